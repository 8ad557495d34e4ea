//! Command line arguments shared by Battery applications
//!
//! Applications can use [`CommonArgs`] directly or flatten it into their own
//! argument struct:
//!
//! ```ignore
//! use battery_app::cli::CommonArgs;
//! use clap::Parser;
//!
//! #[derive(Parser)]
//! struct DemoArgs {
//!     #[command(flatten)]
//!     common: CommonArgs,
//!
//!     /// Demo-specific flag
//!     #[arg(long)]
//!     wireframe: bool,
//! }
//!
//! let args = DemoArgs::parse();
//! let config = args.common.apply_to(AppConfig::new("Demo"))?;
//! ```

use std::path::PathBuf;

use battery_system::FrameworkResult;
use clap::Args;

use crate::config::AppConfig;

/// Common command line arguments
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Run N frames then exit
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Target frames per second
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f64>,

    /// Initial window size
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Load configuration overrides from a TOML file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl CommonArgs {
    /// Apply the arguments to `config`
    ///
    /// The configuration file is merged first, so explicit flags win over it.
    pub fn apply_to(&self, mut config: AppConfig) -> FrameworkResult<AppConfig> {
        if let Some(path) = &self.config {
            config = config.merge_file(path)?;
        }
        if let Some(frames) = self.frames {
            config = config.with_max_frames(frames);
        }
        if let Some(fps) = self.fps {
            config = config.with_framerate(fps);
        }
        if let Some((width, height)) = self.size {
            config = config.with_size(width, height);
        }
        Ok(config)
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let height: u32 = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    if width == 0 || height == 0 {
        return Err("window size must be non-zero".to_string());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[derive(Parser)]
    struct TestArgs {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn test_no_args() {
        let args = TestArgs::parse_from(["test"]);
        assert!(args.common.frames.is_none());
        assert!(args.common.size.is_none());

        let config = args.common.apply_to(AppConfig::new("Demo")).unwrap();
        assert_eq!(config, AppConfig::new("Demo"));
    }

    #[test]
    fn test_frames_fps_and_size() {
        let args = TestArgs::parse_from([
            "test", "--frames", "10", "--fps", "30", "--size", "640x480",
        ]);
        let config = args.common.apply_to(AppConfig::default()).unwrap();
        assert_eq!(config.max_frames, Some(10));
        assert_eq!(config.framerate, 30.0);
        assert_eq!((config.width, config.height), (640, 480));
    }

    #[test]
    fn test_bad_size_is_rejected() {
        assert!(TestArgs::try_parse_from(["test", "--size", "640"]).is_err());
        assert!(TestArgs::try_parse_from(["test", "--size", "0x480"]).is_err());
        assert!(TestArgs::try_parse_from(["test", "--size", "axb"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "width = 1024\nheight = 768\ntitle = \"From file\"").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = TestArgs::parse_from(["test", "--config", &path, "--size", "300x200"]);
        let config = args.common.apply_to(AppConfig::new("Demo")).unwrap();
        assert_eq!(config.title, "From file");
        assert_eq!((config.width, config.height), (300, 200));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = TestArgs::parse_from(["test", "--config", "/nonexistent/battery.toml"]);
        assert!(args.common.apply_to(AppConfig::default()).is_err());
    }
}
