//! Application configuration
//!
//! Built in code with the `with_*` methods, then optionally overridden by a
//! `settings.toml` in the application's settings directory or an explicit
//! file given on the command line.

use std::path::Path;

use battery_renderer::rgba8;
use battery_system::{AppPaths, FrameworkError, FrameworkResult, WindowConfig, DEFAULT_FRAMERATE};
use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Name of the optional settings file in the settings directory
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Configuration for a Battery application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    pub resizable: bool,
    pub vsync: bool,
    /// OpenGL major version
    pub gl_major: u8,
    /// OpenGL minor version
    pub gl_minor: u8,
    /// Target update/render rate in frames per second
    pub framerate: f64,
    /// Clear colour as RGBA bytes
    pub background: [u8; 4],
    /// Application name, used for the settings directory
    pub application: String,
    /// Organization name, used for the settings directory
    pub organization: String,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Battery".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
            vsync: true,
            gl_major: 3,
            gl_minor: 3,
            framerate: DEFAULT_FRAMERATE,
            background: [80, 80, 80, 255],
            application: String::new(),
            organization: String::new(),
            log_level: "info".to_string(),
            max_frames: None,
        }
    }
}

impl AppConfig {
    /// Create a new configuration with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_gl_version(mut self, major: u8, minor: u8) -> Self {
        self.gl_major = major;
        self.gl_minor = minor;
        self
    }

    pub fn with_framerate(mut self, framerate: f64) -> Self {
        self.framerate = framerate;
        self
    }

    pub fn with_background(mut self, rgba: [u8; 4]) -> Self {
        self.background = rgba;
        self
    }

    /// Set the organization and application names used for the settings directory
    pub fn with_identity(
        mut self,
        organization: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        self.organization = organization.into();
        self.application = application.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Run at most `frames` frames, then shut down
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig::new(self.title.clone())
            .with_size(self.width, self.height)
            .with_resizable(self.resizable)
            .with_vsync(self.vsync)
            .with_gl_version(self.gl_major, self.gl_minor)
    }

    pub fn paths(&self) -> AppPaths {
        AppPaths::new(self.organization.clone(), self.application.clone())
    }

    pub fn background_color(&self) -> Vec4 {
        let [r, g, b, a] = self.background;
        rgba8(r, g, b, a)
    }

    /// Read a complete configuration from a TOML file
    ///
    /// Keys missing from the file take their default values.
    pub fn load_from(path: &Path) -> FrameworkResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| FrameworkError::Settings(format!("{}: {}", path.display(), e)))
    }

    /// Apply the keys present in the TOML file at `path` over this configuration
    pub fn merge_file(self, path: &Path) -> FrameworkResult<Self> {
        let content = std::fs::read_to_string(path)?;
        self.merge_str(&content)
            .map_err(|e| FrameworkError::Settings(format!("{}: {}", path.display(), e)))
    }

    fn merge_str(self, content: &str) -> Result<Self, String> {
        let overrides: toml::Table = content.parse().map_err(|e: toml::de::Error| e.to_string())?;
        let mut merged = toml::Value::try_from(&self).map_err(|e| e.to_string())?;
        if let toml::Value::Table(table) = &mut merged {
            table.extend(overrides);
        }
        merged.try_into().map_err(|e: toml::de::Error| e.to_string())
    }

    /// Apply `settings.toml` from the settings directory, if there is one
    ///
    /// A configuration without an application identity, or a missing file,
    /// is returned unchanged.
    pub fn load_overrides(self) -> FrameworkResult<Self> {
        let path = match self.paths().settings_file(SETTINGS_FILE_NAME) {
            Ok(path) => path,
            Err(FrameworkError::MissingAppIdentity) => return Ok(self),
            Err(err) => return Err(err),
        };
        if !path.is_file() {
            tracing::debug!("No settings file at {}", path.display());
            return Ok(self);
        }
        tracing::info!("Loading settings from {}", path.display());
        self.merge_file(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.framerate, 60.0);
        assert_eq!(config.background_color(), rgba8(80, 80, 80, 255));
        assert!(config.max_frames.is_none());
    }

    #[test]
    fn test_builder_feeds_window_config() {
        let config = AppConfig::new("Demo")
            .with_size(800, 600)
            .with_vsync(false)
            .with_gl_version(4, 1);
        let window = config.window_config();
        assert_eq!(window.title, "Demo");
        assert_eq!((window.width, window.height), (800, 600));
        assert!(!window.vsync);
        assert_eq!((window.gl_major, window.gl_minor), (4, 1));
    }

    #[test]
    fn test_merge_keeps_unlisted_fields() {
        let config = AppConfig::new("Demo").with_size(800, 600).with_max_frames(5);
        let merged = config
            .merge_str("framerate = 30.0\nbackground = [0, 0, 0, 255]\n")
            .unwrap();
        assert_eq!(merged.title, "Demo");
        assert_eq!(merged.width, 800);
        assert_eq!(merged.max_frames, Some(5));
        assert_eq!(merged.framerate, 30.0);
        assert_eq!(merged.background, [0, 0, 0, 255]);
    }

    #[test]
    fn test_merge_rejects_wrong_types() {
        assert!(AppConfig::default().merge_str("width = \"wide\"").is_err());
        assert!(AppConfig::default().merge_str("not toml at all [").is_err());
    }

    #[test]
    fn test_load_overrides_without_identity() {
        let config = AppConfig::new("Anonymous");
        assert_eq!(config.clone().load_overrides().unwrap(), config);
    }
}
