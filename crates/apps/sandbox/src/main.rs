//! Battery sandbox
//!
//! Opens a window drawing every 2D primitive. `--headless` runs the same
//! layers without a window (120 frames unless `--frames` says otherwise).

use std::process::ExitCode;

use battery_app::{cli::CommonArgs, AppConfig, Engine};
use clap::Parser;
use sandbox::Sandbox;

/// Battery sandbox
#[derive(Parser)]
#[command(name = "sandbox")]
#[command(about = "Demo of the Battery layer stack and 2D renderer")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Run without a window
    #[arg(long)]
    headless: bool,
}

const HEADLESS_FRAMES: u64 = 120;

fn main() -> ExitCode {
    let args = Args::parse();

    let config = AppConfig::new("Battery Sandbox")
        .with_size(1280, 720)
        .with_identity("Battery", "Sandbox");

    let config = match args.common.apply_to(config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to apply configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.headless {
        battery_system::logging::init(&config.log_level);
        let frames = config.max_frames.unwrap_or(HEADLESS_FRAMES);
        let mut engine = Engine::new(Sandbox::new(), &config, std::env::args().collect());
        return match engine.run_headless(Some(frames)) {
            Ok(frames) => {
                tracing::info!("Headless run finished after {} frames", frames);
                ExitCode::SUCCESS
            }
            Err(err) => {
                tracing::error!("Headless run failed: {:#}", err);
                ExitCode::FAILURE
            }
        };
    }

    battery_app::run(config, |_| Ok(Sandbox::new()))
}
