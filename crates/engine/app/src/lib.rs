//! Battery application framework
//!
//! - [`Application`]: the root object with lifecycle hooks
//! - [`Layer`] and [`LayerStack`]: ordered update/render/event handlers
//! - [`AppContext`]: state passed explicitly to every hook
//! - [`Engine`]: the fixed-interval loop, independent of any window
//!
//! With the `runtime` feature (default) a native window with an OpenGL
//! context and egui is available, and [`run`] opens it. Without it, [`run`]
//! drives the engine headless.

use std::process::ExitCode;

pub mod application;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod layer;

#[cfg(feature = "runtime")]
mod egui_integration;
#[cfg(feature = "runtime")]
mod runner;
#[cfg(feature = "runtime")]
pub mod window;

pub use application::Application;
pub use cli::CommonArgs;
pub use config::AppConfig;
pub use context::AppContext;
pub use engine::{Engine, FrameOutcome, HeadlessHost, LoopState, WindowHost};
pub use layer::{Layer, LayerId, LayerStack};

#[cfg(feature = "runtime")]
pub use egui_integration::EguiIntegration;
#[cfg(feature = "runtime")]
pub use runner::{create_event_loop, run_app, AppRuntime};
#[cfg(feature = "runtime")]
pub use window::Window;

// Re-export the crates applications build against
pub use battery_renderer as renderer;
pub use battery_system as system;
pub use egui;

/// Run an application and turn the outcome into a process exit code
///
/// Initializes logging, merges `settings.toml` from the settings directory
/// into `config`, builds the application with `factory` and runs it until it
/// closes. Failures are logged and shown in an error dialog.
pub fn run<A, F>(config: AppConfig, factory: F) -> ExitCode
where
    A: Application,
    F: FnOnce(&AppConfig) -> anyhow::Result<A>,
{
    battery_system::logging::init(&config.log_level);

    let config = match config.clone().load_overrides() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Ignoring settings file: {}", err);
            config
        }
    };
    let args: Vec<String> = std::env::args().collect();

    let result = factory(&config).and_then(|app| run_with(app, config, args));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            battery_system::platform::report_error("Application error", &format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "runtime")]
fn run_with<A: Application>(app: A, config: AppConfig, args: Vec<String>) -> anyhow::Result<()> {
    run_app(app, config, args)
}

#[cfg(not(feature = "runtime"))]
fn run_with<A: Application>(app: A, config: AppConfig, args: Vec<String>) -> anyhow::Result<()> {
    let max_frames = config.max_frames;
    Engine::new(app, &config, args).run_headless(max_frames)?;
    Ok(())
}
