//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`
///
/// Falls back to `default_level` (e.g. `"info"`) when `RUST_LOG` is unset or
/// invalid. GL and windowing crates are kept at `warn`. Calling this more
/// than once is harmless; only the first subscriber is installed.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{default_level},winit=warn,glutin=warn,egui_glow=warn"))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
