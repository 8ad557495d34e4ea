//! Framework error types.

use thiserror::Error;

/// Errors raised while bringing up or tearing down framework resources.
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// The event loop could not be created or stopped with an error.
    #[error("event loop error: {0}")]
    EventLoop(String),

    /// The native window could not be created.
    #[error("failed to create window: {0}")]
    WindowCreation(String),

    /// No suitable GL configuration or context was available.
    #[error("failed to create OpenGL context: {0}")]
    Context(String),

    /// The GL surface for the window could not be created or resized.
    #[error("surface error: {0}")]
    Surface(String),

    /// The GUI painter (and its font atlas) could not be created.
    #[error("failed to create GUI resources: {0}")]
    Gui(String),

    /// Neither an application nor an organization name was configured.
    #[error("neither the application nor the organization name was set")]
    MissingAppIdentity,

    /// The platform has no settings directory.
    #[error("could not determine the settings directory")]
    NoSettingsDir,

    /// Settings file could not be parsed.
    #[error("invalid settings: {0}")]
    Settings(String),

    /// Clipboard access failed.
    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for framework operations.
pub type FrameworkResult<T> = Result<T, FrameworkError>;
