//! Renderer error types

use thiserror::Error;

/// Errors reported by [`Renderer2D`](crate::Renderer2D) and its backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("another scene is still active")]
    SceneAlreadyOpen,

    #[error("no scene is currently active")]
    NoSceneOpen,

    #[error("scene has no render target")]
    NoRenderTarget,

    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("shader program link failed: {0}")]
    ProgramLink(String),

    #[error("failed to create GL object: {0}")]
    GlObject(String),

    #[error("failed to load texture '{path}': {reason}")]
    TextureLoad { path: String, reason: String },

    #[error("texture upload failed: {0}")]
    TextureUpload(String),

    #[error("the render backend has already shut down")]
    BackendShutDown,
}

pub type RenderResult<T> = Result<T, RenderError>;
