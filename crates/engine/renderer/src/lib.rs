//! Battery 2D renderer
//!
//! [`Renderer2D`] draws lines, arcs, circles, rectangles, quads and
//! [`Texture2D`]s into the current [`Scene`] through a [`DrawBackend`]:
//! [`GlBackend`] on a real GL context, [`HeadlessBackend`] when there is none.

pub mod backend;
pub mod error;
pub mod gl_backend;
pub mod headless;
pub mod renderer;
pub mod scene;
pub mod shader_utils;
pub mod shaders;
pub mod texture;

pub use backend::{DrawBackend, NamedUniform, PrimitiveShader, Quad, Uniform, Vertex};
pub use error::{RenderError, RenderResult};
pub use gl_backend::GlBackend;
pub use headless::{DrawCall, DrawLog, HeadlessBackend};
pub use renderer::{DEFAULT_BACKGROUND, DEFAULT_FALLOFF, DrawStats, Renderer2D, rgba8};
pub use scene::{RenderTarget, Scene};
pub use texture::{Texture2D, TextureFilter, TextureFlags, TextureId};

// Re-export glow and image so applications share the renderer's versions
pub use glow;
pub use image;
