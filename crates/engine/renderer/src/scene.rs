//! Scenes and render targets

use glam::UVec2;

/// Surface a scene draws into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    /// Framebuffer size in physical pixels
    pub size: UVec2,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: UVec2::new(width, height),
        }
    }
}

/// Binding of draw calls to a render target
///
/// A scene is opened with [`Renderer2D::begin_scene`](crate::Renderer2D::begin_scene)
/// and stays current until `end_scene`. Only one scene is current at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scene {
    pub target: Option<RenderTarget>,
}

impl Scene {
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// Scene without a target; rejected by `begin_scene`
    pub fn detached() -> Self {
        Self::default()
    }
}
