//! Recording backend for runs without a GPU

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use glam::{UVec2, Vec4};
use image::RgbaImage;

use crate::backend::{DrawBackend, NamedUniform, PrimitiveShader, Quad, Uniform};
use crate::error::{RenderError, RenderResult};
use crate::scene::RenderTarget;
use crate::texture::{TextureFlags, TextureId};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    BindTarget(RenderTarget),
    Clear(Vec4),
    Quad {
        shader: PrimitiveShader,
        quad: Quad,
        uniforms: Vec<NamedUniform>,
    },
    UploadTexture {
        id: TextureId,
        size: UVec2,
        flags: TextureFlags,
    },
    ReleaseTexture(TextureId),
    BindTexture(TextureId),
}

impl DrawCall {
    pub fn shader(&self) -> Option<PrimitiveShader> {
        match self {
            Self::Quad { shader, .. } => Some(*shader),
            _ => None,
        }
    }

    /// Value of a named uniform on a quad call
    pub fn uniform(&self, name: &str) -> Option<Uniform> {
        match self {
            Self::Quad { uniforms, .. } => uniforms
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, value)| *value),
            _ => None,
        }
    }
}

/// Shared view of the calls a [`HeadlessBackend`] has recorded
///
/// Clones observe the same log, so a test can keep one while the renderer
/// owns the backend.
#[derive(Debug, Clone, Default)]
pub struct DrawLog(Rc<RefCell<Vec<DrawCall>>>);

impl DrawLog {
    pub fn calls(&self) -> Vec<DrawCall> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Quad calls only
    pub fn quads(&self) -> Vec<DrawCall> {
        self.0
            .borrow()
            .iter()
            .filter(|c| matches!(c, DrawCall::Quad { .. }))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, call: DrawCall) {
        self.0.borrow_mut().push(call);
    }
}

/// Backend that records calls instead of drawing
#[derive(Debug)]
pub struct HeadlessBackend {
    log: DrawLog,
    unloaded: HashSet<PrimitiveShader>,
    textures: HashSet<TextureId>,
    active: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            log: DrawLog::default(),
            unloaded: HashSet::new(),
            textures: HashSet::new(),
            active: true,
        }
    }

    /// Pretend the program for `shader` failed to load
    pub fn without_shader(mut self, shader: PrimitiveShader) -> Self {
        self.unloaded.insert(shader);
        self
    }

    pub fn log(&self) -> DrawLog {
        self.log.clone()
    }

    /// Number of live GPU textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl DrawBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn bind_target(&mut self, target: &RenderTarget) {
        if self.active {
            self.log.push(DrawCall::BindTarget(*target));
        }
    }

    fn clear(&mut self, color: Vec4) {
        if self.active {
            self.log.push(DrawCall::Clear(color));
        }
    }

    fn is_loaded(&self, shader: PrimitiveShader) -> bool {
        self.active && !self.unloaded.contains(&shader)
    }

    fn draw_quad(&mut self, quad: &Quad, shader: PrimitiveShader, uniforms: &[NamedUniform]) {
        if self.active {
            self.log.push(DrawCall::Quad {
                shader,
                quad: *quad,
                uniforms: uniforms.to_vec(),
            });
        }
    }

    fn upload_texture(
        &mut self,
        id: TextureId,
        image: &RgbaImage,
        flags: TextureFlags,
    ) -> RenderResult<()> {
        if !self.active {
            return Err(RenderError::BackendShutDown);
        }
        self.textures.insert(id);
        self.log.push(DrawCall::UploadTexture {
            id,
            size: UVec2::new(image.width(), image.height()),
            flags,
        });
        Ok(())
    }

    fn release_texture(&mut self, id: TextureId) {
        if self.active && self.textures.remove(&id) {
            self.log.push(DrawCall::ReleaseTexture(id));
        }
    }

    fn bind_texture(&mut self, id: TextureId) {
        if self.active {
            self.log.push(DrawCall::BindTexture(id));
        }
    }

    fn shutdown(&mut self) {
        self.active = false;
        self.textures.clear();
    }
}
