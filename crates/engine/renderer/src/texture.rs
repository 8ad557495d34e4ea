//! 2D textures
//!
//! A [`Texture2D`] owns its RGBA8 pixels. The GPU copy is created the first
//! time the texture is drawn and belongs to the backend that was current at
//! that moment. Dropping or unloading a texture queues the GPU copy for
//! release; the renderer hands queued releases to its backend at the next
//! `begin_scene` or on shutdown.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use glam::UVec2;
use image::RgbaImage;

use crate::error::{RenderError, RenderResult};

/// Handle of a GPU texture inside a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Sampling filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

/// Upload options of a texture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureFlags {
    pub filter: TextureFilter,
    /// Generate mipmaps on upload
    pub mipmaps: bool,
    /// Repeat instead of clamping to the edge
    pub repeat: bool,
}

impl TextureFlags {
    pub fn linear() -> Self {
        Self {
            filter: TextureFilter::Linear,
            ..Self::default()
        }
    }

    pub fn with_mipmaps(mut self) -> Self {
        self.mipmaps = true;
        self
    }

    pub fn with_repeat(mut self) -> Self {
        self.repeat = true;
        self
    }
}

#[derive(Debug)]
struct RegistryState {
    alive: bool,
    next_id: u64,
    released: Vec<TextureId>,
}

/// Book-keeping shared by a renderer and the textures uploaded through it
#[derive(Debug, Clone)]
pub(crate) struct TextureRegistry(Rc<RefCell<RegistryState>>);

impl TextureRegistry {
    pub(crate) fn new() -> Self {
        Self(Rc::new(RefCell::new(RegistryState {
            alive: true,
            next_id: 1,
            released: Vec::new(),
        })))
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.borrow().alive
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn allocate(&self) -> TextureId {
        let mut state = self.0.borrow_mut();
        let id = TextureId(state.next_id);
        state.next_id += 1;
        id
    }

    /// Ids dropped since the last call
    pub(crate) fn take_released(&self) -> Vec<TextureId> {
        std::mem::take(&mut self.0.borrow_mut().released)
    }

    /// Mark the backend gone; later releases are reported as errors
    pub(crate) fn retire(&self) {
        let mut state = self.0.borrow_mut();
        state.alive = false;
        state.released.clear();
    }

    fn release(&self, id: TextureId) -> RenderResult<()> {
        let mut state = self.0.borrow_mut();
        if !state.alive {
            return Err(RenderError::BackendShutDown);
        }
        state.released.push(id);
        Ok(())
    }
}

/// GPU copy of a texture
#[derive(Debug)]
pub(crate) struct GpuSlot {
    pub(crate) id: TextureId,
    pub(crate) registry: TextureRegistry,
    done: bool,
}

impl GpuSlot {
    pub(crate) fn new(id: TextureId, registry: TextureRegistry) -> Self {
        Self {
            id,
            registry,
            done: false,
        }
    }

    fn release(mut self) -> RenderResult<()> {
        self.done = true;
        self.registry.release(self.id)
    }

    /// Forget a slot whose backend was replaced; nothing left to free
    pub(crate) fn abandon(mut self) {
        self.done = true;
    }
}

impl Drop for GpuSlot {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if self.registry.release(self.id).is_err() {
            tracing::error!(
                "Can't destroy texture {}: the renderer has already shut down. \
                 Unload or drop textures before shutting the renderer down",
                self.id.0
            );
        }
    }
}

/// RGBA8 texture drawn with [`Renderer2D::draw_texture`](crate::Renderer2D::draw_texture)
///
/// Cloning copies the pixels; the clone gets its own GPU copy on first draw.
#[derive(Debug, Default)]
pub struct Texture2D {
    image: Option<RgbaImage>,
    flags: TextureFlags,
    pub(crate) gpu: Option<GpuSlot>,
}

impl Clone for Texture2D {
    fn clone(&self) -> Self {
        Self {
            image: self.image.clone(),
            flags: self.flags,
            gpu: None,
        }
    }
}

impl Texture2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_image(image: RgbaImage, flags: TextureFlags) -> Self {
        Self {
            image: Some(image),
            flags,
            gpu: None,
        }
    }

    /// Decode an image file
    pub fn from_path(path: impl AsRef<Path>, flags: TextureFlags) -> RenderResult<Self> {
        let mut texture = Self::new();
        texture.load(path, flags)?;
        Ok(texture)
    }

    /// Replace the contents with an image file
    ///
    /// On failure the texture is left empty.
    pub fn load(&mut self, path: impl AsRef<Path>, flags: TextureFlags) -> RenderResult<()> {
        let path = path.as_ref();
        if self.image.is_some() {
            tracing::trace!("Texture is already loaded, overwriting previous...");
            self.unload()?;
        }

        match image::open(path) {
            Ok(decoded) => {
                let image = decoded.into_rgba8();
                tracing::debug!(
                    "Loaded texture '{}' ({}x{})",
                    path.display(),
                    image.width(),
                    image.height()
                );
                self.image = Some(image);
                self.flags = flags;
                Ok(())
            }
            Err(err) => {
                tracing::error!("Failed to load texture '{}': {}", path.display(), err);
                Err(RenderError::TextureLoad {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Drop the pixels and queue the GPU copy for release
    ///
    /// Fails if the renderer that uploaded the texture has already shut
    /// down; the texture is emptied either way.
    pub fn unload(&mut self) -> RenderResult<()> {
        self.image = None;
        match self.gpu.take() {
            Some(slot) => slot.release().inspect_err(|_| {
                tracing::error!(
                    "Can't unload texture: the renderer has already shut down. \
                     Unload or drop textures before shutting the renderer down"
                );
            }),
            None => Ok(()),
        }
    }

    /// Change the upload options; the GPU copy is rebuilt on the next draw
    pub fn set_flags(&mut self, flags: TextureFlags) -> RenderResult<()> {
        self.flags = flags;
        match self.gpu.take() {
            Some(slot) => slot.release(),
            None => Ok(()),
        }
    }

    pub fn flags(&self) -> TextureFlags {
        self.flags
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Size in pixels, zero when empty
    pub fn size(&self) -> UVec2 {
        self.image
            .as_ref()
            .map_or(UVec2::ZERO, |image| UVec2::new(image.width(), image.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(4, 2, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_from_image() {
        let texture = Texture2D::from_image(checker(), TextureFlags::linear());
        assert!(texture.is_loaded());
        assert!(!texture.is_uploaded());
        assert_eq!(texture.size(), UVec2::new(4, 2));
        assert_eq!(texture.flags().filter, TextureFilter::Linear);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Texture2D::from_path(dir.path().join("missing.png"), TextureFlags::default());
        assert!(matches!(result, Err(RenderError::TextureLoad { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        checker().save(&path).unwrap();

        let mut texture = Texture2D::from_image(RgbaImage::new(1, 1), TextureFlags::default());
        texture.load(&path, TextureFlags::default().with_repeat()).unwrap();
        assert_eq!(texture.size(), UVec2::new(4, 2));
        assert!(texture.flags().repeat);
        assert_eq!(texture.image().unwrap().get_pixel(1, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_clone_copies_pixels_only() {
        let registry = TextureRegistry::new();
        let mut texture = Texture2D::from_image(checker(), TextureFlags::default());
        texture.gpu = Some(GpuSlot::new(registry.allocate(), registry.clone()));

        let copy = texture.clone();
        assert_eq!(copy.image(), texture.image());
        assert!(!copy.is_uploaded());
        assert!(texture.is_uploaded());
    }

    #[test]
    fn test_drop_queues_release() {
        let registry = TextureRegistry::new();
        let id = registry.allocate();
        let mut texture = Texture2D::from_image(checker(), TextureFlags::default());
        texture.gpu = Some(GpuSlot::new(id, registry.clone()));

        drop(texture);
        assert_eq!(registry.take_released(), vec![id]);
        assert!(registry.take_released().is_empty());
    }

    #[test]
    fn test_unload_after_retire_fails() {
        let registry = TextureRegistry::new();
        let mut texture = Texture2D::from_image(checker(), TextureFlags::default());
        texture.gpu = Some(GpuSlot::new(registry.allocate(), registry.clone()));

        registry.retire();
        assert_eq!(texture.unload(), Err(RenderError::BackendShutDown));
        assert!(!texture.is_loaded());
        assert!(!texture.is_uploaded());
        assert!(registry.take_released().is_empty());
    }

    #[test]
    fn test_set_flags_releases_gpu_copy() {
        let registry = TextureRegistry::new();
        let id = registry.allocate();
        let mut texture = Texture2D::from_image(checker(), TextureFlags::default());
        texture.gpu = Some(GpuSlot::new(id, registry.clone()));

        texture.set_flags(TextureFlags::linear().with_mipmaps()).unwrap();
        assert!(!texture.is_uploaded());
        assert!(texture.is_loaded());
        assert_eq!(registry.take_released(), vec![id]);
    }
}
