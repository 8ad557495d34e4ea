//! Immediate-mode 2D primitive renderer
//!
//! Every primitive becomes one or two screen-aligned quads. The shader bound
//! to a quad computes a distance mask from the primitive's uniforms, which
//! gives anti-aliased edges controlled by the `falloff` width in pixels.
//!
//! Colours are linear RGBA in `0.0..=1.0`. Positions are pixels with the
//! origin at the top-left of the target.

use glam::{Vec2, Vec4};

use crate::backend::{DrawBackend, NamedUniform, PrimitiveShader, Quad, Uniform};
use crate::error::{RenderError, RenderResult};
use crate::headless::HeadlessBackend;
use crate::scene::Scene;
use crate::texture::{GpuSlot, Texture2D, TextureId, TextureRegistry};

/// Default clear colour, grey 80/80/80
pub const DEFAULT_BACKGROUND: Vec4 = Vec4::new(80.0 / 255.0, 80.0 / 255.0, 80.0 / 255.0, 1.0);

/// Default edge falloff for anti-aliased primitives, in pixels
pub const DEFAULT_FALLOFF: f32 = 3.0;

/// Build a colour from 8-bit channels
pub fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Vec4 {
    Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
}

/// Counters for the current frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub quads: u32,
    pub skipped: u32,
}

/// 2D renderer with a single current-scene slot
pub struct Renderer2D {
    backend: Box<dyn DrawBackend>,
    current: Option<Scene>,
    textures: TextureRegistry,
    stats: DrawStats,
}

impl Default for Renderer2D {
    fn default() -> Self {
        Self::headless()
    }
}

impl Renderer2D {
    pub fn new(backend: Box<dyn DrawBackend>) -> Self {
        Self {
            backend,
            current: None,
            textures: TextureRegistry::new(),
            stats: DrawStats::default(),
        }
    }

    /// Renderer on a [`HeadlessBackend`]
    pub fn headless() -> Self {
        Self::new(Box::new(HeadlessBackend::new()))
    }

    /// Swap in a new backend, shutting the previous one down
    ///
    /// Textures uploaded to the previous backend are uploaded again on their
    /// next draw.
    pub fn set_backend(&mut self, backend: Box<dyn DrawBackend>) {
        if self.current.is_some() {
            tracing::warn!("Replacing the render backend while a scene is active");
            self.current = None;
        }
        self.flush_released_textures();
        let mut old = std::mem::replace(&mut self.backend, backend);
        old.shutdown();
        self.textures.retire();
        self.textures = TextureRegistry::new();
        tracing::info!("Render backend: {} -> {}", old.name(), self.backend.name());
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Release backend resources and fall back to a headless backend
    ///
    /// Textures still holding a GPU copy report an error when they are
    /// dropped or unloaded afterwards.
    pub fn shutdown(&mut self) {
        self.end_unfinished_scene();
        self.flush_released_textures();
        self.backend.shutdown();
        self.textures.retire();
        self.textures = TextureRegistry::new();
        self.backend = Box::new(HeadlessBackend::new());
    }

    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DrawStats::default();
    }

    // --- Scenes --------------------------------------------------------------

    /// Make `scene` current and bind its target
    pub fn begin_scene(&mut self, scene: Scene) -> RenderResult<()> {
        if self.current.is_some() {
            tracing::error!("Can't begin scene: another scene is still active");
            return Err(RenderError::SceneAlreadyOpen);
        }
        let Some(target) = scene.target else {
            tracing::error!("Can't begin scene: scene has no render target");
            return Err(RenderError::NoRenderTarget);
        };

        tracing::trace!("begin_scene {}x{}", target.size.x, target.size.y);
        self.flush_released_textures();
        self.backend.bind_target(&target);
        self.current = Some(scene);
        Ok(())
    }

    pub fn end_scene(&mut self) -> RenderResult<()> {
        if self.current.take().is_none() {
            tracing::error!("Can't end scene: no scene is currently active");
            return Err(RenderError::NoSceneOpen);
        }
        tracing::trace!("end_scene");
        Ok(())
    }

    /// Close a scene someone forgot to end
    pub fn end_unfinished_scene(&mut self) {
        if self.current.is_some() {
            tracing::warn!("The most recent scene is still active, make sure to call end_scene()");
            self.current = None;
        }
    }

    pub fn is_scene_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.as_ref()
    }

    // --- Primitives ----------------------------------------------------------

    /// Clear the bound target
    pub fn draw_background(&mut self, color: Vec4) {
        if !self.require_scene("draw_background") {
            return;
        }
        self.backend.clear(color);
    }

    /// Axis-aligned filled quad at `position` (top-left) with `size`
    pub fn draw_quad(&mut self, position: Vec2, size: Vec2, color: Vec4) {
        if !self.require_scene("draw_quad") {
            return;
        }
        if color.w == 0.0 {
            tracing::trace!("Quad color alpha is 0: skipping quad");
            return;
        }
        let quad = Quad::from_corners(position, position + size, color);
        self.submit(&quad, PrimitiveShader::Flat, &[]);
    }

    /// Anti-aliased line segment with round caps
    pub fn draw_line(&mut self, p1: Vec2, p2: Vec2, thickness: f32, color: Vec4, falloff: f32) {
        if !self.require_scene("draw_line") {
            return;
        }
        let Some(quad) = line_quad(p1, p2, thickness, color) else {
            tracing::trace!("Degenerate line: skipping");
            return;
        };
        if color.w == 0.0 {
            tracing::trace!("Line color alpha is 0: skipping line");
            return;
        }

        let uniforms = [
            ("line_p1", Uniform::Vec2(p1)),
            ("line_p2", Uniform::Vec2(p2)),
            ("line_thickness", Uniform::Float(thickness.max(0.0))),
            ("line_falloff", Uniform::Float(falloff.max(0.0))),
        ];
        self.submit(&quad, PrimitiveShader::Line, &uniforms);
    }

    /// Ring segment between two angles in degrees
    ///
    /// Angles are normalized into `[0, 360)`; equal angles draw the whole ring.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_arc(
        &mut self,
        center: Vec2,
        radius: f32,
        start_deg: f32,
        end_deg: f32,
        thickness: f32,
        color: Vec4,
        falloff: f32,
    ) {
        if !self.require_scene("draw_arc") {
            return;
        }
        if color.w == 0.0 {
            tracing::trace!("Arc color alpha is 0: skipping arc");
            return;
        }

        let radius = radius.max(0.0);
        let thickness = thickness.max(0.0);
        let falloff = falloff.max(0.0);
        let margin = thickness / 2.0 + falloff;

        let uniforms = [
            ("arc_center", Uniform::Vec2(center)),
            ("arc_radius", Uniform::Float(radius)),
            ("arc_start_angle", Uniform::Float(normalize_degrees(start_deg).to_radians())),
            ("arc_end_angle", Uniform::Float(normalize_degrees(end_deg).to_radians())),
            ("arc_thickness", Uniform::Float(thickness)),
            ("arc_falloff", Uniform::Float(falloff)),
        ];
        let quad = centered_quad(center, Vec2::splat(radius + margin), color);
        self.submit(&quad, PrimitiveShader::Arc, &uniforms);
    }

    /// Filled circle with an optional outline
    ///
    /// The outline is a full-ring arc; either part is skipped when its colour
    /// is fully transparent.
    pub fn draw_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        outline_thickness: f32,
        outline_color: Vec4,
        fill_color: Vec4,
        falloff: f32,
    ) {
        if !self.require_scene("draw_circle") {
            return;
        }
        let radius = radius.max(0.0);
        let falloff = falloff.max(0.0);

        if fill_color.w != 0.0 {
            let uniforms = [
                ("circle_center", Uniform::Vec2(center)),
                ("circle_radius", Uniform::Float(radius)),
                ("circle_falloff", Uniform::Float(falloff)),
            ];
            let quad = centered_quad(center, Vec2::splat(radius), fill_color);
            self.submit(&quad, PrimitiveShader::Circle, &uniforms);
        } else {
            tracing::trace!("Circle fill alpha is 0: skipping fill");
        }

        if outline_color.w != 0.0 {
            self.draw_arc(center, radius, 0.0, 360.0, outline_thickness, outline_color, falloff);
        } else {
            tracing::trace!("Circle outline alpha is 0: skipping outline");
        }
    }

    /// Rectangle spanning two opposite corners, filled and/or outlined
    ///
    /// The outline is four independent lines between the corners.
    pub fn draw_rectangle(
        &mut self,
        p1: Vec2,
        p2: Vec2,
        outline_thickness: f32,
        outline_color: Vec4,
        fill_color: Vec4,
        falloff: f32,
    ) {
        if !self.require_scene("draw_rectangle") {
            return;
        }

        if fill_color.w != 0.0 {
            let quad = Quad::from_corners(p1, p2, fill_color);
            self.submit(&quad, PrimitiveShader::Rectangle, &[]);
        } else {
            tracing::trace!("Rectangle fill alpha is 0: skipping fill");
        }

        if outline_color.w != 0.0 {
            let corners = Quad::from_corners(p1, p2, outline_color).corners();
            for i in 0..4 {
                let (a, b) = (corners[i], corners[(i + 1) % 4]);
                self.draw_line(a, b, outline_thickness, outline_color, falloff);
            }
        } else {
            tracing::trace!("Rectangle outline alpha is 0: skipping outline");
        }
    }

    /// Draw `texture` stretched over `size` pixels at `position` (top-left)
    ///
    /// `tint` multiplies the sampled colour. The GPU copy is created on the
    /// first draw.
    pub fn draw_texture(
        &mut self,
        texture: &mut Texture2D,
        position: Vec2,
        size: Vec2,
        tint: Vec4,
    ) {
        if !self.require_scene("draw_texture") {
            return;
        }
        if tint.w == 0.0 {
            tracing::trace!("Texture tint alpha is 0: skipping texture");
            return;
        }
        let Some(id) = self.upload_texture(texture) else {
            self.stats.skipped += 1;
            return;
        };

        let uniforms = [
            ("texture_origin", Uniform::Vec2(position)),
            ("texture_size", Uniform::Vec2(size)),
        ];
        let quad = Quad::from_corners(position, position + size, tint);
        self.backend.bind_texture(id);
        self.submit(&quad, PrimitiveShader::Texture, &uniforms);
    }

    /// GPU id of `texture` on the current backend, uploading it if needed
    fn upload_texture(&mut self, texture: &mut Texture2D) -> Option<TextureId> {
        if let Some(slot) = texture.gpu.take() {
            if slot.registry.same_as(&self.textures) {
                let id = slot.id;
                texture.gpu = Some(slot);
                return Some(id);
            }
            // Uploaded to a backend that has since been replaced
            slot.abandon();
        }

        let Some(image) = texture.image() else {
            tracing::error!("draw_texture(): texture is not loaded");
            return None;
        };
        let id = self.textures.allocate();
        if let Err(err) = self.backend.upload_texture(id, image, texture.flags()) {
            tracing::error!("Can't upload texture: {}", err);
            return None;
        }
        texture.gpu = Some(GpuSlot::new(id, self.textures.clone()));
        Some(id)
    }

    fn flush_released_textures(&mut self) {
        if !self.textures.is_alive() {
            return;
        }
        for id in self.textures.take_released() {
            self.backend.release_texture(id);
        }
    }

    fn require_scene(&self, call: &str) -> bool {
        if self.current.is_none() {
            tracing::error!("{}(): no scene is currently active", call);
            return false;
        }
        true
    }

    fn submit(&mut self, quad: &Quad, shader: PrimitiveShader, uniforms: &[NamedUniform]) {
        if !self.backend.is_loaded(shader) {
            tracing::error!("Can't render {}: shader is not loaded", shader.name());
            self.stats.skipped += 1;
            return;
        }
        self.backend.draw_quad(quad, shader, uniforms);
        self.stats.quads += 1;
    }
}

/// Map an angle in degrees into `[0, 360)`
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle - 360.0 * (angle / 360.0).floor();
    // Rounding can land exactly on 360 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Quad covering a line of `thickness`, extended by half the thickness past
/// each endpoint. `None` for a degenerate line.
pub fn line_quad(p1: Vec2, p2: Vec2, thickness: f32, color: Vec4) -> Option<Quad> {
    let atob = (p2 - p1).try_normalize()?;
    let anorm = Vec2::new(atob.y, -atob.x);
    let r = thickness.max(0.0) / 2.0;

    Some(Quad::new(
        [
            p1 - atob * r + anorm * r,
            p1 - atob * r - anorm * r,
            p2 + atob * r - anorm * r,
            p2 + atob * r + anorm * r,
        ],
        color,
    ))
}

fn centered_quad(center: Vec2, half: Vec2, color: Vec4) -> Quad {
    let to_right = Vec2::new(half.x, 0.0);
    let to_top = Vec2::new(0.0, half.y);
    Quad::new(
        [
            center - to_right + to_top,
            center + to_right + to_top,
            center + to_right - to_top,
            center - to_right - to_top,
        ],
        color,
    )
}
