//! Draw backend abstraction
//!
//! [`Renderer2D`](crate::Renderer2D) turns primitives into screen-aligned
//! quads plus shader uniforms. A [`DrawBackend`] puts those on a surface:
//! [`GlBackend`](crate::GlBackend) through OpenGL,
//! [`HeadlessBackend`](crate::HeadlessBackend) by recording them.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};
use image::RgbaImage;

use crate::error::RenderResult;
use crate::scene::RenderTarget;
use crate::texture::{TextureFlags, TextureId};

/// Shader program used for a quad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveShader {
    /// Plain vertex colour
    Flat,
    Line,
    Circle,
    Arc,
    Rectangle,
    /// Samples the bound texture, tinted by the vertex colour
    Texture,
}

impl PrimitiveShader {
    pub const ALL: [Self; 6] = [
        Self::Flat,
        Self::Line,
        Self::Circle,
        Self::Arc,
        Self::Rectangle,
        Self::Texture,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Line => "line",
            Self::Circle => "circle",
            Self::Arc => "arc",
            Self::Rectangle => "rectangle",
            Self::Texture => "texture",
        }
    }
}

/// Quad corner: pixel position (top-left origin) and RGBA colour
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: Vec2, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }
}

/// Four corners in winding order; drawn as triangles (0,1,2) and (0,2,3)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub vertices: [Vertex; 4],
}

/// Index order of the two triangles of a quad
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

impl Quad {
    pub fn new(corners: [Vec2; 4], color: Vec4) -> Self {
        Self {
            vertices: corners.map(|c| Vertex::new(c, color)),
        }
    }

    /// Axis-aligned quad spanning two opposite corners
    pub fn from_corners(p1: Vec2, p2: Vec2, color: Vec4) -> Self {
        Self::new(
            [
                Vec2::new(p1.x, p1.y),
                Vec2::new(p2.x, p1.y),
                Vec2::new(p2.x, p2.y),
                Vec2::new(p1.x, p2.y),
            ],
            color,
        )
    }

    pub fn corners(&self) -> [Vec2; 4] {
        self.vertices.map(|v| v.position())
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.vertices[0].color)
    }
}

/// Value of a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Float(f32),
    Vec2(Vec2),
}

/// Named uniform as passed to [`DrawBackend::draw_quad`]
pub type NamedUniform = (&'static str, Uniform);

/// Surface the renderer draws into
pub trait DrawBackend {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Make `target` the destination of following calls and set the viewport
    fn bind_target(&mut self, target: &RenderTarget);

    /// Clear the bound target
    fn clear(&mut self, color: Vec4);

    /// Whether the program for `shader` is available
    fn is_loaded(&self, shader: PrimitiveShader) -> bool;

    /// Draw one quad with `shader` and its uniforms
    fn draw_quad(&mut self, quad: &Quad, shader: PrimitiveShader, uniforms: &[NamedUniform]);

    /// Create the GPU copy of `image` under `id`
    fn upload_texture(
        &mut self,
        id: TextureId,
        image: &RgbaImage,
        flags: TextureFlags,
    ) -> RenderResult<()>;

    /// Free the GPU copy behind `id`
    fn release_texture(&mut self, id: TextureId);

    /// Texture sampled by the next [`PrimitiveShader::Texture`] quad
    fn bind_texture(&mut self, id: TextureId);

    /// Release backend resources; later calls are no-ops
    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_from_corners_winding() {
        let quad = Quad::from_corners(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), Vec4::ONE);
        assert_eq!(
            quad.corners(),
            [
                Vec2::new(1.0, 2.0),
                Vec2::new(3.0, 2.0),
                Vec2::new(3.0, 4.0),
                Vec2::new(1.0, 4.0),
            ]
        );
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 6 * 4);
        let quad = Quad::new([Vec2::ZERO; 4], Vec4::new(0.1, 0.2, 0.3, 0.4));
        let bytes: &[u8] = bytemuck::cast_slice(&quad.vertices);
        assert_eq!(bytes.len(), 4 * 24);
        assert_eq!(quad.color(), Vec4::new(0.1, 0.2, 0.3, 0.4));
    }
}
