//! OpenGL draw backend
//!
//! One dynamic VBO holds the four corners of the quad being drawn; a static
//! EBO holds its six indices. Each primitive shader is its own program.
//! Textures are RGBA8 2D textures sampled from unit 0.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec2, Vec4};
use glow::*;
use image::RgbaImage;

use crate::backend::{
    DrawBackend, NamedUniform, PrimitiveShader, QUAD_INDICES, Quad, Uniform, Vertex,
};
use crate::error::{RenderError, RenderResult};
use crate::scene::RenderTarget;
use crate::shader_utils::create_program;
use crate::shaders;
use crate::texture::{TextureFilter, TextureFlags, TextureId};

struct QuadMesh {
    vao: VertexArray,
    vbo: Buffer,
    ebo: Buffer,
}

/// Backend drawing into the current GL context's default framebuffer
pub struct GlBackend {
    gl: Arc<Context>,
    programs: HashMap<PrimitiveShader, Program>,
    mesh: Option<QuadMesh>,
    textures: HashMap<TextureId, Texture>,
    screen_size: Vec2,
}

impl GlBackend {
    /// Compile the primitive programs and create the quad buffers
    ///
    /// A program that fails to build is logged and left unloaded; its
    /// primitives are skipped at draw time.
    ///
    /// # Safety
    ///
    /// Must be called with the GL context of `gl` current on this thread.
    pub unsafe fn new(gl: Arc<Context>) -> RenderResult<Self> {
        unsafe {
            let mesh = create_quad_mesh(&gl)?;

            let mut programs = HashMap::new();
            for shader in PrimitiveShader::ALL {
                match create_program(&gl, shaders::VERTEX_SHADER, fragment_source(shader)) {
                    Ok(program) => {
                        programs.insert(shader, program);
                    }
                    Err(err) => {
                        tracing::error!("Failed to build {} shader: {}", shader.name(), err);
                    }
                }
            }
            tracing::info!(
                "GL backend ready ({}/{} programs)",
                programs.len(),
                PrimitiveShader::ALL.len()
            );

            Ok(Self {
                gl,
                programs,
                mesh: Some(mesh),
                textures: HashMap::new(),
                screen_size: Vec2::ONE,
            })
        }
    }

    pub fn gl(&self) -> &Arc<Context> {
        &self.gl
    }
}

fn fragment_source(shader: PrimitiveShader) -> &'static str {
    match shader {
        PrimitiveShader::Flat => shaders::FLAT_FRAGMENT_SHADER,
        PrimitiveShader::Line => shaders::LINE_FRAGMENT_SHADER,
        PrimitiveShader::Circle => shaders::CIRCLE_FRAGMENT_SHADER,
        PrimitiveShader::Arc => shaders::ARC_FRAGMENT_SHADER,
        PrimitiveShader::Rectangle => shaders::RECTANGLE_FRAGMENT_SHADER,
        PrimitiveShader::Texture => shaders::TEXTURE_FRAGMENT_SHADER,
    }
}

unsafe fn create_quad_mesh(gl: &Context) -> RenderResult<QuadMesh> {
    unsafe {
        let vao = gl.create_vertex_array().map_err(RenderError::GlObject)?;
        let vbo = gl.create_buffer().map_err(RenderError::GlObject)?;
        let ebo = gl.create_buffer().map_err(RenderError::GlObject)?;

        gl.bind_vertex_array(Some(vao));

        gl.bind_buffer(ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            ARRAY_BUFFER,
            bytemuck::cast_slice(&[Vertex::new(Vec2::ZERO, Vec4::ZERO); 4]),
            DYNAMIC_DRAW,
        );

        gl.bind_buffer(ELEMENT_ARRAY_BUFFER, Some(ebo));
        gl.buffer_data_u8_slice(
            ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(&QUAD_INDICES),
            STATIC_DRAW,
        );

        let stride = std::mem::size_of::<Vertex>() as i32;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 2, FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 4, FLOAT, false, stride, 2 * 4);

        gl.bind_vertex_array(None);
        gl.bind_buffer(ARRAY_BUFFER, None);

        Ok(QuadMesh { vao, vbo, ebo })
    }
}

impl DrawBackend for GlBackend {
    fn name(&self) -> &'static str {
        "opengl"
    }

    fn bind_target(&mut self, target: &RenderTarget) {
        self.screen_size = target.size.max(glam::UVec2::ONE).as_vec2();
        unsafe {
            self.gl.bind_framebuffer(FRAMEBUFFER, None);
            self.gl
                .viewport(0, 0, target.size.x as i32, target.size.y as i32);
            // The GUI painter leaves scissoring and depth state behind
            self.gl.disable(SCISSOR_TEST);
            self.gl.disable(DEPTH_TEST);
            self.gl.disable(CULL_FACE);
            self.gl.enable(BLEND);
            self.gl
                .blend_func_separate(SRC_ALPHA, ONE_MINUS_SRC_ALPHA, ONE, ONE_MINUS_SRC_ALPHA);
        }
    }

    fn clear(&mut self, color: Vec4) {
        unsafe {
            self.gl.clear_color(color.x, color.y, color.z, color.w);
            self.gl.clear(COLOR_BUFFER_BIT);
        }
    }

    fn is_loaded(&self, shader: PrimitiveShader) -> bool {
        self.mesh.is_some() && self.programs.contains_key(&shader)
    }

    fn draw_quad(&mut self, quad: &Quad, shader: PrimitiveShader, uniforms: &[NamedUniform]) {
        let (Some(mesh), Some(&program)) = (&self.mesh, self.programs.get(&shader)) else {
            return;
        };
        let gl = &self.gl;

        unsafe {
            gl.use_program(Some(program));
            gl.bind_vertex_array(Some(mesh.vao));
            gl.bind_buffer(ARRAY_BUFFER, Some(mesh.vbo));
            gl.buffer_sub_data_u8_slice(ARRAY_BUFFER, 0, bytemuck::cast_slice(&quad.vertices));

            let screen = gl.get_uniform_location(program, "u_screen_size");
            gl.uniform_2_f32(screen.as_ref(), self.screen_size.x, self.screen_size.y);
            if shader == PrimitiveShader::Texture {
                let sampler = gl.get_uniform_location(program, "u_texture");
                gl.uniform_1_i32(sampler.as_ref(), 0);
            }

            for (name, value) in uniforms {
                let location = gl.get_uniform_location(program, name);
                match value {
                    Uniform::Float(v) => gl.uniform_1_f32(location.as_ref(), *v),
                    Uniform::Vec2(v) => gl.uniform_2_f32(location.as_ref(), v.x, v.y),
                }
            }

            gl.draw_elements(TRIANGLES, QUAD_INDICES.len() as i32, UNSIGNED_INT, 0);

            gl.bind_vertex_array(None);
            gl.bind_buffer(ARRAY_BUFFER, None);
            gl.use_program(None);
        }
    }

    fn upload_texture(
        &mut self,
        id: TextureId,
        image: &RgbaImage,
        flags: TextureFlags,
    ) -> RenderResult<()> {
        if self.mesh.is_none() {
            return Err(RenderError::BackendShutDown);
        }
        let gl = &self.gl;

        unsafe {
            let texture = gl.create_texture().map_err(RenderError::TextureUpload)?;
            gl.bind_texture(TEXTURE_2D, Some(texture));

            gl.tex_image_2d(
                TEXTURE_2D,
                0,
                RGBA8 as i32,
                image.width() as i32,
                image.height() as i32,
                0,
                RGBA,
                UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(image.as_raw())),
            );

            let mag = match flags.filter {
                TextureFilter::Nearest => NEAREST,
                TextureFilter::Linear => LINEAR,
            };
            let min = match (flags.filter, flags.mipmaps) {
                (TextureFilter::Nearest, false) => NEAREST,
                (TextureFilter::Linear, false) => LINEAR,
                (TextureFilter::Nearest, true) => NEAREST_MIPMAP_NEAREST,
                (TextureFilter::Linear, true) => LINEAR_MIPMAP_LINEAR,
            };
            let wrap = if flags.repeat { REPEAT } else { CLAMP_TO_EDGE };
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MIN_FILTER, min as i32);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MAG_FILTER, mag as i32);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_S, wrap as i32);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_T, wrap as i32);
            if flags.mipmaps {
                gl.generate_mipmap(TEXTURE_2D);
            }

            gl.bind_texture(TEXTURE_2D, None);
            self.textures.insert(id, texture);
        }
        tracing::debug!(
            "Uploaded texture {} ({}x{})",
            id.0,
            image.width(),
            image.height()
        );
        Ok(())
    }

    fn release_texture(&mut self, id: TextureId) {
        if let Some(texture) = self.textures.remove(&id) {
            unsafe { self.gl.delete_texture(texture) };
        }
    }

    fn bind_texture(&mut self, id: TextureId) {
        let texture = self.textures.get(&id).copied();
        if texture.is_none() {
            tracing::error!("Texture {} is not uploaded", id.0);
        }
        unsafe {
            self.gl.active_texture(TEXTURE0);
            self.gl.bind_texture(TEXTURE_2D, texture);
        }
    }

    fn shutdown(&mut self) {
        unsafe {
            for (_, texture) in self.textures.drain() {
                self.gl.delete_texture(texture);
            }
            for (_, program) in self.programs.drain() {
                self.gl.delete_program(program);
            }
            if let Some(mesh) = self.mesh.take() {
                self.gl.delete_vertex_array(mesh.vao);
                self.gl.delete_buffer(mesh.vbo);
                self.gl.delete_buffer(mesh.ebo);
            }
        }
        tracing::debug!("GL backend released");
    }
}
