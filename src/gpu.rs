//! The slice of a GPU context the renderer talks to.
//!
//! The browser build implements [`Gpu`] on top of `WebGl2RenderingContext`;
//! host tests implement it with an in-memory recorder. Handles are opaque
//! associated types so the renderer never sees a concrete GL object.

use std::fmt;

use crate::error::Result;

/// The two programmable stages of a point-sprite program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Logical (CSS) and backing (pixel) size of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub display_width: u32,
    pub display_height: u32,
    pub backing_width: u32,
    pub backing_height: u32,
}

impl SurfaceSize {
    /// Backing size the display calls for; never smaller than 1x1.
    pub fn target(&self) -> (u32, u32) {
        (self.display_width.max(1), self.display_height.max(1))
    }

    pub fn needs_resize(&self) -> bool {
        self.target() != (self.backing_width, self.backing_height)
    }
}

pub trait Gpu {
    type Shader;
    type Program;
    type VertexArray;
    type Buffer;
    type UniformLocation;

    /// Compile one stage. On failure the shader object is already released
    /// and the error carries the compiler log.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader>;
    fn delete_shader(&self, shader: &Self::Shader);

    /// Link two compiled stages. On failure the program object is already
    /// released and the error carries the linker log.
    fn link_program(&self, vertex: &Self::Shader, fragment: &Self::Shader)
        -> Result<Self::Program>;
    fn delete_program(&self, program: &Self::Program);
    fn use_program(&self, program: Option<&Self::Program>);

    fn attrib_location(&self, program: &Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: &Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    fn create_vertex_array(&self) -> Result<Self::VertexArray>;
    fn delete_vertex_array(&self, vao: &Self::VertexArray);
    fn bind_vertex_array(&self, vao: Option<&Self::VertexArray>);

    fn create_buffer(&self) -> Result<Self::Buffer>;
    fn delete_buffer(&self, buffer: &Self::Buffer);
    /// Bind `buffer` as the array buffer and replace its contents.
    fn upload_vertices(&self, buffer: &Self::Buffer, data: &[f32]);
    /// Enable `location` as a tightly packed `vec2` float attribute reading
    /// from the bound array buffer.
    fn bind_vec2_attribute(&self, location: u32);

    fn uniform1f(&self, location: &Self::UniformLocation, x: f32);
    fn uniform2f(&self, location: &Self::UniformLocation, x: f32, y: f32);
    fn uniform3f(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32);

    fn surface_size(&self) -> SurfaceSize;
    /// Set the backing store to `width` x `height` pixels.
    fn resize_backing(&self, width: u32, height: u32);
    fn viewport(&self, width: u32, height: u32);
    fn clear(&self, color: [f32; 4]);
    fn draw_points(&self, count: usize);

    /// Read the current drawing buffer as packed RGBA8 rows.
    fn read_pixels(&self, width: u32, height: u32) -> Result<Vec<u8>>;
}
