use js_sys::Float32Array;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlContextAttributes,
    WebGlProgram, WebGlShader, WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::error::{Error, Result};
use crate::export::byte_len;
use crate::gpu::{Gpu, ShaderStage, SurfaceSize};

/// A canvas and the WebGL2 context drawn into it.
pub struct WebGl {
    canvas: HtmlCanvasElement,
    gl: GL,
}

impl WebGl {
    /// Acquire a WebGL2 context that keeps its drawing buffer between
    /// frames, so `readPixels` and `toDataURL` see the last frame.
    pub fn from_canvas(canvas: HtmlCanvasElement) -> Result<Self> {
        let attrs = WebGlContextAttributes::new();
        attrs.set_preserve_drawing_buffer(true);
        attrs.set_alpha(true);
        attrs.set_premultiplied_alpha(false);
        attrs.set_antialias(true);
        attrs.set_depth(false);

        let gl: GL = canvas
            .get_context_with_context_options("webgl2", &attrs)
            .map_err(|e| Error::ContextUnavailable(format!("{:?}", e)))?
            .ok_or_else(|| Error::ContextUnavailable("WebGL2 not supported".into()))?
            .dyn_into()
            .map_err(|_| Error::ContextUnavailable("context is not WebGL2".into()))?;

        gl.enable(GL::BLEND);
        gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);
        gl.disable(GL::DEPTH_TEST);

        Ok(Self { canvas, gl })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Gpu for WebGl {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type VertexArray = WebGlVertexArrayObject;
    type Buffer = WebGlBuffer;
    type UniformLocation = WebGlUniformLocation;

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<WebGlShader> {
        let kind = match stage {
            ShaderStage::Vertex => GL::VERTEX_SHADER,
            ShaderStage::Fragment => GL::FRAGMENT_SHADER,
        };
        let shader = self
            .gl
            .create_shader(kind)
            .ok_or(Error::ResourceCreation("shader"))?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);

        if self
            .gl
            .get_shader_parameter(&shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false)
        {
            Ok(shader)
        } else {
            let log = self
                .gl
                .get_shader_info_log(&shader)
                .unwrap_or_else(|| "unknown shader error".to_string());
            self.gl.delete_shader(Some(&shader));
            Err(Error::ShaderCompile { stage, log })
        }
    }

    fn delete_shader(&self, shader: &WebGlShader) {
        self.gl.delete_shader(Some(shader));
    }

    fn link_program(&self, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram> {
        let program = self
            .gl
            .create_program()
            .ok_or(Error::ResourceCreation("program"))?;
        self.gl.attach_shader(&program, vertex);
        self.gl.attach_shader(&program, fragment);
        self.gl.link_program(&program);

        if self
            .gl
            .get_program_parameter(&program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
        {
            self.gl.detach_shader(&program, vertex);
            self.gl.detach_shader(&program, fragment);
            Ok(program)
        } else {
            let log = self
                .gl
                .get_program_info_log(&program)
                .unwrap_or_else(|| "unknown program error".to_string());
            self.gl.delete_program(Some(&program));
            Err(Error::ProgramLink { log })
        }
    }

    fn delete_program(&self, program: &WebGlProgram) {
        self.gl.delete_program(Some(program));
    }

    fn use_program(&self, program: Option<&WebGlProgram>) {
        self.gl.use_program(program);
    }

    fn attrib_location(&self, program: &WebGlProgram, name: &str) -> Option<u32> {
        u32::try_from(self.gl.get_attrib_location(program, name)).ok()
    }

    fn uniform_location(&self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn create_vertex_array(&self) -> Result<WebGlVertexArrayObject> {
        self.gl
            .create_vertex_array()
            .ok_or(Error::ResourceCreation("vertex array"))
    }

    fn delete_vertex_array(&self, vao: &WebGlVertexArrayObject) {
        self.gl.delete_vertex_array(Some(vao));
    }

    fn bind_vertex_array(&self, vao: Option<&WebGlVertexArrayObject>) {
        self.gl.bind_vertex_array(vao);
    }

    fn create_buffer(&self) -> Result<WebGlBuffer> {
        self.gl
            .create_buffer()
            .ok_or(Error::ResourceCreation("particle buffer"))
    }

    fn delete_buffer(&self, buffer: &WebGlBuffer) {
        self.gl.delete_buffer(Some(buffer));
    }

    fn upload_vertices(&self, buffer: &WebGlBuffer, data: &[f32]) {
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
        // Copies into a JS-owned array; a view into wasm memory would be
        // invalidated by any allocation before the upload.
        let array = Float32Array::from(data);
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, GL::STATIC_DRAW);
    }

    fn bind_vec2_attribute(&self, location: u32) {
        self.gl.enable_vertex_attrib_array(location);
        self.gl
            .vertex_attrib_pointer_with_i32(location, 2, GL::FLOAT, false, 0, 0);
    }

    fn uniform1f(&self, location: &WebGlUniformLocation, x: f32) {
        self.gl.uniform1f(Some(location), x);
    }

    fn uniform2f(&self, location: &WebGlUniformLocation, x: f32, y: f32) {
        self.gl.uniform2f(Some(location), x, y);
    }

    fn uniform3f(&self, location: &WebGlUniformLocation, x: f32, y: f32, z: f32) {
        self.gl.uniform3f(Some(location), x, y, z);
    }

    /// The display size is the canvas's CSS box; one backing pixel per CSS
    /// pixel keeps `gl_PointSize` in CSS pixels.
    fn surface_size(&self) -> SurfaceSize {
        SurfaceSize {
            display_width: self.canvas.client_width().max(0) as u32,
            display_height: self.canvas.client_height().max(0) as u32,
            backing_width: self.canvas.width(),
            backing_height: self.canvas.height(),
        }
    }

    fn resize_backing(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn viewport(&self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn clear(&self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(GL::COLOR_BUFFER_BIT);
    }

    fn draw_points(&self, count: usize) {
        self.gl.draw_arrays(GL::POINTS, 0, count as i32);
    }

    fn read_pixels(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        let mut pixels = vec![0u8; byte_len(width, height)];
        self.gl
            .read_pixels_with_opt_u8_array(
                0,
                0,
                width as i32,
                height as i32,
                GL::RGBA,
                GL::UNSIGNED_BYTE,
                Some(&mut pixels),
            )
            .map_err(|e| Error::PixelReadback(format!("{:?}", e)))?;
        Ok(pixels)
    }
}
