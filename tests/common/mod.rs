//! In-memory stand-in for a WebGL2 context.
//!
//! It keeps just enough state to check what the renderer does with it:
//! which objects are alive, what each buffer holds, which uniforms were set
//! on which program, and what every draw call used. "Compilation" fails on
//! `#error`, and "linking" fails when the fragment stage reads a varying the
//! vertex stage never writes.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use particle_saver::{Error, Gpu, Pattern, ShaderStage, SurfaceSize};

#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub program: Option<u32>,
    pub vao: Option<u32>,
    pub count: usize,
    /// Vertices available in the buffer wired to the vertex array.
    pub available: usize,
}

#[derive(Debug, Default)]
pub struct State {
    next_id: u32,
    pub shaders: HashMap<u32, (ShaderStage, String)>,
    pub programs: HashMap<u32, Vec<String>>,
    pub vaos: HashSet<u32>,
    pub buffers: HashMap<u32, Vec<f32>>,
    pub vao_source: HashMap<u32, u32>,
    pub current_program: Option<u32>,
    pub bound_vao: Option<u32>,
    pub array_buffer: Option<u32>,
    pub uniforms: HashMap<(u32, String), Vec<f32>>,
    pub draws: Vec<Draw>,
    pub clears: Vec<[f32; 4]>,
    pub display: (u32, u32),
    pub backing: (u32, u32),
    pub viewport: Option<(u32, u32)>,
}

impl State {
    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn last_draw(&self) -> Option<&Draw> {
        self.draws.last()
    }

    pub fn uniform(&self, program: u32, name: &str) -> Option<&[f32]> {
        self.uniforms
            .get(&(program, name.to_string()))
            .map(|v| v.as_slice())
    }
}

#[derive(Clone)]
pub struct MockGpu {
    pub state: Rc<RefCell<State>>,
    pub fail_vertex_array: Rc<Cell<bool>>,
}

impl MockGpu {
    pub fn new(width: u32, height: u32) -> Self {
        let state = State {
            display: (width, height),
            backing: (width, height),
            ..State::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            fail_vertex_array: Rc::new(Cell::new(false)),
        }
    }

    pub fn set_display(&self, width: u32, height: u32) {
        self.state.borrow_mut().display = (width, height);
    }

    /// (programs, shaders, vertex arrays, buffers) currently alive.
    pub fn live(&self) -> (usize, usize, usize, usize) {
        let s = self.state.borrow();
        (
            s.programs.len(),
            s.shaders.len(),
            s.vaos.len(),
            s.buffers.len(),
        )
    }

    pub fn last_draw(&self) -> Draw {
        self.state
            .borrow()
            .last_draw()
            .cloned()
            .expect("nothing drawn yet")
    }

    pub fn uniform(&self, program: u32, name: &str) -> Option<Vec<f32>> {
        self.state.borrow().uniform(program, name).map(|v| v.to_vec())
    }

    /// Contents of the buffer feeding the last draw.
    pub fn drawn_positions(&self) -> Vec<f32> {
        let s = self.state.borrow();
        let vao = s.last_draw().and_then(|d| d.vao).expect("no draw");
        let buffer = s.vao_source[&vao];
        s.buffers[&buffer].clone()
    }
}

fn declared(source: &str, keyword: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(keyword))
        .filter_map(|line| line.split_whitespace().nth(2))
        .map(|name| name.trim_end_matches(';').to_string())
        .collect()
}

impl Gpu for MockGpu {
    type Shader = u32;
    type Program = u32;
    type VertexArray = u32;
    type Buffer = u32;
    type UniformLocation = (u32, String);

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<u32, Error> {
        if source.contains("#error") {
            return Err(Error::ShaderCompile {
                stage,
                log: "ERROR: 0:2: '#error' : malformed pattern".into(),
            });
        }
        let mut s = self.state.borrow_mut();
        let id = s.id();
        s.shaders.insert(id, (stage, source.to_string()));
        Ok(id)
    }

    fn delete_shader(&self, shader: &u32) {
        self.state.borrow_mut().shaders.remove(shader);
    }

    fn link_program(&self, vertex: &u32, fragment: &u32) -> Result<u32, Error> {
        let mut s = self.state.borrow_mut();
        let (_, vs) = s.shaders[vertex].clone();
        let (_, fs) = s.shaders[fragment].clone();
        let outputs = declared(&vs, "out ");
        for input in declared(&fs, "in ") {
            if !outputs.contains(&input) {
                return Err(Error::ProgramLink {
                    log: format!("varying `{}` is not written by the vertex shader", input),
                });
            }
        }
        let mut uniforms = declared(&vs, "uniform ");
        uniforms.extend(declared(&fs, "uniform "));
        let id = s.id();
        s.programs.insert(id, uniforms);
        Ok(id)
    }

    fn delete_program(&self, program: &u32) {
        let mut s = self.state.borrow_mut();
        s.programs.remove(program);
        if s.current_program == Some(*program) {
            s.current_program = None;
        }
    }

    fn use_program(&self, program: Option<&u32>) {
        let mut s = self.state.borrow_mut();
        if let Some(p) = program {
            assert!(s.programs.contains_key(p), "use of deleted program {}", p);
        }
        s.current_program = program.copied();
    }

    fn attrib_location(&self, _program: &u32, name: &str) -> Option<u32> {
        (name == "position").then_some(0)
    }

    fn uniform_location(&self, program: &u32, name: &str) -> Option<(u32, String)> {
        let s = self.state.borrow();
        s.programs[program]
            .iter()
            .any(|u| u == name)
            .then(|| (*program, name.to_string()))
    }

    fn create_vertex_array(&self) -> Result<u32, Error> {
        if self.fail_vertex_array.get() {
            return Err(Error::ResourceCreation("vertex array"));
        }
        let mut s = self.state.borrow_mut();
        let id = s.id();
        s.vaos.insert(id);
        Ok(id)
    }

    fn delete_vertex_array(&self, vao: &u32) {
        let mut s = self.state.borrow_mut();
        s.vaos.remove(vao);
        s.vao_source.remove(vao);
    }

    fn bind_vertex_array(&self, vao: Option<&u32>) {
        self.state.borrow_mut().bound_vao = vao.copied();
    }

    fn create_buffer(&self) -> Result<u32, Error> {
        let mut s = self.state.borrow_mut();
        let id = s.id();
        s.buffers.insert(id, Vec::new());
        Ok(id)
    }

    fn delete_buffer(&self, buffer: &u32) {
        self.state.borrow_mut().buffers.remove(buffer);
    }

    fn upload_vertices(&self, buffer: &u32, data: &[f32]) {
        let mut s = self.state.borrow_mut();
        assert!(s.buffers.contains_key(buffer), "upload to deleted buffer");
        s.array_buffer = Some(*buffer);
        s.buffers.insert(*buffer, data.to_vec());
    }

    fn bind_vec2_attribute(&self, location: u32) {
        assert_eq!(location, 0);
        let mut s = self.state.borrow_mut();
        let vao = s.bound_vao.expect("attribute set with no vertex array bound");
        let buffer = s.array_buffer.expect("attribute set with no array buffer");
        s.vao_source.insert(vao, buffer);
    }

    fn uniform1f(&self, location: &(u32, String), x: f32) {
        self.set_uniform(location, vec![x]);
    }

    fn uniform2f(&self, location: &(u32, String), x: f32, y: f32) {
        self.set_uniform(location, vec![x, y]);
    }

    fn uniform3f(&self, location: &(u32, String), x: f32, y: f32, z: f32) {
        self.set_uniform(location, vec![x, y, z]);
    }

    fn surface_size(&self) -> SurfaceSize {
        let s = self.state.borrow();
        SurfaceSize {
            display_width: s.display.0,
            display_height: s.display.1,
            backing_width: s.backing.0,
            backing_height: s.backing.1,
        }
    }

    fn resize_backing(&self, width: u32, height: u32) {
        self.state.borrow_mut().backing = (width, height);
    }

    fn viewport(&self, width: u32, height: u32) {
        self.state.borrow_mut().viewport = Some((width, height));
    }

    fn clear(&self, color: [f32; 4]) {
        self.state.borrow_mut().clears.push(color);
    }

    fn draw_points(&self, count: usize) {
        let mut s = self.state.borrow_mut();
        let vao = s.bound_vao;
        let available = vao
            .and_then(|v| s.vao_source.get(&v))
            .map(|b| s.buffers[b].len() / 2)
            .unwrap_or(0);
        let program = s.current_program;
        s.draws.push(Draw {
            program,
            vao,
            count,
            available,
        });
    }

    fn read_pixels(&self, width: u32, height: u32) -> Result<Vec<u8>, Error> {
        Ok([0u8, 0, 25, 255].repeat(width as usize * height as usize))
    }
}

impl MockGpu {
    fn set_uniform(&self, location: &(u32, String), value: Vec<f32>) {
        let mut s = self.state.borrow_mut();
        assert_eq!(
            s.current_program,
            Some(location.0),
            "uniform {} set while another program is bound",
            location.1
        );
        s.uniforms.insert(location.clone(), value);
    }
}

pub const SIMPLE_VERTEX: &str = "#version 300 es
in vec2 position;
uniform float time;
uniform vec2 resolution;
uniform float u_speed;
uniform float u_density;
out vec4 vColor;
void main() {
    gl_Position = vec4(position, 0.0, 1.0);
    gl_PointSize = 2.0 * u_density;
    vColor = vec4(1.0, sin(time * u_speed), 0.0, 1.0);
}";

pub const SIMPLE_FRAGMENT: &str = "#version 300 es
precision highp float;
in vec4 vColor;
out vec4 fragColor;
void main() {
    fragColor = vColor;
}";

pub const COLORED_VERTEX: &str = "#version 300 es
in vec2 position;
uniform float time;
uniform vec3 u_color;
out vec4 vColor;
void main() {
    gl_Position = vec4(position, 0.0, 1.0);
    vColor = vec4(u_color, 1.0);
}";

pub const BROKEN_VERTEX: &str = "#version 300 es
#error
in vec2 position;
void main() {
    gl_Position = vec4(position, 0.0, 1.0)
}";

pub const MISMATCHED_FRAGMENT: &str = "#version 300 es
precision highp float;
in vec4 vColour;
out vec4 fragColor;
void main() {
    fragColor = vColour;
}";

/// 0: plain, 1: colored, 2: does not compile, 3: does not link.
pub fn test_patterns() -> Vec<Pattern> {
    vec![
        Pattern {
            name: "Plain",
            vertex_source: SIMPLE_VERTEX,
            fragment_source: SIMPLE_FRAGMENT,
        },
        Pattern {
            name: "Colored",
            vertex_source: COLORED_VERTEX,
            fragment_source: SIMPLE_FRAGMENT,
        },
        Pattern {
            name: "Broken",
            vertex_source: BROKEN_VERTEX,
            fragment_source: SIMPLE_FRAGMENT,
        },
        Pattern {
            name: "Mismatched",
            vertex_source: SIMPLE_VERTEX,
            fragment_source: MISMATCHED_FRAGMENT,
        },
    ]
}
