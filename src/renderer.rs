//! Program-switching point-sprite renderer.
//!
//! [`Renderer`] owns one GPU context, one linked program with its vertex
//! array and particle buffer, and the clock that feeds `time` to the
//! shaders. The host drives it through [`Renderer::tick`] once per display
//! frame and mutates it between frames with [`Renderer::change_pattern`],
//! [`Renderer::update_density`] and [`Renderer::push_uniforms`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::export::RawFrame;
use crate::gpu::{Gpu, ShaderStage};
use crate::patterns::{Pattern, PatternRegistry};
use crate::settings::{clamp_density, UniformValues, DEFAULT_DENSITY};

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.1, 1.0];
pub const POSITION_ATTRIBUTE: &str = "position";

/// Uniform locations of the active program. Any of them may be missing:
/// the GLSL compiler drops uniforms a pattern never reads.
struct UniformSet<G: Gpu> {
    time: Option<G::UniformLocation>,
    resolution: Option<G::UniformLocation>,
    speed: Option<G::UniformLocation>,
    density: Option<G::UniformLocation>,
    color: Option<G::UniformLocation>,
}

impl<G: Gpu> UniformSet<G> {
    fn resolve(gpu: &G, program: &G::Program) -> Self {
        Self {
            time: gpu.uniform_location(program, "time"),
            resolution: gpu.uniform_location(program, "resolution"),
            speed: gpu.uniform_location(program, "u_speed"),
            density: gpu.uniform_location(program, "u_density"),
            color: gpu.uniform_location(program, "u_color"),
        }
    }
}

/// Everything that is rebuilt when the pattern changes.
struct ActivePattern<G: Gpu> {
    index: usize,
    name: &'static str,
    program: G::Program,
    vao: G::VertexArray,
    buffer: G::Buffer,
    uniforms: UniformSet<G>,
}

/// Elapsed time since the first frame, never running backwards.
#[derive(Debug, Default)]
struct FrameClock {
    start_ms: Option<f64>,
    elapsed: f32,
}

impl FrameClock {
    fn advance(&mut self, now_ms: f64) -> f32 {
        let start = *self.start_ms.get_or_insert(now_ms);
        let secs = ((now_ms - start) / 1000.0) as f32;
        self.elapsed = self.elapsed.max(secs);
        self.elapsed
    }
}

/// What one call to [`Renderer::tick`] drew.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub elapsed: f32,
    pub points: usize,
    pub width: u32,
    pub height: u32,
}

pub struct Renderer<G: Gpu> {
    gpu: G,
    registry: PatternRegistry,
    active: Option<ActivePattern<G>>,
    particle_count: usize,
    uniforms: UniformValues,
    clock: FrameClock,
    rng: SmallRng,
}

impl<G: Gpu> Renderer<G> {
    /// Take ownership of `gpu` and build `initial_index`'s program and a
    /// default-sized particle field. Any failure here is fatal: there is no
    /// previous program to fall back to.
    pub fn new(gpu: G, registry: PatternRegistry, initial_index: usize, seed: u64) -> Result<Self> {
        let pattern = *registry.get(initial_index)?;
        let mut renderer = Self {
            gpu,
            registry,
            active: None,
            particle_count: DEFAULT_DENSITY,
            uniforms: UniformValues::default(),
            clock: FrameClock::default(),
            rng: SmallRng::seed_from_u64(seed),
        };
        let positions = scatter(&mut renderer.rng, renderer.particle_count);
        let active = build_pattern(&renderer.gpu, initial_index, &pattern, &positions)?;
        renderer.active = Some(active);
        renderer.apply_uniforms();
        log::info!(
            "renderer ready: {:?} with {} particles",
            pattern.name,
            renderer.particle_count
        );
        Ok(renderer)
    }

    /// Switch to `index`. Returns `Ok(false)` when there was nothing to do
    /// (same pattern or no such pattern). On error the previous program is
    /// still active and untouched.
    pub fn change_pattern(&mut self, index: usize) -> Result<bool> {
        if self.active_index() == Some(index) {
            return Ok(false);
        }
        let pattern = match self.registry.get(index) {
            Ok(p) => *p,
            Err(e) => {
                log::debug!("ignoring pattern switch: {}", e);
                return Ok(false);
            }
        };

        let positions = scatter(&mut self.rng, self.particle_count);
        let next = build_pattern(&self.gpu, index, &pattern, &positions).map_err(|e| {
            log::error!("switch to {:?} aborted: {}", pattern.name, e);
            e
        })?;

        // The replacement exists; only now is the old program let go.
        if let Some(previous) = self.active.replace(next) {
            release(&self.gpu, &previous);
        }
        self.apply_uniforms();
        log::info!("switched to pattern {} ({:?})", index, pattern.name);
        Ok(true)
    }

    /// Refill the particle buffer with `count` fresh random positions,
    /// clamped to the supported density range. Returns the count in use.
    pub fn update_density(&mut self, count: usize) -> usize {
        let count = clamp_density(count);
        if let Some(active) = &self.active {
            let positions = scatter(&mut self.rng, count);
            self.gpu.upload_vertices(&active.buffer, &positions);
            self.particle_count = count;
        }
        count
    }

    /// Remember `values` and write them to whichever of `u_speed`,
    /// `u_density` and `u_color` the active program declares.
    pub fn push_uniforms(&mut self, values: UniformValues) {
        self.uniforms = values;
        self.apply_uniforms();
    }

    /// Draw one frame. `now_ms` is the host's monotonic timestamp.
    pub fn tick(&mut self, now_ms: f64) -> FrameInfo {
        let elapsed = self.clock.advance(now_ms);

        let mut size = self.gpu.surface_size();
        if size.needs_resize() {
            let (width, height) = size.target();
            self.gpu.resize_backing(width, height);
            self.gpu.viewport(width, height);
            size.backing_width = width;
            size.backing_height = height;
        }

        self.gpu.clear(CLEAR_COLOR);

        let mut points = 0;
        if let Some(active) = &self.active {
            self.gpu.use_program(Some(&active.program));
            self.gpu.bind_vertex_array(Some(&active.vao));
            if let Some(time) = &active.uniforms.time {
                self.gpu.uniform1f(time, elapsed);
            }
            if let Some(resolution) = &active.uniforms.resolution {
                self.gpu.uniform2f(
                    resolution,
                    size.backing_width as f32,
                    size.backing_height as f32,
                );
            }
            self.gpu.draw_points(self.particle_count);
            points = self.particle_count;
        }

        FrameInfo {
            elapsed,
            points,
            width: size.backing_width,
            height: size.backing_height,
        }
    }

    /// Snapshot of the drawing buffer at its current pixel size.
    pub fn export_raw(&self) -> Result<RawFrame> {
        let size = self.gpu.surface_size();
        let pixels = self
            .gpu
            .read_pixels(size.backing_width, size.backing_height)?;
        RawFrame::new(size.backing_width, size.backing_height, pixels)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.index)
    }

    pub fn active_name(&self) -> Option<&'static str> {
        self.active.as_ref().map(|a| a.name)
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn uniforms(&self) -> UniformValues {
        self.uniforms
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    fn apply_uniforms(&self) {
        let Some(active) = &self.active else {
            return;
        };
        let u = &active.uniforms;
        self.gpu.use_program(Some(&active.program));
        if let Some(speed) = &u.speed {
            self.gpu.uniform1f(speed, self.uniforms.speed);
        }
        if let Some(density) = &u.density {
            self.gpu.uniform1f(density, self.uniforms.density);
        }
        if let Some(color) = &u.color {
            let [r, g, b] = self.uniforms.color;
            self.gpu.uniform3f(color, r, g, b);
        }
    }
}

impl<G: Gpu> Drop for Renderer<G> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            release(&self.gpu, &active);
        }
    }
}

/// Compile, link and lay out a pattern. Partially created objects are
/// released before an error is returned.
fn build_pattern<G: Gpu>(
    gpu: &G,
    index: usize,
    pattern: &Pattern,
    positions: &[f32],
) -> Result<ActivePattern<G>> {
    let vertex = gpu.compile_shader(ShaderStage::Vertex, pattern.vertex_source)?;
    let fragment = match gpu.compile_shader(ShaderStage::Fragment, pattern.fragment_source) {
        Ok(shader) => shader,
        Err(e) => {
            gpu.delete_shader(&vertex);
            return Err(e);
        }
    };
    let linked = gpu.link_program(&vertex, &fragment);
    gpu.delete_shader(&vertex);
    gpu.delete_shader(&fragment);
    let program = linked?;

    let vao = match gpu.create_vertex_array() {
        Ok(vao) => vao,
        Err(e) => {
            gpu.delete_program(&program);
            return Err(e);
        }
    };
    let buffer = match gpu.create_buffer() {
        Ok(buffer) => buffer,
        Err(e) => {
            gpu.delete_vertex_array(&vao);
            gpu.delete_program(&program);
            return Err(e);
        }
    };

    gpu.bind_vertex_array(Some(&vao));
    gpu.upload_vertices(&buffer, positions);
    match gpu.attrib_location(&program, POSITION_ATTRIBUTE) {
        Some(location) => gpu.bind_vec2_attribute(location),
        None => log::warn!("{:?} does not read `position`", pattern.name),
    }
    gpu.bind_vertex_array(None);

    let uniforms = UniformSet::resolve(gpu, &program);
    Ok(ActivePattern {
        index,
        name: pattern.name,
        program,
        vao,
        buffer,
        uniforms,
    })
}

fn release<G: Gpu>(gpu: &G, active: &ActivePattern<G>) {
    gpu.delete_buffer(&active.buffer);
    gpu.delete_vertex_array(&active.vao);
    gpu.delete_program(&active.program);
}

/// `count` points, each coordinate drawn independently from `[-1, 1]`.
fn scatter(rng: &mut SmallRng, count: usize) -> Vec<f32> {
    (0..count * 2).map(|_| rng.gen_range(-1.0..=1.0)).collect()
}
