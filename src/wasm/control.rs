use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use js_sys::{Array, Math};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use super::render::{self, AnimationLoop, SharedRenderer};
use super::webgl::WebGl;
use crate::export::{raw_file_name, PNG_MIME};
use crate::patterns::PatternRegistry;
use crate::renderer::Renderer;
use crate::settings::{ColorSetting, Settings};

/// The object the page holds on to: one canvas, one renderer, one loop.
#[wasm_bindgen]
pub struct Screensaver {
    canvas: HtmlCanvasElement,
    renderer: SharedRenderer,
    animation: AnimationLoop,
}

#[wasm_bindgen]
impl Screensaver {
    /// Acquire WebGL2 on `#canvas_id`, build `initial_pattern` and start
    /// drawing.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, initial_pattern: usize) -> Result<Screensaver, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| format!("canvas #{} not found", canvas_id))?
            .dyn_into::<HtmlCanvasElement>()?;

        let gpu = WebGl::from_canvas(canvas.clone()).map_err(|e| {
            log::error!("{}", e);
            e
        })?;
        let seed = (Math::random() * 9_007_199_254_740_992.0) as u64;
        let renderer = Renderer::new(gpu, PatternRegistry::builtin(), initial_pattern, seed)?;
        let renderer = Rc::new(RefCell::new(renderer));
        let animation = render::start(renderer.clone())?;

        Ok(Screensaver {
            canvas,
            renderer,
            animation,
        })
    }

    /// Returns whether the pattern actually changed. Out-of-range and
    /// repeated indices are ignored.
    pub fn change_pattern(&self, index: usize) -> Result<bool, JsValue> {
        Ok(self.renderer()?.change_pattern(index)?)
    }

    pub fn next_pattern(&self) -> Result<usize, JsValue> {
        let mut r = self.renderer()?;
        let next = r.registry().next(r.active_index().unwrap_or(0));
        r.change_pattern(next)?;
        Ok(next)
    }

    pub fn previous_pattern(&self) -> Result<usize, JsValue> {
        let mut r = self.renderer()?;
        let previous = r.registry().previous(r.active_index().unwrap_or(0));
        r.change_pattern(previous)?;
        Ok(previous)
    }

    /// Regenerate the particle field. Returns the clamped count.
    pub fn update_density(&self, count: usize) -> Result<usize, JsValue> {
        Ok(self.renderer()?.update_density(count))
    }

    /// `color` is `#rrggbb` or one of the sentinels `transparent` / `auto`.
    pub fn push_uniforms(&self, speed: f32, density: usize, color: &str) -> Result<(), JsValue> {
        let settings = parse_settings(speed, density, color)?;
        self.renderer()?.push_uniforms(settings.uniforms());
        Ok(())
    }

    /// Push uniforms and, if the density moved, regenerate the particles.
    pub fn apply_settings(&self, speed: f32, density: usize, color: &str) -> Result<(), JsValue> {
        let settings = parse_settings(speed, density, color)?.clamped();
        let mut r = self.renderer()?;
        r.push_uniforms(settings.uniforms());
        if settings.density != r.particle_count() {
            r.update_density(settings.density);
        }
        Ok(())
    }

    pub fn pattern_names(&self) -> Result<Array, JsValue> {
        let r = self.renderer()?;
        Ok(r.registry().names().into_iter().map(JsValue::from).collect())
    }

    pub fn active_pattern(&self) -> Result<Option<usize>, JsValue> {
        Ok(self.renderer()?.active_index())
    }

    pub fn particle_count(&self) -> Result<usize, JsValue> {
        Ok(self.renderer()?.particle_count())
    }

    /// `data:image/png;base64,...` of the last drawn frame.
    pub fn export_png(&self) -> Result<String, JsValue> {
        self.canvas.to_data_url_with_type(PNG_MIME)
    }

    /// Packed RGBA8 pixels, `width * height * 4` bytes, bottom row first.
    pub fn export_raw(&self) -> Result<Vec<u8>, JsValue> {
        Ok(self.renderer()?.export_raw()?.into_bytes())
    }

    /// Suggested download name for [`Screensaver::export_raw`].
    pub fn raw_file_name(&self) -> Result<String, JsValue> {
        let r = self.renderer()?;
        Ok(raw_file_name(
            r.active_name().unwrap_or("frame"),
            self.canvas.width(),
            self.canvas.height(),
        ))
    }

    pub fn is_running(&self) -> bool {
        self.animation.is_running()
    }

    /// Stop scheduling frames. The context itself belongs to the page.
    pub fn stop(&self) {
        self.animation.stop();
        log::info!("animation stopped");
    }
}

impl Screensaver {
    fn renderer(&self) -> Result<RefMut<'_, Renderer<WebGl>>, JsValue> {
        self.renderer
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("renderer is busy"))
    }
}

fn parse_settings(speed: f32, density: usize, color: &str) -> Result<Settings, JsValue> {
    let color: ColorSetting = color.parse().map_err(|e| {
        log::warn!("{}", e);
        e
    })?;
    Ok(Settings {
        speed,
        density,
        color,
    })
}

impl Drop for Screensaver {
    fn drop(&mut self) {
        self.animation.stop();
    }
}
