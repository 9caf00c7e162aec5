//! Full-screen particle screensaver rendered with WebGL2 point sprites.
//!
//! The rendering core ([`Renderer`], [`PatternRegistry`], [`Settings`]) is
//! plain Rust written against the [`Gpu`] trait so it can be exercised on the
//! host. The browser glue (WebGL2 context, animation loop, JS control
//! surface) only exists on `wasm32`.

#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

pub mod error;
pub mod export;
pub mod gpu;
pub mod patterns;
pub mod renderer;
pub mod settings;

pub use error::{Error, Result};
pub use export::RawFrame;
pub use gpu::{Gpu, ShaderStage, SurfaceSize};
pub use patterns::{Pattern, PatternRegistry};
pub use renderer::{FrameInfo, Renderer};
pub use settings::{ColorSetting, Settings, UniformValues};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    mod control;
    mod render;
    mod webgl;

    pub use control::Screensaver;

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();
        log::info!("particle_saver loaded");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::Screensaver;
