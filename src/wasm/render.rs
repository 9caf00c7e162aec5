use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::window;

use super::webgl::WebGl;
use crate::renderer::Renderer;

pub type SharedRenderer = Rc<RefCell<Renderer<WebGl>>>;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Handle to a running `requestAnimationFrame` loop. Dropping it does not
/// stop the loop; call [`AnimationLoop::stop`].
pub struct AnimationLoop {
    callback: FrameCallback,
    pending: Rc<Cell<Option<i32>>>,
}

impl AnimationLoop {
    pub fn is_running(&self) -> bool {
        self.callback.borrow().is_some()
    }

    /// Cancel the pending frame and release the frame closure.
    pub fn stop(&self) {
        if let Some(id) = self.pending.take() {
            if let Some(w) = window() {
                w.cancel_animation_frame(id).ok();
            }
        }
        self.callback.borrow_mut().take();
    }
}

/// Start ticking `renderer` once per display frame.
pub fn start(renderer: SharedRenderer) -> Result<AnimationLoop, JsValue> {
    // `f` holds the animation-frame closure so that we can keep calling
    // `request_animation_frame` recursively. Storing it inside an `Option`
    // allows us to create the `Closure` first and then obtain a reference to
    // it from within itself.
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let next = pending.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        next.set(None);
        match renderer.try_borrow_mut() {
            Ok(mut r) => {
                r.tick(now);
            }
            Err(_) => log::warn!("renderer busy, frame skipped"),
        }

        // A failed schedule ends the loop; report it rather than throw.
        if let Err(e) = schedule(&f, &next) {
            log::error!("animation loop stopped: {:?}", e);
        }
    }) as Box<dyn FnMut(f64)>));

    schedule(&g, &pending)?;

    Ok(AnimationLoop {
        callback: g,
        pending,
    })
}

fn schedule(callback: &FrameCallback, pending: &Cell<Option<i32>>) -> Result<(), JsValue> {
    let slot = callback.borrow();
    let Some(closure) = slot.as_ref() else {
        // Stopped.
        return Ok(());
    };
    let id = window()
        .ok_or("no window")?
        .request_animation_frame(closure.as_ref().unchecked_ref())?;
    pending.set(Some(id));
    Ok(())
}
