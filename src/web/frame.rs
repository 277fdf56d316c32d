//! requestAnimationFrame driver for the shared ticker

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::window;
use crate::clock::Ticker;
use crate::error::Result;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_frame(callback: &Closure<dyn FnMut(f64)>) -> Result<i32> {
    Ok(window()?.request_animation_frame(callback.as_ref().unchecked_ref())?)
}

/// Ticks the ticker once per display frame until stopped
pub struct FrameLoop {
    callback: FrameCallback,
    request: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    /// Start ticking `ticker` with the rAF timestamp (converted to seconds)
    pub fn start(ticker: Rc<Ticker>) -> Result<Self> {
        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let request = Rc::new(Cell::new(None));

        let next = callback.clone();
        let pending = request.clone();
        *callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
            pending.set(None);
            ticker.tick(timestamp / 1000.0);
            let Ok(slot) = next.try_borrow() else {
                return;
            };
            if let Some(cb) = slot.as_ref() {
                match request_frame(cb) {
                    Ok(id) => pending.set(Some(id)),
                    Err(e) => warn!("Frame loop halted: {e}"),
                }
            }
        }));

        if let Some(cb) = callback.borrow().as_ref() {
            request.set(Some(request_frame(cb)?));
        }
        debug!("Frame loop started");
        Ok(Self { callback, request })
    }

    pub fn is_running(&self) -> bool {
        self.request.get().is_some()
    }

    /// Cancel the pending frame and release the callback
    pub fn stop(&self) {
        if let Some(id) = self.request.take() {
            if let Ok(window) = window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        self.callback.borrow_mut().take();
        debug!("Frame loop stopped");
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
