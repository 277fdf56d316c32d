//! Window binding for the smooth scroll engine
//!
//! Wheel and touch input feed the engine, the engine's offset is written back
//! to the window, and scrolls the browser performs on its own (keyboard,
//! anchors, scrollbar) are adopted. With smoothing off only the adoption runs.

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};
use web_sys::{TouchEvent, WheelEvent, Window};

use super::listener::EventListener;
use super::window;
use crate::error::Result;
use crate::scroll::{InputState, ScrollEngine, ScrollToOptions, SmoothScroll, SubscriptionId};

/// Pixels per line for `DOM_DELTA_LINE` wheels
const LINE_HEIGHT: f64 = 16.0;

/// Wheel delta in pixels, whatever unit the browser reported
fn wheel_pixels(event: &WheelEvent, page: f64) -> f64 {
    match event.delta_mode() {
        WheelEvent::DOM_DELTA_LINE => event.delta_y() * LINE_HEIGHT,
        WheelEvent::DOM_DELTA_PAGE => event.delta_y() * page,
        _ => event.delta_y(),
    }
}

fn inner_height(window: &Window) -> f64 {
    window
        .inner_height()
        .ok()
        .and_then(|h| h.as_f64())
        .unwrap_or(0.0)
}

/// Scrollable range of the document
fn scroll_limit(window: &Window) -> f64 {
    let height = window
        .document()
        .and_then(|d| d.document_element())
        .map_or(0, |root| root.scroll_height());
    (f64::from(height) - inner_height(window)).max(0.0)
}

fn first_touch_y(event: &TouchEvent) -> Option<f64> {
    event.touches().get(0).map(|t| f64::from(t.client_y()))
}

/// Live listeners and the engine subscription; all removed on drop
pub struct ScrollBinding {
    engine: Rc<SmoothScroll>,
    subscription: Option<SubscriptionId>,
    _listeners: Vec<EventListener>,
}

impl ScrollBinding {
    pub fn attach(engine: Rc<SmoothScroll>, input: Rc<InputState>, smooth: bool) -> Result<Self> {
        let window = window()?;
        let mut listeners = Vec::new();
        engine.set_limit(scroll_limit(&window));

        // Start where the browser restored or anchored the page
        let initial = window.scroll_y().unwrap_or(0.0);
        engine.scroll_to(initial, ScrollToOptions::IMMEDIATE);

        // Last offset written to the window, so our own writes are not adopted back
        let written = Rc::new(Cell::new(initial));

        let touch_y = Rc::new(Cell::new(None::<f64>));
        {
            let (input, touch_y) = (input.clone(), touch_y.clone());
            listeners.push(EventListener::passive::<TouchEvent>(
                &window,
                "touchstart",
                move |e| {
                    input.touch_start();
                    touch_y.set(first_touch_y(e));
                },
            )?);
        }
        for event in ["touchend", "touchcancel"] {
            let (input, touch_y) = (input.clone(), touch_y.clone());
            listeners.push(EventListener::passive::<TouchEvent>(&window, event, move |_| {
                input.touch_end();
                touch_y.set(None);
            })?);
        }

        let subscription = if smooth {
            {
                let (engine, page) = (engine.clone(), window.clone());
                listeners.push(EventListener::active::<WheelEvent>(
                    &window,
                    "wheel",
                    move |e| {
                        e.prevent_default();
                        engine.on_wheel(wheel_pixels(e, inner_height(&page)));
                    },
                )?);
            }
            {
                let (engine, touch_y) = (engine.clone(), touch_y.clone());
                listeners.push(EventListener::active::<TouchEvent>(
                    &window,
                    "touchmove",
                    move |e| {
                        let Some(y) = first_touch_y(e) else {
                            return;
                        };
                        e.prevent_default();
                        if let Some(last) = touch_y.replace(Some(y)) {
                            engine.on_touch_move(last - y);
                        }
                    },
                )?);
            }
            let (target, written) = (window.clone(), written.clone());
            Some(engine.on(Box::new(move |event| {
                written.set(event.scroll);
                target.scroll_to_with_x_and_y(0.0, event.scroll);
            })))
        } else {
            None
        };

        {
            let (engine, page) = (engine.clone(), window.clone());
            listeners.push(EventListener::passive::<web_sys::Event>(
                &window,
                "scroll",
                move |_| {
                    let offset = page.scroll_y().unwrap_or(0.0);
                    if (offset - written.get()).abs() >= 1.0 {
                        written.set(offset);
                        engine.sync_native(offset);
                    }
                },
            )?);
        }
        {
            let (engine, page) = (engine.clone(), window.clone());
            listeners.push(EventListener::passive::<web_sys::Event>(
                &window,
                "resize",
                move |_| {
                    let limit = scroll_limit(&page);
                    debug!("Scroll limit now {limit}");
                    engine.set_limit(limit);
                },
            )?);
        }

        info!(
            "Scroll bound ({}, limit {})",
            if smooth { "smooth" } else { "native" },
            engine.limit()
        );
        Ok(Self {
            engine,
            subscription,
            _listeners: listeners,
        })
    }

    pub fn engine(&self) -> &Rc<SmoothScroll> {
        &self.engine
    }

    /// Whether wheel and touch are routed through the engine
    pub fn is_smooth(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for ScrollBinding {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.engine.off(id);
        }
    }
}
