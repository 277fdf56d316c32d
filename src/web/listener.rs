//! RAII DOM event listeners

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

use crate::error::Result;

/// A listener that is removed from its target when dropped
pub struct EventListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    /// Listen for `event` on `target`
    ///
    /// Passive listeners cannot call `prevent_default`.
    pub fn new(
        target: &EventTarget,
        event: &'static str,
        passive: bool,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }

    /// Passive listener, typed to the concrete event
    pub fn passive<E: JsCast + 'static>(
        target: &EventTarget,
        event: &'static str,
        mut handler: impl FnMut(&E) + 'static,
    ) -> Result<Self> {
        Self::new(target, event, true, move |e: Event| {
            if let Some(e) = e.dyn_ref::<E>() {
                handler(e);
            }
        })
    }

    /// Active listener (may prevent default), typed to the concrete event
    pub fn active<E: JsCast + 'static>(
        target: &EventTarget,
        event: &'static str,
        mut handler: impl FnMut(&E) + 'static,
    ) -> Result<Self> {
        Self::new(target, event, false, move |e: Event| {
            if let Some(e) = e.dyn_ref::<E>() {
                handler(e);
            }
        })
    }

    pub fn event(&self) -> &'static str {
        self.event
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}
