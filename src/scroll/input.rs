//! Viewport and touch-contact state shared by scroll-driven effects

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;

/// Layout viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Equivalent of `(max-width: <breakpoint>px)`
    pub fn is_mobile(&self, breakpoint: f32) -> bool {
        self.width <= breakpoint
    }
}

/// Whether a finger is currently on the screen
///
/// Owned by the page session and handed to whatever needs to know; the web
/// layer feeds it from window touch events.
#[derive(Debug, Default)]
pub struct InputState {
    touching: Cell<bool>,
    touch_device: bool,
}

impl InputState {
    pub fn new(touch_device: bool) -> Self {
        Self {
            touching: Cell::new(false),
            touch_device,
        }
    }

    /// Device reports touch support (`ontouchstart` or `maxTouchPoints > 0`)
    pub fn is_touch_device(&self) -> bool {
        self.touch_device
    }

    pub fn touch_start(&self) {
        self.touching.set(true);
    }

    /// Also used for `touchcancel`
    pub fn touch_end(&self) {
        self.touching.set(false);
    }

    pub fn is_touching(&self) -> bool {
        self.touching.get()
    }
}

/// Fires at most once, then releases whatever it was asked to hold
///
/// Several listeners (scroll, touchstart, wheel) share one gate; the first to
/// arrive wins and the registrations kept in `guards` are dropped afterwards.
#[derive(Default)]
pub struct OnceGate {
    fired: Cell<bool>,
    guards: RefCell<Vec<Box<dyn Any>>>,
}

impl fmt::Debug for OnceGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceGate")
            .field("fired", &self.fired.get())
            .field("guards", &self.guards.borrow().len())
            .finish()
    }
}

impl OnceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `guard` alive until [`OnceGate::release`]
    pub fn hold(&self, guard: impl Any) {
        self.guards.borrow_mut().push(Box::new(guard));
    }

    /// Returns true for the first call only
    pub fn fire(&self) -> bool {
        !self.fired.replace(true)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }

    /// Drop all held guards
    pub fn release(&self) {
        let guards = std::mem::take(&mut *self.guards.borrow_mut());
        drop(guards);
    }

    pub fn held(&self) -> usize {
        self.guards.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct DropFlag(Rc<Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    #[test]
    fn test_mobile_breakpoint_inclusive() {
        assert!(Viewport::new(768.0, 1000.0).is_mobile(768.0));
        assert!(Viewport::new(375.0, 700.0).is_mobile(768.0));
        assert!(!Viewport::new(1024.0, 768.0).is_mobile(768.0));
    }

    #[test]
    fn test_touch_contact() {
        let input = InputState::new(true);
        assert!(!input.is_touching());
        input.touch_start();
        assert!(input.is_touching());
        input.touch_end();
        assert!(!input.is_touching());
    }

    #[test]
    fn test_once_gate_fires_once_and_releases() {
        let gate = OnceGate::new();
        let dropped = Rc::new(Cell::new(false));
        gate.hold(DropFlag(dropped.clone()));
        gate.hold(42u32);

        assert!(gate.fire());
        assert!(!gate.fire());
        assert_eq!(gate.held(), 2);
        gate.release();
        assert!(dropped.get());
        assert_eq!(gate.held(), 0);
    }
}
