//! Smooth scroll engine
//!
//! Wheel and touch input move a target offset; every `raf` step damps the
//! animated offset toward it and publishes a [`ScrollEvent`]. Subscribers
//! (scroll triggers, the window writer) only ever see the animated value.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::damp;
use crate::settings::ScrollSettings;

/// Below this distance (px) the animated offset snaps onto the target
const SNAP_DISTANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    #[default]
    Forward,
    Backward,
}

/// Published after every step that moved (or jumped) the scroll offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub scroll: f64,
    pub limit: f64,
    /// Pixels moved since the previous step
    pub velocity: f64,
    pub direction: ScrollDirection,
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollToOptions {
    /// Jump without easing
    pub immediate: bool,
}

impl ScrollToOptions {
    pub const IMMEDIATE: ScrollToOptions = ScrollToOptions { immediate: true };
}

pub type SubscriptionId = u64;

/// The operations effects consume from a scroll engine
pub trait ScrollEngine {
    /// Current (animated) scroll offset
    fn scroll(&self) -> f64;

    /// Maximum scroll offset
    fn limit(&self) -> f64;

    /// Pixels moved during the last step
    fn velocity(&self) -> f64;

    fn scroll_to(&self, offset: f64, options: ScrollToOptions);

    /// Freeze scrolling; input is ignored until [`ScrollEngine::start`]
    fn stop(&self);

    fn start(&self);

    fn is_stopped(&self) -> bool;

    /// Subscribe to scroll events
    fn on(&self, handler: Box<dyn FnMut(&ScrollEvent)>) -> SubscriptionId;

    fn off(&self, id: SubscriptionId);
}

type Handler = Rc<RefCell<Box<dyn FnMut(&ScrollEvent)>>>;

#[derive(Debug, Default)]
struct ScrollState {
    animated: f64,
    target: f64,
    velocity: f64,
    limit: f64,
    direction: ScrollDirection,
    last_time: Option<f64>,
    stopped: bool,
    /// A jump happened since the last step and must still be published
    dirty: bool,
    /// Adopt the target without easing on the next step
    snap: bool,
}

/// Damped smooth scroll driven by an external frame clock
pub struct SmoothScroll {
    settings: ScrollSettings,
    state: RefCell<ScrollState>,
    handlers: RefCell<Vec<(SubscriptionId, Handler)>>,
    next_id: Cell<SubscriptionId>,
}

impl fmt::Debug for SmoothScroll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmoothScroll")
            .field("state", &*self.state.borrow())
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

impl SmoothScroll {
    pub fn new(settings: ScrollSettings, limit: f64) -> Self {
        Self {
            settings,
            state: RefCell::new(ScrollState {
                limit: limit.max(0.0),
                ..Default::default()
            }),
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Offset the engine is heading toward
    pub fn target(&self) -> f64 {
        self.state.borrow().target
    }

    /// Update the scrollable range (document height minus viewport)
    pub fn set_limit(&self, limit: f64) {
        let mut state = self.state.borrow_mut();
        state.limit = limit.max(0.0);
        state.target = state.target.clamp(0.0, state.limit);
        if state.animated > state.limit {
            state.animated = state.limit;
            state.dirty = true;
        }
    }

    /// Wheel input (pixels, positive scrolls down)
    pub fn on_wheel(&self, delta: f64) {
        self.push_target(delta * self.settings.wheel_multiplier);
    }

    /// Touch drag input (pixels the finger moved up)
    pub fn on_touch_move(&self, delta: f64) {
        let delta = delta * self.settings.touch_multiplier;
        if self.settings.sync_touch {
            self.push_target(delta);
        } else {
            let offset = self.state.borrow().animated + delta;
            self.scroll_to(offset, ScrollToOptions::IMMEDIATE);
        }
    }

    /// Adopt an offset the browser reached on its own (keyboard, anchors,
    /// or every scroll when smoothing is off) on the next step
    pub fn sync_native(&self, offset: f64) {
        let mut state = self.state.borrow_mut();
        if state.stopped || (offset - state.animated).abs() < SNAP_DISTANCE {
            return;
        }
        state.target = offset.clamp(0.0, state.limit);
        state.snap = true;
    }

    fn push_target(&self, delta: f64) {
        let mut state = self.state.borrow_mut();
        if state.stopped {
            return;
        }
        state.target = (state.target + delta).clamp(0.0, state.limit);
    }

    /// Advance one frame; `time_ms` is the shared clock in milliseconds
    pub fn raf(&self, time_ms: f64) {
        let event = {
            let mut state = self.state.borrow_mut();
            let dt = state
                .last_time
                .map_or(0.0, |last| ((time_ms - last) / 1000.0).max(0.0));
            state.last_time = Some(time_ms);

            let previous = state.animated;
            if !state.stopped {
                let snap = std::mem::take(&mut state.snap);
                state.animated = if snap || (state.target - state.animated).abs() < SNAP_DISTANCE {
                    state.target
                } else {
                    damp(state.animated, state.target, self.settings.lerp * 60.0, dt)
                };
            }
            state.velocity = state.animated - previous;
            if state.velocity > 0.0 {
                state.direction = ScrollDirection::Forward;
            } else if state.velocity < 0.0 {
                state.direction = ScrollDirection::Backward;
            }

            if state.velocity == 0.0 && !state.dirty {
                return;
            }
            state.dirty = false;
            ScrollEvent {
                scroll: state.animated,
                limit: state.limit,
                velocity: state.velocity,
                direction: state.direction,
                progress: if state.limit > 0.0 {
                    state.animated / state.limit
                } else {
                    1.0
                },
            }
        };
        self.emit(&event);
    }

    fn emit(&self, event: &ScrollEvent) {
        // Handlers may subscribe, unsubscribe or scroll while we iterate
        let handlers: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            if let Ok(mut handler) = handler.try_borrow_mut() {
                handler(event);
            }
        }
    }
}

impl ScrollEngine for SmoothScroll {
    fn scroll(&self) -> f64 {
        self.state.borrow().animated
    }

    fn limit(&self) -> f64 {
        self.state.borrow().limit
    }

    fn velocity(&self) -> f64 {
        self.state.borrow().velocity
    }

    /// Immediate jumps are published on the next `raf`, never synchronously
    fn scroll_to(&self, offset: f64, options: ScrollToOptions) {
        let mut state = self.state.borrow_mut();
        let offset = offset.clamp(0.0, state.limit);
        state.target = offset;
        if options.immediate {
            state.animated = offset;
            state.velocity = 0.0;
            state.dirty = true;
        }
    }

    fn stop(&self) {
        let mut state = self.state.borrow_mut();
        state.stopped = true;
        state.target = state.animated;
        state.velocity = 0.0;
    }

    fn start(&self) {
        self.state.borrow_mut().stopped = false;
    }

    fn is_stopped(&self) -> bool {
        self.state.borrow().stopped
    }

    fn on(&self, handler: Box<dyn FnMut(&ScrollEvent)>) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(handler))));
        id
    }

    fn off(&self, id: SubscriptionId) {
        self.handlers.borrow_mut().retain(|(h, _)| *h != id);
    }
}
