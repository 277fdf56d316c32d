//! Scroll triggers
//!
//! A [`TriggerSet`] is the page's registry of scroll-linked ranges. Each
//! trigger measures its element once per refresh, then on every scroll event
//! works out its progress through `[start, end]` and fires boundary callbacks.
//! Pinned triggers also hold their element in place while active and reserve
//! scroll space after it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, trace};

use super::anchor::{Anchor, TriggerEnd};
use super::engine::{ScrollDirection, ScrollEngine, SubscriptionId};
use super::input::Viewport;
use crate::error::Result;
use crate::host::{Element, Transform2d};

/// Trigger range and behaviour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    pub start: Anchor,
    pub end: TriggerEnd,
    /// Hold the element in place while the range is active
    pub pin: bool,
    /// Kill the trigger after the first enter
    pub once: bool,
}

impl TriggerConfig {
    pub fn new(start: Anchor, end: TriggerEnd) -> Self {
        Self {
            start,
            end,
            pin: false,
            once: false,
        }
    }

    /// Build from position strings such as `"top top"` and `"+=2000"`
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    pub fn with_pin(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

/// State of a trigger as of the latest update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerSnapshot {
    pub start: f64,
    pub end: f64,
    pub scroll: f64,
    /// Clamped to [0, 1]
    pub progress: f64,
    pub direction: ScrollDirection,
    pub velocity: f64,
    pub is_active: bool,
}

impl TriggerSnapshot {
    /// Scroll space reserved by a pinned trigger
    pub fn pin_spacing(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

type Callback = Box<dyn FnMut(&TriggerSnapshot)>;

/// Optional callbacks, attached with the builder methods
#[derive(Default)]
pub struct TriggerCallbacks {
    on_update: Option<Callback>,
    on_enter: Option<Callback>,
    on_leave: Option<Callback>,
    on_enter_back: Option<Callback>,
    on_leave_back: Option<Callback>,
}

impl TriggerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called whenever clamped progress changes
    pub fn on_update(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Scrolling forward past the start
    pub fn on_enter(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_enter = Some(Box::new(f));
        self
    }

    /// Scrolling forward past the end
    pub fn on_leave(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_leave = Some(Box::new(f));
        self
    }

    /// Scrolling backward past the end
    pub fn on_enter_back(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_enter_back = Some(Box::new(f));
        self
    }

    /// Scrolling backward past the start
    pub fn on_leave_back(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_leave_back = Some(Box::new(f));
        self
    }
}

/// Which part of the range the scroll offset is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    Within,
    After,
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Enter,
    Leave,
    EnterBack,
    LeaveBack,
}

fn crossings(from: Side, to: Side) -> &'static [Boundary] {
    use Boundary::*;
    match (from, to) {
        (Side::Before, Side::Within) => &[Enter],
        (Side::Within, Side::After) => &[Leave],
        (Side::Before, Side::After) => &[Enter, Leave],
        (Side::After, Side::Within) => &[EnterBack],
        (Side::Within, Side::Before) => &[LeaveBack],
        (Side::After, Side::Before) => &[EnterBack, LeaveBack],
        _ => &[],
    }
}

fn release_pin(element: &dyn Element) {
    element.set_transform(&Transform2d::IDENTITY);
    element.set_pin_spacing(0.0);
}

/// Owner's view of a registered trigger
#[derive(Clone)]
pub struct TriggerHandle {
    id: u64,
    killed: Rc<Cell<bool>>,
    snapshot: Rc<Cell<TriggerSnapshot>>,
    pinned: Option<Rc<dyn Element>>,
}

impl fmt::Debug for TriggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .field("snapshot", &self.snapshot.get())
            .finish()
    }
}

impl TriggerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn snapshot(&self) -> TriggerSnapshot {
        self.snapshot.get()
    }

    pub fn is_alive(&self) -> bool {
        !self.killed.get()
    }

    /// Stop the trigger. A pinned element is released immediately. Idempotent.
    pub fn kill(&self) {
        if self.killed.replace(true) {
            return;
        }
        if let Some(element) = &self.pinned {
            release_pin(element.as_ref());
        }
        debug!("Trigger {} killed", self.id);
    }
}

struct TriggerEntry {
    handle: TriggerHandle,
    element: Rc<dyn Element>,
    config: TriggerConfig,
    callbacks: TriggerCallbacks,
    start: f64,
    end: f64,
    side: Side,
    last_progress: Option<f64>,
    last_pin_offset: Option<f32>,
}

impl TriggerEntry {
    fn measure(&mut self, scroll: f64, viewport: Viewport) {
        // Measure the untransformed box; the next update re-applies the transform
        if self.config.pin {
            release_pin(self.element.as_ref());
            self.last_pin_offset = None;
        } else {
            self.element.set_transform(&Transform2d::IDENTITY);
            self.last_progress = None;
        }
        let rect = self.element.rect();
        let top = f64::from(rect.top) + scroll;
        let height = f64::from(rect.height);
        let vh = f64::from(viewport.height);
        self.start = self.config.start.resolve(top, height, vh);
        self.end = self.config.end.resolve(self.start, top, height, vh);
        if self.config.pin {
            self.element.set_pin_spacing((self.end - self.start).max(0.0) as f32);
        }
        trace!(
            "Trigger {} measured: {:.1}..{:.1}",
            self.handle.id,
            self.start,
            self.end
        );
    }

    fn progress(&self, scroll: f64) -> f64 {
        if self.end > self.start {
            ((scroll - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
        } else if scroll >= self.start {
            1.0
        } else {
            0.0
        }
    }

    fn update(&mut self, scroll: f64, velocity: f64, direction: ScrollDirection) {
        let progress = self.progress(scroll);
        let side = if progress <= 0.0 {
            Side::Before
        } else if progress >= 1.0 {
            Side::After
        } else {
            Side::Within
        };
        let snapshot = TriggerSnapshot {
            start: self.start,
            end: self.end,
            scroll,
            progress,
            direction,
            velocity,
            is_active: side == Side::Within,
        };
        self.handle.snapshot.set(snapshot);

        if self.config.pin {
            let offset = match side {
                Side::Before => 0.0,
                Side::Within => scroll - self.start,
                Side::After => self.end - self.start,
            } as f32;
            if self.last_pin_offset != Some(offset) {
                self.last_pin_offset = Some(offset);
                self.element
                    .set_transform(&Transform2d::translate(0.0, offset));
            }
        }

        if self.last_progress != Some(progress) {
            self.last_progress = Some(progress);
            if let Some(f) = self.callbacks.on_update.as_mut() {
                f(&snapshot);
            }
        }

        let previous = std::mem::replace(&mut self.side, side);
        for boundary in crossings(previous, side) {
            if !self.handle.is_alive() {
                return;
            }
            let callback = match boundary {
                Boundary::Enter => self.callbacks.on_enter.as_mut(),
                Boundary::Leave => self.callbacks.on_leave.as_mut(),
                Boundary::EnterBack => self.callbacks.on_enter_back.as_mut(),
                Boundary::LeaveBack => self.callbacks.on_leave_back.as_mut(),
            };
            if let Some(f) = callback {
                f(&snapshot);
            }
            if matches!(boundary, Boundary::Enter) && self.config.once {
                self.handle.kill();
            }
        }
    }
}

/// Registry of scroll triggers bound to one scroll engine
pub struct TriggerSet {
    engine: Rc<dyn ScrollEngine>,
    viewport: Cell<Viewport>,
    entries: RefCell<Vec<TriggerEntry>>,
    handles: RefCell<Vec<TriggerHandle>>,
    next_id: Cell<u64>,
    direction: Cell<ScrollDirection>,
    updating: Cell<bool>,
    refresh_pending: Cell<bool>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl fmt::Debug for TriggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerSet")
            .field("viewport", &self.viewport.get())
            .field("triggers", &self.len())
            .finish()
    }
}

impl TriggerSet {
    /// Create a registry that updates on every event from `engine`
    pub fn new(engine: Rc<dyn ScrollEngine>, viewport: Viewport) -> Rc<Self> {
        let set = Rc::new(Self {
            engine: engine.clone(),
            viewport: Cell::new(viewport),
            entries: RefCell::new(Vec::new()),
            handles: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            direction: Cell::new(ScrollDirection::Forward),
            updating: Cell::new(false),
            refresh_pending: Cell::new(false),
            subscription: Cell::new(None),
        });
        let weak: Weak<TriggerSet> = Rc::downgrade(&set);
        let id = engine.on(Box::new(move |_| {
            if let Some(set) = weak.upgrade() {
                set.update();
            }
        }));
        set.subscription.set(Some(id));
        set
    }

    pub fn engine(&self) -> &Rc<dyn ScrollEngine> {
        &self.engine
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    /// Record a new viewport size; call [`TriggerSet::refresh`] afterwards
    pub fn set_viewport(&self, viewport: Viewport) {
        self.viewport.set(viewport);
    }

    /// Number of live triggers
    pub fn len(&self) -> usize {
        self.handles.borrow().iter().filter(|h| h.is_alive()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a trigger and measure it against the current scroll offset
    ///
    /// Callbacks first fire on the next [`TriggerSet::update`]. Owners that
    /// must reflect the current offset straight away call `update` once they
    /// have stored the returned handle.
    pub fn create(
        &self,
        element: Rc<dyn Element>,
        config: TriggerConfig,
        callbacks: TriggerCallbacks,
    ) -> TriggerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let handle = TriggerHandle {
            id,
            killed: Rc::new(Cell::new(false)),
            snapshot: Rc::new(Cell::new(TriggerSnapshot::default())),
            pinned: config.pin.then(|| element.clone()),
        };
        let mut entry = TriggerEntry {
            handle: handle.clone(),
            element,
            config,
            callbacks,
            start: 0.0,
            end: 0.0,
            side: Side::Before,
            last_progress: None,
            last_pin_offset: None,
        };
        entry.measure(self.engine.scroll(), self.viewport.get());
        debug!(
            "Trigger {} created: {:.1}..{:.1} pin={}",
            id, entry.start, entry.end, config.pin
        );
        self.entries.borrow_mut().push(entry);
        self.handles.borrow_mut().push(handle.clone());
        handle
    }

    /// Re-evaluate every trigger against the engine's current offset
    pub fn update(&self) {
        if self.updating.replace(true) {
            return;
        }
        let scroll = self.engine.scroll();
        let velocity = self.engine.velocity();
        if velocity > 0.0 {
            self.direction.set(ScrollDirection::Forward);
        } else if velocity < 0.0 {
            self.direction.set(ScrollDirection::Backward);
        }
        let direction = self.direction.get();

        // Callbacks may create, kill or refresh triggers
        let mut entries = std::mem::take(&mut *self.entries.borrow_mut());
        for entry in entries.iter_mut() {
            if entry.handle.is_alive() {
                entry.update(scroll, velocity, direction);
            }
        }

        {
            let mut slot = self.entries.borrow_mut();
            let added = std::mem::replace(&mut *slot, entries);
            slot.extend(added);
            slot.retain(|e| e.handle.is_alive());
        }
        self.handles.borrow_mut().retain(TriggerHandle::is_alive);
        self.updating.set(false);

        if self.refresh_pending.replace(false) {
            self.refresh();
        }
    }

    /// Re-measure every trigger, then update
    ///
    /// Requested from inside a trigger callback, the refresh runs once the
    /// current update finishes.
    pub fn refresh(&self) {
        if self.updating.get() {
            self.refresh_pending.set(true);
            return;
        }
        let scroll = self.engine.scroll();
        let viewport = self.viewport.get();
        for entry in self.entries.borrow_mut().iter_mut() {
            if entry.handle.is_alive() {
                entry.measure(scroll, viewport);
            }
        }
        debug!("Triggers refreshed at scroll {scroll:.1}");
        self.update();
    }

    /// Kill every trigger, releasing pinned elements
    pub fn kill_all(&self) {
        let handles = std::mem::take(&mut *self.handles.borrow_mut());
        for handle in &handles {
            handle.kill();
        }
        if !self.updating.get() {
            self.entries.borrow_mut().clear();
        }
    }
}

impl Drop for TriggerSet {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.engine.off(id);
        }
    }
}
