//! In-memory stand-ins for the DOM, the canvas and the scroll engine

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;

use crate::host::{Element, Rect, Transform2d};
use crate::scroll::{ScrollEngine, ScrollEvent, ScrollToOptions, SubscriptionId};
use crate::text_drop::{FontSpec, Surface};

/// Element whose layout box is fixed in document coordinates
///
/// With a scroll source attached, `rect()` reports the box relative to the
/// viewport the way `getBoundingClientRect` would, transform included.
pub struct FakeElement {
    doc_rect: Cell<Rect>,
    scroll: Option<Rc<dyn ScrollEngine>>,
    transforms: RefCell<Vec<Transform2d>>,
    pin_spacing: Cell<f32>,
}

impl FakeElement {
    /// Element at a fixed viewport position
    pub fn new(rect: Rect) -> Rc<Self> {
        Rc::new(Self {
            doc_rect: Cell::new(rect),
            scroll: None,
            transforms: RefCell::new(Vec::new()),
            pin_spacing: Cell::new(0.0),
        })
    }

    /// Element laid out in a document scrolled by `scroll`
    pub fn in_document<S: ScrollEngine + 'static>(doc_rect: Rect, scroll: &Rc<S>) -> Rc<Self> {
        let scroll: Rc<dyn ScrollEngine> = scroll.clone();
        Rc::new(Self {
            doc_rect: Cell::new(doc_rect),
            scroll: Some(scroll),
            transforms: RefCell::new(Vec::new()),
            pin_spacing: Cell::new(0.0),
        })
    }

    pub fn set_doc_rect(&self, rect: Rect) {
        self.doc_rect.set(rect);
    }

    /// Latest transform written (identity if none)
    pub fn transform(&self) -> Transform2d {
        self.transforms
            .borrow()
            .last()
            .copied()
            .unwrap_or(Transform2d::IDENTITY)
    }

    pub fn writes(&self) -> usize {
        self.transforms.borrow().len()
    }

    pub fn pin_spacing(&self) -> f32 {
        self.pin_spacing.get()
    }
}

impl Element for FakeElement {
    fn rect(&self) -> Rect {
        let mut rect = self.doc_rect.get();
        let transform = self.transform();
        let scroll = self.scroll.as_ref().map_or(0.0, |s| s.scroll() as f32);
        rect.left += transform.translate.x;
        rect.top += transform.translate.y - scroll;
        rect
    }

    fn set_transform(&self, transform: &Transform2d) {
        self.transforms.borrow_mut().push(*transform);
    }

    fn set_pin_spacing(&self, spacing: f32) {
        self.pin_spacing.set(spacing);
    }
}

type Handler = Rc<RefCell<Box<dyn FnMut(&ScrollEvent)>>>;

/// Scroll engine whose offset and velocity are set directly by the test
pub struct FakeScroll {
    scroll: Cell<f64>,
    velocity: Cell<f64>,
    limit: f64,
    stopped: Cell<bool>,
    jumps: RefCell<Vec<(f64, bool)>>,
    calls: RefCell<Vec<&'static str>>,
    handlers: RefCell<Vec<(SubscriptionId, Handler)>>,
    next_id: Cell<SubscriptionId>,
}

impl FakeScroll {
    pub fn new(limit: f64) -> Rc<Self> {
        Rc::new(Self {
            scroll: Cell::new(0.0),
            velocity: Cell::new(0.0),
            limit,
            stopped: Cell::new(false),
            jumps: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        })
    }

    /// Move to `scroll` with `velocity` and publish an event
    pub fn set(&self, scroll: f64, velocity: f64) {
        self.scroll.set(scroll);
        self.velocity.set(velocity);
        self.emit();
    }

    /// Change velocity without moving or publishing
    pub fn set_velocity(&self, velocity: f64) {
        self.velocity.set(velocity);
    }

    pub fn emit(&self) {
        let event = ScrollEvent {
            scroll: self.scroll.get(),
            limit: self.limit,
            velocity: self.velocity.get(),
            direction: Default::default(),
            progress: self.scroll.get() / self.limit,
        };
        let handlers: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            (handler.borrow_mut())(&event);
        }
    }

    /// `(offset, immediate)` of every `scroll_to`
    pub fn jumps(&self) -> Vec<(f64, bool)> {
        self.jumps.borrow().clone()
    }

    /// Ordered log of `stop`, `start` and `scroll_to` calls
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl ScrollEngine for FakeScroll {
    fn scroll(&self) -> f64 {
        self.scroll.get()
    }

    fn limit(&self) -> f64 {
        self.limit
    }

    fn velocity(&self) -> f64 {
        self.velocity.get()
    }

    fn scroll_to(&self, offset: f64, options: ScrollToOptions) {
        self.calls.borrow_mut().push("scroll_to");
        self.jumps.borrow_mut().push((offset, options.immediate));
        self.scroll.set(offset.clamp(0.0, self.limit));
    }

    fn stop(&self) {
        self.calls.borrow_mut().push("stop");
        self.stopped.set(true);
        self.velocity.set(0.0);
    }

    fn start(&self) {
        self.calls.borrow_mut().push("start");
        self.stopped.set(false);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.get()
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

/// Canvas with monospace metrics: every glyph is `0.6 * size` wide
pub struct FakeSurface {
    size: Cell<Vec2>,
    container: Cell<Vec2>,
    context: bool,
    clears: Cell<u32>,
    drawn: RefCell<Vec<(String, Vec2, f32)>>,
}

impl FakeSurface {
    pub fn new(width: f32, height: f32) -> Rc<Self> {
        Rc::new(Self {
            size: Cell::new(Vec2::new(width, height)),
            container: Cell::new(Vec2::new(width, height)),
            context: true,
            clears: Cell::new(0),
            drawn: RefCell::new(Vec::new()),
        })
    }

    /// Canvas whose 2D context cannot be obtained
    pub fn without_context(width: f32, height: f32) -> Rc<Self> {
        Rc::new(Self {
            size: Cell::new(Vec2::new(width, height)),
            container: Cell::new(Vec2::new(width, height)),
            context: false,
            clears: Cell::new(0),
            drawn: RefCell::new(Vec::new()),
        })
    }

    /// Resize the surrounding container (the canvas follows on `sync_size`)
    pub fn resize_container(&self, width: f32, height: f32) {
        self.container.set(Vec2::new(width, height));
    }

    pub fn clears(&self) -> u32 {
        self.clears.get()
    }

    /// Glyphs drawn since the last clear
    pub fn drawn(&self) -> Vec<(String, Vec2, f32)> {
        self.drawn.borrow().clone()
    }
}

impl Surface for FakeSurface {
    fn size(&self) -> Vec2 {
        self.size.get()
    }

    fn sync_size(&self) -> Vec2 {
        self.size.set(self.container.get());
        self.size.get()
    }

    fn container_width(&self) -> f32 {
        self.container.get().x
    }

    fn has_context(&self) -> bool {
        self.context
    }

    fn measure_text(&self, font: &FontSpec, text: &str) -> f32 {
        text.chars().count() as f32 * font.size * 0.6
    }

    fn clear(&self) {
        self.clears.set(self.clears.get() + 1);
        self.drawn.borrow_mut().clear();
    }

    fn begin_text(&self, _font: &FontSpec, _fallback_fill: &str) {}

    fn draw_glyph(&self, text: &str, position: Vec2, angle: f32) {
        self.drawn
            .borrow_mut()
            .push((text.to_string(), position, angle));
    }
}
