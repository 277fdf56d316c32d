//! Cursor label follower
//!
//! A label trails the pointer inside its container, closing a fixed fraction
//! of the remaining distance every frame.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use log::{debug, trace};

use crate::clock::{FrameHandle, Ticker};
use crate::host::{Element, Transform2d};
use crate::settings::CursorSettings;

/// Label scale while the pointer is outside the container
const REST_SCALE: f32 = 0.8;

/// Pointer target and the interpolated label position, container-relative
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub target: Vec2,
    pub current: Vec2,
}

impl PointerState {
    /// One frame of `current += (target - current) * lerp`
    pub fn step(&mut self, lerp: f32) -> Vec2 {
        self.current = Vec2::new(
            crate::lerp(self.current.x, self.target.x, lerp),
            crate::lerp(self.current.y, self.target.y, lerp),
        );
        self.current
    }

    /// Jump straight to `position`
    pub fn snap(&mut self, position: Vec2) {
        self.target = position;
        self.current = position;
    }
}

#[derive(Default)]
struct CursorInner {
    container: Option<Rc<dyn Element>>,
    label: Option<Rc<dyn Element>>,
    pointer: PointerState,
    hovering: bool,
    frame: Option<FrameHandle>,
}

impl CursorInner {
    fn stop(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.cancel();
        }
    }

    fn render(&mut self, lerp: f32) {
        let position = self.pointer.step(lerp);
        let scale = if self.hovering { 1.0 } else { REST_SCALE };
        if let Some(label) = &self.label {
            label.set_transform(&Transform2d::translate(position.x, position.y).with_scale(scale));
        }
        trace!("Cursor label at {position}");
    }
}

/// Trailing cursor label bound to one container
pub struct CursorFollower {
    ticker: Rc<Ticker>,
    settings: CursorSettings,
    inner: Rc<RefCell<CursorInner>>,
}

impl CursorFollower {
    pub fn new(ticker: Rc<Ticker>, settings: CursorSettings) -> Self {
        Self {
            ticker,
            settings,
            inner: Rc::new(RefCell::new(CursorInner::default())),
        }
    }

    /// Bind the measured container and the label that moves inside it
    pub fn attach(&self, container: Rc<dyn Element>, label: Rc<dyn Element>) {
        let mut inner = self.inner.borrow_mut();
        inner.container = Some(container);
        inner.label = Some(label);
    }

    pub fn pointer(&self) -> PointerState {
        self.inner.borrow().pointer
    }

    pub fn is_hovering(&self) -> bool {
        self.inner.borrow().hovering
    }

    /// Whether the frame loop is scheduled
    pub fn is_running(&self) -> bool {
        self.inner
            .borrow()
            .frame
            .as_ref()
            .is_some_and(FrameHandle::is_active)
    }

    /// Pointer position relative to the container, plus the label offset
    fn local(&self, inner: &CursorInner, client: Vec2) -> Option<Vec2> {
        let container = inner.container.as_ref()?;
        let offset = Vec2::new(self.settings.offset_x, self.settings.offset_y);
        Some(client - container.rect().origin() + offset)
    }

    pub fn on_pointer_move(&self, client: Vec2) {
        let mut inner = self.inner.borrow_mut();
        if let Some(target) = self.local(&inner, client) {
            inner.pointer.target = target;
        }
    }

    /// Snap to the pointer and start the frame loop (idempotent)
    pub fn on_pointer_enter(&self, client: Vec2) {
        let mut inner = self.inner.borrow_mut();
        if let Some(position) = self.local(&inner, client) {
            inner.pointer.snap(position);
        }
        inner.hovering = true;

        if inner.frame.as_ref().is_some_and(FrameHandle::is_active) {
            return;
        }
        let weak: Weak<RefCell<CursorInner>> = Rc::downgrade(&self.inner);
        let lerp = self.settings.lerp;
        inner.frame = Some(self.ticker.add(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().render(lerp);
            }
        }));
        debug!("Cursor follower started");
    }

    pub fn on_pointer_leave(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.hovering = false;
        inner.stop();
    }

    /// Cancel the loop and drop element references
    pub fn unmount(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.stop();
        inner.container = None;
        inner.label = None;
    }
}

impl Drop for CursorFollower {
    fn drop(&mut self) {
        self.inner.borrow_mut().stop();
    }
}
