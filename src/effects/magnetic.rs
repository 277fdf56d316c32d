//! Magnetic hover
//!
//! While hovered, the element leans toward the pointer by a fraction of the
//! pointer's distance from its centre. On leave it springs back with an
//! elastic ease. Each pointer event retargets the running tween.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

use crate::clock::{FrameHandle, Ticker};
use crate::host::{Element, Transform2d};
use crate::settings::MagneticSettings;
use crate::tween::{Ease, Tween};

struct MagneticInner {
    element: Option<Rc<dyn Element>>,
    tween: Tween<Vec2>,
    frame: Option<FrameHandle>,
}

impl MagneticInner {
    fn offset(&self) -> Vec2 {
        self.tween.value()
    }
}

pub struct MagneticHover {
    ticker: Rc<Ticker>,
    settings: MagneticSettings,
    inner: Rc<RefCell<MagneticInner>>,
}

impl MagneticHover {
    pub fn new(ticker: Rc<Ticker>, settings: MagneticSettings) -> Self {
        Self {
            ticker,
            settings,
            inner: Rc::new(RefCell::new(MagneticInner {
                element: None,
                tween: Tween::new(Vec2::ZERO, Vec2::ZERO, 0.0, Ease::None),
                frame: None,
            })),
        }
    }

    pub fn attach(&self, element: Rc<dyn Element>) {
        self.inner.borrow_mut().element = Some(element);
    }

    /// Current translation applied to the element
    pub fn offset(&self) -> Vec2 {
        self.inner.borrow().offset()
    }

    /// Whether a tween is in flight
    pub fn is_animating(&self) -> bool {
        self.inner
            .borrow()
            .frame
            .as_ref()
            .is_some_and(FrameHandle::is_active)
    }

    pub fn on_move(&self, client: Vec2) {
        let target = {
            let inner = self.inner.borrow();
            let Some(element) = inner.element.as_ref() else {
                return;
            };
            (client - element.rect().center()) * self.settings.strength
        };
        self.tween_to(
            target,
            self.settings.follow_duration,
            self.settings.follow_ease,
        );
    }

    pub fn on_leave(&self) {
        if self.inner.borrow().element.is_none() {
            return;
        }
        self.tween_to(
            Vec2::ZERO,
            self.settings.return_duration,
            self.settings.return_ease,
        );
    }

    /// Overwrite the running tween, starting from the current offset
    fn tween_to(&self, target: Vec2, duration: f64, ease: Ease) {
        let mut inner = self.inner.borrow_mut();
        inner.tween.retarget(target, duration, ease);
        if inner.frame.as_ref().is_some_and(FrameHandle::is_active) {
            return;
        }

        let weak: Weak<RefCell<MagneticInner>> = Rc::downgrade(&self.inner);
        inner.frame = Some(self.ticker.add(move |ft| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.borrow_mut();
            let offset = inner.tween.advance(ft.delta);
            if let Some(element) = &inner.element {
                element.set_transform(&Transform2d::translate(offset.x, offset.y));
            }
            if inner.tween.is_complete() {
                if let Some(frame) = inner.frame.take() {
                    frame.cancel();
                }
            }
        }));
    }

    /// Cancel any tween and drop the element
    pub fn unmount(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(frame) = inner.frame.take() {
            frame.cancel();
        }
        inner.element = None;
    }
}

impl Drop for MagneticHover {
    fn drop(&mut self) {
        self.unmount();
    }
}
