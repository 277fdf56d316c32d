//! Drives the smooth scroll engine from the shared ticker
//!
//! The engine must step on the same clock as tweens and triggers, and must
//! never see a lag-smoothed jump, so installing the adapter turns lag
//! smoothing off for the whole ticker.

use std::rc::Rc;

use log::info;

use super::ticker::{FrameHandle, Ticker};
use crate::scroll::SmoothScroll;

/// Ticker task forwarding time (ms) into [`SmoothScroll::raf`]
#[derive(Debug)]
pub struct FrameClockAdapter {
    handle: FrameHandle,
}

impl FrameClockAdapter {
    pub fn install(ticker: &Ticker, engine: Rc<SmoothScroll>) -> Self {
        ticker.set_lag_smoothing(None);
        let handle = ticker.add(move |ft| engine.raf(ft.time * 1000.0));
        info!("Smooth scroll attached to ticker");
        Self { handle }
    }

    pub fn is_installed(&self) -> bool {
        self.handle.is_active()
    }

    /// Stop forwarding frames
    pub fn uninstall(&self) {
        self.handle.cancel();
    }
}

impl Drop for FrameClockAdapter {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
