//! Trailing-edge debounce on ticker time

use super::ticker::{FrameHandle, Ticker};

/// Delays a callback until calls have stopped arriving for `delay` seconds
#[derive(Debug)]
pub struct Debouncer {
    delay: f64,
    pending: Option<FrameHandle>,
}

impl Debouncer {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Restart the quiet period; only the latest callback survives
    pub fn call(&mut self, ticker: &Ticker, callback: impl FnOnce() + 'static) {
        self.cancel();
        self.pending = Some(ticker.after(self.delay, callback));
    }

    /// Drop any pending callback
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(FrameHandle::is_active)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
