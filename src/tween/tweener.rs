//! Retargetable value tweens

use glam::Vec2;

use super::ease::Ease;

/// Values a [`Tween`] can interpolate
pub trait Tweenable: Copy {
    fn interpolate(self, to: Self, t: f32) -> Self;
}

impl Tweenable for f32 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Tweenable for f64 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self + (to - self) * f64::from(t)
    }
}

impl Tweenable for Vec2 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

/// An eased transition from one value to another over a fixed duration
///
/// Retargeting restarts the clock from the currently sampled value, so a new
/// tween on the same property takes over smoothly from one still in flight.
#[derive(Debug, Clone)]
pub struct Tween<T: Tweenable> {
    from: T,
    to: T,
    duration: f64,
    elapsed: f64,
    ease: Ease,
}

impl<T: Tweenable> Tween<T> {
    pub fn new(from: T, to: T, duration: f64, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            ease,
        }
    }

    /// Current interpolated value
    pub fn value(&self) -> T {
        if self.is_complete() {
            return self.to;
        }
        let t = (self.elapsed / self.duration) as f32;
        self.from.interpolate(self.to, self.ease.apply(t))
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advance by `dt` seconds and return the new value
    pub fn advance(&mut self, dt: f64) -> T {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.value()
    }

    /// Start a new transition toward `to` from wherever this one is now
    pub fn retarget(&mut self, to: T, duration: f64, ease: Ease) {
        *self = Self::new(self.value(), to, duration, ease);
    }
}
