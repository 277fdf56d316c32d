//! Folio Motion - scroll and pointer driven motion for a portfolio site
//!
//! Core modules:
//! - `clock`: Shared animation ticker, frame handles, debounce
//! - `scroll`: Smooth scroll engine, scroll triggers, input state
//! - `tween`: Easing curves, retargetable tweens, pausable timelines
//! - `effects`: Cursor follower, magnetic hover, parallax, pinned phases, drag scroll
//! - `physics`: Fixed-step 2D rigid body simulation
//! - `text_drop`: Physics-driven text drops rendered onto a 2D surface
//! - `web`: DOM bindings (wasm32 only)

pub mod clock;
pub mod effects;
pub mod error;
pub mod host;
pub mod physics;
pub mod scroll;
pub mod settings;
pub mod text_drop;
pub mod tween;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{MotionError, Result};
pub use settings::Settings;

/// Shared tuning constants
pub mod consts {
    /// Physics step (Matter-style 60 Hz)
    pub const PHYSICS_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Viewports at or below this width take the mobile paths
    pub const MOBILE_BREAKPOINT: f32 = 768.0;

    /// Default lag smoothing: deltas above the threshold are replaced by the adjusted lag
    pub const LAG_THRESHOLD: f64 = 0.5;
    pub const LAG_ADJUSTED: f64 = 0.033;

    /// Resize debounce for canvas rebuilds (seconds)
    pub const RESIZE_DEBOUNCE: f64 = 0.3;

    /// Invisible wall thickness around physics canvases
    pub const WALL_THICKNESS: f32 = 200.0;
}

/// Linear interpolation from `a` toward `b` by factor `t`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Frame-rate independent exponential damping toward `target`
///
/// `lambda` is the approach rate per second.
#[inline]
pub fn damp(current: f64, target: f64, lambda: f64, dt: f64) -> f64 {
    current + (target - current) * (1.0 - (-lambda * dt).exp())
}
