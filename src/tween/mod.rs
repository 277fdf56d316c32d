//! Tween engine
//!
//! Easing curves, retargetable value tweens and pausable timelines.

pub mod ease;
pub mod timeline;
pub mod tweener;

pub use ease::{Ease, EaseMode};
pub use timeline::{Apply, Timeline};
pub use tweener::{Tween, Tweenable};
