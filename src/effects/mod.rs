//! Pointer and scroll driven effects

pub mod cursor;
pub mod drag_scroll;
pub mod magnetic;
pub mod parallax;
pub mod pinned;

pub use cursor::{CursorFollower, PointerState};
pub use drag_scroll::DragScroll;
pub use magnetic::MagneticHover;
pub use parallax::{ParallaxBinding, parallax_offset};
pub use pinned::{
    PinContext, PinState, PinStrategy, PinnedScroll, PinnedStrategy, PlayOn, ScrollPhase,
    SequentialStrategy, phase_progress,
};
