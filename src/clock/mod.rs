//! Frame clock: shared ticker, debounce and scroll engine adapter

pub mod adapter;
pub mod debounce;
pub mod ticker;

pub use adapter::FrameClockAdapter;
pub use debounce::Debouncer;
pub use ticker::{FrameHandle, FrameTime, LagSmoothing, Settle, Ticker};
