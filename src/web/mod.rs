//! DOM bindings (wasm32 only)
//!
//! Everything here adapts browser objects to the crate's own seams:
//! `host::Element`, `text_drop::Surface` and `scroll::ScrollEngine` input.

pub mod canvas;
pub mod element;
pub mod frame;
pub mod listener;
pub mod mount;
pub mod scroll;

pub use canvas::CanvasSurface;
pub use element::DomElement;
pub use frame::FrameLoop;
pub use listener::EventListener;
pub use mount::{Page, mount_page, unmount_page};
pub use scroll::ScrollBinding;

use web_sys::{Document, Window};

use crate::error::{MotionError, Result};

pub(crate) fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| MotionError::MissingElement("window".to_string()))
}

pub(crate) fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| MotionError::MissingElement("document".to_string()))
}
