//! Error types
//!
//! Runtime effects fail soft (a missing element turns the effect into a no-op),
//! so errors only surface from parsing, configuration and page mounting.

use thiserror::Error;

/// Errors raised while configuring or mounting motion effects.
#[derive(Error, Debug)]
pub enum MotionError {
    /// A trigger position such as `"top 60%"` could not be parsed.
    #[error("Invalid trigger anchor: {0:?}")]
    InvalidAnchor(String),

    /// An easing name such as `"power3.out"` is not known.
    #[error("Invalid ease: {0:?}")]
    InvalidEase(String),

    /// Settings JSON was malformed.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// A required DOM element was not present.
    #[error("Missing element: {0}")]
    MissingElement(String),

    /// The canvas has no 2D rendering context.
    #[error("Canvas 2D context unavailable")]
    MissingContext,

    /// A call into the browser threw.
    #[error("JS error: {0}")]
    Js(String),
}

/// Result alias used by fallible configuration and mounting APIs.
pub type Result<T> = std::result::Result<T, MotionError>;

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for MotionError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        MotionError::Js(format!("{value:?}"))
    }
}
