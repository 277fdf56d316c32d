//! Scroll engine, scroll-linked triggers and input state

pub mod anchor;
pub mod engine;
pub mod input;
pub mod trigger;

pub use anchor::{Anchor, Edge, TriggerEnd};
pub use engine::{
    ScrollDirection, ScrollEngine, ScrollEvent, ScrollToOptions, SmoothScroll, SubscriptionId,
};
pub use input::{InputState, OnceGate, Viewport};
pub use trigger::{TriggerCallbacks, TriggerConfig, TriggerHandle, TriggerSet, TriggerSnapshot};
