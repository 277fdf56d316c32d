//! 2D rigid body physics
//!
//! Oriented boxes only, which is all the text drops need:
//! - Fixed timestep via `Runner`
//! - Box-box SAT with clipped contact points
//! - Sequential impulses with restitution and friction, then position correction

pub mod body;
pub mod collision;
pub mod runner;
pub mod world;

pub use body::{Body, INERTIA_SCALE, Material};
pub use collision::{CollisionResult, ContactPoint, box_box_collision};
pub use runner::Runner;
pub use world::World;
