//! World Kernel: deterministic randomness and the authoritative collidable
//! world the generators query.
//!
//! # Invariants
//! - Same seed, same stream, bit for bit, on every platform.
//! - Clearance queries never mutate.
//! - All world mutations flow through explicit operations and are logged.

pub mod clearance;
pub mod index;
pub mod rng;
pub mod world;

pub use clearance::{
    Collidable, EntityFactory, IgnoreSet, RayHit, SpatialQuery, capsule_samples, capsule_step,
    circle_intersects_any, clearance_ok, path_clear_capsule,
};
pub use index::SpatialIndex;
pub use rng::DeterministicRng;
pub use world::{EntityData, World, WorldEvent};
