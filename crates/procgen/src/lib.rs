//! Procedural placement for one chunk at a time.
//!
//! A [`ChunkGenerator`] turns `(seed, chunk, context)` into an ordered
//! [`ChunkPlan`] of spawn descriptors. Placement reads the host world through
//! [`scrapyard_kernel::SpatialQuery`] and a per-pass [`BlockerCache`]; it never
//! spawns anything itself.
//!
//! # Invariants
//! - Every random draw comes from a stream keyed by seed, chunk and purpose,
//!   so generation order across chunks does not matter.
//! - No two obstacle anchors closer than `GenConfig::min_spacing`, within a
//!   chunk or against content already in the world.
//! - Nothing is placed inside a tracked entity's keep-out radius.
//! - A failed placement is an ordinary outcome, never an error.

pub mod blockers;
pub mod chunk_gen;
pub mod config;
mod enhancements;
pub mod hills;
mod obstacles;
pub mod spawn;
pub mod terrain;

pub use blockers::BlockerCache;
pub use chunk_gen::{ChunkGenerator, ChunkPlan, GenContext};
pub use config::{ConfigError, GenConfig, ObstacleClearance, ScatterWeights, WorldConfig};
pub use spawn::{SpawnPoint, find_spawn_point};
pub use terrain::{HeightField, hill_height, hill_height_and_gradient};
