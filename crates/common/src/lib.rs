//! Shared types: entity handles, 2D geometry, chunk addressing and the
//! descriptors that flow from the generators to the entity factory.

pub mod chunk;
pub mod descriptor;
pub mod types;

pub use chunk::{ChunkCoord, ChunkGrid, ChunkKey};
pub use descriptor::{
    CorridorDescriptor, EnhancementDescriptor, EnhancementKind, HillDescriptor,
    ObstacleDescriptor, ObstacleKind, PICKUP_RADIUS, RampDescriptor, SpawnDescriptor,
    TrackedEntity,
};
pub use types::{Category, EntityId, Footprint, Rect, Shape};
