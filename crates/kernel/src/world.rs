use std::collections::BTreeMap;

use glam::Vec2;
use scrapyard_common::{Category, EntityId, Footprint, Rect, SpawnDescriptor};
use serde::{Deserialize, Serialize};

use crate::clearance::{Collidable, EntityFactory, SpatialQuery};
use crate::index::SpatialIndex;

/// Default bucket edge of the world's spatial index.
pub const DEFAULT_BUCKET_SIZE: f32 = 256.0;

/// An event record produced by every mutation to the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Entity was spawned with the given footprint.
    Spawned { id: EntityId, footprint: Footprint },
    /// Entity was despawned. Carries the footprint it had.
    Despawned { id: EntityId, footprint: Footprint },
    /// A free collider (vehicle) moved.
    Moved { id: EntityId, from: Vec2, to: Vec2 },
}

/// Per-entity data stored in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityData {
    pub footprint: Footprint,
    /// The descriptor the entity was spawned from; `None` for walls and
    /// vehicles registered directly as colliders.
    pub descriptor: Option<SpawnDescriptor>,
}

/// The authoritative set of collidable entities.
///
/// Stands in for the game's entity factory and physics query layer: spawns
/// descriptors as collidables, keeps them in a uniform-grid index and answers
/// region and ray queries. Uses BTreeMap and sequential handles so iteration
/// order is identical on every run.
#[derive(Debug, Clone)]
pub struct World {
    entities: BTreeMap<EntityId, EntityData>,
    next_id: u64,
    index: SpatialIndex,
    /// Append-only event log of all mutations.
    event_log: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::with_bucket_size(DEFAULT_BUCKET_SIZE)
    }

    pub fn with_bucket_size(bucket_size: f32) -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            index: SpatialIndex::new(bucket_size),
            event_log: Vec::new(),
        }
    }

    /// Number of entities in the world.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities whose category intersects `mask`.
    pub fn count_matching(&self, mask: Category) -> usize {
        self.entities
            .values()
            .filter(|e| e.footprint.category.intersects(mask))
            .count()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Read-only access to all entities (BTreeMap for deterministic iteration).
    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Register a bare collider (wall, vehicle). Returns its handle.
    pub fn spawn_collider(&mut self, footprint: Footprint) -> EntityId {
        self.insert(footprint, None)
    }

    /// Spawn four wall slabs just outside `bounds`.
    pub fn spawn_boundary_walls(&mut self, bounds: &Rect, thickness: f32) -> [EntityId; 4] {
        tracing::debug!(?bounds, thickness, "spawning boundary walls");
        let half_t = thickness * 0.5;
        let c = bounds.center();
        let half = bounds.half_size();
        let horizontal = Vec2::new(half.x + thickness, half_t);
        let vertical = Vec2::new(half_t, half.y + thickness);
        [
            (Vec2::new(c.x, bounds.max.y + half_t), horizontal),
            (Vec2::new(c.x, bounds.min.y - half_t), horizontal),
            (Vec2::new(bounds.min.x - half_t, c.y), vertical),
            (Vec2::new(bounds.max.x + half_t, c.y), vertical),
        ]
        .map(|(center, half_extents)| {
            self.spawn_collider(Footprint::obb(center, half_extents, 0.0, Category::WALL))
        })
    }

    /// Move a collider, keeping the index in sync. Returns false for an
    /// unknown handle.
    pub fn set_position(&mut self, id: EntityId, to: Vec2) -> bool {
        let Some(data) = self.entities.get_mut(&id) else {
            return false;
        };
        let from = data.footprint.center;
        self.index.remove(id, &data.footprint.aabb());
        data.footprint.center = to;
        self.index.insert(id, &data.footprint.aabb());
        self.event_log.push(WorldEvent::Moved { id, from, to });
        true
    }

    /// Remove an entity. Returns the data if it existed.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityData> {
        let data = self.entities.remove(&id)?;
        self.index.remove(id, &data.footprint.aabb());
        self.event_log.push(WorldEvent::Despawned {
            id,
            footprint: data.footprint,
        });
        Some(data)
    }

    fn insert(&mut self, footprint: Footprint, descriptor: Option<SpawnDescriptor>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.index.insert(id, &footprint.aabb());
        self.entities.insert(
            id,
            EntityData {
                footprint,
                descriptor,
            },
        );
        self.event_log.push(WorldEvent::Spawned { id, footprint });
        id
    }

    /// Compute a deterministic hash of the world contents.
    /// Uses canonical (BTreeMap) iteration order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for (id, data) in &self.entities {
            let fp = &data.footprint;
            mix(&mut h, &id.0.to_le_bytes());
            mix(&mut h, &fp.category.bits().to_le_bytes());
            mix(&mut h, &fp.center.x.to_le_bytes());
            mix(&mut h, &fp.center.y.to_le_bytes());
            mix(&mut h, &fp.shape.bounding_radius().to_le_bytes());
        }
        h
    }
}

impl EntityFactory for World {
    fn spawn(&mut self, descriptor: &SpawnDescriptor) -> EntityId {
        self.insert(descriptor.footprint(), Some(*descriptor))
    }

    fn despawn(&mut self, id: EntityId) -> bool {
        self.remove(id).is_some()
    }
}

impl SpatialQuery for World {
    fn collidables_in(&self, region: &Rect, mask: Category) -> Vec<Collidable> {
        self.index
            .query(region)
            .into_iter()
            .filter_map(|id| {
                let data = self.entities.get(&id)?;
                let fp = data.footprint;
                (fp.category.intersects(mask) && fp.aabb().intersects(region))
                    .then_some(Collidable { id, footprint: fp })
            })
            .collect()
    }
}
