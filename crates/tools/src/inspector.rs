use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use glam::Vec2;
use scrapyard_common::{Category, ChunkCoord, EntityId, HillDescriptor};
use scrapyard_kernel::World;
use scrapyard_stream::StreamManager;
use serde::Serialize;

/// Categories reported by the inspector, in display order.
const CATEGORIES: [(&str, Category); 7] = [
    ("wall", Category::WALL),
    ("obstacle", Category::OBSTACLE),
    ("ramp", Category::RAMP),
    ("hill", Category::HILL),
    ("pickup", Category::PICKUP),
    ("vehicle", Category::VEHICLE),
    ("corridor", Category::CORRIDOR),
];

/// Read-only queries against the host world and the streamer for
/// debugging and the CLI.
pub struct StreamInspector;

impl StreamInspector {
    /// Snapshot of what is in the world and what streaming still owes it.
    pub fn summary(world: &World, manager: &StreamManager) -> StreamSummary {
        let mut by_label = BTreeMap::new();
        for data in world.entities().values() {
            let label = data.descriptor.map_or("collider", |d| d.label());
            *by_label.entry(label).or_insert(0) += 1;
        }
        StreamSummary {
            seed: manager.generator().world().seed,
            entity_count: world.entity_count(),
            by_category: CATEGORIES
                .iter()
                .map(|&(name, mask)| (name, world.count_matching(mask)))
                .collect(),
            by_label,
            loaded_chunks: manager.loaded_count(),
            desired_chunks: manager.desired().len(),
            pending_loads: manager.pending_loads(),
            pending_removals: manager.pending_removals(),
            hills: manager.heights().len(),
            average_tick: manager.timer().average(),
            worst_tick: manager.timer().max(),
        }
    }

    pub fn inspect_entity(world: &World, id: EntityId) -> Option<EntityInfo> {
        world.get(id).map(|data| EntityInfo {
            id,
            label: data.descriptor.map_or("collider", |d| d.label()),
            categories: CATEGORIES
                .iter()
                .filter(|(_, mask)| data.footprint.category.intersects(*mask))
                .map(|&(name, _)| name)
                .collect(),
            position: data.footprint.center,
            bounding_radius: data.footprint.shape.bounding_radius(),
        })
    }

    /// Details of one loaded chunk, `None` when it is not in the registry.
    pub fn chunk_info(
        world: &World,
        manager: &StreamManager,
        coord: ChunkCoord,
    ) -> Option<ChunkInfo> {
        let record = manager.record(coord)?;
        Some(ChunkInfo {
            coord,
            entities: record.handles.len(),
            alive: record.handles.iter().filter(|id| world.contains(**id)).count(),
            hill: record.hill,
        })
    }

    /// Loaded chunks sorted by coordinate.
    pub fn list_chunks(manager: &StreamManager) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = manager.loaded().map(|r| r.coord).collect();
        coords.sort();
        coords
    }
}

/// Summary of world and streaming state for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    pub seed: u64,
    pub entity_count: usize,
    /// Entity count per collision category. An entity may count in more
    /// than one.
    pub by_category: Vec<(&'static str, usize)>,
    /// Entity count per descriptor label; bare colliders count as
    /// `collider`.
    pub by_label: BTreeMap<&'static str, usize>,
    pub loaded_chunks: usize,
    pub desired_chunks: usize,
    pub pending_loads: usize,
    pub pending_removals: usize,
    pub hills: usize,
    pub average_tick: Duration,
    pub worst_tick: Duration,
}

impl fmt::Display for StreamSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "World: seed={} entities={} chunks={}/{} hills={}",
            self.seed, self.entity_count, self.loaded_chunks, self.desired_chunks, self.hills
        )?;
        writeln!(
            f,
            "Pending: loads={} removals={}",
            self.pending_loads, self.pending_removals
        )?;
        for (name, count) in &self.by_category {
            if *count > 0 {
                writeln!(f, "  {name:<10} {count}")?;
            }
        }
        write!(
            f,
            "Tick: avg={:.3}ms worst={:.3}ms",
            self.average_tick.as_secs_f64() * 1e3,
            self.worst_tick.as_secs_f64() * 1e3
        )
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    pub id: EntityId,
    pub label: &'static str,
    pub categories: Vec<&'static str>,
    pub position: Vec2,
    pub bounding_radius: f32,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entity [{}] {} pos=({:.1}, {:.1}) r={:.1} [{}]",
            self.id.0,
            self.label,
            self.position.x,
            self.position.y,
            self.bounding_radius,
            self.categories.join("|")
        )
    }
}

/// One registry entry as the inspector sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkInfo {
    pub coord: ChunkCoord,
    pub entities: usize,
    /// Handles that still resolve in the host world.
    pub alive: usize,
    pub hill: Option<HillDescriptor>,
}

impl fmt::Display for ChunkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chunk ({}, {}) entities={} alive={} hill={}",
            self.coord.x,
            self.coord.y,
            self.entities,
            self.alive,
            if self.hill.is_some() { "yes" } else { "no" }
        )
    }
}
