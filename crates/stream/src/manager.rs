use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Instant;

use glam::Vec2;
use scrapyard_common::{ChunkCoord, ChunkKey, EntityId, HillDescriptor, Rect, TrackedEntity};
use scrapyard_kernel::{EntityFactory, SpatialQuery};
use scrapyard_procgen::{ChunkGenerator, GenConfig, GenContext, HeightField, WorldConfig};

use crate::budget::{FrameTimer, StreamConfig, StreamStats};
use crate::grid::{anchor_chunks, desired_chunks, sort_near_first};

/// What the streamer follows this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamInputs {
    pub view: Rect,
    pub tracked: Vec<TrackedEntity>,
}

impl StreamInputs {
    pub fn new(view: Rect, tracked: Vec<TrackedEntity>) -> Self {
        Self { view, tracked }
    }
}

/// A loaded chunk and every entity spawned for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub coord: ChunkCoord,
    /// Spawned handles in plan order.
    pub handles: Vec<EntityId>,
    pub hill: Option<HillDescriptor>,
}

/// Handles of an unloaded chunk still waiting for removal.
#[derive(Debug, Clone)]
struct UnloadBatch {
    key: ChunkKey,
    handles: VecDeque<EntityId>,
}

/// Owns all streaming state: the loaded registry, both pending queues and
/// the height field of loaded hills.
///
/// Constructed once per world and [`reset`](Self::reset) on round restart.
/// A chunk is either in the registry with every entity spawned or absent;
/// in-between states live only in the queues.
#[derive(Debug, Clone)]
pub struct StreamManager {
    config: StreamConfig,
    generator: ChunkGenerator,
    registry: BTreeMap<ChunkKey, ChunkRecord>,
    load_queue: VecDeque<ChunkCoord>,
    unload_queue: VecDeque<UnloadBatch>,
    heights: HeightField,
    desired: BTreeSet<ChunkCoord>,
    anchors: Option<Vec<Option<ChunkCoord>>>,
    since_refresh: f32,
    stats: StreamStats,
    timer: FrameTimer,
}

impl StreamManager {
    pub fn new(world: WorldConfig, generation: GenConfig, config: StreamConfig) -> Self {
        Self {
            timer: FrameTimer::new(config.timer_history),
            config,
            generator: ChunkGenerator::new(world, generation),
            registry: BTreeMap::new(),
            load_queue: VecDeque::new(),
            unload_queue: VecDeque::new(),
            heights: HeightField::new(),
            desired: BTreeSet::new(),
            anchors: None,
            since_refresh: 0.0,
            stats: StreamStats::default(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn heights(&self) -> &HeightField {
        &self.heights
    }

    /// Last computed desired set.
    pub fn desired(&self) -> &BTreeSet<ChunkCoord> {
        &self.desired
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.registry.contains_key(&coord.key())
    }

    pub fn record(&self, coord: ChunkCoord) -> Option<&ChunkRecord> {
        self.registry.get(&coord.key())
    }

    /// Loaded chunks in key order.
    pub fn loaded(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.registry.values()
    }

    pub fn loaded_count(&self) -> usize {
        self.registry.len()
    }

    pub fn pending_loads(&self) -> usize {
        self.load_queue.len()
    }

    /// Entity removals still queued across all unload batches.
    pub fn pending_removals(&self) -> usize {
        self.unload_queue.iter().map(|b| b.handles.len()).sum()
    }

    /// True while an unload batch for `coord` is still draining.
    pub fn is_unloading(&self, coord: ChunkCoord) -> bool {
        let key = coord.key();
        self.unload_queue.iter().any(|b| b.key == key)
    }

    /// Terrain height at `p` over all loaded hills.
    pub fn ground_height(&self, p: Vec2) -> f32 {
        self.heights.height(p)
    }

    pub fn ground_height_and_gradient(&self, p: Vec2) -> (f32, Vec2) {
        self.heights.height_and_gradient(p)
    }

    pub fn ground_gradient_fd(&self, p: Vec2, eps: f32) -> Vec2 {
        self.heights.gradient_fd(p, eps)
    }

    /// Advance streaming by one frame: refresh the desired set when due,
    /// then remove at most `unload_budget` entities and load at most
    /// `load_budget` chunks.
    pub fn tick<H: EntityFactory + SpatialQuery>(
        &mut self,
        dt: f32,
        inputs: &StreamInputs,
        host: &mut H,
    ) -> &StreamStats {
        let _span = tracing::info_span!("stream_tick").entered();
        let start = Instant::now();
        let mut stats = StreamStats::default();
        if !self.generator.world().is_degenerate() {
            self.since_refresh += dt.max(0.0);
            stats.refreshed = self.refresh_if_due(inputs);
            self.drain_unloads(host, Some(self.config.unload_budget), &mut stats);
            self.drain_loads(host, &inputs.tracked, Some(self.config.load_budget), &mut stats);
        }
        self.finish(stats, start)
    }

    /// Recompute the desired set now and flush both queues, ignoring the
    /// per-tick budgets. For rare bulk events such as a zoom change.
    pub fn force_refresh<H: EntityFactory + SpatialQuery>(
        &mut self,
        inputs: &StreamInputs,
        host: &mut H,
    ) -> &StreamStats {
        let _span = tracing::info_span!("stream_force_refresh").entered();
        let start = Instant::now();
        let mut stats = StreamStats::default();
        if !self.generator.world().is_degenerate() {
            self.refresh(inputs);
            stats.refreshed = true;
            self.drain_unloads(host, None, &mut stats);
            self.drain_loads(host, &inputs.tracked, None, &mut stats);
        }
        self.finish(stats, start)
    }

    /// Despawn everything this manager owns and return to the freshly
    /// constructed state.
    pub fn reset<H: EntityFactory>(&mut self, host: &mut H) {
        let mut removed = 0;
        for record in std::mem::take(&mut self.registry).into_values() {
            for id in record.handles {
                removed += usize::from(host.despawn(id));
            }
        }
        for batch in std::mem::take(&mut self.unload_queue) {
            for id in batch.handles {
                removed += usize::from(host.despawn(id));
            }
        }
        self.load_queue.clear();
        self.heights.clear();
        self.desired.clear();
        self.anchors = None;
        self.since_refresh = 0.0;
        self.stats = StreamStats::default();
        self.timer.clear();
        tracing::info!(removed, "stream manager reset");
    }

    fn finish(&mut self, mut stats: StreamStats, start: Instant) -> &StreamStats {
        stats.pending_loads = self.load_queue.len();
        stats.pending_removals = self.pending_removals();
        stats.loaded_chunks = self.registry.len();
        stats.tick_time = start.elapsed();
        self.timer.record(stats.tick_time);
        tracing::trace!(
            loaded = stats.chunks_loaded,
            removed = stats.entities_removed,
            deferred = stats.loads_deferred,
            pending_loads = stats.pending_loads,
            pending_removals = stats.pending_removals,
            total = stats.loaded_chunks,
            "stream tick complete"
        );
        self.stats = stats;
        &self.stats
    }

    fn refresh_if_due(&mut self, inputs: &StreamInputs) -> bool {
        let grid = self.generator.grid();
        let anchors = anchor_chunks(grid, &inputs.view, &inputs.tracked);
        let moved = self.anchors.as_ref() != Some(&anchors);
        if moved || self.since_refresh >= self.config.refresh_interval {
            self.refresh(inputs);
            true
        } else {
            false
        }
    }

    /// Recompute the desired set and diff it against the registry and the
    /// load queue.
    fn refresh(&mut self, inputs: &StreamInputs) {
        let world = *self.generator.world();
        let grid = *self.generator.grid();
        let desired = desired_chunks(
            &grid,
            &world.bounds,
            &inputs.view,
            self.config.view_margin,
            &inputs.tracked,
            self.config.tracked_radius,
        );

        // Chunks no longer wanted leave the registry now; their entities
        // drain over the following ticks.
        let leaving: Vec<ChunkKey> = self
            .registry
            .iter()
            .filter(|(_, r)| !desired.contains(&r.coord))
            .map(|(k, _)| *k)
            .collect();
        for key in leaving {
            if let Some(record) = self.registry.remove(&key) {
                self.heights.remove(key);
                tracing::debug!(
                    x = record.coord.x,
                    y = record.coord.y,
                    entities = record.handles.len(),
                    "chunk queued for unload"
                );
                self.unload_queue.push_back(UnloadBatch {
                    key,
                    handles: record.handles.into(),
                });
            }
        }

        let before = self.load_queue.len();
        self.load_queue.retain(|c| desired.contains(c));
        let dropped = before - self.load_queue.len();

        let queued: BTreeSet<ChunkCoord> = self.load_queue.iter().copied().collect();
        let mut fresh: Vec<ChunkCoord> = desired
            .iter()
            .filter(|c| !self.registry.contains_key(&c.key()) && !queued.contains(c))
            .copied()
            .collect();
        let focus = grid.chunk_of(inputs.view.center()).unwrap_or_default();
        sort_near_first(&mut fresh, focus);
        tracing::debug!(
            desired = desired.len(),
            enqueued = fresh.len(),
            dropped,
            "desired set refreshed"
        );
        self.load_queue.extend(fresh);

        self.desired = desired;
        self.anchors = Some(anchor_chunks(&grid, &inputs.view, &inputs.tracked));
        self.since_refresh = 0.0;
    }

    fn drain_unloads<H: EntityFactory>(
        &mut self,
        host: &mut H,
        budget: Option<usize>,
        stats: &mut StreamStats,
    ) {
        while let Some(batch) = self.unload_queue.front_mut() {
            while let Some(&id) = batch.handles.front() {
                if budget.is_some_and(|b| stats.entities_removed + stats.stale_handles >= b) {
                    return;
                }
                batch.handles.pop_front();
                if host.despawn(id) {
                    stats.entities_removed += 1;
                } else {
                    stats.stale_handles += 1;
                    tracing::warn!(id = id.0, "unload handle no longer in the host world");
                }
            }
            if let Some(done) = self.unload_queue.pop_front() {
                let coord = done.key.unpack();
                tracing::debug!(x = coord.x, y = coord.y, "chunk unloaded");
                stats.chunks_unloaded += 1;
            }
        }
    }

    fn drain_loads<H: EntityFactory + SpatialQuery>(
        &mut self,
        host: &mut H,
        tracked: &[TrackedEntity],
        budget: Option<usize>,
        stats: &mut StreamStats,
    ) {
        let mut waiting = VecDeque::with_capacity(self.load_queue.len());
        while let Some(coord) = self.load_queue.pop_front() {
            if budget.is_some_and(|b| stats.chunks_loaded >= b) {
                waiting.push_back(coord);
                continue;
            }
            // A chunk still draining finishes its unload before it loads
            // again, so the new entities never coexist with the old ones.
            if self.is_unloading(coord) {
                stats.loads_deferred += 1;
                waiting.push_back(coord);
                continue;
            }
            stats.entities_spawned += self.load_chunk(coord, tracked, host);
            stats.chunks_loaded += 1;
        }
        self.load_queue = waiting;
    }

    fn load_chunk<H: EntityFactory + SpatialQuery>(
        &mut self,
        coord: ChunkCoord,
        tracked: &[TrackedEntity],
        host: &mut H,
    ) -> usize {
        let ctx = GenContext {
            tracked,
            hills: &self.heights,
        };
        let plan = self.generator.generate(coord, &*host, &ctx);
        let handles: Vec<EntityId> = plan.items.iter().map(|d| host.spawn(d)).collect();
        let hill = plan.hill().copied();
        let key = coord.key();
        if let Some(h) = hill {
            self.heights.insert(key, h);
        }
        tracing::debug!(x = coord.x, y = coord.y, entities = handles.len(), "chunk loaded");
        let spawned = handles.len();
        self.registry.insert(key, ChunkRecord { coord, handles, hill });
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapyard_common::Category;
    use scrapyard_kernel::World;

    fn manager(load_budget: usize, unload_budget: usize) -> StreamManager {
        StreamManager::new(
            WorldConfig::default(),
            GenConfig::default(),
            StreamConfig {
                load_budget,
                unload_budget,
                view_margin: 0.0,
                tracked_radius: 0,
                ..StreamConfig::default()
            },
        )
    }

    fn view_at(x: f32, y: f32, half: f32) -> StreamInputs {
        StreamInputs::new(
            Rect::from_center_size(Vec2::new(x, y), Vec2::splat(half * 2.0)),
            Vec::new(),
        )
    }

    #[test]
    fn tick_never_exceeds_load_budget() {
        let mut world = World::new();
        let mut m = manager(2, 1000);
        // A view covering 5x5 chunks queues 25 loads.
        let inputs = view_at(1024.0, 1024.0, 5000.0);
        let stats = m.tick(0.016, &inputs, &mut world).clone();
        assert!(stats.refreshed);
        assert_eq!(stats.chunks_loaded, 2);
        assert_eq!(m.loaded_count(), 2);
        assert!(m.pending_loads() >= 2);
        for _ in 0..5 {
            let stats = m.tick(0.016, &inputs, &mut world);
            assert!(stats.chunks_loaded <= 2);
        }
    }

    #[test]
    fn loads_run_nearest_first() {
        let mut world = World::new();
        let mut m = manager(1, 1000);
        let inputs = view_at(3072.0, 3072.0, 3000.0);
        m.tick(0.016, &inputs, &mut world);
        assert!(m.is_loaded(ChunkCoord::new(1, 1)));
    }

    #[test]
    fn moving_away_unloads_every_entity() {
        let mut world = World::new();
        let mut m = manager(4, 16);
        let home = view_at(-12000.0, -12000.0, 2500.0);
        m.force_refresh(&home, &mut world);
        let owned: Vec<EntityId> = m.loaded().flat_map(|r| r.handles.clone()).collect();
        assert!(!owned.is_empty());
        let home_chunks: Vec<ChunkCoord> = m.loaded().map(|r| r.coord).collect();

        let away = view_at(12000.0, 12000.0, 100.0);
        m.tick(0.016, &away, &mut world);
        for c in &home_chunks {
            assert!(!m.is_loaded(*c));
        }
        assert!(m.stats().entities_removed <= 16);
        for _ in 0..200 {
            m.tick(0.016, &away, &mut world);
        }
        assert_eq!(m.pending_removals(), 0);
        for id in owned {
            assert!(!world.contains(id), "{id:?} still spawned");
        }
    }

    #[test]
    fn regenerated_chunk_is_identical() {
        let mut world = World::new();
        let mut m = manager(8, 1000);
        let coord = ChunkCoord::new(-8, -8);
        let center = m.generator().grid().chunk_rect(coord).center();
        let here = view_at(center.x, center.y, 10.0);
        m.force_refresh(&here, &mut world);
        let first: Vec<_> = m
            .record(coord)
            .unwrap()
            .handles
            .iter()
            .map(|id| world.get(*id).unwrap().descriptor)
            .collect();

        m.force_refresh(&view_at(0.0, 0.0, 10.0), &mut world);
        assert!(!m.is_loaded(coord));
        m.force_refresh(&here, &mut world);
        let second: Vec<_> = m
            .record(coord)
            .unwrap()
            .handles
            .iter()
            .map(|id| world.get(*id).unwrap().descriptor)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn reload_waits_for_pending_unload() {
        let mut world = World::new();
        let mut m = manager(4, 1);
        let coord = ChunkCoord::new(-8, -8);
        let center = m.generator().grid().chunk_rect(coord).center();
        let here = view_at(center.x, center.y, 10.0);
        m.force_refresh(&here, &mut world);
        let old = m.record(coord).unwrap().handles.clone();
        assert!(old.len() > 1);

        // Leave, then come back before the batch has drained.
        m.tick(0.016, &view_at(0.0, 0.0, 10.0), &mut world);
        assert!(m.is_unloading(coord));
        let stats = m.tick(0.016, &here, &mut world).clone();
        assert_eq!(stats.loads_deferred, 1);
        assert!(!m.is_loaded(coord));

        while m.is_unloading(coord) {
            m.tick(0.016, &here, &mut world);
        }
        m.tick(0.016, &here, &mut world);
        assert!(m.is_loaded(coord));
        for id in old {
            assert!(!world.contains(id));
        }
    }

    #[test]
    fn handles_gone_from_the_host_are_not_counted() {
        let mut world = World::new();
        let mut m = manager(4, 1000);
        let coord = ChunkCoord::new(-8, -8);
        let center = m.generator().grid().chunk_rect(coord).center();
        m.force_refresh(&view_at(center.x, center.y, 10.0), &mut world);
        let handles = m.record(coord).unwrap().handles.clone();
        assert!(handles.len() > 1);
        // Something else already destroyed one of the chunk's entities.
        assert!(world.despawn(handles[0]));

        let stats = m.tick(0.016, &view_at(0.0, 0.0, 10.0), &mut world).clone();
        assert_eq!(stats.entities_removed, handles.len() - 1);
        assert_eq!(stats.stale_handles, 1);
        assert!(!m.is_unloading(coord));
    }

    #[test]
    fn stale_loads_are_dropped() {
        let mut world = World::new();
        let mut m = manager(1, 1000);
        m.tick(0.016, &view_at(-12000.0, -12000.0, 3000.0), &mut world);
        assert!(m.pending_loads() > 0);
        m.tick(0.016, &view_at(12000.0, 12000.0, 10.0), &mut world);
        assert_eq!(m.pending_loads(), 0);
        assert!(m.is_loaded(ChunkCoord::new(5, 5)));
    }

    #[test]
    fn refresh_is_throttled() {
        let mut world = World::new();
        let mut m = manager(100, 1000);
        let inputs = view_at(100.0, 100.0, 10.0);
        assert!(m.tick(0.01, &inputs, &mut world).refreshed);
        assert!(!m.tick(0.01, &inputs, &mut world).refreshed);
        assert!(m.tick(0.3, &inputs, &mut world).refreshed);
        // Crossing a chunk border refreshes immediately.
        let moved = view_at(2100.0, 100.0, 10.0);
        assert!(m.tick(0.0, &moved, &mut world).refreshed);
    }

    #[test]
    fn hills_follow_the_registry() {
        let mut world = World::new();
        let mut m = manager(1000, 100_000);
        m.force_refresh(&view_at(0.0, 0.0, 16000.0), &mut world);
        let hills: Vec<HillDescriptor> = m.loaded().filter_map(|r| r.hill).collect();
        assert!(!hills.is_empty());
        assert_eq!(m.heights().len(), hills.len());
        let top = hills[0];
        assert_eq!(m.ground_height(top.center), top.top_height);
        assert_eq!(world.count_matching(Category::HILL), hills.len());

        m.force_refresh(&view_at(20000.0, 20000.0, 10.0), &mut world);
        assert_eq!(m.loaded_count(), 0);
        assert!(m.heights().is_empty());
        assert_eq!(m.ground_height(top.center), 0.0);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut world = World::new();
        let mut m = manager(3, 2);
        m.force_refresh(&view_at(-12000.0, 12000.0, 3000.0), &mut world);
        m.tick(0.016, &view_at(12000.0, -12000.0, 3000.0), &mut world);
        assert!(world.entity_count() > 0);
        m.reset(&mut world);
        assert_eq!(world.entity_count(), 0);
        assert_eq!(m.loaded_count(), 0);
        assert_eq!(m.pending_loads(), 0);
        assert_eq!(m.pending_removals(), 0);
        assert!(m.desired().is_empty());
    }

    #[test]
    fn degenerate_world_is_a_no_op() {
        let mut world = World::new();
        let mut m = StreamManager::new(
            WorldConfig {
                chunk_size: 0.0,
                ..WorldConfig::default()
            },
            GenConfig::default(),
            StreamConfig::default(),
        );
        let stats = m.tick(0.016, &view_at(0.0, 0.0, 5000.0), &mut world).clone();
        assert_eq!(stats.chunks_loaded, 0);
        assert_eq!(m.pending_loads(), 0);
        assert_eq!(world.entity_count(), 0);
    }
}
