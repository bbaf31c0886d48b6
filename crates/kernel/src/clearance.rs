//! Clearance queries against collidable entities.
//!
//! All queries are pure. Exclusions are explicit identity sets; there is no
//! implicit parent/child walk.

use std::collections::BTreeSet;

use glam::Vec2;
use scrapyard_common::{Category, EntityId, Footprint, Rect, SpawnDescriptor};

/// Entities to skip during a query.
pub type IgnoreSet = BTreeSet<EntityId>;

/// Lower bound on the capsule sampling interval.
pub const MIN_CAPSULE_STEP: f32 = 16.0;

/// Capsule sampling interval as a multiple of the probe radius.
pub const CAPSULE_STEP_FACTOR: f32 = 1.25;

/// A collidable returned by a region query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collidable {
    pub id: EntityId,
    pub footprint: Footprint,
}

/// First intersection of a ray with a collidable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub id: EntityId,
    pub point: Vec2,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
    /// Distance from the ray origin to where the ray leaves the shape.
    pub exit_distance: f32,
}

/// Region and ray queries over collidable entities, provided by the physics
/// layer.
pub trait SpatialQuery {
    /// Collidables whose category intersects `mask` and whose bounds touch
    /// `region`, in handle order.
    fn collidables_in(&self, region: &Rect, mask: Category) -> Vec<Collidable>;

    /// Nearest collidable hit by the segment `from -> to`.
    fn raycast(&self, from: Vec2, to: Vec2, mask: Category, ignore: &IgnoreSet) -> Option<RayHit> {
        let delta = to - from;
        let len = delta.length();
        if len <= f32::EPSILON {
            return None;
        }
        let dir = delta / len;
        let region = Rect::new(from.min(to), from.max(to));
        self.collidables_in(&region, mask)
            .into_iter()
            .filter(|c| !ignore.contains(&c.id))
            .filter_map(|c| {
                let (t0, t1) = c.footprint.ray_interval(from, dir)?;
                (t0 <= len).then_some(RayHit {
                    id: c.id,
                    point: from + dir * t0,
                    distance: t0,
                    exit_distance: t1,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Turns descriptors into spawned collidable entities, provided by the game.
pub trait EntityFactory {
    fn spawn(&mut self, descriptor: &SpawnDescriptor) -> EntityId;
    /// Remove a spawned entity. Returns false if the handle was unknown.
    fn despawn(&mut self, id: EntityId) -> bool;
}

/// True iff no collidable matching `mask` (and not in `ignore`) overlaps the
/// circle. Uses exact shape distance, not bounding boxes.
pub fn clearance_ok<Q: SpatialQuery + ?Sized>(
    query: &Q,
    point: Vec2,
    radius: f32,
    mask: Category,
    ignore: &IgnoreSet,
) -> bool {
    let region = Rect::from_center_size(point, Vec2::splat(radius * 2.0));
    query
        .collidables_in(&region, mask)
        .iter()
        .filter(|c| !ignore.contains(&c.id))
        .all(|c| !c.footprint.overlaps_circle(point, radius))
}

/// True if the circle overlaps any of the pre-gathered footprints.
pub fn circle_intersects_any(point: Vec2, radius: f32, footprints: &[Footprint]) -> bool {
    footprints.iter().any(|fp| fp.overlaps_circle(point, radius))
}

/// Sampling interval used by capsule sweeps for a probe of `radius`.
pub fn capsule_step(radius: f32) -> f32 {
    MIN_CAPSULE_STEP.max(radius * CAPSULE_STEP_FACTOR)
}

/// Evenly spaced probe points along `from -> to`, endpoints included, never
/// further apart than [`capsule_step`].
pub fn capsule_samples(from: Vec2, to: Vec2, radius: f32) -> impl Iterator<Item = Vec2> {
    let len = from.distance(to);
    let n = if len.is_finite() && len > 0.0 {
        (len / capsule_step(radius)).ceil().max(1.0) as usize
    } else {
        0
    };
    (0..=n).map(move |i| {
        if n == 0 {
            from
        } else {
            from.lerp(to, i as f32 / n as f32)
        }
    })
}

/// Approximate capsule sweep: probes circles of `radius` along the segment.
///
/// Obstacles thinner than the gap between probes can slip through; this is a
/// sampled test, not a continuous sweep.
pub fn path_clear_capsule<Q: SpatialQuery + ?Sized>(
    query: &Q,
    from: Vec2,
    to: Vec2,
    radius: f32,
    mask: Category,
    ignore: &IgnoreSet,
) -> bool {
    let region = Rect::new(from.min(to), from.max(to)).expand(radius);
    let nearby: Vec<Footprint> = query
        .collidables_in(&region, mask)
        .into_iter()
        .filter(|c| !ignore.contains(&c.id))
        .map(|c| c.footprint)
        .collect();
    if nearby.is_empty() {
        return true;
    }
    capsule_samples(from, to, radius).all(|p| !circle_intersects_any(p, radius, &nearby))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;
    use scrapyard_common::{ObstacleDescriptor, ObstacleKind};

    fn world_with(obstacles: &[(ObstacleKind, Vec2)]) -> (World, Vec<EntityId>) {
        let mut w = World::new();
        let ids = obstacles
            .iter()
            .map(|(k, p)| w.spawn(&SpawnDescriptor::Obstacle(ObstacleDescriptor::new(*k, *p, 0.0))))
            .collect();
        (w, ids)
    }

    #[test]
    fn clearance_respects_mask_and_ignore() {
        let (w, ids) = world_with(&[(ObstacleKind::Rock, Vec2::ZERO)]);
        let none = IgnoreSet::new();
        assert!(!clearance_ok(&w, Vec2::new(50.0, 0.0), 20.0, Category::OBSTACLE, &none));
        assert!(clearance_ok(&w, Vec2::new(50.0, 0.0), 5.0, Category::OBSTACLE, &none));
        assert!(clearance_ok(&w, Vec2::new(50.0, 0.0), 20.0, Category::WALL, &none));
        let ignore: IgnoreSet = ids.into_iter().collect();
        assert!(clearance_ok(&w, Vec2::ZERO, 100.0, Category::OBSTACLE, &ignore));
    }

    #[test]
    fn clearance_uses_shape_not_bounds() {
        // A 45-degree steel block: its AABB corner region is empty space.
        let mut w = World::new();
        w.spawn(&SpawnDescriptor::Obstacle(ObstacleDescriptor::new(
            ObstacleKind::Steel,
            Vec2::ZERO,
            std::f32::consts::FRAC_PI_4,
        )));
        let corner = Vec2::new(44.0, 44.0);
        assert!(clearance_ok(&w, corner, 4.0, Category::OBSTACLE, &IgnoreSet::new()));
    }

    #[test]
    fn circle_against_gathered_list() {
        let list = [
            Footprint::circle(Vec2::ZERO, 10.0, Category::OBSTACLE),
            Footprint::obb(Vec2::new(100.0, 0.0), Vec2::new(5.0, 5.0), 0.0, Category::RAMP),
        ];
        assert!(circle_intersects_any(Vec2::new(15.0, 0.0), 6.0, &list));
        assert!(circle_intersects_any(Vec2::new(90.0, 0.0), 6.0, &list));
        assert!(!circle_intersects_any(Vec2::new(50.0, 0.0), 6.0, &list));
        assert!(!circle_intersects_any(Vec2::ZERO, 100.0, &[]));
    }

    #[test]
    fn capsule_samples_include_endpoints_and_respect_step() {
        let from = Vec2::ZERO;
        let to = Vec2::new(100.0, 0.0);
        let samples: Vec<_> = capsule_samples(from, to, 20.0).collect();
        assert_eq!(samples.first(), Some(&from));
        assert_eq!(samples.last(), Some(&to));
        for pair in samples.windows(2) {
            assert!(pair[0].distance(pair[1]) <= capsule_step(20.0) + 1e-4);
        }
        // Small radius falls back to the minimum step.
        assert_eq!(capsule_step(1.0), MIN_CAPSULE_STEP);
        let degenerate: Vec<_> = capsule_samples(from, from, 10.0).collect();
        assert_eq!(degenerate, vec![from]);
    }

    #[test]
    fn empty_corridor_is_clear() {
        let (w, _) = world_with(&[(ObstacleKind::Rock, Vec2::new(0.0, 500.0))]);
        assert!(path_clear_capsule(
            &w,
            Vec2::new(-300.0, 0.0),
            Vec2::new(300.0, 0.0),
            60.0,
            Category::OBSTACLE,
            &IgnoreSet::new()
        ));
    }

    #[test]
    fn obstacle_on_segment_blocks_corridor() {
        let (w, _) = world_with(&[(ObstacleKind::Cone, Vec2::new(37.0, 0.0))]);
        assert!(!path_clear_capsule(
            &w,
            Vec2::new(-300.0, 0.0),
            Vec2::new(300.0, 0.0),
            30.0,
            Category::OBSTACLE,
            &IgnoreSet::new()
        ));
    }

    #[test]
    fn obstacle_within_radius_at_sampling_resolution_blocks() {
        // Rock radius (40) exceeds the sampling step for r = 30, so an offset
        // rock inside the corridor is always seen by some probe.
        let (w, _) = world_with(&[(ObstacleKind::Rock, Vec2::new(113.0, 55.0))]);
        assert!(!path_clear_capsule(
            &w,
            Vec2::ZERO,
            Vec2::new(400.0, 0.0),
            30.0,
            Category::OBSTACLE,
            &IgnoreSet::new()
        ));
    }

    #[test]
    fn raycast_returns_nearest_hit() {
        let (w, ids) = world_with(&[
            (ObstacleKind::Rock, Vec2::new(300.0, 0.0)),
            (ObstacleKind::Barrel, Vec2::new(150.0, 0.0)),
        ]);
        let hit = w
            .raycast(Vec2::ZERO, Vec2::new(1000.0, 0.0), Category::OBSTACLE, &IgnoreSet::new())
            .unwrap();
        assert_eq!(hit.id, ids[1]);
        assert!((hit.distance - 128.0).abs() < 1e-3);
        assert!((hit.exit_distance - 172.0).abs() < 1e-3);

        let ignore: IgnoreSet = [ids[1]].into_iter().collect();
        let hit = w
            .raycast(Vec2::ZERO, Vec2::new(1000.0, 0.0), Category::OBSTACLE, &ignore)
            .unwrap();
        assert_eq!(hit.id, ids[0]);
        assert!(w
            .raycast(Vec2::ZERO, Vec2::new(100.0, 0.0), Category::OBSTACLE, &IgnoreSet::new())
            .is_none());
    }
}
