use glam::Vec2;
use scrapyard_common::{Category, Rect};
use scrapyard_kernel::rng::{mix_seed, salt};
use scrapyard_kernel::{DeterministicRng, IgnoreSet, SpatialQuery, clearance_ok};

/// Result of a spawn-point search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub position: Vec2,
    /// True when nothing clear was found and `position` is the search
    /// rectangle's center.
    pub fallback: bool,
}

/// Find a clear point for a circle of `radius` inside `search`.
///
/// Tries `attempts` seeded random samples, then a row-major sweep at the
/// probe diameter. Never fails: with no clear point anywhere it returns the
/// rectangle's center.
pub fn find_spawn_point<Q: SpatialQuery + ?Sized>(
    query: &Q,
    search: &Rect,
    radius: f32,
    mask: Category,
    seed: u64,
    attempts: u32,
) -> SpawnPoint {
    let fallback = SpawnPoint {
        position: search.center(),
        fallback: true,
    };
    if search.is_degenerate() || radius.is_nan() || radius < 0.0 {
        return fallback;
    }
    let ignore = IgnoreSet::new();
    let area = if search.inset(radius).is_degenerate() {
        Rect::from_center_size(search.center(), Vec2::ZERO)
    } else {
        search.inset(radius)
    };
    let found = |p: Vec2| {
        clearance_ok(query, p, radius, mask, &ignore).then_some(SpawnPoint {
            position: p,
            fallback: false,
        })
    };

    let mut rng = DeterministicRng::new(mix_seed(seed, 0, 0, salt::SPAWN_SEARCH));
    for _ in 0..attempts {
        let p = area.min + Vec2::new(rng.unit() * area.width(), rng.unit() * area.height());
        if let Some(hit) = found(p) {
            return hit;
        }
    }

    let step = (radius * 2.0).max(1.0);
    let cols = (area.width() / step).floor() as u32;
    let rows = (area.height() / step).floor() as u32;
    for iy in 0..=rows {
        for ix in 0..=cols {
            let p = area.min + Vec2::new(ix as f32, iy as f32) * step;
            if let Some(hit) = found(p) {
                return hit;
            }
        }
    }

    tracing::warn!(?search, radius, "no clear spawn point, using search center");
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapyard_common::{Footprint, ObstacleDescriptor, ObstacleKind, SpawnDescriptor};
    use scrapyard_kernel::{EntityFactory, World};

    #[test]
    fn empty_world_gives_a_random_point_inside() {
        let world = World::new();
        let search = Rect::new(Vec2::splat(-500.0), Vec2::splat(500.0));
        let a = find_spawn_point(&world, &search, 30.0, Category::all(), 7, 16);
        let b = find_spawn_point(&world, &search, 30.0, Category::all(), 7, 16);
        assert_eq!(a, b);
        assert!(!a.fallback);
        assert!(search.inset(30.0).contains(a.position));
    }

    #[test]
    fn sweep_finds_the_only_gap() {
        let mut world = World::new();
        let search = Rect::new(Vec2::ZERO, Vec2::splat(400.0));
        // Cover everything except the top-right corner.
        world.spawn_collider(Footprint::obb(
            Vec2::new(150.0, 200.0),
            Vec2::new(150.0, 200.0),
            0.0,
            Category::WALL,
        ));
        world.spawn_collider(Footprint::obb(
            Vec2::new(350.0, 100.0),
            Vec2::new(50.0, 100.0),
            0.0,
            Category::WALL,
        ));
        let spot = find_spawn_point(&world, &search, 20.0, Category::WALL, 1, 0);
        assert!(!spot.fallback);
        assert!(spot.position.x > 300.0 && spot.position.y > 200.0);
    }

    #[test]
    fn blocked_search_falls_back_to_center() {
        let mut world = World::new();
        let search = Rect::new(Vec2::ZERO, Vec2::splat(200.0));
        for x in 0..5 {
            for y in 0..5 {
                world.spawn(&SpawnDescriptor::Obstacle(ObstacleDescriptor::new(
                    ObstacleKind::Hole,
                    Vec2::new(x as f32 * 50.0, y as f32 * 50.0),
                    0.0,
                )));
            }
        }
        let spot = find_spawn_point(&world, &search, 20.0, Category::OBSTACLE, 3, 32);
        assert!(spot.fallback);
        assert_eq!(spot.position, Vec2::splat(100.0));
    }

    #[test]
    fn degenerate_search_returns_center() {
        let world = World::new();
        let search = Rect::new(Vec2::new(10.0, 10.0), Vec2::new(10.0, 50.0));
        let spot = find_spawn_point(&world, &search, 5.0, Category::all(), 0, 8);
        assert_eq!(spot.position, Vec2::new(10.0, 30.0));
        assert!(spot.fallback);
    }
}
