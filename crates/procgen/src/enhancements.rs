//! Pickup placement: behind a destructible obstacle, on open ground, and on
//! a hill top. Each roll has its own stream so changing one density leaves
//! the others untouched.

use std::f32::consts::TAU;

use glam::Vec2;
use scrapyard_common::{
    Category, EnhancementDescriptor, EnhancementKind, HillDescriptor, ObstacleDescriptor,
    SpawnDescriptor,
};
use scrapyard_kernel::rng::salt;
use scrapyard_kernel::{DeterministicRng, IgnoreSet, clearance_ok};

use crate::chunk_gen::Pass;
use crate::terrain::PLATEAU_FRACTION;

/// Relative odds of each pickup kind, in [`EnhancementKind::ALL`] order.
const KIND_WEIGHTS: [f32; 4] = [0.3, 0.3, 0.25, 0.15];

/// Hill-top pickups stay within this share of the plateau.
const PLATEAU_SHARE: f32 = 0.8;

/// Sweep offsets, in multiples of `pickup_sweep_step`, tried after the
/// direct placements fail.
const SWEEP: [f32; 6] = [1.0, -1.0, 2.0, -2.0, 3.0, -3.0];

fn roll_kind(rng: &mut DeterministicRng) -> EnhancementKind {
    EnhancementKind::ALL[rng.pick_weighted(&KIND_WEIGHTS)]
}

/// Run the three pickup rolls for the pass's chunk.
pub(crate) fn place(
    pass: &mut Pass<'_>,
    hill: Option<&HillDescriptor>,
    obstacles: &[ObstacleDescriptor],
) {
    if let Some(pickup) = behind_obstacle(pass, obstacles) {
        pass.place(SpawnDescriptor::Enhancement(pickup));
    }
    if let Some(pickup) = open_ground(pass, hill) {
        pass.place(SpawnDescriptor::Enhancement(pickup));
    }
    if let Some(pickup) = hill.and_then(|h| hill_top(pass, h)) {
        pass.place(SpawnDescriptor::Enhancement(pickup));
    }
}

/// Shared validation: bounds, border band, tracked distance and clearance
/// against everything in `mask`.
fn valid(pass: &Pass<'_>, p: Vec2, mask: Category) -> bool {
    let cfg = pass.config;
    if !pass.inside_world(p) || pass.world.bounds.distance_to_edge(p) < cfg.border_band {
        return false;
    }
    let keep_away = cfg.pickup_min_tracked_distance;
    if pass
        .ctx
        .tracked
        .iter()
        .any(|t| t.position.distance(p) < t.keep_out.max(keep_away))
    {
        return false;
    }
    !pass.cache.blocks_circle(p, cfg.pickup_clearance, mask)
        && clearance_ok(pass.query, p, cfg.pickup_clearance, mask, &IgnoreSet::new())
}

fn behind_obstacle(
    pass: &Pass<'_>,
    obstacles: &[ObstacleDescriptor],
) -> Option<EnhancementDescriptor> {
    let cfg = pass.config;
    let mut rng = DeterministicRng::for_chunk(pass.seed(), pass.coord, salt::PICKUP_BEHIND);
    if !rng.chance(cfg.pickup_behind_chance) {
        return None;
    }
    let kind = roll_kind(&mut rng);
    let chunk_center = pass.rect.center();
    let mut candidates: Vec<&ObstacleDescriptor> =
        obstacles.iter().filter(|o| o.destructible).collect();
    if candidates.is_empty() {
        return None;
    }
    // Stable sort: equal distances keep placement order.
    candidates.sort_by(|a, b| {
        a.position
            .distance_squared(chunk_center)
            .total_cmp(&b.position.distance_squared(chunk_center))
    });
    candidates.truncate(cfg.pickup_nearest_k.max(1));
    let last = candidates.len() as i32 - 1;
    let target = candidates[rng.int_range(0, last) as usize];
    let jitter = rng.range(-cfg.pickup_jitter, cfg.pickup_jitter);

    let anchor = pass.world_center();
    let toward = target.position - anchor;
    let dir = if toward == Vec2::ZERO {
        Vec2::X
    } else {
        toward.normalize()
    };
    let lateral = dir.perp() * jitter;
    let footprint = target.footprint();
    let frame = footprint.shape.bounding_radius();
    let mask = Category::PLACEMENT | Category::PICKUP;

    // Precise: just past where the ray leaves the obstacle's own shape.
    let precise = footprint
        .ray_interval(anchor, dir)
        .map(|(_, exit)| anchor + dir * (exit + cfg.pickup_gap) + lateral);
    // Estimate: the obstacle's bounding radius instead of the exit point.
    let estimate = target.position + dir * (frame + cfg.pickup_gap) + lateral;
    let sweep = SWEEP.iter().map(|k| {
        let d = Vec2::from_angle(dir.to_angle() + k * cfg.pickup_sweep_step);
        target.position + d * (frame + cfg.pickup_gap * 1.5)
    });

    precise
        .into_iter()
        .chain(std::iter::once(estimate))
        .chain(sweep)
        .find(|p| valid(pass, *p, mask))
        .map(|position| EnhancementDescriptor { position, kind })
}

fn open_ground(pass: &Pass<'_>, hill: Option<&HillDescriptor>) -> Option<EnhancementDescriptor> {
    let cfg = pass.config;
    let mut rng = DeterministicRng::for_chunk(pass.seed(), pass.coord, salt::PICKUP_OPEN);
    if !rng.chance(cfg.pickup_open_chance) {
        return None;
    }
    let kind = roll_kind(&mut rng);
    let mask = Category::PLACEMENT | Category::PICKUP;
    let clear_of_hills = |p: Vec2| {
        hill.into_iter()
            .chain(pass.ctx.hills.hills())
            .all(|h| h.footprint().distance_to(p) >= cfg.hill_avoid_margin)
    };
    (0..cfg.open_attempts)
        .map(|_| {
            pass.rect.min
                + Vec2::new(
                    rng.unit() * pass.rect.width(),
                    rng.unit() * pass.rect.height(),
                )
        })
        .find(|p| clear_of_hills(*p) && valid(pass, *p, mask))
        .map(|position| EnhancementDescriptor { position, kind })
}

fn hill_top(pass: &Pass<'_>, hill: &HillDescriptor) -> Option<EnhancementDescriptor> {
    let cfg = pass.config;
    let mut rng = DeterministicRng::for_chunk(pass.seed(), pass.coord, salt::PICKUP_HILLTOP);
    if !rng.chance(cfg.pickup_hilltop_chance) {
        return None;
    }
    let kind = roll_kind(&mut rng);
    // The hill itself is not in the way of its own top.
    let mask = (Category::PLACEMENT | Category::PICKUP).difference(Category::HILL);
    let reach = PLATEAU_FRACTION * PLATEAU_SHARE;
    (0..cfg.open_attempts)
        .map(|_| {
            let angle = rng.unit() * TAU;
            let r = rng.unit().sqrt() * reach;
            let offset = Vec2::from_angle(angle) * r;
            hill.center + Vec2::new(offset.x * hill.radius_x, offset.y * hill.radius_y)
        })
        .find(|p| valid(pass, *p, mask))
        .map(|position| EnhancementDescriptor { position, kind })
}
