//! Obstacle scatter over a chunk's cell grid.
//!
//! Each cell owns one RNG stream and proposes one anchor. Surviving anchors
//! try, in order: a barrier with flanking cones, a cone row, a single
//! weighted scatter. Cells are visited row-major; that order is part of the
//! determinism contract.

use glam::Vec2;
use scrapyard_common::{Category, ObstacleDescriptor, ObstacleKind, SpawnDescriptor};
use scrapyard_kernel::rng::salt;
use scrapyard_kernel::{DeterministicRng, IgnoreSet, path_clear_capsule};

use crate::chunk_gen::Pass;
use crate::config::{MAX_CELLS_PER_AXIS, ScatterWeights};

/// Placement probability at `p`: sparse core, dense frontier.
pub(crate) fn density_at(pass: &Pass<'_>, p: Vec2) -> f32 {
    let cfg = pass.config;
    let half = pass.world.bounds.half_size();
    let d = (p - pass.world_center()).abs();
    let t = (d.x / half.x).max(d.y / half.y).clamp(0.0, 1.0);
    cfg.core_density + (cfg.frontier_density - cfg.core_density) * t.powf(cfg.density_exponent)
}

/// Scatter obstacles over every cell of the pass's chunk. Returns what was
/// placed, in placement order.
pub(crate) fn scatter(pass: &mut Pass<'_>) -> Vec<ObstacleDescriptor> {
    let cfg = pass.config;
    let chunk_size = pass.world.chunk_size;
    let cells = (chunk_size / cfg.obstacle_cell_size)
        .floor()
        .clamp(1.0, MAX_CELLS_PER_AXIS as f32) as u32;
    let cell = chunk_size / cells as f32;
    let inset = cfg.cell_inset.clamp(0.0, cell * 0.5);
    let first = pass.items.len();
    let mut rows: Vec<Vec2> = Vec::new();

    for iy in 0..cells {
        for ix in 0..cells {
            let mut rng =
                DeterministicRng::for_cell(pass.seed(), pass.coord, ix, iy, salt::OBSTACLES);
            let origin = pass.rect.min + Vec2::new(ix as f32, iy as f32) * cell;
            let anchor = origin
                + Vec2::new(
                    rng.range(inset, cell - inset),
                    rng.range(inset, cell - inset),
                );
            if !pass.inside_world(anchor) {
                tracing::trace!(ix, iy, "anchor outside world");
                continue;
            }
            if pass.near_tracked(anchor, 0.0) {
                tracing::trace!(ix, iy, "anchor inside keep-out");
                continue;
            }
            if !rng.chance(density_at(pass, anchor)) {
                continue;
            }
            let placed = place_barrier(pass, &mut rng, anchor)
                || place_cone_row(pass, &mut rng, anchor, &mut rows)
                || place_single(pass, &mut rng, anchor);
            if !placed {
                tracing::trace!(ix, iy, "anchor rejected");
            }
        }
    }

    pass.items[first..]
        .iter()
        .filter_map(|d| match d {
            SpawnDescriptor::Obstacle(o) => Some(*o),
            _ => None,
        })
        .collect()
}

/// True when an obstacle of `kind` fits at `p` against the cache and the
/// tracked keep-out zones.
fn fits(pass: &Pass<'_>, kind: ObstacleKind, p: Vec2) -> bool {
    let radius = pass.config.clearance.of(kind).max(pass.config.min_spacing);
    pass.inside_world(p)
        && !pass.near_tracked(p, radius)
        && !pass.cache.blocks_circle(p, radius, Category::PLACEMENT)
}

fn place_obstacle(pass: &mut Pass<'_>, kind: ObstacleKind, p: Vec2, rotation: f32) {
    pass.place(SpawnDescriptor::Obstacle(ObstacleDescriptor::new(kind, p, rotation)));
}

/// Barrier facing away from the world center, with a cone behind each end.
fn place_barrier(pass: &mut Pass<'_>, rng: &mut DeterministicRng, anchor: Vec2) -> bool {
    if !rng.chance(pass.config.barrier_chance) {
        return false;
    }
    let outward = (anchor - pass.world_center()).normalize_or_zero();
    let outward = if outward == Vec2::ZERO { Vec2::X } else { outward };
    let heading = outward.to_angle();
    if !fits(pass, ObstacleKind::Barrier, anchor) {
        return false;
    }
    place_obstacle(pass, ObstacleKind::Barrier, anchor, heading);

    let lateral = outward.perp();
    for side in [-1.0, 1.0] {
        let p = anchor - outward * pass.config.flank_back
            + lateral * (side * pass.config.flank_lateral);
        if fits(pass, ObstacleKind::Cone, p) {
            place_obstacle(pass, ObstacleKind::Cone, p, heading);
        }
    }
    true
}

/// A straight row of cones through `anchor`. All or nothing.
fn place_cone_row(
    pass: &mut Pass<'_>,
    rng: &mut DeterministicRng,
    anchor: Vec2,
    rows: &mut Vec<Vec2>,
) -> bool {
    let cfg = pass.config;
    if !rng.chance(cfg.cone_row_chance) {
        return false;
    }
    let angle = rng.angle();
    let count = rng.int_range(cfg.cone_row_min, cfg.cone_row_max).max(1) as usize;
    // Anti-chaining: rows in one chunk stay apart.
    if rows.iter().any(|c| c.distance(anchor) < cfg.cone_row_separation) {
        return false;
    }

    let dir = Vec2::from_angle(angle);
    let half = dir * (cfg.cone_row_spacing * (count - 1) as f32 * 0.5);
    let (from, to) = (anchor - half, anchor + half);
    if !pass.inside_world(from) || !pass.inside_world(to) {
        return false;
    }
    let radius = cfg.clearance.cone;
    if !path_clear_capsule(pass.query, from, to, radius, Category::TRAVERSAL, &IgnoreSet::new())
        || !pass.cache.capsule_clear(from, to, radius, Category::PLACEMENT)
    {
        return false;
    }

    let mark = pass.mark();
    for i in 0..count {
        let p = from + dir * (cfg.cone_row_spacing * i as f32);
        if !fits(pass, ObstacleKind::Cone, p) {
            tracing::trace!(cone = i, "cone row rolled back");
            pass.rollback(mark);
            return false;
        }
        place_obstacle(pass, ObstacleKind::Cone, p, angle);
    }
    rows.push(anchor);
    true
}

fn place_single(pass: &mut Pass<'_>, rng: &mut DeterministicRng, anchor: Vec2) -> bool {
    let idx = rng.pick_weighted(&pass.config.scatter_weights.as_array());
    let kind = ScatterWeights::KINDS[idx];
    let rotation = rng.angle();
    if !fits(pass, kind, anchor) {
        return false;
    }
    place_obstacle(pass, kind, anchor, rotation);
    true
}
