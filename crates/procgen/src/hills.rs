//! Hill and ramp placement.

use glam::Vec2;
use scrapyard_common::{Category, CorridorDescriptor, HillDescriptor, RampDescriptor, Rect};
use scrapyard_kernel::rng::salt;
use scrapyard_kernel::{DeterministicRng, IgnoreSet, clearance_ok, path_clear_capsule};

use crate::chunk_gen::Pass;
use crate::terrain;

/// Vertical speed needed to climb `deficit` under `gravity`, with headroom.
pub fn launch_strength(deficit: f32, gravity: f32, safety: f32) -> f32 {
    (2.0 * gravity * deficit.max(0.0)).sqrt() * safety
}

/// Roll for a hill in the pass's chunk and try up to `hill_attempts`
/// candidates.
pub(crate) fn place_hill(pass: &Pass<'_>) -> Option<HillDescriptor> {
    let cfg = pass.config;
    let mut rng = DeterministicRng::for_chunk(pass.seed(), pass.coord, salt::HILLS);
    if !rng.chance(cfg.hill_chance) {
        return None;
    }
    for attempt in 0..cfg.hill_attempts {
        let radius_x = rng.range(cfg.hill_radius_min, cfg.hill_radius_max);
        let radius_y = rng.range(cfg.hill_radius_min, cfg.hill_radius_max);
        let top_height = rng.range(cfg.hill_height_min, cfg.hill_height_max);
        let area = pass.rect.inset(radius_x.max(radius_y) + cfg.hill_edge_inset);
        let (u, v) = (rng.unit(), rng.unit());
        if area.is_degenerate() {
            continue;
        }
        let hill = HillDescriptor {
            center: area.min + Vec2::new(u * area.width(), v * area.height()),
            radius_x,
            radius_y,
            top_height,
        };
        if hill_fits(pass, &hill) {
            return Some(hill);
        }
        tracing::trace!(attempt, "hill candidate rejected");
    }
    None
}

fn hill_fits(pass: &Pass<'_>, hill: &HillDescriptor) -> bool {
    let cfg = pass.config;
    let reach = hill.max_radius();
    let extent = Rect::from_center_size(hill.center, Vec2::new(hill.radius_x, hill.radius_y) * 2.0);
    let inner = pass.inner_bounds();
    if !inner.contains(extent.min) || !inner.contains(extent.max) {
        return false;
    }
    if pass
        .ctx
        .hills
        .hills()
        .any(|other| {
            other.center.distance(hill.center) < reach + other.max_radius() + cfg.hill_spacing
        })
    {
        return false;
    }
    if pass.near_tracked(hill.center, reach) {
        return false;
    }
    let mask = Category::PLACEMENT.difference(Category::HILL);
    clearance_ok(
        pass.query,
        hill.center,
        reach * cfg.hill_probe_fraction,
        mask,
        &IgnoreSet::new(),
    )
}

/// Run-up tolerances for one round of heading attempts.
struct RunUp {
    min: f32,
    max: f32,
    radius: f32,
}

/// Find a ramp and its run-up corridor for `hill`. `None` leaves the hill
/// without a ramp.
pub(crate) fn place_ramp(
    pass: &Pass<'_>,
    hill: &HillDescriptor,
) -> Option<(RampDescriptor, CorridorDescriptor)> {
    let cfg = pass.config;
    let mut rng = DeterministicRng::for_chunk(pass.seed(), pass.coord, salt::RAMPS);
    let toward_center = pass.world_center() - hill.center;
    let base = if toward_center == Vec2::ZERO {
        0.0
    } else {
        toward_center.to_angle()
    };
    let headings = [
        base,
        base + cfg.ramp_heading_offset,
        base - cfg.ramp_heading_offset,
        rng.angle(),
    ];
    let rounds = [
        RunUp {
            min: cfg.runup_min,
            max: cfg.runup_max,
            radius: cfg.corridor_radius,
        },
        RunUp {
            min: cfg.relaxed_runup_min,
            max: cfg.relaxed_runup_max,
            radius: cfg.relaxed_corridor_radius,
        },
    ];
    for (round, runup) in rounds.iter().enumerate() {
        for heading in headings {
            let length = rng.range(runup.min, runup.max);
            if let Some(found) = try_heading(pass, hill, heading, length, runup.radius) {
                return Some(found);
            }
        }
        tracing::trace!(round, "no ramp heading fits");
    }
    None
}

/// `heading` names the side of the hill the ramp sits on; vehicles drive
/// the opposite way, from the run-up start toward the hill.
fn try_heading(
    pass: &Pass<'_>,
    hill: &HillDescriptor,
    heading: f32,
    runup: f32,
    radius: f32,
) -> Option<(RampDescriptor, CorridorDescriptor)> {
    let cfg = pass.config;
    let side = Vec2::from_angle(heading);
    let inner = pass.inner_bounds();
    let offset = hill.edge_distance(side) + cfg.ramp_gap + cfg.ramp_size.x * 0.5;
    let center = hill.center + side * offset;
    if !inner.contains(center) {
        return None;
    }
    let start = center + side * runup;
    if !inner.contains(start) {
        return None;
    }
    if pass.near_tracked(center, cfg.ramp_size.x * 0.5) || pass.near_tracked(start, radius) {
        return None;
    }
    let mask = Category::TRAVERSAL;
    if !path_clear_capsule(pass.query, start, center, radius, mask, &IgnoreSet::new())
        || !pass.cache.capsule_clear(start, center, radius, mask)
    {
        return None;
    }
    let mut ramp = RampDescriptor {
        center,
        size: cfg.ramp_size,
        heading: (-side).to_angle(),
        launch_strength: 0.0,
    };
    let (near, far) = ramp.ends();
    if !inner.contains(near) || !inner.contains(far) {
        return None;
    }
    let ground = terrain::hill_height(hill, center).max(pass.ctx.hills.height(center));
    ramp.launch_strength =
        launch_strength(hill.top_height - ground, cfg.gravity, cfg.launch_safety);
    Some((
        ramp,
        CorridorDescriptor {
            from: start,
            to: center,
            radius,
        },
    ))
}
