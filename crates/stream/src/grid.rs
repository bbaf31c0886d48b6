//! Desired-set computation over the chunk grid.

use std::collections::BTreeSet;

use scrapyard_common::{ChunkCoord, ChunkGrid, Rect, TrackedEntity};

/// True when the chunk shares positive area with the world bounds.
pub fn chunk_in_world(grid: &ChunkGrid, bounds: &Rect, coord: ChunkCoord) -> bool {
    grid.chunk_rect(coord)
        .intersection(bounds)
        .is_some_and(|r| r.width() > 0.0 && r.height() > 0.0)
}

/// Chunks that should be loaded: everything overlapping the view plus
/// `margin`, and a `radius`-chunk square around each tracked entity, all
/// clipped to the world bounds.
pub fn desired_chunks(
    grid: &ChunkGrid,
    bounds: &Rect,
    view: &Rect,
    margin: f32,
    tracked: &[TrackedEntity],
    radius: i32,
) -> BTreeSet<ChunkCoord> {
    let mut out = BTreeSet::new();
    if grid.is_degenerate() || bounds.is_degenerate() {
        return out;
    }
    if let Some(visible) = view.expand(margin).intersection(bounds) {
        out.extend(grid.chunks_overlapping(&visible));
    }
    let radius = radius.max(0);
    for t in tracked {
        let Some(c) = grid.chunk_of(t.position) else {
            continue;
        };
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                out.insert(ChunkCoord::new(c.x.saturating_add(dx), c.y.saturating_add(dy)));
            }
        }
    }
    out.retain(|c| chunk_in_world(grid, bounds, *c));
    out
}

/// Chunks whose change forces an early recompute: both view corners and
/// every tracked entity's chunk.
pub fn anchor_chunks(
    grid: &ChunkGrid,
    view: &Rect,
    tracked: &[TrackedEntity],
) -> Vec<Option<ChunkCoord>> {
    [view.min, view.max]
        .into_iter()
        .chain(tracked.iter().map(|t| t.position))
        .map(|p| grid.chunk_of(p))
        .collect()
}

/// Order chunks nearest `focus` first; ties fall back to row-major order.
pub fn sort_near_first(coords: &mut [ChunkCoord], focus: ChunkCoord) {
    coords.sort_by_key(|c| {
        let dx = c.x as i64 - focus.x as i64;
        let dy = c.y as i64 - focus.y as i64;
        (c.chebyshev(focus), dx * dx + dy * dy, c.y, c.x)
    });
}
