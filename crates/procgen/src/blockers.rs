use glam::Vec2;
use scrapyard_common::{Category, Footprint, Rect};
use scrapyard_kernel::{SpatialQuery, capsule_samples};

/// Bounding shapes one chunk pass tests candidates against: neighbouring
/// content gathered once at pass start, then everything placed so far.
///
/// Lives for exactly one generation pass.
#[derive(Debug, Clone, Default)]
pub struct BlockerCache {
    footprints: Vec<Footprint>,
}

impl BlockerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with every collidable in `region` matching `mask`.
    pub fn gather<Q: SpatialQuery + ?Sized>(query: &Q, region: &Rect, mask: Category) -> Self {
        Self {
            footprints: query
                .collidables_in(region, mask)
                .into_iter()
                .map(|c| c.footprint)
                .collect(),
        }
    }

    pub fn push(&mut self, footprint: Footprint) {
        self.footprints.push(footprint);
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Drop everything pushed after the cache had `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.footprints.truncate(len);
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    /// True if the circle overlaps any cached shape whose category
    /// intersects `mask`.
    pub fn blocks_circle(&self, point: Vec2, radius: f32, mask: Category) -> bool {
        self.footprints
            .iter()
            .filter(|fp| fp.category.intersects(mask))
            .any(|fp| fp.overlaps_circle(point, radius))
    }

    /// Sampled capsule test against the cache, same resolution as
    /// [`scrapyard_kernel::path_clear_capsule`].
    pub fn capsule_clear(&self, from: Vec2, to: Vec2, radius: f32, mask: Category) -> bool {
        capsule_samples(from, to, radius).all(|p| !self.blocks_circle(p, radius, mask))
    }
}
