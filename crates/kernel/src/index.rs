use std::collections::{BTreeSet, HashMap, HashSet};

use scrapyard_common::{EntityId, Rect};

/// A 2D bucket coordinate in the index grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketCoord {
    pub x: i32,
    pub y: i32,
}

impl BucketCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Uniform-grid spatial index over collidable entities.
///
/// Each entity is registered in every bucket its bounding box touches, so a
/// region query only has to visit the buckets overlapping the region. The
/// index stores identities only; shapes live with the owning world.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    bucket_size: f32,
    buckets: HashMap<BucketCoord, HashSet<EntityId>>,
}

impl SpatialIndex {
    /// Create an index with the given bucket edge length.
    pub fn new(bucket_size: f32) -> Self {
        assert!(bucket_size > 0.0, "bucket_size must be positive");
        Self {
            bucket_size,
            buckets: HashMap::new(),
        }
    }

    pub fn bucket_size(&self) -> f32 {
        self.bucket_size
    }

    /// Bucket containing a world position.
    pub fn bucket_of(&self, x: f32, y: f32) -> BucketCoord {
        BucketCoord {
            x: (x / self.bucket_size).floor() as i32,
            y: (y / self.bucket_size).floor() as i32,
        }
    }

    fn buckets_for(&self, aabb: &Rect) -> impl Iterator<Item = BucketCoord> + use<> {
        let lo = self.bucket_of(aabb.min.x, aabb.min.y);
        let hi = self.bucket_of(aabb.max.x, aabb.max.y);
        (lo.y..=hi.y).flat_map(move |y| (lo.x..=hi.x).map(move |x| BucketCoord::new(x, y)))
    }

    pub fn insert(&mut self, id: EntityId, aabb: &Rect) {
        for coord in self.buckets_for(aabb) {
            self.buckets.entry(coord).or_default().insert(id);
        }
    }

    /// Remove an entity previously inserted with the same bounds.
    pub fn remove(&mut self, id: EntityId, aabb: &Rect) {
        for coord in self.buckets_for(aabb) {
            if let Some(set) = self.buckets.get_mut(&coord) {
                set.remove(&id);
                if set.is_empty() {
                    self.buckets.remove(&coord);
                }
            }
        }
    }

    /// Candidate entities whose buckets overlap `region`, in id order.
    pub fn query(&self, region: &Rect) -> BTreeSet<EntityId> {
        let mut result = BTreeSet::new();
        for coord in self.buckets_for(region) {
            if let Some(set) = self.buckets.get(&coord) {
                result.extend(set.iter().copied());
            }
        }
        result
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of entity placements across all buckets.
    pub fn total_placements(&self) -> usize {
        self.buckets.values().map(|s| s.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Rect {
        Rect::new(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    #[test]
    fn bucket_of_basic() {
        let index = SpatialIndex::new(16.0);
        assert_eq!(index.bucket_of(10.0, 10.0), BucketCoord::new(0, 0));
        assert_eq!(index.bucket_of(20.0, -5.0), BucketCoord::new(1, -1));
    }

    #[test]
    fn large_entity_spans_buckets() {
        let mut index = SpatialIndex::new(16.0);
        index.insert(EntityId(1), &rect(0.0, 0.0, 40.0, 10.0));
        assert_eq!(index.bucket_count(), 3);
        assert_eq!(index.total_placements(), 3);
        assert!(index.query(&rect(35.0, 0.0, 36.0, 1.0)).contains(&EntityId(1)));
    }

    #[test]
    fn remove_clears_empty_buckets() {
        let mut index = SpatialIndex::new(16.0);
        let bounds = rect(-20.0, -20.0, 20.0, 20.0);
        index.insert(EntityId(7), &bounds);
        index.insert(EntityId(8), &rect(1.0, 1.0, 2.0, 2.0));
        index.remove(EntityId(7), &bounds);
        assert_eq!(index.total_placements(), 1);
        assert_eq!(index.bucket_count(), 1);
    }

    #[test]
    fn query_is_sorted_and_deduplicated() {
        let mut index = SpatialIndex::new(10.0);
        for i in (0..20).rev() {
            index.insert(EntityId(i), &rect(0.0, 0.0, 25.0, 25.0));
        }
        let hits: Vec<_> = index.query(&rect(0.0, 0.0, 30.0, 30.0)).into_iter().collect();
        let expected: Vec<_> = (0..20).map(EntityId).collect();
        assert_eq!(hits, expected);
    }

    #[test]
    fn empty_region_returns_empty_set() {
        let index = SpatialIndex::new(16.0);
        assert!(index.query(&rect(99.0, 99.0, 100.0, 100.0)).is_empty());
    }
}
