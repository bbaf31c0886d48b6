use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::Rect;

/// Integer chunk cell in the world grid.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn key(self) -> ChunkKey {
        ChunkKey::pack(self.x, self.y)
    }

    /// Chebyshev distance in chunks.
    pub fn chebyshev(self, other: ChunkCoord) -> i64 {
        let dx = (self.x as i64 - other.x as i64).abs();
        let dy = (self.y as i64 - other.y as i64).abs();
        dx.max(dy)
    }
}

/// Lossless packing of a [`ChunkCoord`] into one integer.
///
/// The high 32 bits hold `x`, the low 32 bits hold `y`, both as their
/// two's-complement bit patterns, so every `i32` pair maps to a distinct key.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkKey(pub u64);

impl ChunkKey {
    pub const fn pack(x: i32, y: i32) -> Self {
        Self(((x as u32 as u64) << 32) | (y as u32 as u64))
    }

    pub const fn unpack(self) -> ChunkCoord {
        ChunkCoord {
            x: (self.0 >> 32) as u32 as i32,
            y: self.0 as u32 as i32,
        }
    }
}

impl From<ChunkCoord> for ChunkKey {
    fn from(c: ChunkCoord) -> Self {
        c.key()
    }
}

/// Maps world positions onto square chunks of a fixed edge length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkGrid {
    chunk_size: f32,
}

impl ChunkGrid {
    pub fn new(chunk_size: f32) -> Self {
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    /// A non-positive or non-finite edge length makes every query a no-op.
    pub fn is_degenerate(&self) -> bool {
        !(self.chunk_size.is_finite() && self.chunk_size > 0.0)
    }

    /// Chunk containing `pos`, by floor division. `None` for a degenerate
    /// grid or a coordinate outside the `i32` chunk range.
    pub fn chunk_of(&self, pos: Vec2) -> Option<ChunkCoord> {
        if self.is_degenerate() {
            return None;
        }
        let fx = (pos.x / self.chunk_size).floor();
        let fy = (pos.y / self.chunk_size).floor();
        let range = i32::MIN as f32..=i32::MAX as f32;
        (range.contains(&fx) && range.contains(&fy)).then(|| ChunkCoord::new(fx as i32, fy as i32))
    }

    /// World-space bounds of a chunk.
    pub fn chunk_rect(&self, coord: ChunkCoord) -> Rect {
        let min = Vec2::new(coord.x as f32, coord.y as f32) * self.chunk_size;
        Rect::new(min, min + Vec2::splat(self.chunk_size))
    }

    /// Every chunk overlapping `rect`, row-major (y outer, x inner).
    pub fn chunks_overlapping(&self, rect: &Rect) -> Vec<ChunkCoord> {
        let (Some(lo), Some(hi)) = (self.chunk_of(rect.min), self.chunk_of(rect.max)) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                out.push(ChunkCoord::new(x, y));
            }
        }
        out
    }
}
