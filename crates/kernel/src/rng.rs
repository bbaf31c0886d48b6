//! Seeded bit-stream generator.
//!
//! Every generator draws from its own stream derived from the world seed, the
//! chunk coordinate and a purpose salt, so no RNG state ever needs to be
//! persisted and toggling one feature never shifts another feature's draws.

use std::f32::consts::PI;

use scrapyard_common::ChunkCoord;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Purpose salts for the independent sub-streams.
pub mod salt {
    pub const OBSTACLES: u64 = 0x4f42_5354_4143_4c45;
    pub const HILLS: u64 = 0x4849_4c4c_5300_0001;
    pub const RAMPS: u64 = 0x5241_4d50_5300_0002;
    pub const PICKUP_BEHIND: u64 = 0x5055_5042_4548_4e44;
    pub const PICKUP_OPEN: u64 = 0x5055_504f_5045_4e00;
    pub const PICKUP_HILLTOP: u64 = 0x5055_5048_494c_4c54;
    pub const SPAWN_SEARCH: u64 = 0x5350_4157_4e00_0003;
}

/// Splitmix64 finalizer: advances `state` by the golden gamma and mixes it.
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(GOLDEN_GAMMA);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Avalanche-mix a seed with a 2D integer coordinate and a purpose salt.
pub fn mix_seed(seed: u64, x: i32, y: i32, salt: u64) -> u64 {
    let mut h = splitmix64(seed ^ salt.rotate_left(17));
    h = splitmix64(h ^ (x as u32 as u64).wrapping_mul(0xd6e8_feb8_6659_fd93));
    splitmix64(h ^ (y as u32 as u64).wrapping_mul(0xa076_1d64_78bd_642f))
}

/// Reproducible splitmix64 stream. Identical seeds give bit-identical output
/// on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Stream for one purpose inside one chunk.
    pub fn for_chunk(seed: u64, coord: ChunkCoord, salt: u64) -> Self {
        Self::new(mix_seed(seed, coord.x, coord.y, salt))
    }

    /// Stream for one cell of a chunk's placement grid.
    pub fn for_cell(seed: u64, coord: ChunkCoord, ix: u32, iy: u32, salt: u64) -> Self {
        let chunk = mix_seed(seed, coord.x, coord.y, salt);
        Self::new(mix_seed(chunk, ix as i32, iy as i32, salt))
    }

    pub fn next_u64(&mut self) -> u64 {
        let out = splitmix64(self.state);
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        out
    }

    /// Uniform float in `[0, 1)` built from the top 24 bits.
    pub fn unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// Uniform float in `[lo, hi)`.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.unit()
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// Uniform integer in `lo..=hi`. Returns `lo` when the range is empty.
    pub fn int_range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi as i64 - lo as i64 + 1) as u64;
        (lo as i64 + (self.next_u64() % span) as i64) as i32
    }

    /// Uniform angle in `[-PI, PI)`.
    pub fn angle(&mut self) -> f32 {
        self.range(-PI, PI)
    }

    /// Index chosen with probability proportional to `weights`.
    /// Non-positive weights are never chosen unless all are.
    pub fn pick_weighted(&mut self, weights: &[f32]) -> usize {
        let total: f32 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 || weights.is_empty() {
            return 0;
        }
        let mut roll = self.unit() * total;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            if roll < *w {
                return i;
            }
            roll -= w;
        }
        weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
    }
}
