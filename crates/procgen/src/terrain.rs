//! Ground height field built from hill footprints.
//!
//! Queried by the vehicle integrator every physics step, so everything here
//! is closed-form: no allocation, no finite differences on the hot path.

use std::collections::BTreeMap;

use glam::Vec2;
use scrapyard_common::{ChunkKey, HillDescriptor};

/// Normalized radius inside which a hill is flat at its top height.
pub const PLATEAU_FRACTION: f32 = 0.35;

/// Normalized radius beyond which a hill is skipped outright. Between the
/// edge and this radius the falloff is clamped to zero.
pub const GRACE_RADIUS: f32 = 1.05;

/// Default step of [`HeightField::gradient_fd`].
pub const FD_EPSILON: f32 = 0.5;

fn smoothstep(u: f32) -> f32 {
    u * u * (3.0 - 2.0 * u)
}

fn degenerate(hill: &HillDescriptor) -> bool {
    !(hill.radius_x > 0.0 && hill.radius_y > 0.0)
}

/// Height contribution of one hill at `p`.
pub fn hill_height(hill: &HillDescriptor, p: Vec2) -> f32 {
    hill_height_and_gradient(hill, p).0
}

/// Height and analytic gradient of one hill at `p`.
///
/// With `r` the normalized elliptical radius and `u = (r - plateau) / (1 -
/// plateau)` clamped to 1, height is `top * (1 - smoothstep(u))`; the
/// gradient is that formula differentiated through `r`. Past
/// [`GRACE_RADIUS`] the result is zero without evaluating the falloff.
pub fn hill_height_and_gradient(hill: &HillDescriptor, p: Vec2) -> (f32, Vec2) {
    if degenerate(hill) {
        return (0.0, Vec2::ZERO);
    }
    let r = hill.normalized_radius(p);
    if r <= PLATEAU_FRACTION {
        return (hill.top_height, Vec2::ZERO);
    }
    if r > GRACE_RADIUS {
        return (0.0, Vec2::ZERO);
    }
    let span = 1.0 - PLATEAU_FRACTION;
    let u = ((r - PLATEAU_FRACTION) / span).min(1.0);
    let height = hill.top_height * (1.0 - smoothstep(u));
    let dh_dr = -hill.top_height * 6.0 * u * (1.0 - u) / span;
    let d = p - hill.center;
    let dr = Vec2::new(
        d.x / (hill.radius_x * hill.radius_x * r),
        d.y / (hill.radius_y * hill.radius_y * r),
    );
    (height, dr * dh_dr)
}

/// Combined height over `hills`: the maximum single contribution, with the
/// gradient of the hill that wins.
pub fn combined_height_and_gradient<'a>(
    hills: impl IntoIterator<Item = &'a HillDescriptor>,
    p: Vec2,
) -> (f32, Vec2) {
    let mut best = (0.0, Vec2::ZERO);
    for hill in hills {
        let sample = hill_height_and_gradient(hill, p);
        if sample.0 > best.0 {
            best = sample;
        }
    }
    best
}

/// Hills of every loaded chunk, keyed by the chunk that owns them.
///
/// Owned by the streaming manager; a hill enters when its chunk loads and
/// leaves when the chunk leaves the loaded registry.
#[derive(Debug, Clone, Default)]
pub struct HeightField {
    hills: BTreeMap<ChunkKey, HillDescriptor>,
}

impl HeightField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ChunkKey, hill: HillDescriptor) {
        self.hills.insert(key, hill);
    }

    pub fn remove(&mut self, key: ChunkKey) -> Option<HillDescriptor> {
        self.hills.remove(&key)
    }

    pub fn clear(&mut self) {
        self.hills.clear();
    }

    pub fn len(&self) -> usize {
        self.hills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hills.is_empty()
    }

    /// Hills in chunk-key order.
    pub fn hills(&self) -> impl Iterator<Item = &HillDescriptor> {
        self.hills.values()
    }

    pub fn height(&self, p: Vec2) -> f32 {
        self.height_and_gradient(p).0
    }

    pub fn height_and_gradient(&self, p: Vec2) -> (f32, Vec2) {
        combined_height_and_gradient(self.hills.values(), p)
    }

    /// Central-difference gradient. Convenience for tools; physics uses
    /// [`Self::height_and_gradient`].
    pub fn gradient_fd(&self, p: Vec2, eps: f32) -> Vec2 {
        let eps = if eps > 0.0 { eps } else { FD_EPSILON };
        let dx = Vec2::new(eps, 0.0);
        let dy = Vec2::new(0.0, eps);
        Vec2::new(
            self.height(p + dx) - self.height(p - dx),
            self.height(p + dy) - self.height(p - dy),
        ) / (2.0 * eps)
    }
}
