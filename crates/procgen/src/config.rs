use glam::Vec2;
use scrapyard_common::{ChunkGrid, ObstacleKind, Rect};
use serde::{Deserialize, Serialize};

/// Smallest obstacle cell edge that still lays out a grid.
pub const MIN_CELL_SIZE: f32 = 1.0;

/// Upper bound on obstacle cells along one chunk edge.
pub const MAX_CELLS_PER_AXIS: u32 = 256;

/// Errors from configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("chunk size must be positive and finite, got {0}")]
    NonPositiveChunkSize(f32),
    #[error("world bounds have no area: {0:?}")]
    DegenerateBounds(Rect),
    #[error("obstacle cell size {0} does not lay out a grid over the chunk")]
    BadCellSize(f32),
    #[error("{field} must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f32 },
    #[error("range {field} is inverted: {min} > {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("cone row spacing {spacing} cannot satisfy minimum spacing {min_spacing}")]
    ConeRowTooTight { spacing: f32, min_spacing: f32 },
    #[error("{0} must be at least 1")]
    ZeroBudget(&'static str),
}

/// Fixed world parameters, chosen at world creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Sole source of generation randomness.
    pub seed: u64,
    pub bounds: Rect,
    pub chunk_size: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            bounds: Rect::new(Vec2::splat(-16384.0), Vec2::splat(16384.0)),
            chunk_size: 2048.0,
        }
    }
}

impl WorldConfig {
    pub fn grid(&self) -> ChunkGrid {
        ChunkGrid::new(self.chunk_size)
    }

    /// True when generation and streaming must be no-ops.
    pub fn is_degenerate(&self) -> bool {
        self.grid().is_degenerate() || self.bounds.is_degenerate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid().is_degenerate() {
            return Err(ConfigError::NonPositiveChunkSize(self.chunk_size));
        }
        if self.bounds.is_degenerate() {
            return Err(ConfigError::DegenerateBounds(self.bounds));
        }
        Ok(())
    }
}

/// Relative odds of each kind in single-scatter placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterWeights {
    pub cone: f32,
    pub rock: f32,
    pub barrel: f32,
    pub steel: f32,
    pub hole: f32,
}

impl Default for ScatterWeights {
    fn default() -> Self {
        Self {
            cone: 0.22,
            rock: 0.34,
            barrel: 0.22,
            steel: 0.14,
            hole: 0.08,
        }
    }
}

impl ScatterWeights {
    pub const KINDS: [ObstacleKind; 5] = [
        ObstacleKind::Cone,
        ObstacleKind::Rock,
        ObstacleKind::Barrel,
        ObstacleKind::Steel,
        ObstacleKind::Hole,
    ];

    pub fn as_array(&self) -> [f32; 5] {
        [self.cone, self.rock, self.barrel, self.steel, self.hole]
    }
}

/// Placement clearance radius per obstacle kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleClearance {
    pub rock: f32,
    pub barrel: f32,
    pub cone: f32,
    pub barrier: f32,
    pub steel: f32,
    pub hole: f32,
}

impl Default for ObstacleClearance {
    fn default() -> Self {
        Self {
            rock: 72.0,
            barrel: 44.0,
            cone: 30.0,
            barrier: 76.0,
            steel: 62.0,
            hole: 70.0,
        }
    }
}

impl ObstacleClearance {
    pub fn of(&self, kind: ObstacleKind) -> f32 {
        match kind {
            ObstacleKind::Rock => self.rock,
            ObstacleKind::Barrel => self.barrel,
            ObstacleKind::Cone => self.cone,
            ObstacleKind::Barrier => self.barrier,
            ObstacleKind::Steel => self.steel,
            ObstacleKind::Hole => self.hole,
        }
    }

    pub fn max(&self) -> f32 {
        [
            self.rock,
            self.barrel,
            self.cone,
            self.barrier,
            self.steel,
            self.hole,
        ]
        .into_iter()
        .fold(0.0, f32::max)
    }
}

/// Every tunable of the placement algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    // --- obstacles ---
    /// Edge length of the per-chunk scatter grid cells.
    pub obstacle_cell_size: f32,
    /// Jitter margin kept free inside each cell.
    pub cell_inset: f32,
    /// Content stays this far inside the world bounds.
    pub border_margin: f32,
    /// Placement probability at the world center.
    pub core_density: f32,
    /// Placement probability at the world frontier.
    pub frontier_density: f32,
    pub density_exponent: f32,
    /// No two obstacle anchors closer than this.
    pub min_spacing: f32,
    pub barrier_chance: f32,
    pub flank_back: f32,
    pub flank_lateral: f32,
    pub cone_row_chance: f32,
    pub cone_row_min: i32,
    pub cone_row_max: i32,
    pub cone_row_spacing: f32,
    /// Minimum distance between two row centers in one chunk.
    pub cone_row_separation: f32,
    pub scatter_weights: ScatterWeights,
    pub clearance: ObstacleClearance,

    // --- hills ---
    pub hill_chance: f32,
    pub hill_attempts: u32,
    pub hill_radius_min: f32,
    pub hill_radius_max: f32,
    pub hill_height_min: f32,
    pub hill_height_max: f32,
    pub hill_edge_inset: f32,
    pub hill_spacing: f32,
    /// Clearance probe radius as a fraction of the hill radius.
    pub hill_probe_fraction: f32,

    // --- ramps ---
    /// Ramp length (along heading) and width.
    pub ramp_size: Vec2,
    pub ramp_gap: f32,
    pub ramp_heading_offset: f32,
    pub runup_min: f32,
    pub runup_max: f32,
    pub corridor_radius: f32,
    pub relaxed_runup_min: f32,
    pub relaxed_runup_max: f32,
    pub relaxed_corridor_radius: f32,
    pub gravity: f32,
    pub launch_safety: f32,

    // --- pickups ---
    pub pickup_behind_chance: f32,
    pub pickup_open_chance: f32,
    pub pickup_hilltop_chance: f32,
    pub pickup_nearest_k: usize,
    pub pickup_gap: f32,
    pub pickup_jitter: f32,
    pub pickup_sweep_step: f32,
    pub pickup_clearance: f32,
    pub pickup_min_tracked_distance: f32,
    /// Pickups never land this close to the world edge.
    pub border_band: f32,
    pub open_attempts: u32,
    pub hill_avoid_margin: f32,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            obstacle_cell_size: 256.0,
            cell_inset: 24.0,
            border_margin: 80.0,
            core_density: 0.18,
            frontier_density: 0.7,
            density_exponent: 2.0,
            min_spacing: 48.0,
            barrier_chance: 0.10,
            flank_back: 52.0,
            flank_lateral: 96.0,
            cone_row_chance: 0.16,
            cone_row_min: 4,
            cone_row_max: 7,
            cone_row_spacing: 64.0,
            cone_row_separation: 640.0,
            scatter_weights: ScatterWeights::default(),
            clearance: ObstacleClearance::default(),

            hill_chance: 0.35,
            hill_attempts: 4,
            hill_radius_min: 180.0,
            hill_radius_max: 320.0,
            hill_height_min: 90.0,
            hill_height_max: 160.0,
            hill_edge_inset: 64.0,
            hill_spacing: 256.0,
            hill_probe_fraction: 0.6,

            ramp_size: Vec2::new(140.0, 110.0),
            ramp_gap: 24.0,
            ramp_heading_offset: 0.35,
            runup_min: 260.0,
            runup_max: 480.0,
            corridor_radius: 70.0,
            relaxed_runup_min: 160.0,
            relaxed_runup_max: 300.0,
            relaxed_corridor_radius: 48.0,
            gravity: 980.0,
            launch_safety: 1.15,

            pickup_behind_chance: 0.4,
            pickup_open_chance: 0.1,
            pickup_hilltop_chance: 0.8,
            pickup_nearest_k: 4,
            pickup_gap: 48.0,
            pickup_jitter: 20.0,
            pickup_sweep_step: 0.45,
            pickup_clearance: 40.0,
            pickup_min_tracked_distance: 480.0,
            border_band: 320.0,
            open_attempts: 6,
            hill_avoid_margin: 48.0,
        }
    }
}

impl GenConfig {
    /// Farthest an obstacle can land outside the chunk whose cell proposed
    /// its anchor: half the longest cone row, or a barrier's flanking cone.
    pub fn obstacle_overhang(&self) -> f32 {
        let longest = self.cone_row_min.max(self.cone_row_max).max(1) - 1;
        let row = self.cone_row_spacing.max(0.0) * longest as f32 * 0.5;
        let flank = Vec2::new(self.flank_back, self.flank_lateral).length();
        row.max(flank)
    }

    /// Margin around a chunk from which neighbouring content is gathered
    /// into the blocker cache. Covers every obstacle overhang plus the
    /// widest clearance checked around it.
    pub fn context_margin(&self) -> f32 {
        self.obstacle_overhang()
            + self.clearance.max().max(self.min_spacing)
            + self.pickup_clearance
    }

    /// True when the obstacle cell grid cannot be laid out over a chunk of
    /// `world`. Generation is a no-op in that case.
    pub fn is_degenerate(&self, world: &WorldConfig) -> bool {
        let cell = self.obstacle_cell_size;
        !(cell.is_finite() && cell >= MIN_CELL_SIZE)
            || world.chunk_size / cell > MAX_CELLS_PER_AXIS as f32
    }

    pub fn validate(&self, world: &WorldConfig) -> Result<(), ConfigError> {
        world.validate()?;
        if self.is_degenerate(world) || self.obstacle_cell_size > world.chunk_size {
            return Err(ConfigError::BadCellSize(self.obstacle_cell_size));
        }
        for (field, value) in [
            ("core_density", self.core_density),
            ("frontier_density", self.frontier_density),
            ("barrier_chance", self.barrier_chance),
            ("cone_row_chance", self.cone_row_chance),
            ("hill_chance", self.hill_chance),
            ("pickup_behind_chance", self.pickup_behind_chance),
            ("pickup_open_chance", self.pickup_open_chance),
            ("pickup_hilltop_chance", self.pickup_hilltop_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { field, value });
            }
        }
        for (field, min, max) in [
            ("hill_radius", self.hill_radius_min, self.hill_radius_max),
            ("hill_height", self.hill_height_min, self.hill_height_max),
            ("runup", self.runup_min, self.runup_max),
            ("relaxed_runup", self.relaxed_runup_min, self.relaxed_runup_max),
            ("cone_row", self.cone_row_min as f32, self.cone_row_max as f32),
        ] {
            if min > max {
                return Err(ConfigError::InvertedRange { field, min, max });
            }
        }
        let cone_radius = ObstacleKind::Cone.footprint_radius();
        if self.cone_row_spacing < self.min_spacing + cone_radius {
            return Err(ConfigError::ConeRowTooTight {
                spacing: self.cone_row_spacing,
                min_spacing: self.min_spacing,
            });
        }
        Ok(())
    }
}
