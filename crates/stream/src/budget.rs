use std::collections::VecDeque;
use std::time::Duration;

use scrapyard_procgen::ConfigError;
use serde::{Deserialize, Serialize};

/// Streaming configuration: desired-set margins, refresh throttle and
/// per-tick budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// World units added around the view rectangle.
    pub view_margin: f32,
    /// Square radius (in chunks) kept loaded around each tracked entity.
    pub tracked_radius: i32,
    /// Seconds between desired-set recomputations when nothing moved
    /// across a chunk border.
    pub refresh_interval: f32,
    /// Maximum chunk loads per tick.
    pub load_budget: usize,
    /// Maximum entity removals per tick.
    pub unload_budget: usize,
    /// Ticks of duration history kept by the frame timer.
    pub timer_history: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            view_margin: 512.0,
            tracked_radius: 1,
            refresh_interval: 0.25,
            load_budget: 2,
            unload_budget: 64,
            timer_history: 120,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_budget == 0 {
            return Err(ConfigError::ZeroBudget("load_budget"));
        }
        if self.unload_budget == 0 {
            return Err(ConfigError::ZeroBudget("unload_budget"));
        }
        Ok(())
    }
}

/// Per-tick streaming statistics for instrumentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamStats {
    /// Whether the desired set was recomputed this tick.
    pub refreshed: bool,
    pub chunks_loaded: usize,
    /// Chunks whose unload batch finished draining this tick.
    pub chunks_unloaded: usize,
    pub entities_spawned: usize,
    /// Entities actually despawned this tick.
    pub entities_removed: usize,
    /// Queued handles the host no longer knew. They still use removal budget.
    pub stale_handles: usize,
    /// Loads held back because the same chunk is still draining.
    pub loads_deferred: usize,
    pub pending_loads: usize,
    pub pending_removals: usize,
    pub loaded_chunks: usize,
    pub tick_time: Duration,
}

/// Rolling window of tick durations.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one sample, evicting the oldest once full.
    pub fn record(&mut self, dt: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(dt);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn last(&self) -> Option<Duration> {
        self.samples.back().copied()
    }

    pub fn average(&self) -> Duration {
        match self.samples.len() {
            0 => Duration::ZERO,
            n => self.samples.iter().sum::<Duration>() / n as u32,
        }
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.samples.iter().copied().min().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_config_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.load_budget, 2);
        assert_eq!(config.unload_budget, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_budgets_are_rejected() {
        let config = StreamConfig {
            load_budget: 0,
            ..StreamConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBudget("load_budget")));
        let config = StreamConfig {
            unload_budget: 0,
            ..StreamConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBudget("unload_budget")));
    }

    #[test]
    fn frame_timer_tracks_history() {
        let mut timer = FrameTimer::new(3);
        assert_eq!(timer.average(), Duration::ZERO);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
        assert_eq!(timer.min(), Duration::from_millis(10));
        assert_eq!(timer.last(), Some(Duration::from_millis(30)));
    }

    #[test]
    fn frame_timer_evicts_oldest() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
        timer.clear();
        assert_eq!(timer.count(), 0);
    }
}
