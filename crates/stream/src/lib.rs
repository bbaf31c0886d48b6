//! Streaming: keeps the chunks around the view and tracked entities
//! populated, under per-tick load and removal budgets.
//!
//! # Invariants
//! - A chunk is in the registry only after every entity of its plan was
//!   spawned, and leaves it the moment its unload is enqueued.
//! - No tick loads more than `load_budget` chunks or removes more than
//!   `unload_budget` entities.
//! - A chunk that is reloaded after an unload produces the same plan.
//! - The height field only ever holds hills of registered chunks.

mod budget;
pub mod config;
pub mod grid;
mod manager;

pub use budget::{FrameTimer, StreamConfig, StreamStats};
pub use config::{ConfigLoadError, ScrapyardConfig};
pub use grid::{anchor_chunks, chunk_in_world, desired_chunks, sort_near_first};
pub use manager::{ChunkRecord, StreamInputs, StreamManager};
