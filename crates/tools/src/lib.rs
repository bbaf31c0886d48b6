//! Developer tooling: read-only inspection of the host world and the
//! streaming state.
//!
//! # Invariants
//! - Inspection never mutates what it looks at.

pub mod inspector;

pub use inspector::{ChunkInfo, EntityInfo, StreamInspector, StreamSummary};
