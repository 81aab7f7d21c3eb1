//! Portal synchronization core.
//!
//! Checkpoint state, fetch-window planning, band merging, record
//! normalization and the per-cycle orchestration that ties them together.

pub mod checkpoint;
pub mod merger;
pub mod orchestrator;
pub mod planner;
pub mod transformer;
pub mod types;


pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use merger::merge;
pub use orchestrator::{CycleOptions, SyncOrchestrator, SyncSettings};
pub use planner::{plan, FullWindowPolicy};
pub use transformer::{transform, TransformOptions, TransformOutcome};
pub use types::{
    Band, FetchMode, FetchWindow, MergedPoint, RawBands, RawPoint, SgvRecord, SyncError,
    SyncResult,
};
