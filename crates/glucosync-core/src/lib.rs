//! # Glucosync Core Library
//!
//! Core logic for glucosync: incremental retrieval of glucose-sensor
//! readings from a third-party health portal and normalization into the
//! record format of a downstream monitoring tool. The CLI binary is a thin
//! layer over this library.
//!
//! ## Architecture
//!
//! - **Sync core**: checkpoint state, fetch-window planning, band merging,
//!   record transformation and the per-cycle orchestration
//! - **Portal**: collaborator interfaces for authentication and raw series
//!   fetching, plus the HTTP client implementation
//! - **Storage**: TOML-based configuration and the on-disk checkpoint
//!
//! ## Key Components
//!
//! - [`SyncOrchestrator`]: runs one fetch cycle end-to-end
//! - [`CheckpointStore`]: persists the incremental-fetch marker
//! - [`Config`]: application configuration management
//! - [`Authenticator`] / [`SeriesFetcher`]: portal collaborator seams

pub mod portal;
pub mod storage;
pub mod sync;
pub mod trend;
pub mod units;

pub use portal::{Authenticator, PortalClient, Session, SeriesFetcher, StoredSessionAuthenticator};
pub use storage::{Config, ConfigError};
pub use sync::{
    Checkpoint, CheckpointStore, CycleOptions, FetchMode, FetchWindow, RawBands, RawPoint,
    SgvRecord, SyncError, SyncOrchestrator, SyncResult, SyncSettings,
};
pub use trend::{Direction, TrendCode};
