//! Checkpoint persistence.
//!
//! The checkpoint marks the newest successfully processed reading and drives
//! the incremental-vs-full fetch decision. It is read at the start of every
//! cycle and overwritten atomically at the end of any cycle that retrieved at
//! least one record. A missing or unreadable checkpoint is never an error:
//! the next cycle simply falls back to a full fetch.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CHECKPOINT_FILE: &str = "checkpoint.json";

/// Error type for checkpoint writes. Reads never fail, see [`CheckpointStore::load`].
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted marker of the newest successfully processed reading.
///
/// `last_reading_time` is `None` iff no successful fetch has ever completed;
/// once set it only moves forward (enforced by the orchestrator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub last_record_id: Option<String>,
    pub last_reading_time: Option<DateTime<Utc>>,
    pub identity: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// File-backed checkpoint store.
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Store backed by `checkpoint.json` inside the given directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(CHECKPOINT_FILE),
        }
    }

    /// Store backed by an explicit file path.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint, treating any read or parse failure as "no
    /// checkpoint". A corrupt file therefore triggers a full fetch instead of
    /// aborting the cycle.
    pub fn load(&self) -> Option<Checkpoint> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no readable checkpoint");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(cp) => Some(cp),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "discarding unparsable checkpoint");
                None
            }
        }
    }

    /// Persist the checkpoint as a whole-file overwrite. Written to a temp
    /// file first and renamed into place so a crash mid-write leaves the
    /// previous checkpoint intact.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(checkpoint)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Remove the persisted checkpoint, forcing the next cycle to full-fetch.
    pub fn clear(&self) -> Result<(), CheckpointError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
