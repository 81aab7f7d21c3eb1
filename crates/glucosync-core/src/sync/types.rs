//! Core types for portal synchronization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trend::{Direction, TrendCode};

/// Glucose-range band the portal partitions its time series into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    #[default]
    Normal,
    High,
}

/// One raw reading as delivered by the portal. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    /// Band is assigned by the fetcher from the list the point arrived in.
    #[serde(default, skip_serializing_if = "is_default_band")]
    pub band: Band,
    /// Reading time on the upstream clock, seconds since epoch.
    #[serde(rename = "timestamp")]
    pub epoch_seconds: i64,
    /// Glucose value in the portal's native unit (mmol/L).
    #[serde(rename = "glucoseValue")]
    pub value_native: f64,
    /// The portal's own human-readable timestamp label.
    #[serde(rename = "appTime", default)]
    pub timestamp_label: String,
    /// Meal annotation, empty when absent.
    #[serde(rename = "mealFlag", default)]
    pub meal_tag: String,
    /// Whether the portal interpolated this point.
    #[serde(rename = "isCalculated", default)]
    pub calculated: bool,
    /// Trend code, textual or numeric.
    #[serde(rename = "trend", default)]
    pub trend_code: Option<TrendCode>,
    /// Native record id, when the portal provides one.
    #[serde(rename = "recordId", default)]
    pub native_id: Option<String>,
    #[serde(rename = "transmitterId", default)]
    pub transmitter_id: Option<String>,
    #[serde(default)]
    pub noise: Option<i64>,
    #[serde(default)]
    pub filtered: Option<f64>,
    #[serde(default)]
    pub unfiltered: Option<f64>,
    #[serde(default)]
    pub rssi: Option<i64>,
}

fn is_default_band(band: &Band) -> bool {
    *band == Band::Normal
}

impl RawPoint {
    /// Reading time as an absolute instant on the upstream clock, or `None`
    /// when the epoch is outside the representable range.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.epoch_seconds, 0)
    }
}

/// The three labeled sub-series of one fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBands {
    pub low: Vec<RawPoint>,
    pub normal: Vec<RawPoint>,
    pub high: Vec<RawPoint>,
}

impl RawBands {
    pub fn len(&self) -> usize {
        self.low.len() + self.normal.len() + self.high.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetch classification for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    Full,
    Incremental,
}

/// Concrete fetch boundary for one cycle. Derived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub mode: FetchMode,
}

/// A raw point with its stable record identifier assigned by the merger.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPoint {
    pub id: String,
    pub point: RawPoint,
}

/// Normalized reading in the downstream monitoring tool's record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgvRecord {
    #[serde(rename = "type")]
    pub kind: String,
    /// Value in the target unit (mg/dL), rounded.
    pub sgv: i32,
    /// Value in the portal's native unit (mmol/L).
    pub sgv_native: f64,
    /// Corrected reading time, epoch milliseconds.
    pub date: i64,
    #[serde(rename = "dateString")]
    pub date_string: String,
    #[serde(rename = "localTime")]
    pub local_time: String,
    pub direction: Direction,
    pub device: String,
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(rename = "transmitterId", skip_serializing_if = "Option::is_none", default)]
    pub transmitter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub noise: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub filtered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unfiltered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rssi: Option<i64>,
}

/// Outcome of one sync cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub success: bool,
    /// Normalized records, newest first. Empty on failure.
    pub records: Vec<SgvRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_millis: u64,
}

/// Sync error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Credentials rejected by the portal. Fatal, not retried.
    #[error("authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },

    /// Session lapsed mid-cycle. Retried with forced re-authentication.
    #[error("portal session expired")]
    AuthExpired,

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Portal answered but the payload signals an application-level error.
    #[error("portal error: {0}")]
    Portal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether the orchestrator should retry the cycle after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::AuthExpired | SyncError::Transport(_) | SyncError::Portal(_)
        )
    }
}
