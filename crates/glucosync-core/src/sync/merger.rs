//! Band merging.
//!
//! The portal splits one time series into three range bands. The merger
//! flattens them back into a single newest-first stream and assigns every
//! point a stable record id, so that repeated fetches of the same underlying
//! reading always resolve to the same identifier.

use tracing::debug;

use crate::sync::types::{MergedPoint, RawBands, RawPoint};

/// Merge the labeled sub-series into one newest-first stream.
///
/// Points are ordered by their upstream epoch timestamp descending; ties keep
/// input order (low, normal, high). Bands are mutually exclusive by portal
/// semantics, so no cross-band deduplication is attempted -- a reading that
/// somehow appears in two bands is kept twice.
pub fn merge(bands: RawBands, source: &str) -> Vec<MergedPoint> {
    let RawBands { low, normal, high } = bands;

    let mut points: Vec<MergedPoint> = low
        .into_iter()
        .chain(normal)
        .chain(high)
        .map(|point| MergedPoint {
            id: record_id(&point, source),
            point,
        })
        .collect();

    // Stable sort: equal timestamps preserve band order.
    points.sort_by(|a, b| b.point.epoch_seconds.cmp(&a.point.epoch_seconds));

    debug!(count = points.len(), source, "merged band series");
    points
}

/// Stable identifier for a point: the portal's native id when present, else a
/// deterministic synthetic id derived from source, timestamp and value.
fn record_id(point: &RawPoint, source: &str) -> String {
    match &point.native_id {
        Some(id) => id.clone(),
        None => format!("{}_{}_{}", source, point.epoch_seconds, point.value_native),
    }
}
