//! Record normalization.
//!
//! Maps merged raw points into the downstream monitoring tool's record
//! format: timestamp correction, unit conversion, trend mapping and a
//! plausibility filter for corrupt or sentinel upstream values.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sync::types::{MergedPoint, SgvRecord};
use crate::trend::Direction;
use crate::units;

/// Transformation settings for one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Correction applied to every upstream timestamp, in hours. The observed
    /// portal labels readings two hours ahead of the true instant, hence the
    /// -2 default; other deployments may need a different value.
    pub timestamp_correction_hours: i64,
    /// Device label stamped on every output record.
    pub device: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            timestamp_correction_hours: -2,
            device: "glucosync".to_string(),
        }
    }
}

/// Result of one transformation pass.
#[derive(Debug, Clone, Default)]
pub struct TransformOutcome {
    /// Surviving records, newest first by corrected timestamp.
    pub records: Vec<SgvRecord>,
    /// Points excluded by the plausibility filter.
    pub dropped: usize,
}

/// Normalize merged points into downstream records.
///
/// Implausible native values (<= 0 or >= 30 mmol/L) are dropped and counted,
/// never surfaced as a cycle failure.
pub fn transform(points: &[MergedPoint], opts: &TransformOptions) -> TransformOutcome {
    let correction = Duration::hours(opts.timestamp_correction_hours);
    let mut outcome = TransformOutcome::default();

    for merged in points {
        let point = &merged.point;

        if !units::is_plausible_mmol(point.value_native) {
            warn!(
                id = %merged.id,
                value = point.value_native,
                "dropping implausible reading"
            );
            outcome.dropped += 1;
            continue;
        }

        let Some(corrected) = point
            .instant()
            .and_then(|instant| instant.checked_add_signed(correction))
        else {
            warn!(
                id = %merged.id,
                epoch = point.epoch_seconds,
                "dropping reading with unrepresentable timestamp"
            );
            outcome.dropped += 1;
            continue;
        };
        outcome.records.push(SgvRecord {
            kind: "sgv".to_string(),
            sgv: units::mmol_to_mgdl(point.value_native),
            sgv_native: point.value_native,
            date: corrected.timestamp_millis(),
            date_string: corrected.to_rfc3339(),
            local_time: corrected.format("%Y-%m-%d %H:%M:%S").to_string(),
            direction: Direction::from_trend_code(point.trend_code.as_ref()),
            device: opts.device.clone(),
            source_id: merged.id.clone(),
            transmitter_id: point.transmitter_id.clone(),
            noise: point.noise,
            filtered: point.filtered,
            unfiltered: point.unfiltered,
            rssi: point.rssi,
        });
    }

    // Canonical output order. Stable, so input band order survives ties.
    outcome.records.sort_by(|a, b| b.date.cmp(&a.date));

    debug!(
        kept = outcome.records.len(),
        dropped = outcome.dropped,
        "transformed readings"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::{Band, RawPoint};
    use crate::trend::TrendCode;

    fn merged(epoch: i64, value: f64, trend: Option<TrendCode>) -> MergedPoint {
        MergedPoint {
            id: format!("portal_{epoch}_{value}"),
            point: RawPoint {
                band: Band::Normal,
                epoch_seconds: epoch,
                value_native: value,
                timestamp_label: String::new(),
                meal_tag: String::new(),
                calculated: false,
                trend_code: trend,
                native_id: None,
                transmitter_id: None,
                noise: None,
                filtered: None,
                unfiltered: None,
                rssi: None,
            },
        }
    }

    #[test]
    fn converts_units_and_keeps_both_values() {
        let points = vec![merged(1724990400, 5.0, None)];
        let out = transform(&points, &TransformOptions::default());
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].sgv, 90);
        assert_eq!(out.records[0].sgv_native, 5.0);
        assert_eq!(out.records[0].kind, "sgv");
    }

    #[test]
    fn applies_timestamp_correction() {
        let epoch = 1724990400i64; // 2024-08-30 04:00:00 UTC
        let points = vec![merged(epoch, 6.0, None)];
        let out = transform(&points, &TransformOptions::default());
        let expected_millis = (epoch - 2 * 3600) * 1000;
        assert_eq!(out.records[0].date, expected_millis);
        assert!(out.records[0].date_string.starts_with("2024-08-30T02:00:00"));
        assert_eq!(out.records[0].local_time, "2024-08-30 02:00:00");
    }

    #[test]
    fn correction_offset_is_configurable() {
        let epoch = 1724990400i64;
        let opts = TransformOptions {
            timestamp_correction_hours: 0,
            device: "glucosync".into(),
        };
        let out = transform(&[merged(epoch, 6.0, None)], &opts);
        assert_eq!(out.records[0].date, epoch * 1000);
    }

    #[test]
    fn drops_out_of_range_values_and_counts_them() {
        let points = vec![
            merged(400, 0.0, None),
            merged(300, 30.0, None),
            merged(200, 0.01, None),
            merged(100, 29.99, None),
        ];
        let out = transform(&points, &TransformOptions::default());
        assert_eq!(out.dropped, 2);
        let natives: Vec<f64> = out.records.iter().map(|r| r.sgv_native).collect();
        assert_eq!(natives, vec![0.01, 29.99]);
    }

    #[test]
    fn drops_readings_with_unrepresentable_timestamps() {
        let points = vec![merged(i64::MAX, 5.0, None), merged(1724990400, 5.5, None)];
        let out = transform(&points, &TransformOptions::default());
        assert_eq!(out.dropped, 1);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].sgv_native, 5.5);
    }

    #[test]
    fn maps_trend_and_defaults_unknown_to_none() {
        let points = vec![
            merged(300, 5.0, Some(TrendCode::Text("RISING".into()))),
            merged(200, 5.0, Some(TrendCode::Numeric(99))),
            merged(100, 5.0, None),
        ];
        let out = transform(&points, &TransformOptions::default());
        assert_eq!(out.records[0].direction, Direction::SingleUp);
        assert_eq!(out.records[1].direction, Direction::None);
        assert_eq!(out.records[2].direction, Direction::None);
    }

    #[test]
    fn output_is_newest_first_by_corrected_timestamp() {
        let points = vec![
            merged(100, 5.0, None),
            merged(300, 5.5, None),
            merged(200, 6.0, None),
        ];
        let out = transform(&points, &TransformOptions::default());
        let dates: Vec<i64> = out.records.iter().map(|r| r.date).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
    }

    #[test]
    fn carries_instrument_fields_only_when_present() {
        let mut with_fields = merged(200, 5.0, None);
        with_fields.point.transmitter_id = Some("TX1".into());
        with_fields.point.noise = Some(1);
        with_fields.point.rssi = Some(-70);
        let bare = merged(100, 5.0, None);

        let out = transform(&[with_fields, bare], &TransformOptions::default());
        assert_eq!(out.records[0].transmitter_id.as_deref(), Some("TX1"));
        assert_eq!(out.records[0].noise, Some(1));
        assert_eq!(out.records[0].rssi, Some(-70));
        assert!(out.records[1].transmitter_id.is_none());
        assert!(out.records[1].noise.is_none());
    }
}
