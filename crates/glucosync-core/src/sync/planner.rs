//! Fetch window planning.
//!
//! Decides, per cycle, whether to run a full or an incremental fetch and what
//! concrete time boundary to request from the portal. Pure function of its
//! inputs; the effect of a window is only ever persisted via the checkpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::sync::checkpoint::Checkpoint;
use crate::sync::types::{FetchMode, FetchWindow};

/// Shape of the window used for a full fetch.
///
/// The portal accepts both a rolling look-back and calendar-day boundaries;
/// rolling look-back is the default because it honors the caller's requested
/// horizon exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FullWindowPolicy {
    #[default]
    RollingLookback,
    CalendarDay,
}

/// Plan the fetch window for one cycle.
///
/// Full mode is chosen when the caller forces it or when the checkpoint has
/// never recorded a successful fetch. Incremental windows start exactly at the
/// checkpointed last reading time. A checkpoint ahead of `now` (clock skew)
/// clamps to an empty `[now, now]` window instead of failing.
pub fn plan(
    now: DateTime<Utc>,
    checkpoint: Option<&Checkpoint>,
    lookback_hours: i64,
    force_full: bool,
    policy: FullWindowPolicy,
) -> FetchWindow {
    let last_reading = checkpoint.and_then(|cp| {
        match (&cp.last_record_id, cp.last_reading_time) {
            (Some(_), Some(time)) => Some(time),
            _ => None,
        }
    });

    match last_reading {
        Some(time) if !force_full => {
            let start = if time > now { now } else { time };
            FetchWindow {
                start,
                end: now,
                mode: FetchMode::Incremental,
            }
        }
        _ => full_window(now, lookback_hours, policy),
    }
}

fn full_window(now: DateTime<Utc>, lookback_hours: i64, policy: FullWindowPolicy) -> FetchWindow {
    let (start, end) = match policy {
        FullWindowPolicy::RollingLookback => (now - Duration::hours(lookback_hours), now),
        FullWindowPolicy::CalendarDay => {
            let day_start = now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc();
            (day_start, day_start + Duration::days(1))
        }
    };
    FetchWindow {
        start,
        end,
        mode: FetchMode::Full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn checkpoint_at(time: DateTime<Utc>) -> Checkpoint {
        Checkpoint {
            last_record_id: Some("portal_1724990400_5.8".into()),
            last_reading_time: Some(time),
            identity: Some("user-1".into()),
            saved_at: time,
        }
    }

    #[test]
    fn no_checkpoint_plans_full_rolling_window() {
        let now = Utc.with_ymd_and_hms(2024, 8, 30, 12, 0, 0).unwrap();
        let window = plan(now, None, 24, false, FullWindowPolicy::RollingLookback);
        assert_eq!(window.mode, FetchMode::Full);
        assert_eq!(window.start, now - Duration::hours(24));
        assert_eq!(window.end, now);
    }

    #[test]
    fn incremental_window_starts_exactly_at_checkpoint_time() {
        let now = Utc.with_ymd_and_hms(2024, 8, 30, 12, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2024, 8, 30, 9, 30, 0).unwrap();
        let cp = checkpoint_at(last);
        let window = plan(now, Some(&cp), 24, false, FullWindowPolicy::RollingLookback);
        assert_eq!(window.mode, FetchMode::Incremental);
        assert_eq!(window.start, last);
        assert_eq!(window.end, now);
    }

    #[test]
    fn force_full_overrides_checkpoint() {
        let now = Utc.with_ymd_and_hms(2024, 8, 30, 12, 0, 0).unwrap();
        let cp = checkpoint_at(now - Duration::hours(1));
        let window = plan(now, Some(&cp), 6, true, FullWindowPolicy::RollingLookback);
        assert_eq!(window.mode, FetchMode::Full);
        assert_eq!(window.start, now - Duration::hours(6));
    }

    #[test]
    fn checkpoint_without_record_id_plans_full() {
        let now = Utc.with_ymd_and_hms(2024, 8, 30, 12, 0, 0).unwrap();
        let cp = Checkpoint {
            last_record_id: None,
            last_reading_time: Some(now - Duration::hours(1)),
            identity: None,
            saved_at: now,
        };
        let window = plan(now, Some(&cp), 24, false, FullWindowPolicy::RollingLookback);
        assert_eq!(window.mode, FetchMode::Full);
    }

    #[test]
    fn clock_skew_clamps_to_empty_window() {
        let now = Utc.with_ymd_and_hms(2024, 8, 30, 12, 0, 0).unwrap();
        let cp = checkpoint_at(now + Duration::minutes(10));
        let window = plan(now, Some(&cp), 24, false, FullWindowPolicy::RollingLookback);
        assert_eq!(window.mode, FetchMode::Incremental);
        assert_eq!(window.start, now);
        assert_eq!(window.end, now);
    }

    #[test]
    fn calendar_day_policy_covers_the_whole_day() {
        let now = Utc.with_ymd_and_hms(2024, 8, 30, 14, 45, 12).unwrap();
        let window = plan(now, None, 24, false, FullWindowPolicy::CalendarDay);
        assert_eq!(window.mode, FetchMode::Full);
        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2024, 8, 30, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 8, 31, 0, 0, 0).unwrap()
        );
    }
}
