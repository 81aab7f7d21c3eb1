//! One-cycle sync orchestration.
//!
//! Composes checkpoint load, session acquisition, window planning, fetch,
//! merge, transform and checkpoint update into a single pipeline pass. A
//! cycle either succeeds with newest-first records or fails with an error
//! description and an empty record set; `run_cycle` itself never propagates
//! an error. Callers must serialize invocations against the same checkpoint
//! file -- there is no internal locking.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::portal::session::Session;
use crate::portal::traits::{Authenticator, SeriesFetcher};
use crate::sync::checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
use crate::sync::merger;
use crate::sync::planner::{self, FullWindowPolicy};
use crate::sync::transformer::{self, TransformOptions};
use crate::sync::types::{MergedPoint, SgvRecord, SyncError, SyncResult};

/// Orchestrator settings, normally filled from the stored config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Look-back horizon for full fetches, in hours.
    pub lookback_hours: i64,
    /// Total attempts per cycle, including the first.
    pub max_retries: u32,
    /// Backoff base; attempt `n` waits `base_delay_ms * (n - 1)` before running.
    pub base_delay_ms: u64,
    pub full_window_policy: FullWindowPolicy,
    /// Source tag used for synthetic record ids.
    pub source: String,
    pub transform: TransformOptions,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            max_retries: 3,
            base_delay_ms: 5000,
            full_window_policy: FullWindowPolicy::default(),
            source: "portal".to_string(),
            transform: TransformOptions::default(),
        }
    }
}

/// Per-cycle options from the caller.
#[derive(Debug, Clone, Default)]
pub struct CycleOptions {
    /// Override for the configured look-back horizon.
    pub lookback_hours: Option<i64>,
    pub force_full: bool,
}

/// Runs fetch cycles against a portal.
pub struct SyncOrchestrator<A, F> {
    authenticator: A,
    fetcher: F,
    checkpoints: CheckpointStore,
    settings: SyncSettings,
    session: Option<Session>,
}

impl<A: Authenticator, F: SeriesFetcher> SyncOrchestrator<A, F> {
    pub fn new(
        authenticator: A,
        fetcher: F,
        checkpoints: CheckpointStore,
        settings: SyncSettings,
    ) -> Self {
        Self {
            authenticator,
            fetcher,
            checkpoints,
            settings,
            session: None,
        }
    }

    /// Run one full fetch-and-transform cycle.
    ///
    /// Retries the whole cycle on retryable errors (lapsed session, network,
    /// portal hiccups) with linear backoff; fatal authentication errors fail
    /// immediately. Each retry starts fresh -- no partial work is carried
    /// across attempts.
    pub fn run_cycle(&mut self, options: &CycleOptions) -> SyncResult {
        let started = Instant::now();
        let checkpoint = self.checkpoints.load();
        let lookback = options
            .lookback_hours
            .unwrap_or(self.settings.lookback_hours);

        let mut force_new_session = false;
        let mut last_error: Option<SyncError> = None;

        for attempt in 1..=self.settings.max_retries.max(1) {
            if attempt > 1 {
                let delay = self.settings.base_delay_ms * u64::from(attempt - 1);
                std::thread::sleep(std::time::Duration::from_millis(delay));
            }

            match self.attempt_cycle(
                checkpoint.as_ref(),
                lookback,
                options.force_full,
                force_new_session,
            ) {
                Ok((merged, records, dropped)) => {
                    self.update_checkpoint(checkpoint.as_ref(), &merged, &records);
                    info!(
                        records = records.len(),
                        dropped, attempt, "sync cycle succeeded"
                    );
                    return SyncResult {
                        success: true,
                        records,
                        error: None,
                        duration_millis: started.elapsed().as_millis() as u64,
                    };
                }
                Err(e) => {
                    if matches!(e, SyncError::AuthExpired) {
                        self.session = None;
                        force_new_session = true;
                    }
                    if !e.is_retryable() {
                        return Self::failure(e.to_string(), started);
                    }
                    warn!(attempt, error = %e, "sync attempt failed, will retry");
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "sync retries exhausted".to_string());
        Self::failure(message, started)
    }

    /// Checkpoint pass-through for tooling that inspects sync state.
    pub fn load_checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoints.load()
    }

    /// Checkpoint pass-through for tooling that rewrites sync state.
    pub fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        self.checkpoints.save(checkpoint)
    }

    fn failure(message: String, started: Instant) -> SyncResult {
        SyncResult {
            success: false,
            records: Vec::new(),
            error: Some(message),
            duration_millis: started.elapsed().as_millis() as u64,
        }
    }

    /// One attempt: session, window, fetch, merge, transform.
    fn attempt_cycle(
        &mut self,
        checkpoint: Option<&Checkpoint>,
        lookback_hours: i64,
        force_full: bool,
        force_new_session: bool,
    ) -> Result<(Vec<MergedPoint>, Vec<SgvRecord>, usize), SyncError> {
        let session = self.session(force_new_session)?;
        let window = planner::plan(
            Utc::now(),
            checkpoint,
            lookback_hours,
            force_full,
            self.settings.full_window_policy,
        );

        let bands = self.fetcher.fetch(&session, &window)?;
        let merged = merger::merge(bands, &self.settings.source);
        let outcome = transformer::transform(&merged, &self.settings.transform);
        Ok((merged, outcome.records, outcome.dropped))
    }

    /// Return a usable session, authenticating when the cached one is absent,
    /// expired, or explicitly invalidated.
    fn session(&mut self, force_new: bool) -> Result<Session, SyncError> {
        if !force_new {
            if let Some(session) = &self.session {
                if !session.is_expired() {
                    return Ok(session.clone());
                }
            }
        }
        let session = self.authenticator.authenticate(force_new)?;
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Persist the checkpoint keyed on the newest surviving reading.
    ///
    /// Continuity keys off the upstream clock (the raw epoch), not the
    /// corrected display time, and the stored time never moves backwards.
    /// A write failure is reported but does not fail the cycle.
    fn update_checkpoint(
        &self,
        previous: Option<&Checkpoint>,
        merged: &[MergedPoint],
        records: &[SgvRecord],
    ) {
        if records.is_empty() {
            return;
        }
        let surviving: HashSet<&str> = records.iter().map(|r| r.source_id.as_str()).collect();
        // Merged points are newest-first by raw timestamp already.
        let Some(newest) = merged.iter().find(|m| surviving.contains(m.id.as_str())) else {
            return;
        };
        // Surviving records always have representable timestamps; the
        // transformer drops anything else.
        let Some(newest_instant) = newest.point.instant() else {
            return;
        };

        let previous_time = previous.and_then(|cp| cp.last_reading_time);
        let reading_time = match previous_time {
            Some(prev) => prev.max(newest_instant),
            None => newest_instant,
        };

        let checkpoint = Checkpoint {
            last_record_id: Some(newest.id.clone()),
            last_reading_time: Some(reading_time),
            identity: self.session.as_ref().map(|s| s.identity.clone()),
            saved_at: Utc::now(),
        };

        if let Err(e) = self.checkpoints.save(&checkpoint) {
            warn!(error = %e, "failed to persist checkpoint; next cycle will re-fetch");
        }
    }
}
