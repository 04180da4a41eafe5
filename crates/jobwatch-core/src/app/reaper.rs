//! ReaperService - reclaims jobs whose heartbeat has gone stale.
//!
//! # Flow
//! 1. fetch non-terminal candidates (stalest first, optionally capped)
//! 2. read the clock once; classify every candidate against that instant
//! 3. commit each Dead transition with a compare-and-swap on the version
//!    the candidate was fetched with
//! 4. aggregate killed / failed / scanned
//!
//! A job that heartbeated or finished between step 1 and step 3 fails the
//! compare-and-swap and is left alone. One failing record never aborts the
//! sweep: it lands in `SweepResult::failed` and the next sweep retries it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::ReaperConfig;
use crate::domain::liveness::{self, Action};
use crate::domain::{DomainEvent, JobError, JobId, JobRecord};
use crate::ports::{CasOutcome, Clock, EventSink, JobStore, bounded};

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepResult {
    /// Jobs this sweep moved to Dead.
    pub killed: BTreeSet<JobId>,

    /// Jobs that were due but could not be committed.
    pub failed: BTreeSet<JobId>,

    /// Candidates evaluated.
    pub scanned: usize,
}

impl SweepResult {
    /// True when no due record failed to commit.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Finds silent Running jobs and marks them Dead.
pub struct ReaperService {
    store: Arc<dyn JobStore>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    batch_limit: Option<usize>,
    store_timeout: Option<Duration>,
}

impl ReaperService {
    /// No batch limit and no store deadline. See `with_config`.
    pub fn new(store: Arc<dyn JobStore>, clock: Arc<dyn Clock>, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            clock,
            events,
            batch_limit: None,
            store_timeout: None,
        }
    }

    /// Apply `batch_limit` and `store_timeout_ms`.
    pub fn with_config(mut self, config: &ReaperConfig) -> Self {
        self.batch_limit = config.batch_limit;
        self.store_timeout = config.store_timeout();
        self
    }

    /// Mark Dead every running job silent for `threshold_seconds` or more.
    ///
    /// # Errors
    /// Returns `JobError::StoreUnavailable` only when the candidate listing
    /// fails or runs past `store_timeout`. Nothing has been scanned at that
    /// point. Once the listing succeeds the sweep always returns `Ok`, and
    /// every record that was due but could not be committed is reported in
    /// `SweepResult::failed`.
    ///
    /// # Example
    /// ```ignore
    /// let result = reaper.sweep(20 * 60).await?;
    /// if !result.is_clean() {
    ///     warn!(failed = ?result.failed, "retrying next sweep");
    /// }
    /// ```
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn sweep(&self, threshold_seconds: u64) -> Result<SweepResult, JobError> {
        let mut candidates =
            bounded(self.store_timeout, self.store.find_all_non_terminal()).await?;
        candidates.sort_by(|a, b| {
            a.last_updated_at
                .cmp(&b.last_updated_at)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        if let Some(limit) = self.batch_limit {
            candidates.truncate(limit);
        }

        let now = self.clock.now();
        let mut result = SweepResult::default();

        for record in candidates {
            result.scanned += 1;

            let Action::MarkDead { stopped_at } =
                liveness::classify(&record, now, threshold_seconds)
            else {
                continue;
            };

            match self.commit_dead(&record, stopped_at).await {
                Ok(true) => {
                    result.killed.insert(record.job_id);
                }
                Ok(false) => {}
                Err(err @ JobError::InvalidTransition { .. }) => {
                    error!(job_id = %record.job_id, error = %err, "refusing dead transition");
                    result.failed.insert(record.job_id);
                }
                Err(err) => {
                    warn!(job_id = %record.job_id, error = %err, "could not mark job dead");
                    result.failed.insert(record.job_id);
                }
            }
        }

        info!(
            threshold_seconds,
            scanned = result.scanned,
            killed = result.killed.len(),
            failed = result.failed.len(),
            "sweep finished"
        );
        Ok(result)
    }

    /// Returns whether the Dead transition was written.
    async fn commit_dead(
        &self,
        record: &JobRecord,
        stopped_at: DateTime<Utc>,
    ) -> Result<bool, JobError> {
        let dead = liveness::mark_dead(record, stopped_at)?;
        let outcome = bounded(
            self.store_timeout,
            self.store.compare_and_swap(record.version, dead),
        )
        .await?;

        match outcome {
            CasOutcome::Applied { .. } => {
                self.events.emit(DomainEvent::JobDeclaredDead {
                    job_id: record.job_id.clone(),
                    last_updated_at: record.last_updated_at,
                    silent_for_secs: liveness::elapsed_since_update(record, stopped_at)
                        .num_seconds(),
                    at: stopped_at,
                });
                Ok(true)
            }
            CasOutcome::Stale { current_version } => {
                debug!(
                    job_id = %record.job_id,
                    seen_version = record.version,
                    current_version,
                    "job changed since it was fetched, leaving it alone"
                );
                Ok(false)
            }
            CasOutcome::Missing => {
                debug!(job_id = %record.job_id, "job vanished before it could be marked dead");
                Ok(false)
            }
        }
    }
}
