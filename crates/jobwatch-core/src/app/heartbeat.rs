//! HeartbeatRecorder - the write path of a running job.
//!
//! Every write is read → transition → compare-and-swap. If another writer
//! (a reaper, or a second heartbeat from the same job) got in between, the
//! round starts over from a fresh read, up to `max_write_attempts` times.
//! A terminal record stops the loop with `JobAlreadyTerminal`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::HeartbeatConfig;
use crate::domain::liveness;
use crate::domain::{DomainEvent, JobError, JobId, JobMessage, JobRecord, JobStatus, Level};
use crate::ports::{CasOutcome, Clock, EventSink, JobStore, bounded};

/// Heartbeats and completion reports on behalf of running jobs.
pub struct HeartbeatRecorder {
    store: Arc<dyn JobStore>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    max_write_attempts: u32,
    store_timeout: Option<Duration>,
}

impl HeartbeatRecorder {
    pub fn new(store: Arc<dyn JobStore>, clock: Arc<dyn Clock>, events: Arc<dyn EventSink>) -> Self {
        let defaults = HeartbeatConfig::default();
        Self {
            store,
            clock,
            events,
            max_write_attempts: defaults.max_write_attempts,
            store_timeout: defaults.store_timeout(),
        }
    }

    /// Apply `max_write_attempts` (at least 1) and `store_timeout_ms`.
    pub fn with_config(mut self, config: &HeartbeatConfig) -> Self {
        self.max_write_attempts = config.max_write_attempts.max(1);
        self.store_timeout = config.store_timeout();
        self
    }

    /// Refresh the job's heartbeat and append an info message.
    ///
    /// # Example
    /// ```ignore
    /// match recorder.update(&job_id, "page 3/10").await {
    ///     Err(err) if err.kind() == ErrorKind::Stop => return, // reaped or finished
    ///     other => other?,
    /// }
    /// ```
    pub async fn update(&self, job_id: &JobId, message: impl Into<String>) -> Result<(), JobError> {
        self.update_with_level(job_id, Level::Info, message).await
    }

    /// Like `update`, with an explicit message level.
    pub async fn update_with_level(
        &self,
        job_id: &JobId,
        level: Level,
        message: impl Into<String>,
    ) -> Result<(), JobError> {
        let text = message.into();
        let committed = self
            .write(job_id, |record, now| {
                liveness::apply_heartbeat(record, now, JobMessage::new(level, text.clone(), now))
            })
            .await?;

        self.events.emit(DomainEvent::JobHeartbeat {
            job_id: job_id.clone(),
            at: committed.last_updated_at,
        });
        Ok(())
    }

    /// Self-reported completion. `final_status` must be Ok or Error.
    pub async fn finish(&self, job_id: &JobId, final_status: JobStatus) -> Result<(), JobError> {
        let committed = self
            .write(job_id, |record, now| {
                liveness::apply_terminal(record, now, final_status)
            })
            .await?;

        info!(%job_id, status = %final_status, "job finished");
        self.events.emit(DomainEvent::JobFinished {
            job_id: job_id.clone(),
            status: final_status,
            at: committed.last_updated_at,
        });
        Ok(())
    }

    /// Returns the record as committed.
    async fn write<F>(&self, job_id: &JobId, transition: F) -> Result<JobRecord, JobError>
    where
        F: Fn(&JobRecord, DateTime<Utc>) -> Result<JobRecord, JobError>,
    {
        for attempt in 1..=self.max_write_attempts {
            let current = bounded(self.store_timeout, self.store.find_one(job_id))
                .await?
                .ok_or_else(|| JobError::UnknownJob(job_id.clone()))?;

            if current.status.is_terminal() {
                return Err(JobError::JobAlreadyTerminal {
                    job_id: job_id.clone(),
                    status: current.status,
                });
            }

            let next = transition(&current, self.clock.now())?;
            let outcome = bounded(
                self.store_timeout,
                self.store.compare_and_swap(current.version, next.clone()),
            )
            .await?;

            match outcome {
                CasOutcome::Applied { version } => return Ok(JobRecord { version, ..next }),
                CasOutcome::Stale { current_version } => {
                    debug!(%job_id, attempt, current_version, "concurrent write, retrying");
                }
                CasOutcome::Missing => return Err(JobError::UnknownJob(job_id.clone())),
            }
        }

        Err(JobError::Contention {
            job_id: job_id.clone(),
            attempts: self.max_write_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoreError;
    use crate::impls::InMemoryJobStore;
    use crate::ports::{FixedClock, NoopEventSink};
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn job(id: &str) -> JobRecord {
        JobRecord::new(JobId::new(id), "someJobType", t0() - TimeDelta::minutes(5), "someHostname")
    }

    async fn setup(record: JobRecord) -> (Arc<InMemoryJobStore>, FixedClock, HeartbeatRecorder) {
        let store = InMemoryJobStore::arc();
        store.create_or_update(record).await.unwrap();
        let clock = FixedClock::new(t0());
        let recorder =
            HeartbeatRecorder::new(store.clone(), Arc::new(clock.clone()), Arc::new(NoopEventSink));
        (store, clock, recorder)
    }

    #[tokio::test]
    async fn update_refreshes_heartbeat_and_appends() {
        let (store, clock, recorder) = setup(job("import")).await;
        let id = JobId::new("import");

        recorder.update(&id, "10% done").await.unwrap();
        clock.advance(TimeDelta::seconds(5));
        recorder
            .update_with_level(&id, Level::Warning, "slow source")
            .await
            .unwrap();

        let stored = store.find_one(&id).await.unwrap().unwrap();
        assert_eq!(stored.last_updated_at, t0() + TimeDelta::seconds(5));
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[0].text, "10% done");
        assert_eq!(stored.messages[1].level, Level::Warning);
        assert_eq!(stored.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn update_unknown_job() {
        let (_store, _clock, recorder) = setup(job("import")).await;

        let err = recorder.update(&JobId::new("nope"), "hi").await.unwrap_err();
        assert_eq!(err, JobError::UnknownJob(JobId::new("nope")));
    }

    #[rstest]
    #[case::ok(JobStatus::Ok)]
    #[case::error(JobStatus::Error)]
    #[case::dead(JobStatus::Dead)]
    #[tokio::test]
    async fn late_heartbeat_is_refused_and_leaves_record(#[case] status: JobStatus) {
        let mut record = job("import");
        record.status = status;
        record.stopped_at = Some(t0() - TimeDelta::minutes(1));
        let (store, _clock, recorder) = setup(record).await;
        let id = JobId::new("import");
        let before = store.find_one(&id).await.unwrap().unwrap();

        let err = recorder.update(&id, "still here").await.unwrap_err();

        assert_eq!(err, JobError::JobAlreadyTerminal { job_id: id.clone(), status });
        assert_eq!(store.find_one(&id).await.unwrap().unwrap(), before);
    }

    #[rstest]
    #[case::ok(JobStatus::Ok)]
    #[case::error(JobStatus::Error)]
    #[tokio::test]
    async fn finish_stops_the_job(#[case] status: JobStatus) {
        let (store, _clock, recorder) = setup(job("import")).await;
        let id = JobId::new("import");

        recorder.finish(&id, status).await.unwrap();

        let stored = store.find_one(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, status);
        assert_eq!(stored.stopped_at, Some(t0()));
        assert!(stored.is_stopped());

        let err = recorder.finish(&id, JobStatus::Ok).await.unwrap_err();
        assert!(matches!(err, JobError::JobAlreadyTerminal { .. }));
    }

    #[tokio::test]
    async fn finish_as_dead_is_invalid() {
        let (store, _clock, recorder) = setup(job("import")).await;
        let id = JobId::new("import");

        let err = recorder.finish(&id, JobStatus::Dead).await.unwrap_err();

        assert!(matches!(err, JobError::InvalidTransition { to: JobStatus::Dead, .. }));
        let stored = store.find_one(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Running);
    }

    /// Store whose conditional writes always lose the race.
    struct AlwaysStale {
        inner: InMemoryJobStore,
        cas_calls: AtomicU32,
    }

    #[async_trait]
    impl JobStore for AlwaysStale {
        async fn create_or_update(&self, record: JobRecord) -> Result<(), StoreError> {
            self.inner.create_or_update(record).await
        }

        async fn find_one(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError> {
            self.inner.find_one(job_id).await
        }

        async fn find_all(&self) -> Result<Vec<JobRecord>, StoreError> {
            self.inner.find_all().await
        }

        async fn compare_and_swap(
            &self,
            expected_version: u64,
            _record: JobRecord,
        ) -> Result<CasOutcome, StoreError> {
            self.cas_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CasOutcome::Stale {
                current_version: expected_version + 1,
            })
        }
    }

    #[tokio::test]
    async fn gives_up_after_max_write_attempts() {
        let store = Arc::new(AlwaysStale {
            inner: InMemoryJobStore::new(),
            cas_calls: AtomicU32::new(0),
        });
        store.create_or_update(job("import")).await.unwrap();
        let recorder = HeartbeatRecorder::new(
            store.clone(),
            Arc::new(FixedClock::new(t0())),
            Arc::new(NoopEventSink),
        )
        .with_config(&HeartbeatConfig {
            max_write_attempts: 4,
            store_timeout_ms: None,
        });

        let err = recorder.update(&JobId::new("import"), "hi").await.unwrap_err();

        assert_eq!(
            err,
            JobError::Contention {
                job_id: JobId::new("import"),
                attempts: 4
            }
        );
        assert_eq!(store.cas_calls.load(Ordering::SeqCst), 4);
    }
}
