//! JobLauncher - creates the Running record of a new job.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{DomainEvent, JobError, JobRecord};
use crate::ports::{Clock, EventSink, IdGenerator, JobStore, bounded};

/// Creates jobs. Ids come from the injected `IdGenerator`.
pub struct JobLauncher {
    store: Arc<dyn JobStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    events: Arc<dyn EventSink>,
    host: String,
    store_timeout: Option<Duration>,
}

impl JobLauncher {
    pub fn new(
        store: Arc<dyn JobStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        events: Arc<dyn EventSink>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            ids,
            events,
            host: host.into(),
            store_timeout: None,
        }
    }

    /// Deadline for the create call. `None` waits indefinitely.
    pub fn with_store_timeout(mut self, store_timeout: Option<Duration>) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Register a new job of `job_type` as Running on this host.
    ///
    /// # Example
    /// ```ignore
    /// let job = launcher.start("product-import").await?;
    /// recorder.update(&job.job_id, "fetching feed").await?;
    /// ```
    pub async fn start(&self, job_type: impl Into<String>) -> Result<JobRecord, JobError> {
        let record = JobRecord::new(
            self.ids.generate_job_id(),
            job_type,
            self.clock.now(),
            self.host.clone(),
        );
        bounded(self.store_timeout, self.store.create_or_update(record.clone())).await?;

        self.events.emit(DomainEvent::JobStarted {
            job_id: record.job_id.clone(),
            job_type: record.job_type.clone(),
            host: record.host.clone(),
            at: record.started_at,
        });
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;
    use crate::impls::InMemoryJobStore;
    use crate::ports::{FixedClock, NoopEventSink, UlidGenerator};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn started_job_is_running_and_stored() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(now);
        let store = InMemoryJobStore::arc();
        let launcher = JobLauncher::new(
            store.clone(),
            Arc::new(clock.clone()),
            Arc::new(UlidGenerator::new(clock)),
            Arc::new(NoopEventSink),
            "worker-1",
        );

        let record = launcher.start("product-import").await.unwrap();

        assert_eq!(record.status, JobStatus::Running);
        assert_eq!(record.started_at, now);
        assert_eq!(record.host, "worker-1");
        let stored = store.find_one(&record.job_id).await.unwrap().unwrap();
        assert_eq!(stored, record);
    }
}
