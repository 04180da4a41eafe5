//! JobQuery - read-only views for admin surfaces.

use std::sync::Arc;

use crate::domain::{JobError, JobId, JobRecord};
use crate::observability::JobCounts;
use crate::ports::JobStore;

/// Read side of the store. Never writes.
#[derive(Clone)]
pub struct JobQuery {
    store: Arc<dyn JobStore>,
}

impl JobQuery {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// `Ok(None)` for an unknown id.
    pub async fn find(&self, job_id: &JobId) -> Result<Option<JobRecord>, JobError> {
        Ok(self.store.find_one(job_id).await?)
    }

    /// Every non-terminal record, in store order.
    pub async fn running(&self) -> Result<Vec<JobRecord>, JobError> {
        Ok(self.store.find_all_non_terminal().await?)
    }

    /// Records per status across the whole store.
    ///
    /// # Example
    /// ```ignore
    /// let counts = app.query.counts().await?;
    /// info!(dead = counts.dead, total = counts.total(), "job counts");
    /// ```
    pub async fn counts(&self) -> Result<JobCounts, JobError> {
        let all = self.store.find_all().await?;
        Ok(all.into_iter().map(|record| record.status).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;
    use crate::impls::InMemoryJobStore;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn counts_by_status() {
        let store = InMemoryJobStore::arc();
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        for (id, status) in [
            ("a", JobStatus::Running),
            ("b", JobStatus::Running),
            ("c", JobStatus::Dead),
            ("d", JobStatus::Ok),
        ] {
            let mut record = JobRecord::new(JobId::new(id), "someJobType", started, "host");
            record.status = status;
            if status.is_terminal() {
                record.stopped_at = Some(started);
            }
            store.create_or_update(record).await.unwrap();
        }
        let query = JobQuery::new(store);

        let counts = query.counts().await.unwrap();

        assert_eq!(
            counts,
            JobCounts {
                running: 2,
                ok: 1,
                error: 0,
                dead: 1
            }
        );
        assert_eq!(counts.total(), 4);
        assert_eq!(query.running().await.unwrap().len(), 2);
        assert!(query.find(&JobId::new("c")).await.unwrap().unwrap().is_stopped());
    }
}
