//! InMemoryJobStore - development and test store.
//!
//! A single `RwLock` over a `HashMap` makes each call atomic, which is all
//! the per-key linearizability the core asks of a store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{JobId, JobRecord, StoreError};
use crate::ports::{CasOutcome, JobStore};

/// Records keyed by job id. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    records: RwLock<HashMap<JobId, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `Arc::new(InMemoryJobStore::new())`, which is how
    /// services take it.
    ///
    /// # Example
    /// ```ignore
    /// let store = InMemoryJobStore::arc();
    /// let reaper = ReaperService::new(store.clone(), clock, events);
    /// ```
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of records in any status.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_or_update(&self, mut record: JobRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&record.job_id) {
            record.version = existing.version + 1;
        }
        records.insert(record.job_id.clone(), record);
        Ok(())
    }

    async fn find_one(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.records.read().await.get(job_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<JobRecord>, StoreError> {
        let mut all: Vec<JobRecord> = self.records.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        Ok(all)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        mut record: JobRecord,
    ) -> Result<CasOutcome, StoreError> {
        let mut records = self.records.write().await;
        let Some(current) = records.get(&record.job_id) else {
            return Ok(CasOutcome::Missing);
        };
        if current.version != expected_version {
            return Ok(CasOutcome::Stale {
                current_version: current.version,
            });
        }

        let version = expected_version + 1;
        record.version = version;
        records.insert(record.job_id.clone(), record);
        Ok(CasOutcome::Applied { version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;
    use chrono::{TimeZone, Utc};

    fn record(id: &str) -> JobRecord {
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        JobRecord::new(JobId::new(id), "someJobType", started, "someHostname")
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = InMemoryJobStore::new();
        store.create_or_update(record("a")).await.unwrap();

        let found = store.find_one(&JobId::new("a")).await.unwrap().unwrap();
        assert_eq!(found.job_id, JobId::new("a"));
        assert_eq!(found.version, 0);
        assert!(store.find_one(&JobId::new("b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overwrite_bumps_version() {
        let store = InMemoryJobStore::new();
        store.create_or_update(record("a")).await.unwrap();
        store.create_or_update(record("a")).await.unwrap();

        let found = store.find_one(&JobId::new("a")).await.unwrap().unwrap();
        assert_eq!(found.version, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn compare_and_swap_applies_on_matching_version() {
        let store = InMemoryJobStore::new();
        store.create_or_update(record("a")).await.unwrap();

        let mut update = record("a");
        update.status = JobStatus::Dead;
        update.stopped_at = Some(update.started_at);

        let outcome = store.compare_and_swap(0, update).await.unwrap();
        assert_eq!(outcome, CasOutcome::Applied { version: 1 });

        let found = store.find_one(&JobId::new("a")).await.unwrap().unwrap();
        assert_eq!(found.status, JobStatus::Dead);
    }

    #[tokio::test]
    async fn compare_and_swap_rejects_stale_version() {
        let store = InMemoryJobStore::new();
        store.create_or_update(record("a")).await.unwrap();
        store.create_or_update(record("a")).await.unwrap();

        let mut update = record("a");
        update.status = JobStatus::Dead;

        let outcome = store.compare_and_swap(0, update).await.unwrap();
        assert_eq!(outcome, CasOutcome::Stale { current_version: 1 });

        let found = store.find_one(&JobId::new("a")).await.unwrap().unwrap();
        assert_eq!(found.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn compare_and_swap_on_missing_record() {
        let store = InMemoryJobStore::new();
        let outcome = store.compare_and_swap(0, record("ghost")).await.unwrap();

        assert_eq!(outcome, CasOutcome::Missing);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn non_terminal_listing_skips_finished_jobs() {
        let store = InMemoryJobStore::new();
        let mut done = record("done");
        done.status = JobStatus::Ok;
        done.stopped_at = Some(done.started_at);
        store.create_or_update(done).await.unwrap();
        store.create_or_update(record("running")).await.unwrap();

        let candidates = store.find_all_non_terminal().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].job_id, JobId::new("running"));
        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }
}
