//! JobStore port - durable keyed storage of job records.
//!
//! The store is the only shared mutable resource. Everything above it
//! works on snapshots and writes whole records back.
//!
//! # Write semantics
//! - `create_or_update` is last-write-wins keyed by `job_id`
//! - `compare_and_swap` writes only if the stored `version` still equals
//!   the version the caller read; this is what keeps a sweep from killing
//!   a job that heartbeated after it was fetched
//! - every successful write bumps the stored `version`

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{JobId, JobRecord, StoreError};

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// Written; carries the version now stored.
    Applied { version: u64 },

    /// Someone wrote in between; nothing was written.
    Stale { current_version: u64 },

    /// No record under this id.
    Missing,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or overwrite unconditionally.
    async fn create_or_update(&self, record: JobRecord) -> Result<(), StoreError>;

    async fn find_one(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError>;

    async fn find_all(&self) -> Result<Vec<JobRecord>, StoreError>;

    /// Records still running. Stores with an index on status should
    /// override this; the default filters `find_all` locally.
    async fn find_all_non_terminal(&self) -> Result<Vec<JobRecord>, StoreError> {
        let mut records = self.find_all().await?;
        records.retain(|record| !record.status.is_terminal());
        Ok(records)
    }

    /// Write `record` only if the stored version equals `expected_version`.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: JobRecord,
    ) -> Result<CasOutcome, StoreError>;
}

/// Run a store call under an optional deadline.
///
/// On expiry the call is dropped. A write that had not been applied by
/// then is not applied at all, so the caller can retry safely.
pub async fn bounded<T, F>(deadline: Option<Duration>, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout(deadline, call)
            .await
            .map_err(|_| StoreError::DeadlineExceeded(deadline))?,
        None => call.await,
    }
}
