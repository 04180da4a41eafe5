//! Job record: identity, timing, status and progress of one job instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use super::message::JobMessage;
use super::state::JobStatus;

/// Job record as held by the store.
///
/// Values handed out by the store are snapshots: they do not follow later
/// writes. Transitions never mutate a record in place; `domain::liveness`
/// returns a new value which is written back through the store.
///
/// Invariants:
/// - `stopped_at.is_some()` iff `status.is_terminal()`
/// - `last_updated_at >= started_at`
/// - once terminal, `status`, `stopped_at` and `messages` never change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub job_type: String,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub messages: Vec<JobMessage>,

    /// Process that runs the job (diagnostics only).
    pub host: String,

    /// Optimistic concurrency token. Bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

impl JobRecord {
    /// A freshly launched job: running, no messages, last update = start.
    pub fn new(
        job_id: JobId,
        job_type: impl Into<String>,
        started_at: DateTime<Utc>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            job_type: job_type.into(),
            started_at,
            last_updated_at: started_at,
            stopped_at: None,
            status: JobStatus::Running,
            messages: Vec::new(),
            host: host.into(),
            version: 0,
        }
    }

    /// Override the last heartbeat (clamped to `started_at`).
    ///
    /// Used when importing records whose heartbeat predates this process,
    /// and by tests to age a record.
    pub fn with_last_updated_at(mut self, last_updated_at: DateTime<Utc>) -> Self {
        self.last_updated_at = last_updated_at.max(self.started_at);
        self
    }

    /// Has `stopped_at` been set?
    ///
    /// # Example
    /// ```ignore
    /// let job = JobRecord::new(JobId::new("import"), "product-import", now, "worker-1");
    /// assert!(!job.is_stopped());
    /// ```
    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Same as `self.status.is_terminal()`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check the record-level invariants. Stores may use this to reject
    /// malformed writes.
    pub fn is_consistent(&self) -> bool {
        self.stopped_at.is_some() == self.status.is_terminal()
            && self.last_updated_at >= self.started_at
    }
}
