//! Errors and their operational classification.

use std::time::Duration;

use thiserror::Error;

use super::ids::JobId;
use super::state::JobStatus;

/// How a caller should react to a `JobError`.
///
/// - Transient: retry soon
/// - Permanent: retrying cannot help
/// - Infrastructure: the store is failing; retry with backoff
/// - Stop: the job is over; the caller should leave its work loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
    Stop,
}

/// Failure of a `JobStore` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("job store unavailable: {0}")]
    Unavailable(String),

    #[error("job store call exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

/// Errors returned by the liveness transitions and the services built on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    #[error("job {job_id} is already terminal ({status})")]
    JobAlreadyTerminal { job_id: JobId, status: JobStatus },

    #[error("invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("job {job_id} was modified concurrently on each of {attempts} write attempts")]
    Contention { job_id: JobId, attempts: u32 },
}

impl JobError {
    /// Classify for retry decisions.
    ///
    /// # Example
    /// ```ignore
    /// match recorder.update(&job_id, "tick").await {
    ///     Err(err) if err.kind() == ErrorKind::Stop => break,
    ///     Err(err) if err.kind() == ErrorKind::Transient => continue,
    ///     other => other?,
    /// }
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::UnknownJob(_) | JobError::InvalidTransition { .. } => ErrorKind::Permanent,
            JobError::JobAlreadyTerminal { .. } => ErrorKind::Stop,
            JobError::StoreUnavailable(_) => ErrorKind::Infrastructure,
            JobError::Contention { .. } => ErrorKind::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_writes_are_a_stop_signal() {
        let err = JobError::JobAlreadyTerminal {
            job_id: JobId::new("a"),
            status: JobStatus::Dead,
        };
        assert_eq!(err.kind(), ErrorKind::Stop);
        assert_eq!(err.to_string(), "job a is already terminal (DEAD)");
    }

    #[test]
    fn store_errors_convert() {
        let err: JobError = StoreError::Unavailable("connection reset".into()).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.to_string().contains("connection reset"));
    }
}
