//! Liveness state machine.
//!
//! Pure functions over `JobRecord` snapshots: no I/O, no clock access.
//! Callers pass `now` in, so every decision inside one sweep or one
//! heartbeat is made against a single instant.
//!
//! # Transitions
//! - `classify`: Running + stale heartbeat -> `Action::MarkDead`
//! - `apply_heartbeat`: Running -> Running (last update advanced, message appended)
//! - `apply_terminal`: Running -> Ok | Error
//! - `mark_dead`: Running -> Dead
//!
//! Every function refuses terminal input. A terminal record can never be
//! revived or re-terminated.

use chrono::{DateTime, TimeDelta, Utc};

use super::errors::JobError;
use super::job::JobRecord;
use super::message::JobMessage;
use super::state::JobStatus;

/// Outcome of classifying one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Terminal already, or still alive.
    NoOp,

    /// Heartbeat is stale: the job must be stopped as Dead at `stopped_at`.
    MarkDead { stopped_at: DateTime<Utc> },
}

/// Time since the record's last heartbeat. Negative if the clock went
/// backwards past it.
pub fn elapsed_since_update(record: &JobRecord, now: DateTime<Utc>) -> TimeDelta {
    now - record.last_updated_at
}

/// Decide whether `record` has gone dead as of `now`.
///
/// The boundary is inclusive: a job whose last heartbeat is exactly
/// `threshold_seconds` old is dead. Otherwise sweeps running at exactly the
/// threshold interval could keep missing it.
pub fn classify(record: &JobRecord, now: DateTime<Utc>, threshold_seconds: u64) -> Action {
    if record.status.is_terminal() {
        return Action::NoOp;
    }

    // Thresholds too large for TimeDelta never expire.
    let Some(threshold) = threshold_delta(threshold_seconds) else {
        return Action::NoOp;
    };

    if elapsed_since_update(record, now) >= threshold {
        Action::MarkDead { stopped_at: now }
    } else {
        Action::NoOp
    }
}

/// Record a heartbeat: advance `last_updated_at` and append `message`.
pub fn apply_heartbeat(
    record: &JobRecord,
    now: DateTime<Utc>,
    message: JobMessage,
) -> Result<JobRecord, JobError> {
    ensure_running(record, JobStatus::Running)?;

    let mut next = record.clone();
    next.last_updated_at = now.max(record.last_updated_at);
    next.messages.push(message);
    Ok(next)
}

/// Self-reported completion with `final_status` (Ok or Error).
pub fn apply_terminal(
    record: &JobRecord,
    now: DateTime<Utc>,
    final_status: JobStatus,
) -> Result<JobRecord, JobError> {
    ensure_running(record, final_status)?;
    if !final_status.is_self_reportable() {
        return Err(invalid(record, final_status));
    }

    let stopped_at = now.max(record.last_updated_at);
    let mut next = record.clone();
    next.status = final_status;
    next.last_updated_at = stopped_at;
    next.stopped_at = Some(stopped_at);
    Ok(next)
}

/// Reaper-assigned termination.
///
/// `last_updated_at` keeps the heartbeat the classification was based on:
/// a Dead record always shows when the job was last heard from.
pub fn mark_dead(record: &JobRecord, stopped_at: DateTime<Utc>) -> Result<JobRecord, JobError> {
    ensure_running(record, JobStatus::Dead)?;

    let mut next = record.clone();
    next.status = JobStatus::Dead;
    next.stopped_at = Some(stopped_at.max(record.last_updated_at));
    Ok(next)
}

fn ensure_running(record: &JobRecord, to: JobStatus) -> Result<(), JobError> {
    if record.status.is_terminal() {
        Err(invalid(record, to))
    } else {
        Ok(())
    }
}

fn invalid(record: &JobRecord, to: JobStatus) -> JobError {
    JobError::InvalidTransition {
        job_id: record.job_id.clone(),
        from: record.status,
        to,
    }
}

fn threshold_delta(threshold_seconds: u64) -> Option<TimeDelta> {
    i64::try_from(threshold_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
}
