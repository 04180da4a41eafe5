//! Domain events, emitted after a transition has been committed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::JobId;
use super::state::JobStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    JobStarted {
        job_id: JobId,
        job_type: String,
        host: String,
        at: DateTime<Utc>,
    },
    JobHeartbeat {
        job_id: JobId,
        at: DateTime<Utc>,
    },
    JobFinished {
        job_id: JobId,
        status: JobStatus,
        at: DateTime<Utc>,
    },
    JobDeclaredDead {
        job_id: JobId,
        last_updated_at: DateTime<Utc>,
        silent_for_secs: i64,
        at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// The job the event is about. Every variant carries one.
    pub fn job_id(&self) -> &JobId {
        match self {
            DomainEvent::JobStarted { job_id, .. }
            | DomainEvent::JobHeartbeat { job_id, .. }
            | DomainEvent::JobFinished { job_id, .. }
            | DomainEvent::JobDeclaredDead { job_id, .. } => job_id,
        }
    }

    /// Stable snake_case name, same as the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::JobStarted { .. } => "job_started",
            DomainEvent::JobHeartbeat { .. } => "job_heartbeat",
            DomainEvent::JobFinished { .. } => "job_finished",
            DomainEvent::JobDeclaredDead { .. } => "job_declared_dead",
        }
    }
}
