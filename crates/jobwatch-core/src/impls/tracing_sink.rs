//! TracingEventSink - reports domain events as structured log lines.

use tracing::{info, warn};

use crate::domain::DomainEvent;
use crate::ports::EventSink;

/// Default sink: heartbeats at trace, lifecycle at info, deaths at warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: DomainEvent) {
        match &event {
            DomainEvent::JobStarted {
                job_id,
                job_type,
                host,
                ..
            } => info!(event = event.name(), %job_id, %job_type, %host, "job started"),
            DomainEvent::JobHeartbeat { job_id, .. } => {
                tracing::trace!(event = event.name(), %job_id, "job heartbeat")
            }
            DomainEvent::JobFinished { job_id, status, .. } => {
                info!(event = event.name(), %job_id, %status, "job finished")
            }
            DomainEvent::JobDeclaredDead {
                job_id,
                last_updated_at,
                silent_for_secs,
                ..
            } => warn!(
                event = event.name(),
                %job_id,
                %last_updated_at,
                silent_for_secs,
                "job declared dead"
            ),
        }
    }
}
