//! EventSink port - where committed transitions are reported.

use crate::domain::DomainEvent;

/// EventSink receives a `DomainEvent` after the store accepted the write.
///
/// Emission is fire-and-forget: a sink must not fail the transition that
/// produced the event.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: DomainEvent) {}
}
