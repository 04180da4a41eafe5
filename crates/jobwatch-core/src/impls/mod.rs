//! Impls - concrete adapters for the ports.
//!
//! - **InMemoryJobStore**: development/test store
//! - **TracingEventSink**: logs domain events through `tracing`

pub mod inmem_store;
pub mod tracing_sink;

pub use self::inmem_store::InMemoryJobStore;
pub use self::tracing_sink::TracingEventSink;
