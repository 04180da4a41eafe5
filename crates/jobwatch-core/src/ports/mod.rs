//! Ports - seams to the outside world.
//!
//! Each trait hides an external dependency (persistence, time, id
//! generation, event delivery) so the core can be tested against in-memory
//! or fixed implementations.

pub mod clock;
pub mod event_sink;
pub mod id_generator;
pub mod job_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::{EventSink, NoopEventSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::job_store::{CasOutcome, JobStore, bounded};
