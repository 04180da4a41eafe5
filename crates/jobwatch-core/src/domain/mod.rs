//! Domain model (ids, status, records, liveness rules, errors, events).

pub mod errors;
pub mod events;
pub mod ids;
pub mod job;
pub mod liveness;
pub mod message;
pub mod state;

pub use self::errors::{ErrorKind, JobError, StoreError};
pub use self::events::DomainEvent;
pub use self::ids::JobId;
pub use self::job::JobRecord;
pub use self::liveness::Action;
pub use self::message::{JobMessage, Level};
pub use self::state::JobStatus;
