//! IdGenerator port - job id generation.

use crate::domain::JobId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator hands out fresh, globally unique job ids.
pub trait IdGenerator: Send + Sync {
    fn generate_job_id(&self) -> JobId;
}

/// ULID-based generator.
///
/// The timestamp half comes from the injected `Clock`, so ids generated
/// under a `FixedClock` share a predictable prefix. The random half keeps
/// them unique.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_job_id(&self) -> JobId {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        JobId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
