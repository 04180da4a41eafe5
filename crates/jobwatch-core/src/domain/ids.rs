//! Job identifiers.
//!
//! A `JobId` is opaque to the core: generated ids look like `job-<ULID>`
//! (see `ports::id_generator`), but callers may also bring their own
//! strings (`"nightly-import"`, `"toBeKilled"`, ...).
//!
//! The ULID form sorts by creation time, which keeps store listings and
//! sweep reports in a stable, readable order.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Prefix used for generated ids.
pub const GENERATED_PREFIX: &str = "job-";

/// Identifier of one job instance. Unique within the store's key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a caller-supplied identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build a generated id from a ULID (`job-<ULID>`).
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(format!("{GENERATED_PREFIX}{ulid}"))
    }

    /// Recover the ULID of a generated id. `None` for caller-supplied ids.
    pub fn as_ulid(&self) -> Option<Ulid> {
        self.0
            .strip_prefix(GENERATED_PREFIX)
            .and_then(|raw| Ulid::from_string(raw).ok())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Ulid> for JobId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
