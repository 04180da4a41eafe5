//! Progress messages appended by running jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// One progress entry of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    pub level: Level,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl JobMessage {
    pub fn new(level: Level, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            level,
            text: text.into(),
            timestamp,
        }
    }

    /// An `Info` message, the level `HeartbeatRecorder::update` uses.
    pub fn info(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Level::Info, text, timestamp)
    }
}
