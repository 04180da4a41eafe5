//! Job status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a job record.
///
/// State transitions:
/// - Running -> Running (heartbeat)
/// - Running -> Ok | Error (self-reported completion)
/// - Running -> Dead (reaper, no heartbeat within the threshold)
///
/// Ok, Error and Dead are terminal: nothing leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Still executing and expected to heartbeat.
    Running,

    /// Finished successfully.
    Ok,

    /// Finished with an error reported by the job itself.
    Error,

    /// Stopped reporting; reclaimed by the reaper.
    Dead,
}

impl JobStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Ok | JobStatus::Error | JobStatus::Dead)
    }

    /// Can a job report this status about itself on completion?
    pub fn is_self_reportable(self) -> bool {
        matches!(self, JobStatus::Ok | JobStatus::Error)
    }

    /// Wire name, as stored and logged (`"RUNNING"`, `"DEAD"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "RUNNING",
            JobStatus::Ok => "OK",
            JobStatus::Error => "ERROR",
            JobStatus::Dead => "DEAD",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::running(JobStatus::Running, false)]
    #[case::ok(JobStatus::Ok, true)]
    #[case::error(JobStatus::Error, true)]
    #[case::dead(JobStatus::Dead, true)]
    fn terminal_states(#[case] status: JobStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn dead_is_not_self_reportable() {
        assert!(!JobStatus::Dead.is_self_reportable());
        assert!(!JobStatus::Running.is_self_reportable());
        assert!(JobStatus::Ok.is_self_reportable());
    }

    #[test]
    fn serializes_with_symbolic_names() {
        assert_eq!(serde_json::to_string(&JobStatus::Dead).unwrap(), "\"DEAD\"");
        assert_eq!(JobStatus::Running.to_string(), "RUNNING");
    }
}
