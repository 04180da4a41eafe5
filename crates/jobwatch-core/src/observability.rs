use serde::{Deserialize, Serialize};

use crate::domain::JobStatus;

/// Number of jobs per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub running: usize,
    pub ok: usize,
    pub error: usize,
    pub dead: usize,
}

impl JobCounts {
    /// Count one more job in `status`.
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Running => self.running += 1,
            JobStatus::Ok => self.ok += 1,
            JobStatus::Error => self.error += 1,
            JobStatus::Dead => self.dead += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.running + self.ok + self.error + self.dead
    }
}

impl FromIterator<JobStatus> for JobCounts {
    fn from_iter<I: IntoIterator<Item = JobStatus>>(iter: I) -> Self {
        let mut counts = Self::default();
        for status in iter {
            counts.record(status);
        }
        counts
    }
}
