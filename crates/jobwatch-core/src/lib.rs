//! jobwatch-core
//!
//! Lifecycle tracking for long-running background jobs, and a reaper that
//! reclaims jobs which stopped heartbeating without ever reporting an end.
//!
//! # Modules
//! - **domain**: job records, status, the liveness state machine, errors, events
//! - **ports**: Clock, JobStore, IdGenerator, EventSink
//! - **app**: ReaperService, ReaperLoop, HeartbeatRecorder, JobLauncher, JobQuery, AppBuilder
//! - **impls**: InMemoryJobStore, TracingEventSink
//! - **config**: defaults and `JOBWATCH_*` environment overrides
//! - **observability**: per-status job counts

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{App, AppBuilder, HeartbeatRecorder, ReaperService, SweepResult};
pub use config::JobwatchConfig;
pub use domain::{JobError, JobId, JobRecord, JobStatus};
