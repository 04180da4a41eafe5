//! App - services built on the ports.
//!
//! # Components
//! - **ReaperService**: one liveness sweep (classify, commit Dead, aggregate)
//! - **ReaperLoop**: periodic sweeps with graceful shutdown
//! - **HeartbeatRecorder**: heartbeat and completion writes of running jobs
//! - **JobLauncher**: registers new Running jobs
//! - **JobQuery**: read-only views
//! - **AppBuilder**: wiring

pub mod builder;
pub mod heartbeat;
pub mod launcher;
pub mod reaper;
pub mod reaper_loop;
pub mod status;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::heartbeat::HeartbeatRecorder;
pub use self::launcher::JobLauncher;
pub use self::reaper::{ReaperService, SweepResult};
pub use self::reaper_loop::ReaperLoop;
pub use self::status::JobQuery;
