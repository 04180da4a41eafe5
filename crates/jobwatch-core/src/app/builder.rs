//! AppBuilder - wires ports into the application services.
//!
//! Everything is injected: there is no global registry of jobs, only the
//! store handle passed to each service.

use std::sync::Arc;

use crate::config::{ConfigError, JobwatchConfig};
use crate::impls::{InMemoryJobStore, TracingEventSink};
use crate::ports::{Clock, EventSink, IdGenerator, JobStore, SystemClock, UlidGenerator};

use super::heartbeat::HeartbeatRecorder;
use super::launcher::JobLauncher;
use super::reaper::ReaperService;
use super::reaper_loop::ReaperLoop;
use super::status::JobQuery;

/// Defaults: in-memory store, system clock, tracing event sink, ULID ids.
///
/// ```ignore
/// let app = AppBuilder::new()
///     .with_store(postgres_store)
///     .with_config(JobwatchConfig::from_env()?)
///     .build()?;
/// let reaper_loop = app.spawn_reaper_loop();
/// ```
pub struct AppBuilder {
    store: Option<Arc<dyn JobStore>>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: JobwatchConfig,
}

/// Why `AppBuilder::build` refused to build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEventSink),
            ids: None,
            config: JobwatchConfig::default(),
        }
    }

    /// Replace the in-memory default.
    pub fn with_store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Validated in `build`, not here.
    pub fn with_config(mut self, config: JobwatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration, then builds every service.
    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| InMemoryJobStore::arc() as Arc<dyn JobStore>);
        let clock = self.clock.clone();
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock)) as Arc<dyn IdGenerator>);

        let reaper = ReaperService::new(store.clone(), self.clock.clone(), self.events.clone())
            .with_config(&self.config.reaper);
        let recorder =
            HeartbeatRecorder::new(store.clone(), self.clock.clone(), self.events.clone())
                .with_config(&self.config.heartbeat);
        let launcher = JobLauncher::new(
            store.clone(),
            self.clock.clone(),
            ids,
            self.events.clone(),
            self.config.host.clone(),
        )
        .with_store_timeout(self.config.heartbeat.store_timeout());

        Ok(App {
            query: JobQuery::new(store.clone()),
            store,
            reaper: Arc::new(reaper),
            recorder: Arc::new(recorder),
            launcher: Arc::new(launcher),
            config: self.config,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The wired services. All of them share one store.
pub struct App {
    pub store: Arc<dyn JobStore>,
    pub reaper: Arc<ReaperService>,
    pub recorder: Arc<HeartbeatRecorder>,
    pub launcher: Arc<JobLauncher>,
    pub query: JobQuery,
    pub config: JobwatchConfig,
}

impl App {
    /// Start periodic sweeps with the configured threshold and interval.
    pub fn spawn_reaper_loop(&self) -> ReaperLoop {
        ReaperLoop::spawn(
            self.reaper.clone(),
            self.config.reaper.dead_after_secs,
            self.config.reaper.sweep_interval(),
        )
    }
}
