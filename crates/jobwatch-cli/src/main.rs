use std::sync::Arc;

use tokio::time::{Duration, sleep, timeout};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jobwatch_core::config::{JobwatchConfig, ReaperConfig};
use jobwatch_core::domain::ErrorKind;
use jobwatch_core::{AppBuilder, HeartbeatRecorder, JobId, JobStatus};

/// JSON logs, filtered through RUST_LOG (default: info).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}

/// A well-behaved job: heartbeats `steps` times, then reports success.
/// Leaves early if the reaper got to it first.
async fn well_behaved_job(recorder: Arc<HeartbeatRecorder>, job_id: JobId, steps: u32, beat: Duration) {
    for step in 1..=steps {
        sleep(beat).await;
        match recorder.update(&job_id, format!("step {step}/{steps}")).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::Stop => {
                warn!(%job_id, error = %err, "job was stopped from outside");
                return;
            }
            Err(err) => warn!(%job_id, error = %err, "heartbeat failed"),
        }
    }
    if let Err(err) = recorder.finish(&job_id, JobStatus::Ok).await {
        warn!(%job_id, error = %err, "could not report completion");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Short demo defaults; JOBWATCH_* variables still win.
    let config = JobwatchConfig {
        reaper: ReaperConfig {
            dead_after_secs: 3,
            sweep_interval_secs: 1,
            ..ReaperConfig::default()
        },
        ..JobwatchConfig::default()
    }
    .overlay_env()?;
    let dead_after = config.reaper.dead_after_secs;

    let app = AppBuilder::new().with_config(config).build()?;
    let reaper_loop = app.spawn_reaper_loop();
    let mut results = reaper_loop.subscribe();

    // (A) three jobs: one heartbeats then succeeds, one fails fast, one goes silent
    let import = app.launcher.start("product-import").await?;
    let report = app.launcher.start("report").await?;
    let sitemap = app.launcher.start("sitemap").await?;

    let beat = Duration::from_millis((dead_after.saturating_mul(1000) / 2).max(100));
    let worker = tokio::spawn(well_behaved_job(
        app.recorder.clone(),
        import.job_id.clone(),
        4,
        beat,
    ));

    app.recorder.update(&report.job_id, "source unreachable").await?;
    app.recorder.finish(&report.job_id, JobStatus::Error).await?;

    // (B) wait for the reaper to notice the silent job
    let budget = Duration::from_secs(dead_after.saturating_mul(3).saturating_add(5));
    let waited = timeout(budget, async {
        loop {
            if results.changed().await.is_err() {
                break;
            }
            let killed = results
                .borrow_and_update()
                .as_ref()
                .is_some_and(|result| result.killed.contains(&sitemap.job_id));
            if killed {
                break;
            }
        }
    })
    .await;
    if waited.is_err() {
        warn!(job_id = %sitemap.job_id, "silent job was not reclaimed in time");
    }

    // (C) let the well-behaved job finish, then stop sweeping
    worker.await?;
    reaper_loop.shutdown_and_join().await;

    let counts = app.query.counts().await?;
    info!(?counts, "final job counts");

    let mut records = Vec::new();
    for job_id in [&import.job_id, &report.job_id, &sitemap.job_id] {
        if let Some(record) = app.query.find(job_id).await? {
            records.push(record);
        }
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "counts": counts,
            "jobs": records,
        }))?
    );

    Ok(())
}
