//! Command-line driver for the gol distributor.
//!
//! Wires the distributor to PGM files on disk, keyboard control on stdin,
//! and a logging event consumer, then runs one simulation.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `gol-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Spawn the PGM I/O service
//! 4. Start keyboard and Ctrl-C control sources
//! 5. Spawn the event consumer
//! 6. Run the distributor inside a span carrying the run id
//! 7. Wait for the consumer and I/O service to drain, log the summary

mod error;
mod keys;
mod sink;

use std::path::Path;

use anyhow::Context;
use gol_core::config::{GolConfig, LoggingConfig};
use gol_core::distributor::log_run_end;
use gol_core::io::spawn_io_service;
use gol_core::{DistributorChannels, RunSummary, run};
use gol_io::PgmStore;
use gol_types::ControlSignal;
use tokio::sync::mpsc;
use tracing::{Instrument, info, info_span, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::error::EngineError;

const CONFIG_PATH: &str = "gol-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the run fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().with_context(|| format!("failed to load {CONFIG_PATH}"))?;
    init_tracing(&config.logging);

    let run_id = Uuid::now_v7();
    info!(%run_id, "gol-engine starting");

    execute(config)
        .instrument(info_span!("run", %run_id))
        .await
        .context("simulation did not complete")?;
    Ok(())
}

/// Load configuration from `gol-config.yaml`, or defaults if it is absent.
fn load_config() -> Result<GolConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(GolConfig::from_file(config_path)?)
    } else {
        let mut config = GolConfig::default();
        config.io.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn execute(config: GolConfig) -> Result<RunSummary, EngineError> {
    let params = config.params();
    let options = config.run_options();
    info!(
        turns = params.turns,
        threads = params.threads,
        width = params.image_width,
        height = params.image_height,
        images_dir = %config.io.images_dir.display(),
        output_dir = %config.io.output_dir.display(),
        progress_interval_ms = config.timing.progress_interval_ms,
        worker_timeout_ms = config.timing.worker_timeout_ms,
        "Configuration loaded"
    );

    let (io, io_service) =
        spawn_io_service(PgmStore::from_config(&config.io), config.io.request_buffer);
    let (events, event_stream) = mpsc::channel(config.events.buffer.max(1));
    let (controls, control_source) = mpsc::channel(config.events.control_buffer.max(1));

    if let Err(e) = keys::spawn_stdin_reader(controls.clone()) {
        warn!(error = %e, "Keyboard control unavailable");
    }
    spawn_interrupt_handler(controls);
    info!("Controls: p = pause/resume, s = snapshot, q = quit");

    let consumer = tokio::spawn(sink::consume(event_stream).in_current_span());

    let outcome = run(params, options, DistributorChannels {
        events,
        io,
        controls: control_source,
    })
    .await;

    let stats = consumer
        .await
        .map_err(|e| EngineError::task("event consumer", &e))?;
    io_service
        .await
        .map_err(|e| EngineError::task("image I/O", &e))?;
    info!(
        events = stats.events,
        cell_flips = stats.cell_flips,
        images = ?stats.images,
        failure = ?stats.failure,
        "Events consumed"
    );

    let summary = outcome?;
    log_run_end(&summary);
    Ok(summary)
}

/// Turn Ctrl-C into a quit request so the final snapshot is still written.
fn spawn_interrupt_handler(controls: mpsc::Sender<ControlSignal>) {
    tokio::spawn(
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, requesting quit");
                if controls.send(ControlSignal::Quit).await.is_err() {
                    warn!("Run already finished");
                }
            }
        }
        .in_current_span(),
    );
}
