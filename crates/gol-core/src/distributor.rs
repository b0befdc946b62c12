//! The distributor: turn loop, control handling, and shutdown sequence.
//!
//! [`run`] drives one complete simulation run:
//!
//! 1. **Start-up** -- validate params, start the control listener, load the
//!    initial grid, announce its live cells, start the progress reporter.
//! 2. **Turn loop** -- at each turn boundary apply pending control requests
//!    (quit first), then compute the next turn across all workers and emit
//!    its flips followed by `TurnComplete`.
//! 3. **Shutdown** -- stop the reporter, emit `FinalTurnComplete`, write the
//!    final snapshot, wait for the I/O collaborator to go idle, emit
//!    `StateChange(Quitting)`, stop the listener, and close the stream.
//!
//! A fatal error at any point is reported as [`Event::RunFailed`] before
//! the stream closes. Background tasks are stopped on every path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gol_types::{ControlSignal, Event, Params, ParamsError, State};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::control::{Action, ControlListener, ControlState, Phase};
use crate::grid::Grid;
use crate::io::{IoError, IoHandle};
use crate::progress::{self, Progress, ProgressReporter};
use crate::workers::{self, WorkerError};

/// Default bound on how long one turn's workers may take.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum DistributorError {
    /// The run configuration is invalid.
    #[error("invalid params: {source}")]
    Params {
        /// The validation failure.
        #[from]
        source: ParamsError,
    },

    /// The I/O collaborator failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },

    /// A turn could not be computed.
    #[error("worker error: {source}")]
    Worker {
        /// The underlying worker error.
        #[from]
        source: WorkerError,
    },

    /// The event consumer hung up before the run finished.
    #[error("event stream receiver dropped")]
    EventsClosed,
}

/// Timer and timeout options for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Period of the alive-cell reporter.
    pub progress_interval: Duration,
    /// Bound on one turn's worker join; `None` waits forever.
    pub worker_timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            progress_interval: progress::DEFAULT_INTERVAL,
            worker_timeout: Some(DEFAULT_WORKER_TIMEOUT),
        }
    }
}

/// Channels connecting a run to its collaborators.
#[derive(Debug)]
pub struct DistributorChannels {
    /// Event sink. The stream closes when the run returns.
    pub events: mpsc::Sender<Event>,
    /// Client for the image I/O collaborator.
    pub io: IoHandle,
    /// Control token source.
    pub controls: mpsc::Receiver<ControlSignal>,
}

/// Why the turn loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// All configured turns were computed.
    TurnsExhausted,
    /// A quit was observed at a turn boundary.
    QuitRequested,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the turn loop ended.
    pub end_reason: RunEndReason,
    /// Turns computed.
    pub completed_turns: u64,
    /// Live cells in the final grid.
    pub alive_cells: usize,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}

/// Run one simulation to completion.
///
/// Events are delivered on `channels.events` in generation order; the
/// channel is closed when this returns, on success or failure.
///
/// # Errors
///
/// Returns [`DistributorError`] if params are invalid, the I/O collaborator
/// fails, a turn cannot be computed, or the event consumer goes away.
pub async fn run(
    params: Params,
    options: RunOptions,
    channels: DistributorChannels,
) -> Result<RunSummary, DistributorError> {
    let DistributorChannels {
        events,
        io,
        controls,
    } = channels;

    if let Err(e) = params.validate() {
        let err = DistributorError::from(e);
        report_failure(&events, 0, &err).await;
        return Err(err);
    }

    let started_at = Utc::now();
    info!(
        turns = params.turns,
        threads = params.threads,
        width = params.image_width,
        height = params.image_height,
        "Run starting"
    );

    let control = Arc::new(ControlState::new());
    let listener = ControlListener::spawn(controls, Arc::clone(&control));

    let mut coordinator = Coordinator::new(params, options, events.clone(), io, control);
    let outcome = coordinator.execute().await;

    listener.stop().await;

    match outcome {
        Ok(end_reason) => {
            let elapsed = Utc::now().signed_duration_since(started_at).num_milliseconds();
            Ok(RunSummary {
                end_reason,
                completed_turns: coordinator.completed_turns,
                alive_cells: coordinator.grid.alive_count(),
                started_at,
                elapsed_ms: u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX),
            })
        }
        Err(err) => {
            report_failure(&events, coordinator.completed_turns, &err).await;
            Err(err)
        }
    }
}

/// Log the end of a run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        completed_turns = summary.completed_turns,
        alive_cells = summary.alive_cells,
        started_at = %summary.started_at,
        elapsed_ms = summary.elapsed_ms,
        "Run ended"
    );
}

async fn report_failure(events: &mpsc::Sender<Event>, completed_turns: u64, err: &DistributorError) {
    error!(completed_turns, error = %err, "Run failed");
    let event = Event::RunFailed {
        completed_turns,
        reason: err.to_string(),
    };
    if events.send(event).await.is_err() {
        warn!("Event stream closed before failure could be reported");
    }
}

/// Result of a turn-boundary check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Continue,
    Quit,
}

/// Run state owned by the coordinating task.
///
/// Only the coordinator mutates the grid, the turn counter, and the phase.
/// Workers and the reporter see the grid through `Arc` snapshots.
struct Coordinator {
    params: Params,
    options: RunOptions,
    events: mpsc::Sender<Event>,
    io: IoHandle,
    control: Arc<ControlState>,
    phase: Phase,
    completed_turns: u64,
    grid: Arc<Grid>,
    progress: watch::Sender<Progress>,
}

impl Coordinator {
    fn new(
        params: Params,
        options: RunOptions,
        events: mpsc::Sender<Event>,
        io: IoHandle,
        control: Arc<ControlState>,
    ) -> Self {
        let grid = Arc::new(Grid::dead(params.image_width, params.image_height));
        let (progress, _) = watch::channel(Progress {
            completed_turns: 0,
            grid: Arc::clone(&grid),
        });
        Self {
            params,
            options,
            events,
            io,
            control,
            phase: Phase::Running,
            completed_turns: 0,
            grid,
            progress,
        }
    }

    async fn execute(&mut self) -> Result<RunEndReason, DistributorError> {
        self.load_initial().await?;

        let reporter = ProgressReporter::spawn(
            self.options.progress_interval,
            self.progress.subscribe(),
            Arc::clone(&self.control),
            self.events.clone(),
        );
        let looped = self.turn_loop().await;
        reporter.stop().await;

        let end_reason = looped?;
        self.shutdown().await?;
        Ok(end_reason)
    }

    async fn load_initial(&mut self) -> Result<(), DistributorError> {
        let label = self.params.input_label();
        let grid = self
            .io
            .load(&label, self.params.image_width, self.params.image_height)
            .await?;
        info!(label, alive = grid.alive_count(), "Initial grid loaded");

        for cell in grid.alive_cells() {
            self.emit(Event::CellFlipped {
                completed_turns: 0,
                cell,
            })
            .await?;
        }
        self.publish(grid);
        Ok(())
    }

    async fn turn_loop(&mut self) -> Result<RunEndReason, DistributorError> {
        while self.completed_turns < self.params.turns {
            if self.turn_boundary().await? == Boundary::Quit {
                return Ok(RunEndReason::QuitRequested);
            }
            self.advance_turn().await?;
        }
        Ok(RunEndReason::TurnsExhausted)
    }

    /// Apply pending control requests before the next turn starts.
    ///
    /// Quit is checked before any queued toggle, and again on every wake-up
    /// while paused, so repeated pause signals can never hold off a quit.
    async fn turn_boundary(&mut self) -> Result<Boundary, DistributorError> {
        loop {
            if self.control.is_quit_requested() {
                info!(completed_turns = self.completed_turns, "Quit requested");
                return Ok(Boundary::Quit);
            }

            for signal in self.control.take_pending().await {
                self.apply(signal).await?;
            }

            if self.phase == Phase::Running {
                return Ok(Boundary::Continue);
            }
            if !self.control.is_quit_requested() {
                self.control.wait_for_signal().await;
            }
        }
    }

    async fn apply(&mut self, signal: ControlSignal) -> Result<(), DistributorError> {
        let (phase, action) = self.phase.apply(signal);
        self.phase = phase;

        match action {
            Some(Action::Pause) => {
                self.control.set_paused(true);
                self.emit_state(State::Executing).await?;
                self.emit_state(State::Paused).await?;
                info!(completed_turns = self.completed_turns, "Paused");
            }
            Some(Action::Resume) => {
                self.control.set_paused(false);
                info!(completed_turns = self.completed_turns, "Continuing");
            }
            Some(Action::Snapshot) => self.snapshot().await?,
            None => {}
        }
        Ok(())
    }

    async fn advance_turn(&mut self) -> Result<(), DistributorError> {
        let turn = self.completed_turns;
        let output = workers::run_turn(
            Arc::clone(&self.grid),
            self.params.threads,
            turn,
            self.options.worker_timeout,
        )
        .await?;

        for flip in output.flips {
            self.emit(flip).await?;
        }
        self.emit(Event::TurnComplete {
            completed_turns: turn,
        })
        .await?;

        self.completed_turns = turn.saturating_add(1);
        self.publish(output.grid);
        debug!(completed_turns = self.completed_turns, "Turn complete");
        Ok(())
    }

    async fn snapshot(&self) -> Result<(), DistributorError> {
        let label = self.params.output_label(self.completed_turns);
        self.io.save(&label, &self.grid).await?;
        info!(label, "Snapshot written");
        self.emit(Event::ImageOutputComplete {
            completed_turns: self.completed_turns,
            filename: label,
        })
        .await
    }

    async fn shutdown(&mut self) -> Result<(), DistributorError> {
        self.emit(Event::FinalTurnComplete {
            completed_turns: self.completed_turns,
            alive: self.grid.alive_cells(),
        })
        .await?;

        self.snapshot().await?;
        self.io.wait_idle().await?;

        self.emit_state(State::Quitting).await?;
        info!(completed_turns = self.completed_turns, "Shutdown complete");
        Ok(())
    }

    fn publish(&mut self, grid: Grid) {
        self.grid = Arc::new(grid);
        self.progress.send_replace(Progress {
            completed_turns: self.completed_turns,
            grid: Arc::clone(&self.grid),
        });
    }

    async fn emit_state(&self, new_state: State) -> Result<(), DistributorError> {
        self.emit(Event::StateChange {
            completed_turns: self.completed_turns,
            new_state,
        })
        .await
    }

    async fn emit(&self, event: Event) -> Result<(), DistributorError> {
        self.events
            .send(event)
            .await
            .map_err(|_closed| DistributorError::EventsClosed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gol_types::Cell;

    use super::*;
    use crate::io::{MemoryStore, spawn_io_service};

    fn params(turns: u64, threads: usize) -> Params {
        Params {
            turns,
            threads,
            image_width: 6,
            image_height: 6,
        }
    }

    async fn collect(mut rx: mpsc::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn blinker_store() -> MemoryStore {
        let store = MemoryStore::new();
        let grid =
            Grid::from_alive_cells(6, 6, &[Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)])
                .unwrap();
        store.insert_grid("6x6", &grid);
        store
    }

    #[tokio::test]
    async fn invalid_params_fail_before_any_work() {
        let (events, rx) = mpsc::channel(8);
        let (io, _service) = spawn_io_service(MemoryStore::new(), 4);
        let (_controls_tx, controls) = mpsc::channel(1);

        let result = run(params(1, 0), RunOptions::default(), DistributorChannels {
            events,
            io,
            controls,
        })
        .await;

        assert!(matches!(result, Err(DistributorError::Params { .. })));
        let events = collect(rx).await;
        assert!(matches!(events.as_slice(), [Event::RunFailed { completed_turns: 0, .. }]));
    }

    #[tokio::test]
    async fn missing_input_reports_failure_and_closes_stream() {
        let (events, rx) = mpsc::channel(8);
        let (io, _service) = spawn_io_service(MemoryStore::new(), 4);
        let (_controls_tx, controls) = mpsc::channel(1);

        let result = run(params(3, 2), RunOptions::default(), DistributorChannels {
            events,
            io,
            controls,
        })
        .await;

        assert!(matches!(result, Err(DistributorError::Io { .. })));
        let events = collect(rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events.first(), Some(Event::RunFailed { .. })));
    }

    #[tokio::test]
    async fn summary_reports_turns_and_alive_cells() {
        let (events, rx) = mpsc::channel(64);
        let (io, _service) = spawn_io_service(blinker_store(), 4);
        let (_controls_tx, controls) = mpsc::channel(1);

        let consumer = tokio::spawn(collect(rx));
        let summary = run(params(3, 3), RunOptions::default(), DistributorChannels {
            events,
            io,
            controls,
        })
        .await
        .unwrap();
        let events = consumer.await.unwrap();

        assert_eq!(summary.end_reason, RunEndReason::TurnsExhausted);
        assert_eq!(summary.completed_turns, 3);
        assert_eq!(summary.alive_cells, 3);
        assert_eq!(
            events.last(),
            Some(&Event::StateChange {
                completed_turns: 3,
                new_state: State::Quitting,
            })
        );
    }
}
