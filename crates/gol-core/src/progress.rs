//! Timer-driven alive-cell reporter.
//!
//! Runs beside the turn loop on its own interval. Each tick samples the
//! most recently published grid; it stays silent before the first completed
//! turn and while the run is paused.

use std::sync::Arc;
use std::time::Duration;

use gol_types::Event;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::control::ControlState;
use crate::grid::Grid;

/// Default sampling period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// The latest state published by the coordinator after each turn.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Turns completed so far.
    pub completed_turns: u64,
    /// Grid after `completed_turns` turns.
    pub grid: Arc<Grid>,
}

/// Decide what a tick should report, if anything.
pub fn sample(progress: &Progress, paused: bool) -> Option<Event> {
    if progress.completed_turns == 0 || paused {
        return None;
    }
    Some(Event::AliveCellsCount {
        completed_turns: progress.completed_turns,
        cells_count: progress.grid.alive_count(),
    })
}

/// Handle to the running reporter task.
#[derive(Debug)]
pub struct ProgressReporter {
    handle: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl ProgressReporter {
    /// Start reporting every `period`, first tick one period from now.
    pub fn spawn(
        period: Duration,
        progress: watch::Receiver<Progress>,
        control: Arc<ControlState>,
        events: mpsc::Sender<Event>,
    ) -> Self {
        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(report(period, progress, control, events, stop_rx));
        Self { handle, stop }
    }

    /// Stop the timer and wait for the task to exit.
    ///
    /// No tick is delivered after this returns.
    pub async fn stop(self) {
        // The task may already have exited because the event stream closed.
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Progress reporter ended abnormally");
        }
    }
}

async fn report(
    period: Duration,
    progress: watch::Receiver<Progress>,
    control: Arc<ControlState>,
    events: mpsc::Sender<Event>,
    mut stop: oneshot::Receiver<()>,
) {
    let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let latest = progress.borrow().clone();
                let Some(event) = sample(&latest, control.is_paused()) else {
                    continue;
                };
                debug!(%event, "Progress tick");
                if events.send(event).await.is_err() {
                    debug!("Event stream closed, progress reporter exiting");
                    break;
                }
            }
        }
    }
}
