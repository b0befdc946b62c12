//! Control protocol: listener task, shared control state, and the pause
//! state machine.
//!
//! The listener drains the external control source and records each token
//! on [`ControlState`]. A quit sets a sticky flag; pause toggles and
//! snapshot requests are queued in arrival order. Every submission wakes
//! the coordinator, which applies queued requests through [`Phase::apply`]
//! only at turn boundaries.
//!
//! # Architecture
//!
//! The paused and quit flags are atomics so the progress reporter can read
//! them without locks. Only the coordinator writes the paused flag.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gol_types::ControlSignal;
use tokio::sync::{Mutex, Notify, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Shared control state between the listener, the coordinator, and the
/// progress reporter.
#[derive(Debug, Default)]
pub struct ControlState {
    /// Whether the coordinator is currently in [`Phase::Paused`].
    paused: AtomicBool,

    /// Whether a quit has been requested. Never cleared.
    quit_requested: AtomicBool,

    /// Pause toggles and snapshot requests awaiting the next turn boundary.
    pending: Mutex<VecDeque<ControlSignal>>,

    /// Wakes the coordinator while it waits in the paused phase.
    wake: Notify,
}

impl ControlState {
    /// Create a control state in the running phase with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the run is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Publish the coordinator's phase. Called only by the coordinator.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    /// Request a clean stop at the next turn boundary.
    pub fn request_quit(&self) {
        self.quit_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether a quit has been requested.
    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested.load(Ordering::Acquire)
    }

    /// Record a control token and wake the coordinator.
    pub async fn submit(&self, signal: ControlSignal) {
        match signal {
            ControlSignal::Quit => self.request_quit(),
            ControlSignal::PauseToggle | ControlSignal::Snapshot => {
                self.pending.lock().await.push_back(signal);
                self.wake.notify_one();
            }
        }
    }

    /// Take every queued request, oldest first.
    pub async fn take_pending(&self) -> Vec<ControlSignal> {
        self.pending.lock().await.drain(..).collect()
    }

    /// Wait until the next token is submitted.
    ///
    /// A submission that happened since the last wait completes this
    /// immediately, so callers must re-check state after waking.
    pub async fn wait_for_signal(&self) {
        self.wake.notified().await;
    }
}

/// Phase of the turn loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Turns are being computed.
    #[default]
    Running,
    /// No turn starts until resumed.
    Paused,
}

/// Side effect the coordinator performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Entered [`Phase::Paused`]; announce it.
    Pause,
    /// Entered [`Phase::Running`] from paused.
    Resume,
    /// Write a snapshot of the current grid.
    Snapshot,
}

impl Phase {
    /// Apply a control token, returning the next phase and the action to
    /// perform.
    ///
    /// Quit does not change the phase; it is carried by the sticky flag on
    /// [`ControlState`] and checked before any queued request.
    pub const fn apply(self, signal: ControlSignal) -> (Self, Option<Action>) {
        match (self, signal) {
            (Self::Running, ControlSignal::PauseToggle) => (Self::Paused, Some(Action::Pause)),
            (Self::Paused, ControlSignal::PauseToggle) => (Self::Running, Some(Action::Resume)),
            (phase, ControlSignal::Snapshot) => (phase, Some(Action::Snapshot)),
            (phase, ControlSignal::Quit) => (phase, None),
        }
    }
}

/// Handle to the background task that drains the control source.
#[derive(Debug)]
pub struct ControlListener {
    handle: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl ControlListener {
    /// Start forwarding tokens from `source` into `control`.
    ///
    /// The task ends when [`stop`](Self::stop) is called or the source is
    /// closed. A closed source leaves nobody able to resume or quit the
    /// run, so it is recorded as a quit request.
    pub fn spawn(source: mpsc::Receiver<ControlSignal>, control: Arc<ControlState>) -> Self {
        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(listen(source, control, stop_rx));
        Self { handle, stop }
    }

    /// Stop the listener and wait for it to finish.
    pub async fn stop(self) {
        // The task may already have exited because its source closed.
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Control listener ended abnormally");
        }
    }
}

async fn listen(
    mut source: mpsc::Receiver<ControlSignal>,
    control: Arc<ControlState>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            signal = source.recv() => match signal {
                Some(signal) => {
                    info!(%signal, "Control signal received");
                    control.submit(signal).await;
                }
                None => {
                    info!("Control source closed, requesting quit");
                    control.request_quit();
                    break;
                }
            },
        }
    }
}
