//! Control tokens accepted by the distributor while a run is in progress.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A discrete control token from the outside world.
///
/// Tokens arrive asynchronously relative to the turn loop. The distributor
/// applies them at the next turn boundary, never in the middle of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSignal {
    /// Pause a running simulation, or resume a paused one.
    PauseToggle,
    /// Write the current grid through the output collaborator.
    Snapshot,
    /// Stop at the next turn boundary and shut down cleanly.
    Quit,
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PauseToggle => "pause-toggle",
            Self::Snapshot => "snapshot",
            Self::Quit => "quit",
        };
        f.write_str(name)
    }
}
