//! Events emitted by the distributor.
//!
//! Events are produced, never retracted. They reach the consumer in the
//! order the coordinator generates them: every `CellFlipped` of a turn
//! precedes that turn's `TurnComplete`, and the stream ends with
//! `StateChange { new_state: Quitting }` on a clean run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell::Cell;

/// Execution state reported through [`Event::StateChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// The turn loop is blocked until resumed.
    Paused,
    /// The turn loop is running.
    Executing,
    /// The run has finished and the stream is about to close.
    Quitting,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Paused => "Paused",
            Self::Executing => "Executing",
            Self::Quitting => "Quitting",
        };
        f.write_str(name)
    }
}

/// A notification from the distributor to the event consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A cell changed state during the turn with index `completed_turns`.
    ///
    /// Also emitted with `completed_turns == 0` for every live cell of the
    /// initial grid.
    CellFlipped {
        /// Index of the turn that produced the flip.
        completed_turns: u64,
        /// Global coordinates of the cell.
        cell: Cell,
    },

    /// All bands of the turn with index `completed_turns` were merged.
    TurnComplete {
        /// Index of the turn that finished.
        completed_turns: u64,
    },

    /// Periodic progress sample from the progress reporter.
    AliveCellsCount {
        /// Turns completed when the sample was taken.
        completed_turns: u64,
        /// Number of live cells in the sampled grid.
        cells_count: usize,
    },

    /// The run changed execution state.
    StateChange {
        /// Turns completed at the transition.
        completed_turns: u64,
        /// The state being entered.
        new_state: State,
    },

    /// A snapshot was handed to the output collaborator.
    ImageOutputComplete {
        /// Turns completed when the snapshot was taken.
        completed_turns: u64,
        /// Label the snapshot was written under.
        filename: String,
    },

    /// The turn loop exited.
    FinalTurnComplete {
        /// Total turns completed by the run.
        completed_turns: u64,
        /// Live cells of the final grid in row-major order.
        alive: Vec<Cell>,
    },

    /// The run aborted on a fatal error. No further events follow.
    RunFailed {
        /// Turns completed before the failure.
        completed_turns: u64,
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl Event {
    /// The turn counter carried by this event.
    pub const fn completed_turns(&self) -> u64 {
        match self {
            Self::CellFlipped { completed_turns, .. }
            | Self::TurnComplete { completed_turns }
            | Self::AliveCellsCount { completed_turns, .. }
            | Self::StateChange { completed_turns, .. }
            | Self::ImageOutputComplete { completed_turns, .. }
            | Self::FinalTurnComplete { completed_turns, .. }
            | Self::RunFailed { completed_turns, .. } => *completed_turns,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CellFlipped { completed_turns, cell } => {
                write!(f, "turn {completed_turns}: cell {cell} flipped")
            }
            Self::TurnComplete { completed_turns } => {
                write!(f, "turn {completed_turns}: complete")
            }
            Self::AliveCellsCount {
                completed_turns,
                cells_count,
            } => write!(f, "after {completed_turns} turns: {cells_count} alive cells"),
            Self::StateChange {
                completed_turns,
                new_state,
            } => write!(f, "after {completed_turns} turns: {new_state}"),
            Self::ImageOutputComplete {
                completed_turns,
                filename,
            } => write!(f, "after {completed_turns} turns: wrote {filename}"),
            Self::FinalTurnComplete {
                completed_turns,
                alive,
            } => write!(
                f,
                "finished after {completed_turns} turns with {} alive cells",
                alive.len()
            ),
            Self::RunFailed {
                completed_turns,
                reason,
            } => write!(f, "failed after {completed_turns} turns: {reason}"),
        }
    }
}
