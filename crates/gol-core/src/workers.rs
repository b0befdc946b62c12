//! Fork-join execution of one turn.
//!
//! Each turn spawns one blocking task per band against the same frozen
//! `Arc<Grid>` snapshot. Results land in an indexed slot per band as tasks
//! finish, in whatever order they finish, and are concatenated in band
//! order once every slot is filled. The coordinator does not build the next
//! grid until the join completes.

use std::sync::Arc;
use std::time::Duration;

use gol_types::Event;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::grid::{Grid, GridError};
use crate::partition::{Band, partition};
use crate::turn::{self, BandOutput};

/// Signature of the per-band computation run by each worker.
pub type BandFn = fn(Band, &Grid, u64) -> BandOutput;

/// Errors that can occur while running a turn across workers.
///
/// Band computation is pure, so every variant indicates a defect or a
/// stuck worker rather than a recoverable condition.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Not every band reported back within the configured bound.
    #[error("turn {turn}: workers did not finish within {timeout_ms}ms")]
    Timeout {
        /// Index of the turn being computed.
        turn: u64,
        /// The bound that was exceeded.
        timeout_ms: u64,
    },

    /// A worker task panicked or was cancelled.
    #[error("turn {turn}: worker failed: {message}")]
    Failed {
        /// Index of the turn being computed.
        turn: u64,
        /// Description from the join error.
        message: String,
    },

    /// A band slot was never filled.
    #[error("turn {turn}: band {band_index} produced no result")]
    MissingBand {
        /// Index of the turn being computed.
        turn: u64,
        /// Position of the band in the partition.
        band_index: usize,
    },

    /// The merged bands do not form a grid of the original size.
    #[error("turn {turn}: merged bands are malformed: {source}")]
    Merge {
        /// Index of the turn being computed.
        turn: u64,
        /// The underlying grid error.
        source: GridError,
    },
}

/// Merged result of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutput {
    /// The next-generation grid.
    pub grid: Grid,
    /// Flip events from every band, bands in ascending order.
    pub flips: Vec<Event>,
}

/// Run turn `turn` over `view` with `threads` workers.
///
/// # Errors
///
/// Returns [`WorkerError`] if a worker fails or the join exceeds `timeout`.
pub async fn run_turn(
    view: Arc<Grid>,
    threads: usize,
    turn: u64,
    timeout: Option<Duration>,
) -> Result<TurnOutput, WorkerError> {
    run_turn_with(view, threads, turn, timeout, turn::compute_band).await
}

/// Like [`run_turn`], with the per-band computation supplied by the caller.
///
/// # Errors
///
/// Returns [`WorkerError`] if a worker fails or the join exceeds `timeout`.
pub async fn run_turn_with(
    view: Arc<Grid>,
    threads: usize,
    turn: u64,
    timeout: Option<Duration>,
    compute: BandFn,
) -> Result<TurnOutput, WorkerError> {
    let bands = partition(view.height(), threads);

    let mut workers = JoinSet::new();
    for (index, band) in bands.iter().copied().enumerate() {
        let view = Arc::clone(&view);
        workers.spawn_blocking(move || (index, compute(band, &view, turn)));
    }

    let mut slots: Vec<Option<BandOutput>> =
        std::iter::repeat_with(|| None).take(bands.len()).collect();

    let gather = async {
        while let Some(joined) = workers.join_next().await {
            let (index, output) = joined.map_err(|e| WorkerError::Failed {
                turn,
                message: e.to_string(),
            })?;
            match slots.get_mut(index) {
                Some(slot) => *slot = Some(output),
                None => warn!(turn, band_index = index, "Worker returned unknown band index"),
            }
        }
        Ok::<(), WorkerError>(())
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, gather)
            .await
            .map_err(|_elapsed| WorkerError::Timeout {
                turn,
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })??,
        None => gather.await?,
    }

    merge(&view, turn, slots)
}

/// Concatenate band results in band order into the next grid.
fn merge(
    view: &Grid,
    turn: u64,
    slots: Vec<Option<BandOutput>>,
) -> Result<TurnOutput, WorkerError> {
    let mut cells = Vec::with_capacity(view.width().saturating_mul(view.height()));
    let mut flips = Vec::new();

    for (band_index, slot) in slots.into_iter().enumerate() {
        let output = slot.ok_or(WorkerError::MissingBand { turn, band_index })?;
        cells.extend(output.cells);
        flips.extend(output.flips);
    }

    let grid = Grid::from_cells(view.width(), view.height(), cells)
        .map_err(|source| WorkerError::Merge { turn, source })?;
    debug!(turn, flips = flips.len(), "Bands merged");
    Ok(TurnOutput { grid, flips })
}
