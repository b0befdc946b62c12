//! Event consumer: logs the distributor's event stream.

use gol_types::Event;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

/// Tally of what the consumer saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Events received.
    pub events: u64,
    /// `CellFlipped` events received.
    pub cell_flips: u64,
    /// Snapshot labels written, in order.
    pub images: Vec<String>,
    /// Reason carried by a `RunFailed` event, if any.
    pub failure: Option<String>,
}

/// Drain `events` until the stream closes, logging each event.
pub async fn consume(mut events: mpsc::Receiver<Event>) -> SinkStats {
    let mut stats = SinkStats::default();
    while let Some(event) = events.recv().await {
        stats.events = stats.events.saturating_add(1);
        record(&mut stats, event);
    }
    debug!(events = stats.events, cell_flips = stats.cell_flips, "Event stream closed");
    stats
}

fn record(stats: &mut SinkStats, event: Event) {
    match event {
        Event::CellFlipped {
            completed_turns,
            cell,
        } => {
            stats.cell_flips = stats.cell_flips.saturating_add(1);
            trace!(completed_turns, %cell, "Cell flipped");
        }
        Event::TurnComplete { completed_turns } => {
            debug!(completed_turns, "Turn complete");
        }
        Event::AliveCellsCount {
            completed_turns,
            cells_count,
        } => info!(completed_turns, cells_count, "Alive cells"),
        Event::StateChange {
            completed_turns,
            new_state,
        } => info!(completed_turns, state = %new_state, "State changed"),
        Event::ImageOutputComplete {
            completed_turns,
            filename,
        } => {
            info!(completed_turns, filename, "Image output complete");
            stats.images.push(filename);
        }
        Event::FinalTurnComplete {
            completed_turns,
            alive,
        } => info!(completed_turns, alive_cells = alive.len(), "Final turn complete"),
        Event::RunFailed {
            completed_turns,
            reason,
        } => {
            error!(completed_turns, reason, "Run failed");
            stats.failure = Some(reason);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gol_types::{Cell, State};

    use super::*;

    #[tokio::test]
    async fn consume_tallies_until_close() {
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(consume(rx));

        for event in [
            Event::CellFlipped {
                completed_turns: 0,
                cell: Cell::new(1, 1),
            },
            Event::TurnComplete { completed_turns: 0 },
            Event::ImageOutputComplete {
                completed_turns: 1,
                filename: "4x4x1".to_owned(),
            },
            Event::StateChange {
                completed_turns: 1,
                new_state: State::Quitting,
            },
        ] {
            tx.send(event).await.unwrap();
        }
        drop(tx);

        let stats = task.await.unwrap();
        assert_eq!(stats.events, 4);
        assert_eq!(stats.cell_flips, 1);
        assert_eq!(stats.images, vec!["4x4x1".to_owned()]);
        assert_eq!(stats.failure, None);
    }

    #[tokio::test]
    async fn failure_reason_is_kept() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(Event::RunFailed {
            completed_turns: 3,
            reason: "disk full".to_owned(),
        })
        .await
        .unwrap();
        drop(tx);

        let stats = consume(rx).await;
        assert_eq!(stats.failure.as_deref(), Some("disk full"));
    }
}
