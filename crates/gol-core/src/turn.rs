//! Turn engine: one Game of Life generation for a row band.
//!
//! [`compute_band`] is pure. It reads the full grid through a shared
//! reference (neighbours of the band's edge rows live in other bands) and
//! returns the band's next-generation rows plus one flip event per cell that
//! changed state.

use gol_types::{Cell, Event};

use crate::grid::Grid;
use crate::partition::Band;

/// Next-generation rows and flip events for one band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandOutput {
    /// The band that was computed.
    pub band: Band,
    /// Row-major cells for rows `band.start_y..band.end_y`.
    pub cells: Vec<bool>,
    /// One [`Event::CellFlipped`] per changed cell, in row-major order.
    pub flips: Vec<Event>,
}

/// Standard B3/S23 rule.
pub const fn next_state(alive: bool, neighbours: u8) -> bool {
    matches!((alive, neighbours), (true, 2 | 3) | (false, 3))
}

/// Compute the next generation of `band` from `view`.
///
/// Flip events carry `turn` and global coordinates. Rows past the bottom
/// of the grid are ignored.
pub fn compute_band(band: Band, view: &Grid, turn: u64) -> BandOutput {
    let band = Band::new(band.start_y.min(view.height()), band.end_y.min(view.height()));
    let width = view.width();
    let mut cells = Vec::with_capacity(band.len().saturating_mul(width));
    let mut flips = Vec::new();

    for y in band.rows() {
        for (x, &alive) in view.row(y).iter().enumerate() {
            let next = next_state(alive, view.count_alive_neighbours(x, y));
            if next != alive {
                flips.push(Event::CellFlipped {
                    completed_turns: turn,
                    cell: Cell::new(x, y),
                });
            }
            cells.push(next);
        }
    }

    BandOutput { band, cells, flips }
}

/// Compute the next generation of the whole grid in a single band.
///
/// # Errors
///
/// Never fails for a well-formed grid; the result type is shared with the
/// grid constructor.
pub fn compute_turn(view: &Grid, turn: u64) -> Result<(Grid, Vec<Event>), crate::grid::GridError> {
    let output = compute_band(Band::whole(view.height()), view, turn);
    let grid = Grid::from_cells(view.width(), view.height(), output.cells)?;
    Ok((grid, output.flips))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn grid(width: usize, height: usize, alive: &[(usize, usize)]) -> Grid {
        let cells: Vec<Cell> = alive.iter().map(|&(x, y)| Cell::new(x, y)).collect();
        Grid::from_alive_cells(width, height, &cells).unwrap()
    }

    fn flipped_cells(flips: &[Event]) -> BTreeSet<Cell> {
        flips
            .iter()
            .filter_map(|e| match e {
                Event::CellFlipped { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn rule_table() {
        assert!(!next_state(true, 0));
        assert!(!next_state(true, 1));
        assert!(next_state(true, 2));
        assert!(next_state(true, 3));
        assert!(!next_state(true, 4));
        assert!(!next_state(true, 8));
        assert!(!next_state(false, 2));
        assert!(next_state(false, 3));
        assert!(!next_state(false, 4));
    }

    #[test]
    fn lone_cell_dies() {
        let g = grid(8, 8, &[(4, 4)]);
        let (next, flips) = compute_turn(&g, 0).unwrap();
        assert_eq!(next.alive_count(), 0);
        assert_eq!(flipped_cells(&flips), BTreeSet::from([Cell::new(4, 4)]));
    }

    #[test]
    fn block_is_still_life() {
        let block = grid(6, 6, &[(2, 2), (3, 2), (2, 3), (3, 3)]);
        let mut current = block.clone();
        for turn in 0..5 {
            let (next, flips) = compute_turn(&current, turn).unwrap();
            assert!(flips.is_empty());
            current = next;
        }
        assert_eq!(current, block);
    }

    #[test]
    fn blinker_has_period_two() {
        let horizontal = grid(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let vertical = grid(5, 5, &[(2, 1), (2, 2), (2, 3)]);

        let (after_one, flips) = compute_turn(&horizontal, 0).unwrap();
        assert_eq!(after_one, vertical);
        assert_eq!(flips.len(), 4);

        let (after_two, _) = compute_turn(&after_one, 1).unwrap();
        assert_eq!(after_two, horizontal);
    }

    #[test]
    fn blinker_wraps_across_edges() {
        let horizontal = grid(5, 5, &[(4, 0), (0, 0), (1, 0)]);
        let vertical = grid(5, 5, &[(0, 4), (0, 0), (0, 1)]);
        let (next, _) = compute_turn(&horizontal, 0).unwrap();
        assert_eq!(next, vertical);
    }

    #[test]
    fn band_flips_use_global_coordinates_and_turn() {
        let g = grid(5, 6, &[(1, 4), (2, 4), (3, 4)]);
        let output = compute_band(Band::new(3, 6), &g, 7);
        assert_eq!(output.cells.len(), 15);
        assert!(output.flips.iter().all(|e| e.completed_turns() == 7));
        assert_eq!(
            flipped_cells(&output.flips),
            BTreeSet::from([Cell::new(1, 4), Cell::new(3, 4), Cell::new(2, 3), Cell::new(2, 5)])
        );
    }

    #[test]
    fn flips_are_exactly_the_changed_cells() {
        let g = grid(7, 7, &[(1, 1), (2, 1), (3, 1), (5, 5), (5, 6), (0, 3)]);
        let (next, flips) = compute_turn(&g, 0).unwrap();

        let mut changed = BTreeSet::new();
        for y in 0..7 {
            for x in 0..7 {
                if g.is_alive(x, y) != next.is_alive(x, y) {
                    changed.insert(Cell::new(x, y));
                }
            }
        }
        assert_eq!(flipped_cells(&flips), changed);
        assert_eq!(flips.len(), changed.len());
    }

    #[test]
    fn empty_band_produces_nothing() {
        let g = grid(4, 4, &[(1, 1)]);
        let output = compute_band(Band::new(2, 2), &g, 0);
        assert!(output.cells.is_empty());
        assert!(output.flips.is_empty());
    }
}
