//! Toroidal cell grid.
//!
//! The grid is replaced wholesale every turn and never mutated once built.
//! Workers share it through an `Arc` for the duration of a single turn.
//! Neighbour lookups wrap at every edge: column `-1` is column `width - 1`
//! and row `height` is row `0`.

use gol_types::{ALIVE, Cell, DEAD};

/// Errors produced when building a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The cell buffer does not hold `width * height` entries.
    #[error("expected {expected} cells for a {width}x{height} grid, got {actual}")]
    SizeMismatch {
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
        /// `width * height`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// A live cell lies outside the grid.
    #[error("cell {cell} is outside a {width}x{height} grid")]
    OutOfBounds {
        /// The offending cell.
        cell: Cell,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
}

/// A `width × height` grid of live and dead cells in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// Create a grid in which every cell is dead.
    pub fn dead(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width.saturating_mul(height)],
        }
    }

    /// Build a grid from a row-major cell buffer.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::SizeMismatch`] if `cells.len() != width * height`.
    pub fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Result<Self, GridError> {
        let expected = width.saturating_mul(height);
        if cells.len() != expected {
            return Err(GridError::SizeMismatch {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a grid from image bytes in row-major order.
    ///
    /// `0` is dead; any other value is alive.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::SizeMismatch`] if the byte count is wrong.
    pub fn from_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self, GridError> {
        let cells = bytes.iter().map(|&b| b != DEAD).collect();
        Self::from_cells(width, height, cells)
    }

    /// Build a grid with exactly the given cells alive.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] if any cell lies outside the grid.
    pub fn from_alive_cells(width: usize, height: usize, alive: &[Cell]) -> Result<Self, GridError> {
        let mut grid = Self::dead(width, height);
        for &cell in alive {
            let slot = grid
                .index(cell.x, cell.y)
                .and_then(|idx| grid.cells.get_mut(idx))
                .ok_or(GridError::OutOfBounds {
                    cell,
                    width,
                    height,
                })?;
            *slot = true;
        }
        Ok(grid)
    }

    /// Grid width in cells.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Whether the cell at column `x`, row `y` is alive.
    ///
    /// Coordinates outside the grid read as dead.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.index(x, y)
            .and_then(|idx| self.cells.get(idx))
            .copied()
            .unwrap_or(false)
    }

    /// The cells of row `y`, or an empty slice if `y` is out of range.
    pub fn row(&self, y: usize) -> &[bool] {
        let start = y.saturating_mul(self.width);
        let end = start.saturating_add(self.width);
        self.cells.get(start..end).unwrap_or(&[])
    }

    /// Count the live cells among the eight toroidally wrapped neighbours
    /// of `(x, y)`.
    ///
    /// On grids narrower or shorter than three cells the same neighbour can
    /// be visited more than once, exactly as `(x + dx) mod width` would.
    pub fn count_alive_neighbours(&self, x: usize, y: usize) -> u8 {
        let xs = [wrap_prev(x, self.width), x, wrap_next(x, self.width)];
        let ys = [wrap_prev(y, self.height), y, wrap_next(y, self.height)];

        let mut count: u8 = 0;
        for (dy, &ny) in ys.iter().enumerate() {
            for (dx, &nx) in xs.iter().enumerate() {
                if dy == 1 && dx == 1 {
                    continue;
                }
                if self.is_alive(nx, ny) {
                    count = count.saturating_add(1);
                }
            }
        }
        count
    }

    /// Number of live cells.
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// All live cells in row-major order.
    pub fn alive_cells(&self) -> Vec<Cell> {
        (0..self.height)
            .flat_map(|y| {
                self.row(y)
                    .iter()
                    .enumerate()
                    .filter(|(_, alive)| **alive)
                    .map(move |(x, _)| Cell::new(x, y))
            })
            .collect()
    }

    /// Image bytes in row-major order: [`ALIVE`] or [`DEAD`] per cell.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells
            .iter()
            .map(|&alive| if alive { ALIVE } else { DEAD })
            .collect()
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        y.checked_mul(self.width)?.checked_add(x)
    }
}

/// Free-function form of [`Grid::count_alive_neighbours`].
pub fn count_alive_neighbours(grid: &Grid, x: usize, y: usize) -> u8 {
    grid.count_alive_neighbours(x, y)
}

const fn wrap_prev(i: usize, extent: usize) -> usize {
    if i == 0 {
        extent.saturating_sub(1)
    } else {
        i.saturating_sub(1)
    }
}

const fn wrap_next(i: usize, extent: usize) -> usize {
    let next = i.saturating_add(1);
    if next >= extent { 0 } else { next }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize, alive: &[(usize, usize)]) -> Grid {
        let cells: Vec<Cell> = alive.iter().map(|&(x, y)| Cell::new(x, y)).collect();
        Grid::from_alive_cells(width, height, &cells).unwrap()
    }

    #[test]
    fn interior_cell_counts_all_eight() {
        let g = grid(
            5,
            5,
            &[(1, 1), (2, 1), (3, 1), (1, 2), (3, 2), (1, 3), (2, 3), (3, 3)],
        );
        assert_eq!(g.count_alive_neighbours(2, 2), 8);
        assert_eq!(count_alive_neighbours(&g, 2, 2), 8);
    }

    #[test]
    fn origin_wraps_to_opposite_edges() {
        let g = grid(6, 4, &[(5, 3), (5, 0), (0, 3)]);
        assert_eq!(g.count_alive_neighbours(0, 0), 3);
    }

    #[test]
    fn every_corner_sees_the_other_three() {
        let g = grid(6, 4, &[(0, 0), (5, 0), (0, 3), (5, 3)]);
        for &(x, y) in &[(0, 0), (5, 0), (0, 3), (5, 3)] {
            assert_eq!(g.count_alive_neighbours(x, y), 3, "corner ({x}, {y})");
        }
    }

    #[test]
    fn cell_does_not_count_itself() {
        let g = grid(5, 5, &[(2, 2)]);
        assert_eq!(g.count_alive_neighbours(2, 2), 0);
        assert_eq!(g.count_alive_neighbours(1, 1), 1);
    }

    #[test]
    fn from_bytes_treats_nonzero_as_alive() {
        let g = Grid::from_bytes(2, 2, &[0, 255, 1, 0]).unwrap();
        assert_eq!(g.alive_cells(), vec![Cell::new(1, 0), Cell::new(0, 1)]);
        assert_eq!(g.to_bytes(), vec![0, 255, 255, 0]);
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        let err = Grid::from_bytes(3, 3, &[0; 8]).unwrap_err();
        assert_eq!(
            err,
            GridError::SizeMismatch {
                width: 3,
                height: 3,
                expected: 9,
                actual: 8,
            }
        );
    }

    #[test]
    fn from_alive_cells_rejects_out_of_bounds() {
        let err = Grid::from_alive_cells(3, 3, &[Cell::new(3, 0)]).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { .. }));
    }

    #[test]
    fn rows_slice_row_major() {
        let g = grid(3, 2, &[(0, 1), (2, 1)]);
        assert_eq!(g.row(0), &[false, false, false]);
        assert_eq!(g.row(1), &[true, false, true]);
        assert!(g.row(2).is_empty());
        assert_eq!(g.alive_count(), 2);
    }
}
