//! Cell coordinates and cell byte values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte value of a live cell in the image wire format.
pub const ALIVE: u8 = 255;

/// Byte value of a dead cell in the image wire format.
pub const DEAD: u8 = 0;

/// Global coordinates of a single cell.
///
/// `x` is the column (0 at the left edge), `y` is the row (0 at the top).
/// Ordering is row-major so sorted cell lists match the order cells appear
/// in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column index.
    pub x: usize,
    /// Row index.
    pub y: usize,
}

impl Cell {
    /// Create a cell at column `x`, row `y`.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
