//! Static row-band partitioning.
//!
//! Every band has `height / threads` rows except the last, which also takes
//! the remainder. The partition depends only on the grid height and worker
//! count, so it is identical every turn of a run.

use std::ops::Range;

/// A half-open row range `[start_y, end_y)` computed by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Band {
    /// First row of the band.
    pub start_y: usize,
    /// One past the last row of the band.
    pub end_y: usize,
}

impl Band {
    /// Create a band covering rows `start_y..end_y`.
    pub const fn new(start_y: usize, end_y: usize) -> Self {
        Self { start_y, end_y }
    }

    /// A single band covering a whole grid of the given height.
    pub const fn whole(height: usize) -> Self {
        Self::new(0, height)
    }

    /// Number of rows in the band.
    pub const fn len(&self) -> usize {
        self.end_y.saturating_sub(self.start_y)
    }

    /// Whether the band has no rows.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The band's rows as a range.
    pub const fn rows(&self) -> Range<usize> {
        self.start_y..self.end_y
    }
}

/// Split `height` rows into `threads` contiguous bands in ascending order.
///
/// A `threads` of zero is treated as one. When `threads > height` the
/// leading bands are empty and the last band holds every row.
pub fn partition(height: usize, threads: usize) -> Vec<Band> {
    let threads = threads.max(1);
    let band_height = height.checked_div(threads).unwrap_or(height);
    let last = threads.saturating_sub(1);

    (0..threads)
        .map(|i| {
            let start_y = i.saturating_mul(band_height);
            let end_y = if i == last {
                height
            } else {
                start_y.saturating_add(band_height)
            };
            Band::new(start_y, end_y)
        })
        .collect()
}
