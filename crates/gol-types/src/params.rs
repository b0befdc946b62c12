//! Immutable run configuration.

use serde::{Deserialize, Serialize};

/// Errors produced when validating [`Params`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    /// At least one worker is required.
    #[error("threads must be at least 1")]
    ZeroThreads,

    /// Grid width and height must both be positive.
    #[error("invalid grid dimensions {width}x{height}: both must be positive")]
    EmptyGrid {
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
    },

    /// `width * height` does not fit in memory addressing.
    #[error("grid dimensions {width}x{height} overflow usize")]
    TooLarge {
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
    },
}

/// Run configuration supplied once at the start of a run.
///
/// Params never change mid-run. The distributor rejects invalid params
/// before any task is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Number of generations to compute.
    pub turns: u64,
    /// Number of workers (row bands) per turn.
    pub threads: usize,
    /// Grid width in cells.
    pub image_width: usize,
    /// Grid height in cells.
    pub image_height: usize,
}

impl Params {
    /// Check the invariants the distributor relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] describing the first violated invariant.
    pub const fn validate(&self) -> Result<(), ParamsError> {
        if self.threads == 0 {
            return Err(ParamsError::ZeroThreads);
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ParamsError::EmptyGrid {
                width: self.image_width,
                height: self.image_height,
            });
        }
        if self.image_width.checked_mul(self.image_height).is_none() {
            return Err(ParamsError::TooLarge {
                width: self.image_width,
                height: self.image_height,
            });
        }
        Ok(())
    }

    /// Label of the input image for these dimensions, e.g. `"512x512"`.
    pub fn input_label(&self) -> String {
        format!("{}x{}", self.image_width, self.image_height)
    }

    /// Label of a snapshot taken after `completed_turns` turns, e.g.
    /// `"512x512x100"`.
    pub fn output_label(&self, completed_turns: u64) -> String {
        format!("{}x{completed_turns}", self.input_label())
    }
}
