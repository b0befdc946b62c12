//! Turn engine, worker coordination, and run control for the gol distributor.
//!
//! This crate owns the distributor: the coordinating routine that splits
//! each Game of Life turn across a fixed number of workers, merges their
//! results, applies pause/snapshot/quit requests between turns, and reports
//! progress on a timer.
//!
//! # Modules
//!
//! - [`grid`] -- Toroidal cell grid and neighbour counting.
//! - [`partition`] -- Static row-band partitioning.
//! - [`turn`] -- Pure per-band next-generation computation.
//! - [`workers`] -- Fork-join execution of one turn across all bands.
//! - [`progress`] -- Timer-driven alive-cell reporter.
//! - [`control`] -- Control listener, shared control state, and the
//!   pause state machine.
//! - [`io`] -- Request/response protocol to the image I/O collaborator.
//! - [`distributor`] -- The turn loop, snapshotting, and shutdown sequence.
//! - [`config`] -- Configuration loading from `gol-config.yaml`.

pub mod config;
pub mod control;
pub mod distributor;
pub mod grid;
pub mod io;
pub mod partition;
pub mod progress;
pub mod turn;
pub mod workers;

pub use distributor::{DistributorChannels, DistributorError, RunOptions, RunSummary, run};
pub use grid::Grid;
