//! Shared type definitions for the gol distributor.
//!
//! This crate is the single source of truth for the values that cross the
//! boundary between the distributor core, the I/O collaborator, and whatever
//! consumes the event stream.
//!
//! # Modules
//!
//! - [`cell`] -- Cell coordinates and the on-the-wire cell byte values
//! - [`params`] -- Immutable run configuration and its validation
//! - [`events`] -- Events emitted by the distributor
//! - [`control`] -- Control tokens accepted from the outside world

pub mod cell;
pub mod control;
pub mod events;
pub mod params;

pub use cell::{ALIVE, Cell, DEAD};
pub use control::ControlSignal;
pub use events::{Event, State};
pub use params::{Params, ParamsError};
