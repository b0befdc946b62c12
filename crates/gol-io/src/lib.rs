//! PGM image collaborator for the gol distributor.
//!
//! - [`pgm`] -- Binary (P5) PGM encoding and decoding.
//! - [`store`] -- [`PgmStore`], an [`ImageStore`](gol_core::io::ImageStore)
//!   reading input grids from one directory and writing snapshots to another.

pub mod pgm;
pub mod store;

pub use pgm::{PgmError, PgmImage};
pub use store::PgmStore;
