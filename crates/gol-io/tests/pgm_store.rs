//! PGM store against the real filesystem, and a full run through it.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::fs;
use std::path::PathBuf;

use gol_core::io::{ImageStore, IoError, spawn_io_service};
use gol_core::{DistributorChannels, Grid, RunOptions, run};
use gol_io::{PgmStore, pgm};
use gol_types::{ALIVE, Cell, DEAD, Event, Params};
use tokio::sync::mpsc;

/// A fresh directory under the system temp dir, removed on drop.
struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("gol-io-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn join(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn write_input(dir: &TempDir, label: &str, grid: &Grid) {
    let images = dir.join("images");
    fs::create_dir_all(&images).unwrap();
    let bytes = pgm::encode(grid.width(), grid.height(), &grid.to_bytes()).unwrap();
    fs::write(images.join(format!("{label}.pgm")), bytes).unwrap();
}

fn store(dir: &TempDir) -> PgmStore {
    PgmStore::new(dir.join("images"), dir.join("out"))
}

#[test]
fn write_creates_output_dir_and_file() {
    let dir = TempDir::new();
    let mut store = store(&dir);

    store.write("2x2x5", 2, 2, &[ALIVE, DEAD, DEAD, ALIVE]).unwrap();

    let bytes = fs::read(dir.join("out").join("2x2x5.pgm")).unwrap();
    let image = pgm::decode(&bytes).unwrap();
    assert_eq!(image.pixels, vec![ALIVE, DEAD, DEAD, ALIVE]);
}

#[test]
fn read_returns_input_pixels() {
    let dir = TempDir::new();
    let grid = Grid::from_alive_cells(4, 3, &[Cell::new(0, 0), Cell::new(3, 2)]).unwrap();
    write_input(&dir, "4x3", &grid);

    let pixels = store(&dir).read("4x3", 4, 3).unwrap();
    assert_eq!(Grid::from_bytes(4, 3, &pixels).unwrap(), grid);
}

#[test]
fn missing_input_is_not_found() {
    let dir = TempDir::new();
    let err = store(&dir).read("16x16", 16, 16).unwrap_err();
    assert!(matches!(err, IoError::NotFound { label } if label == "16x16"));
}

#[test]
fn wrong_dimensions_are_rejected() {
    let dir = TempDir::new();
    write_input(&dir, "8x8", &Grid::dead(8, 4));

    let err = store(&dir).read("8x8", 8, 8).unwrap_err();
    assert!(matches!(
        err,
        IoError::DimensionMismatch {
            actual_width: 8,
            actual_height: 4,
            ..
        }
    ));
}

#[test]
fn corrupt_input_is_a_store_error() {
    let dir = TempDir::new();
    fs::create_dir_all(dir.join("images")).unwrap();
    fs::write(dir.join("images").join("3x3.pgm"), b"P6\n3 3\n255\n").unwrap();

    let err = store(&dir).read("3x3", 3, 3).unwrap_err();
    assert!(matches!(err, IoError::Store { .. }));
}

#[tokio::test]
async fn run_writes_final_snapshot_as_pgm() {
    let dir = TempDir::new();
    let blinker =
        Grid::from_alive_cells(5, 5, &[Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)])
            .unwrap();
    write_input(&dir, "5x5", &blinker);

    let (io, service) = spawn_io_service(store(&dir), 4);
    let (events, mut rx) = mpsc::channel(64);
    let (_controls, controls) = mpsc::channel(4);
    let params = Params {
        turns: 1,
        threads: 2,
        image_width: 5,
        image_height: 5,
    };

    let consumer = tokio::spawn(async move {
        let mut filenames = Vec::new();
        while let Some(event) = rx.recv().await {
            if let Event::ImageOutputComplete { filename, .. } = event {
                filenames.push(filename);
            }
        }
        filenames
    });

    let summary = run(params, RunOptions::default(), DistributorChannels {
        events,
        io,
        controls,
    })
    .await
    .unwrap();
    let filenames = consumer.await.unwrap();
    service.await.unwrap();

    assert_eq!(summary.completed_turns, 1);
    assert_eq!(filenames, vec!["5x5x1".to_owned()]);

    let written = pgm::decode(&fs::read(dir.join("out").join("5x5x1.pgm")).unwrap()).unwrap();
    let vertical =
        Grid::from_alive_cells(5, 5, &[Cell::new(2, 1), Cell::new(2, 2), Cell::new(2, 3)])
            .unwrap();
    assert_eq!(written.pixels, vertical.to_bytes());
}
