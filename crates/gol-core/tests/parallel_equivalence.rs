//! Parallel decomposition must be result-equivalent to a single sequential
//! pass over the whole grid, for every worker count from 1 to the height.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;

use gol_core::Grid;
use gol_core::partition::partition;
use gol_core::turn::compute_turn;
use gol_core::workers::run_turn;
use gol_types::Event;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_grid(width: usize, height: usize, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let cells = (0..width * height).map(|_| rng.random_bool(0.35)).collect();
    Grid::from_cells(width, height, cells).unwrap()
}

fn sorted_flips(flips: &[Event]) -> Vec<Event> {
    let mut flips = flips.to_vec();
    flips.sort_by_key(|e| match e {
        Event::CellFlipped { cell, .. } => *cell,
        _ => gol_types::Cell::new(usize::MAX, usize::MAX),
    });
    flips
}

#[tokio::test]
async fn every_thread_count_matches_sequential() {
    let (width, height) = (13, 17);
    let start = random_grid(width, height, 7);

    for threads in 1..=height {
        let mut sequential = start.clone();
        let mut parallel = Arc::new(start.clone());

        for turn in 0..4 {
            let (expected, expected_flips) = compute_turn(&sequential, turn).unwrap();
            let output = run_turn(Arc::clone(&parallel), threads, turn, None)
                .await
                .unwrap();

            assert_eq!(output.grid, expected, "threads = {threads}, turn = {turn}");
            assert_eq!(
                sorted_flips(&output.flips),
                sorted_flips(&expected_flips),
                "threads = {threads}, turn = {turn}"
            );

            sequential = expected;
            parallel = Arc::new(output.grid);
        }
    }
}

#[tokio::test]
async fn more_workers_than_rows_still_matches() {
    let start = random_grid(8, 3, 11);
    let (expected, _) = compute_turn(&start, 0).unwrap();
    let output = run_turn(Arc::new(start), 10, 0, None).await.unwrap();
    assert_eq!(output.grid, expected);
}

#[tokio::test]
async fn wide_and_short_grids_match() {
    for (width, height, seed) in [(64, 4, 1), (3, 40, 2), (1, 9, 3), (9, 1, 4)] {
        let start = random_grid(width, height, seed);
        let (expected, _) = compute_turn(&start, 0).unwrap();
        for threads in [1, 2, height] {
            let output = run_turn(Arc::new(start.clone()), threads, 0, None)
                .await
                .unwrap();
            assert_eq!(output.grid, expected, "{width}x{height} threads = {threads}");
        }
    }
}

#[test]
fn partition_is_exact_for_uneven_splits() {
    for height in [1, 7, 16, 17, 100, 513] {
        for threads in 1..=16 {
            let bands = partition(height, threads);
            let total: usize = bands.iter().map(|b| b.len()).sum();
            assert_eq!(total, height);
            assert_eq!(bands[0].start_y, 0);
            assert_eq!(bands[bands.len() - 1].end_y, height);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].end_y, pair[1].start_y);
            }
        }
    }
}
