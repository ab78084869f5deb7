//! pilot-2048: next-move engine for 2048 driven by an external game loop
//!
//! This crate provides:
//! - A value-type `Board` with rotation-based move simulation (`engine` module)
//! - A node-budgeted expectimax search with iterative deepening (`expectimax` module)
//! - A repetition guard that breaks stuck `(board, move)` loops (`cycle` module)
//! - A `Pilot` that validates raw snapshots and ties the above together (`pilot` module)
//!
//! Quick start:
//! ```
//! use pilot_2048::engine::{Board, Move};
//! use pilot_2048::expectimax::{start_search, EngineConfig};
//!
//! let board = Board::from_cells(&[0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0]).unwrap();
//! let decision = start_search(board, &EngineConfig::default());
//! let dir: Move = decision.chosen.unwrap();
//! assert!(board.shift(dir).changed);
//! ```
//!
//! Driving a live game:
//! ```
//! use pilot_2048::expectimax::EngineConfig;
//! use pilot_2048::pilot::Pilot;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut pilot = Pilot::new(EngineConfig::default(), StdRng::seed_from_u64(7));
//! // Cells as read from the page, row-major.
//! let cells = [2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0];
//! if let Some(dir) = pilot.decide(&cells).unwrap() {
//!     let _key = dir.arrow_key(); // dispatch this to the page
//! }
//! ```
//!
pub mod cycle;
pub mod engine;
pub mod expectimax;
pub mod pilot;
