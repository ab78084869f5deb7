//! Boundary between a driving loop (browser automation, a simulator, ...) and
//! the engine: validates raw snapshots, asks the deepening search for a move
//! and runs it past the cycle guard.

use log::{debug, info};
use rand::Rng;
use serde::Serialize;

use crate::cycle::CycleGuard;
use crate::engine::{Board, BoardError, Move};
use crate::expectimax::{Expectimax, EngineConfig, SearchStats};

/// Stateful per-session decision maker. Only the cycle guard carries state
/// across ticks; each search starts fresh.
pub struct Pilot<R: Rng> {
    policy: Expectimax,
    guard: CycleGuard,
    rng: R,
}

/// Summary of a simulated game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub moves: u64,
    /// Sum of all merged tiles over the game.
    pub score: u64,
    pub highest_tile: u32,
    pub final_board: Board,
    /// Decisions the cycle guard replaced.
    pub substitutions: u64,
}

impl<R: Rng> Pilot<R> {
    pub fn new(cfg: EngineConfig, rng: R) -> Self {
        Self { policy: Expectimax::with_config(cfg), guard: CycleGuard::new(), rng }
    }

    /// Validate a row-major snapshot and return the move to actuate.
    ///
    /// `Ok(None)` is the no-op: no direction changes the board.
    ///
    /// ```
    /// use pilot_2048::expectimax::EngineConfig;
    /// use pilot_2048::pilot::Pilot;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut pilot = Pilot::new(EngineConfig::default(), StdRng::seed_from_u64(0));
    /// let cells = [0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0];
    /// assert!(pilot.decide(&cells).unwrap().is_some());
    /// assert!(pilot.decide(&cells[..8]).is_err());
    /// ```
    pub fn decide(&mut self, cells: &[u32]) -> Result<Option<Move>, BoardError> {
        let board = Board::from_cells(cells)?;
        Ok(self.decide_board(board))
    }

    /// Like [`Self::decide`] for an already validated board.
    pub fn decide_board(&mut self, board: Board) -> Option<Move> {
        let chosen = self.policy.best_move(board);
        let stats = self.policy.last_stats();
        debug!("decided {:?} at depth {} ({} nodes)", chosen, stats.depth, stats.nodes);
        self.guard.observe(board, chosen, &mut self.rng)
    }

    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.policy.last_stats() }

    #[inline]
    pub fn guard(&self) -> &CycleGuard { &self.guard }

    /// Play a simulated game from two random tiles until no move is left or
    /// `max_moves` is reached. `on_move` sees every board after a move.
    pub fn play<F: FnMut(Board, Move)>(&mut self, max_moves: Option<u64>, mut on_move: F) -> GameSummary {
        let mut board = Board::EMPTY.with_random_tile(&mut self.rng).with_random_tile(&mut self.rng);
        let mut moves = 0u64;
        let mut score = 0u64;
        let mut substitutions = 0u64;
        while !board.is_game_over() && max_moves.map_or(true, |cap| moves < cap) {
            let planned = self.policy.best_move(board);
            let Some(dir) = self.guard.observe(board, planned, &mut self.rng) else {
                break;
            };
            if Some(dir) != planned {
                substitutions += 1;
            }
            let shifted = board.shift(dir);
            if shifted.changed {
                score += shifted.score;
                board = shifted.board.with_random_tile(&mut self.rng);
            }
            moves += 1;
            on_move(board, dir);
        }
        info!("game finished: {} moves, score {}, highest tile {}", moves, score, board.highest_tile());
        GameSummary { moves, score, highest_tile: board.highest_tile(), final_board: board, substitutions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn quick() -> EngineConfig { EngineConfig { node_budget: 2_000, depth_ceiling: 4, initial_depth: 2 } }

    #[test]
    fn decide_rejects_bad_snapshots() {
        let mut pilot = Pilot::new(quick(), StdRng::seed_from_u64(1));
        assert_eq!(pilot.decide(&[0; 15]), Err(BoardError::WrongLength(15)));
        let mut cells = [0u32; 16];
        cells[9] = 12;
        assert_eq!(pilot.decide(&cells), Err(BoardError::NotPowerOfTwo { index: 9, value: 12 }));
        assert!(pilot.guard().is_empty());
    }

    #[test]
    fn blocked_snapshot_is_noop() {
        let mut pilot = Pilot::new(quick(), StdRng::seed_from_u64(1));
        let blocked = [2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2];
        assert_eq!(pilot.decide(&blocked), Ok(None));
    }

    #[test]
    fn stuck_loop_gets_a_substitute() {
        // The same snapshot keeps coming back, as if key presses were lost.
        let mut pilot = Pilot::new(quick(), StdRng::seed_from_u64(7));
        let b = Board::EMPTY.with_tile(0, 2).with_tile(15, 2);
        let first = pilot.decide_board(b).unwrap();
        assert_eq!(pilot.decide_board(b), Some(first));
        let third = pilot.decide_board(b).unwrap();
        assert!(first.perpendicular().contains(&third));
        assert!(pilot.guard().is_empty());
    }

    #[test]
    fn play_is_reproducible_and_bounded() {
        let run = |seed| {
            let mut pilot = Pilot::new(quick(), StdRng::seed_from_u64(seed));
            let mut seen = 0u64;
            let summary = pilot.play(Some(25), |_, _| seen += 1);
            (summary, seen)
        };
        let (a, seen) = run(42);
        let (b, _) = run(42);
        assert_eq!(a, b);
        assert_eq!(a.moves, seen);
        assert!(a.moves <= 25);
        assert!(a.highest_tile >= 4);
        assert!(a.score > 0);
    }
}
