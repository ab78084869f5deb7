//! Repetition guard for the driving loop.
//!
//! A live game that keeps showing the same board while the engine keeps
//! answering the same move is stuck (the key press has no effect). The guard
//! notices three identical `(board, move)` observations in a row and swaps in
//! a random move on the other axis for that one actuation.

use std::collections::VecDeque;

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{Board, Move};

/// Number of consecutive identical observations that make a cycle.
pub const HISTORY_LEN: usize = 3;

/// One observation: the board shown and the move the engine picked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub board: Board,
    pub chosen: Option<Move>,
}

#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    ring: VecDeque<HistoryEntry>,
}

impl CycleGuard {
    pub fn new() -> Self { Self { ring: VecDeque::with_capacity(HISTORY_LEN) } }

    /// Record an observation and return the move to actuate.
    ///
    /// Returns `chosen` unchanged unless this observation completes a cycle,
    /// in which case the history is cleared and one of the two perpendicular
    /// directions is returned instead. The substitute is not recorded.
    ///
    /// ```
    /// use pilot_2048::cycle::CycleGuard;
    /// use pilot_2048::engine::{Board, Move};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut guard = CycleGuard::new();
    /// let mut rng = StdRng::seed_from_u64(5);
    /// let b = Board::EMPTY.with_tile(0, 2);
    /// assert_eq!(guard.observe(b, Some(Move::Left), &mut rng), Some(Move::Left));
    /// assert_eq!(guard.observe(b, Some(Move::Left), &mut rng), Some(Move::Left));
    /// let third = guard.observe(b, Some(Move::Left), &mut rng);
    /// assert!(matches!(third, Some(Move::Up) | Some(Move::Down)));
    /// assert!(guard.is_empty());
    /// ```
    pub fn observe<R: Rng + ?Sized>(&mut self, board: Board, chosen: Option<Move>, rng: &mut R) -> Option<Move> {
        if self.ring.len() == HISTORY_LEN {
            self.ring.pop_front();
        }
        self.ring.push_back(HistoryEntry { board, chosen });
        let repeated = match chosen {
            Some(dir) if self.is_cycle() => dir,
            _ => return chosen,
        };
        self.ring.clear();
        let substitute = repeated.perpendicular().choose(rng).copied().unwrap_or(repeated);
        info!("cycle on {} after {} repeats, actuating {} instead", repeated, HISTORY_LEN, substitute);
        Some(substitute)
    }

    /// True when the ring is full and every entry is the same.
    pub fn is_cycle(&self) -> bool {
        self.ring.len() == HISTORY_LEN && self.ring.iter().all(|e| *e == self.ring[0])
    }

    #[inline]
    pub fn len(&self) -> usize { self.ring.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.ring.is_empty() }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> { self.ring.iter() }

    pub fn clear(&mut self) { self.ring.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board() -> Board { Board::EMPTY.with_tile(3, 4).with_tile(7, 2) }

    #[test]
    fn three_repeats_trigger_substitution() {
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut guard = CycleGuard::new();
            let b = board();
            guard.observe(b, Some(Move::Right), &mut rng);
            guard.observe(b, Some(Move::Right), &mut rng);
            let out = guard.observe(b, Some(Move::Right), &mut rng);
            assert!(matches!(out, Some(Move::Up) | Some(Move::Down)), "seed {seed}: {out:?}");
            assert_eq!(guard.len(), 0);
        }
    }

    #[test]
    fn both_substitutes_are_drawn() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut guard = CycleGuard::new();
        let mut seen = Vec::new();
        for _ in 0..40 {
            let mut out = None;
            for _ in 0..HISTORY_LEN {
                out = guard.observe(board(), Some(Move::Up), &mut rng);
            }
            seen.push(out);
        }
        assert!(seen.contains(&Some(Move::Left)));
        assert!(seen.contains(&Some(Move::Right)));
        assert!(!seen.contains(&Some(Move::Up)) && !seen.contains(&Some(Move::Down)));
    }

    #[test]
    fn different_boards_or_moves_are_not_a_cycle() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut guard = CycleGuard::new();
        let b = board();
        assert_eq!(guard.observe(b, Some(Move::Left), &mut rng), Some(Move::Left));
        assert_eq!(guard.observe(b, Some(Move::Left), &mut rng), Some(Move::Left));
        assert_eq!(guard.observe(b, Some(Move::Down), &mut rng), Some(Move::Down));
        assert_eq!(guard.observe(b.with_tile(0, 2), Some(Move::Down), &mut rng), Some(Move::Down));
        assert_eq!(guard.len(), HISTORY_LEN);
        assert!(!guard.is_cycle());
    }

    #[test]
    fn oldest_entry_is_evicted() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut guard = CycleGuard::new();
        let b = board();
        guard.observe(b.with_tile(0, 2), Some(Move::Left), &mut rng);
        guard.observe(b, Some(Move::Left), &mut rng);
        guard.observe(b, Some(Move::Left), &mut rng);
        assert!(!guard.is_cycle());
        // The odd board drops out and the window now holds three repeats.
        let out = guard.observe(b, Some(Move::Left), &mut rng);
        assert!(matches!(out, Some(Move::Up) | Some(Move::Down)));
    }

    #[test]
    fn noop_repeats_are_ignored() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut guard = CycleGuard::new();
        for _ in 0..5 {
            assert_eq!(guard.observe(board(), None, &mut rng), None);
        }
        assert_eq!(guard.len(), HISTORY_LEN);
    }
}
