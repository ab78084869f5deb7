//! Budgeted expectimax move selection for 2048.
//!
//! - [`search`] walks the move/spawn tree of one fixed-depth pass, bounded by
//!   a node budget, and records the best root direction in a [`SearchContext`].
//! - [`start_search`] reruns it at growing depth (iterative deepening) while the
//!   budget allows, so sparse boards are searched deeper than dense ones.
//! - [`Expectimax`] wraps both behind a small stateful policy with stats.
//!
//! Quick start
//! ```
//! use pilot_2048::engine::Board;
//! use pilot_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let b0 = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//!
//! let mut ex = Expectimax::new();
//! let m = ex.best_move(b0);
//! assert!(m.is_some());
//! assert!(ex.last_stats().nodes <= 10_000);
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Move};

mod deepening;
mod heuristic;
mod search;

pub use deepening::{start_search, Decision, PassReport};
pub use heuristic::estimate;
pub use search::{root_branches, search, SearchContext, SENTINEL};

/// Search limits. Constant for the lifetime of a policy.
///
/// - `node_budget`: recursive calls allowed in one pass.
/// - `depth_ceiling`: deepest pass the driver will start.
/// - `initial_depth`: depth of the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub node_budget: u64,
    pub depth_ceiling: u32,
    pub initial_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { node_budget: 10_000, depth_ceiling: 8, initial_depth: 3 }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("node budget must be positive")]
    ZeroBudget,
    #[error("initial depth must be at least 1")]
    ZeroDepth,
    #[error("initial depth {initial} exceeds depth ceiling {ceiling}")]
    DepthAboveCeiling { initial: u32, ceiling: u32 },
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_budget == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        if self.initial_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.initial_depth > self.depth_ceiling {
            return Err(ConfigError::DepthAboveCeiling { initial: self.initial_depth, ceiling: self.depth_ceiling });
        }
        Ok(())
    }
}

/// Per-branch expected value at the root (no normalization).
///
/// - `ev` is the move's merge score plus its expected continuation.
/// - `legal` is false when the move is a no-op for the current board; `ev`
///   is then [`SENTINEL`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for the last decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Nodes visited by the final pass.
    pub nodes: u64,
    /// Largest `nodes` seen since the last reset.
    pub peak_nodes: u64,
    /// Deepening passes run for the last decision.
    pub passes: u32,
    /// Depth limit of the final pass.
    pub depth: u32,
}

/// Iterative-deepening expectimax policy.
#[derive(Debug, Clone)]
pub struct Expectimax {
    cfg: EngineConfig,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(EngineConfig::default()) }

    pub fn with_config(cfg: EngineConfig) -> Self {
        Self { cfg, stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig { &self.cfg }

    /// Full decision, including per-pass reports.
    pub fn decide(&mut self, board: Board) -> Decision {
        let decision = start_search(board, &self.cfg);
        self.stats.nodes = decision.final_nodes();
        self.stats.peak_nodes = self.stats.peak_nodes.max(self.stats.nodes);
        self.stats.passes = decision.passes.len() as u32;
        self.stats.depth = decision.depth;
        decision
    }

    /// Compute the best move; `None` when no direction changes the board.
    #[inline]
    pub fn best_move(&mut self, board: Board) -> Option<Move> { self.decide(board).chosen }

    /// Compute EV for each direction at the depth [`Self::best_move`] would settle on.
    ///
    /// Returns a fixed array in [`Move::ALL`] order.
    ///
    /// ```
    /// use pilot_2048::engine::{Board, Move};
    /// use pilot_2048::expectimax::Expectimax;
    /// let b = Board::from_array([2, 4, 8, 16, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    /// let mut ex = Expectimax::new();
    /// let branches = ex.branch_evals(b);
    /// assert_eq!(branches[3].dir, Move::Down);
    /// assert!(!branches[0].legal && branches[3].legal);
    /// ```
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let depth = self.decide(board).depth;
        let mut ctx = SearchContext::new(self.cfg.node_budget, depth);
        root_branches(&mut ctx, board)
    }

    /// Statistics collected from the last call to [`Self::best_move`],
    /// [`Self::decide`] or [`Self::branch_evals`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for Expectimax { fn default() -> Self { Self::new() } }
