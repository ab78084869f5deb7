use log::debug;
use serde::Serialize;

use crate::engine::{Board, Move};

use super::search::{search, SearchContext};
use super::EngineConfig;

/// Outcome of one fixed-depth pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PassReport {
    pub max_depth: u32,
    pub nodes: u64,
    pub best: Option<Move>,
    /// True when the pass stopped expanding because the node budget ran out.
    pub exhausted: bool,
}

/// Result of [`start_search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Move chosen by the final pass; `None` means no legal move (no-op).
    pub chosen: Option<Move>,
    /// Depth limit of the final pass.
    pub depth: u32,
    pub passes: Vec<PassReport>,
}

impl Decision {
    /// Nodes visited across all passes.
    pub fn total_nodes(&self) -> u64 { self.passes.iter().map(|p| p.nodes).sum() }

    /// Nodes visited by the final pass.
    pub fn final_nodes(&self) -> u64 { self.passes.last().map_or(0, |p| p.nodes) }
}

/// Pick a move by rerunning the search at growing depth while the node budget allows.
///
/// Each pass gets a fresh [`SearchContext`]; only the last completed pass's
/// choice survives. Stops after a pass that spent the whole budget or ran at
/// the depth ceiling.
///
/// ```
/// use pilot_2048::engine::Board;
/// use pilot_2048::expectimax::{start_search, EngineConfig};
/// let b = Board::from_array([0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0]);
/// let d = start_search(b, &EngineConfig::default());
/// assert!(d.chosen.is_some());
/// assert!(d.depth >= 3 && d.depth <= 8);
/// ```
pub fn start_search(board: Board, cfg: &EngineConfig) -> Decision {
    let mut max_depth = cfg.initial_depth;
    let mut passes = Vec::new();
    loop {
        let mut ctx = SearchContext::new(cfg.node_budget, max_depth);
        search(&mut ctx, board, 0);
        let report = PassReport {
            max_depth,
            nodes: ctx.nodes(),
            best: ctx.best_move(),
            exhausted: ctx.exhausted(),
        };
        debug!(
            "pass depth={} nodes={} best={:?} exhausted={}",
            report.max_depth, report.nodes, report.best, report.exhausted
        );
        passes.push(report);
        if report.exhausted || max_depth >= cfg.depth_ceiling {
            break;
        }
        max_depth += 1;
    }
    Decision { chosen: passes.last().and_then(|p| p.best), depth: max_depth, passes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_board_deepens_until_budget() {
        let b = Board::from_array([0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0]);
        let d = start_search(b, &EngineConfig::default());
        assert_eq!(d.passes.first().map(|p| p.max_depth), Some(3));
        let last = d.passes.last().copied().unwrap();
        assert!(last.exhausted || last.max_depth == 8);
        for pair in d.passes.windows(2) {
            assert!(pair[1].nodes >= pair[0].nodes, "{:?}", d.passes);
            assert_eq!(pair[1].max_depth, pair[0].max_depth + 1);
            assert!(!pair[0].exhausted);
        }
        assert!(d.passes.iter().all(|p| p.nodes <= 10_000));
        assert_eq!(d.chosen, last.best);
        assert_eq!(d.depth, last.max_depth);
    }

    #[test]
    fn generous_budget_stops_at_ceiling() {
        let b = Board::from_array([2, 4, 8, 16, 4, 8, 16, 32, 8, 16, 32, 64, 16, 32, 64, 0]);
        let cfg = EngineConfig { node_budget: u64::MAX, depth_ceiling: 4, initial_depth: 3 };
        let d = start_search(b, &cfg);
        assert_eq!(d.depth, 4);
        assert_eq!(d.passes.len(), 2);
        assert!(d.chosen.is_some());
    }

    #[test]
    fn tight_budget_runs_a_single_pass() {
        let b = Board::EMPTY.with_tile(0, 2).with_tile(15, 2);
        let cfg = EngineConfig { node_budget: 10, ..EngineConfig::default() };
        let d = start_search(b, &cfg);
        assert_eq!(d.passes.len(), 1);
        assert_eq!(d.final_nodes(), 10);
        assert!(d.chosen.is_some());
    }

    #[test]
    fn blocked_board_is_a_noop() {
        let b = Board::from_array([2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2]);
        let d = start_search(b, &EngineConfig::default());
        assert_eq!(d.chosen, None);
        assert_eq!(d.depth, 8);
        assert_eq!(d.total_nodes(), 6);
    }
}
