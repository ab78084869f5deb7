use log::trace;

use crate::engine::{Board, Move};

use super::heuristic::estimate;
use super::BranchEval;

/// Value of an option that must never be chosen (illegal move, no spawn cell).
pub const SENTINEL: f64 = -1e20;

const SPAWN_TWO: f64 = 0.9;
const SPAWN_FOUR: f64 = 0.1;

/// Mutable state shared by one call tree: node counter, depth limit and the
/// best root move. Owned by a single deepening pass and dropped with it.
#[derive(Debug, Clone)]
pub struct SearchContext {
    node_budget: u64,
    max_depth: u32,
    nodes: u64,
    best: Option<Move>,
}

impl SearchContext {
    pub fn new(node_budget: u64, max_depth: u32) -> Self {
        Self { node_budget, max_depth, nodes: 0, best: None }
    }

    /// Recursive calls made so far. Never exceeds the budget.
    #[inline]
    pub fn nodes(&self) -> u64 { self.nodes }

    #[inline]
    pub fn max_depth(&self) -> u32 { self.max_depth }

    /// Best root direction recorded by the last root ply, `None` if every
    /// direction was illegal.
    #[inline]
    pub fn best_move(&self) -> Option<Move> { self.best }

    #[inline]
    pub fn exhausted(&self) -> bool { self.nodes >= self.node_budget }
}

/// Expectimax value of `board` at `depth`, recording the best move at the root.
///
/// ```
/// use pilot_2048::engine::Board;
/// use pilot_2048::expectimax::{search, SearchContext};
/// let b = Board::from_array([0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0]);
/// let mut ctx = SearchContext::new(10_000, 3);
/// let v = search(&mut ctx, b, 0);
/// assert!(v > 0.0 && ctx.best_move().is_some());
/// assert!(ctx.nodes() <= 10_000);
/// ```
pub fn search(ctx: &mut SearchContext, board: Board, depth: u32) -> f64 {
    ctx.nodes += 1;
    if ctx.exhausted() || depth >= ctx.max_depth {
        return estimate(board);
    }
    let (value, best) = expand_ply(ctx, board, depth);
    if depth == 0 {
        if let Some(dir) = best {
            ctx.best = Some(dir);
        }
    }
    value
}

/// Evaluate each root direction separately, counting the root as one node.
///
/// Returned in [`Move::ALL`] order; illegal moves carry `ev = SENTINEL`.
pub fn root_branches(ctx: &mut SearchContext, board: Board) -> [BranchEval; 4] {
    ctx.nodes += 1;
    let out = Move::ALL.map(|dir| evaluate_branch(ctx, board, dir, 0));
    ctx.best = select(&out);
    out
}

/// Max node: try every direction in fixed order and keep the first best legal one.
fn expand_ply(ctx: &mut SearchContext, board: Board, depth: u32) -> (f64, Option<Move>) {
    let mut best_value = SENTINEL;
    let mut best: Option<Move> = None;
    for dir in Move::ALL {
        let branch = evaluate_branch(ctx, board, dir, depth);
        if depth == 0 {
            trace!("root {} legal={} ev={:.1}", dir, branch.legal, branch.ev);
        }
        if branch.legal && (best.is_none() || branch.ev > best_value) {
            best_value = branch.ev;
            best = Some(dir);
        }
    }
    (best_value, best)
}

fn evaluate_branch(ctx: &mut SearchContext, board: Board, dir: Move, depth: u32) -> BranchEval {
    let shifted = board.shift(dir);
    if !shifted.changed {
        return BranchEval { dir, ev: SENTINEL, legal: false };
    }
    let ev = shifted.score as f64 + expand_chance(ctx, shifted.board, depth);
    BranchEval { dir, ev, legal: true }
}

/// Chance node: average over empty cells of the 2/4 spawn outcomes.
fn expand_chance(ctx: &mut SearchContext, moved: Board, depth: u32) -> f64 {
    let empty = moved.count_empty();
    if empty == 0 {
        return SENTINEL;
    }
    let mut total = 0.0;
    for idx in moved.empty_cells() {
        let v2 = descend(ctx, moved.with_tile(idx, 2), depth + 1);
        let v4 = descend(ctx, moved.with_tile(idx, 4), depth + 1);
        total += SPAWN_TWO * v2 + SPAWN_FOUR * v4;
    }
    total / empty as f64
}

/// Recurse unless the budget is spent; a spent budget yields the leaf value
/// the call would have returned, without counting a node.
#[inline]
fn descend(ctx: &mut SearchContext, board: Board, depth: u32) -> f64 {
    if ctx.exhausted() {
        estimate(board)
    } else {
        search(ctx, board, depth)
    }
}

fn select(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best: Option<&BranchEval> = None;
    for b in branches.iter().filter(|b| b.legal) {
        if best.map_or(true, |cur| b.ev > cur.ev) {
            best = Some(b);
        }
    }
    best.map(|b| b.dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKED: Board = Board::from_array([2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2]);

    #[test]
    fn leaf_at_depth_limit() {
        let b = Board::EMPTY.with_tile(0, 2);
        let mut ctx = SearchContext::new(100, 0);
        assert_eq!(search(&mut ctx, b, 0), estimate(b));
        assert_eq!(ctx.nodes(), 1);
        assert_eq!(ctx.best_move(), None);
    }

    #[test]
    fn one_ply_counts_every_spawn() {
        // Lone corner tile: Right and Down are legal, each leaves 15 empty cells.
        let b = Board::EMPTY.with_tile(0, 2);
        let mut ctx = SearchContext::new(10_000, 1);
        search(&mut ctx, b, 0);
        assert_eq!(ctx.nodes(), 1 + 2 * 15 * 2);
    }

    #[test]
    fn blocked_board_returns_sentinel_and_no_move() {
        let mut ctx = SearchContext::new(10_000, 3);
        assert_eq!(search(&mut ctx, BLOCKED, 0), SENTINEL);
        assert_eq!(ctx.best_move(), None);
        assert_eq!(ctx.nodes(), 1);
    }

    #[test]
    fn budget_bounds_the_tree_for_any_depth() {
        let b = Board::from_array([2, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]);
        for max_depth in [2, 4, 8, 30] {
            let mut ctx = SearchContext::new(10_000, max_depth);
            search(&mut ctx, b, 0);
            assert!(ctx.nodes() <= 10_000, "depth {max_depth}: {}", ctx.nodes());
        }
        let mut ctx = SearchContext::new(50, 30);
        search(&mut ctx, b, 0);
        assert_eq!(ctx.nodes(), 50);
        assert!(ctx.best_move().is_some());
    }

    #[test]
    fn root_branches_agree_with_search() {
        let b = Board::from_array([0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0]);
        let mut a = SearchContext::new(10_000, 2);
        let value = search(&mut a, b, 0);
        let mut r = SearchContext::new(10_000, 2);
        let branches = root_branches(&mut r, b);
        assert_eq!(a.nodes(), r.nodes());
        assert_eq!(a.best_move(), r.best_move());
        let best = branches.iter().filter(|x| x.legal).map(|x| x.ev).fold(SENTINEL, f64::max);
        assert_eq!(best, value);
    }

    #[test]
    fn illegal_branch_is_sentinel() {
        let b = Board::from_array([2, 4, 8, 16, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut ctx = SearchContext::new(10_000, 1);
        let branches = root_branches(&mut ctx, b);
        assert!(!branches[0].legal);
        assert_eq!(branches[0].ev, SENTINEL);
        // The row is full and already against the top edge: only Down moves it.
        assert!(!branches[1].legal && !branches[2].legal);
        assert!(branches[3].legal);
        assert_eq!(ctx.best_move(), Some(Move::Down));
    }
}
