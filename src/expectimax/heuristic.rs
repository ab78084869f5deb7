use crate::engine::Board;

/// Static value of a board: rewards total tile mass, penalizes differences
/// between horizontal and vertical neighbours as a cheap smoothness proxy.
///
/// `(sum * 4 - diff) * 2`, never negative since every cell has at most four
/// neighbours.
pub fn estimate(board: Board) -> f64 {
    let cells = board.cells();
    let sum: f64 = cells.iter().map(|&v| v as f64).sum();
    let mut diff = 0.0;
    for r in 0..4 {
        for c in 0..4 {
            let here = cells[r * 4 + c] as f64;
            if c < 3 {
                diff += (here - cells[r * 4 + c + 1] as f64).abs();
            }
            if r < 3 {
                diff += (here - cells[(r + 1) * 4 + c] as f64).abs();
            }
        }
    }
    (sum * 4.0 - diff) * 2.0
}
