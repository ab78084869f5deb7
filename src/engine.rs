use rand::Rng;
use serde::Serialize;
use std::fmt;

/// A direction to slide/merge tiles.
///
/// The declaration order is the search order: every direction is realized as
/// a left slide on a view rotated [`Move::rotations`] times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Left,
    Up,
    Right,
    Down,
}

impl Move {
    /// All directions in search order.
    pub const ALL: [Move; 4] = [Move::Left, Move::Up, Move::Right, Move::Down];

    /// Number of counter-clockwise quarter turns that make this direction a left slide.
    #[inline]
    pub fn rotations(self) -> u8 {
        match self {
            Move::Left => 0,
            Move::Up => 1,
            Move::Right => 2,
            Move::Down => 3,
        }
    }

    #[inline]
    pub fn opposite(self) -> Move {
        match self {
            Move::Left => Move::Right,
            Move::Up => Move::Down,
            Move::Right => Move::Left,
            Move::Down => Move::Up,
        }
    }

    /// The two directions on the other axis.
    #[inline]
    pub fn perpendicular(self) -> [Move; 2] {
        match self {
            Move::Left | Move::Right => [Move::Up, Move::Down],
            Move::Up | Move::Down => [Move::Left, Move::Right],
        }
    }

    /// DOM `KeyboardEvent.key` name a browser driver dispatches for this move.
    pub fn arrow_key(self) -> &'static str {
        match self {
            Move::Left => "ArrowLeft",
            Move::Up => "ArrowUp",
            Move::Right => "ArrowRight",
            Move::Down => "ArrowDown",
        }
    }

    /// Legacy `keyCode` for the arrow key.
    pub fn key_code(self) -> u32 {
        match self {
            Move::Left => 37,
            Move::Up => 38,
            Move::Right => 39,
            Move::Down => 40,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Left => "left",
            Move::Up => "up",
            Move::Right => "right",
            Move::Down => "down",
        };
        f.write_str(name)
    }
}

/// Number of cells on a board.
pub const CELLS: usize = 16;

/// Largest tile accepted at the input boundary.
pub const MAX_TILE: u32 = 1 << 20;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board must have 16 cells, got {0}")]
    WrongLength(usize),
    #[error("cell {index} holds {value}, which is neither 0 nor a power of two")]
    NotPowerOfTwo { index: usize, value: u32 },
    #[error("cell {index} holds {value}, above the largest supported tile (2^20)")]
    TileTooLarge { index: usize, value: u32 },
}

/// 4x4 2048 board as 16 tile values in row-major order (0 = empty).
///
/// Boards are plain values: every operation returns a new board and leaves
/// the receiver untouched, so search branches never share state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Board([u32; CELLS]);

/// Outcome of sliding a board in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    /// Resulting board, in the caller's orientation.
    pub board: Board,
    /// Sum of the tiles created by merges.
    pub score: u64,
    /// False when the slide left every cell where it was.
    pub changed: bool,
}

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board([0; CELLS]);

    /// Validate a row-major snapshot and build a board from it.
    ///
    /// ```
    /// use pilot_2048::engine::{Board, BoardError};
    /// let b = Board::from_cells(&[0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0]).unwrap();
    /// assert_eq!(b.count_empty(), 14);
    /// assert_eq!(Board::from_cells(&[2; 15]), Err(BoardError::WrongLength(15)));
    /// ```
    pub fn from_cells(cells: &[u32]) -> Result<Self, BoardError> {
        if cells.len() != CELLS {
            return Err(BoardError::WrongLength(cells.len()));
        }
        let mut out = [0u32; CELLS];
        for (index, (&value, slot)) in cells.iter().zip(out.iter_mut()).enumerate() {
            if value != 0 && !value.is_power_of_two() {
                return Err(BoardError::NotPowerOfTwo { index, value });
            }
            if value > MAX_TILE {
                return Err(BoardError::TileTooLarge { index, value });
            }
            *slot = value;
        }
        Ok(Board(out))
    }

    /// Like [`Board::from_cells`] for sources that list the grid column by column.
    pub fn from_column_major(cells: &[u32]) -> Result<Self, BoardError> {
        Ok(Board::from_cells(cells)?.transpose())
    }

    /// Build a board without validation, for tests and constants only.
    ///
    /// This is the one unchecked constructor: tiles above [`MAX_TILE`] can
    /// overflow when merged. Snapshots from outside go through
    /// [`Board::from_cells`] or `TryFrom`.
    #[inline]
    pub const fn from_array(cells: [u32; CELLS]) -> Self { Board(cells) }

    #[inline]
    pub fn cells(&self) -> &[u32; CELLS] { &self.0 }

    #[inline]
    pub fn into_cells(self) -> [u32; CELLS] { self.0 }

    /// Tile value at `idx` (row-major, 0..16).
    #[inline]
    pub fn tile(self, idx: usize) -> u32 { self.0[idx] }

    /// Copy of this board with `idx` set to `value`.
    #[inline]
    pub fn with_tile(self, idx: usize, value: u32) -> Self {
        let mut cells = self.0;
        cells[idx] = value;
        Board(cells)
    }

    #[inline]
    pub fn row(self, r: usize) -> [u32; 4] {
        [self.0[r * 4], self.0[r * 4 + 1], self.0[r * 4 + 2], self.0[r * 4 + 3]]
    }

    /// Indices of the empty cells, in row-major order.
    pub fn empty_cells(self) -> impl Iterator<Item = usize> {
        (0..CELLS).filter(move |&i| self.0[i] == 0)
    }

    #[inline]
    pub fn count_empty(self) -> usize { self.0.iter().filter(|&&v| v == 0).count() }

    /// Total of all tile values.
    #[inline]
    pub fn sum(self) -> u64 { self.0.iter().map(|&v| v as u64).sum() }

    #[inline]
    pub fn highest_tile(self) -> u32 { self.0.iter().copied().max().unwrap_or(0) }

    /// One counter-clockwise quarter turn: the top row becomes the left column.
    ///
    /// ```
    /// use pilot_2048::engine::Board;
    /// let b = Board::from_array([2, 4, 8, 16, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 32]);
    /// assert_eq!(b.rotate().rotate().rotate().rotate(), b);
    /// ```
    #[inline]
    pub fn rotate(self) -> Self { rotate(self) }

    /// `n` counter-clockwise quarter turns (taken mod 4).
    #[inline]
    pub fn rotate_n(self, n: u8) -> Self {
        (0..n % 4).fold(self, |b, _| rotate(b))
    }

    /// Mirror along the main diagonal.
    pub fn transpose(self) -> Self {
        let mut out = [0u32; CELLS];
        for r in 0..4 {
            for c in 0..4 {
                out[c * 4 + r] = self.0[r * 4 + c];
            }
        }
        Board(out)
    }

    /// Slide/merge tiles in `dir` (no random insert).
    ///
    /// ```
    /// use pilot_2048::engine::{Board, Move};
    /// let b = Board::from_array([0, 2, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    /// let s = b.shift(Move::Left);
    /// assert!(s.changed);
    /// assert_eq!(s.score, 4);
    /// assert_eq!(s.board.row(0), [4, 0, 0, 0]);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Shift { shift(self, dir) }

    /// Insert a 2 (90%) or 4 (10%) tile into a uniformly chosen empty cell.
    ///
    /// A full board is returned unchanged.
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let pick = rng.gen_range(0..empty);
        let idx = self.empty_cells().nth(pick).unwrap_or(0);
        self.with_tile(idx, generate_random_tile(rng))
    }

    /// Perform a move, then insert a random tile if the move changed the board.
    pub fn make_move<R: Rng + ?Sized>(self, dir: Move, rng: &mut R) -> Self {
        let shifted = self.shift(dir);
        if shifted.changed { shifted.board.with_random_tile(rng) } else { self }
    }

    /// True if no direction changes the board.
    #[inline]
    pub fn is_game_over(self) -> bool { is_game_over(self) }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..4 {
            if r > 0 {
                writeln!(f, "-------------------------------")?;
            }
            let row: Vec<String> = self.row(r).iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", row.join("|"))?;
        }
        Ok(())
    }
}

impl From<Board> for [u32; CELLS] { fn from(b: Board) -> Self { b.0 } }

impl TryFrom<[u32; CELLS]> for Board {
    type Error = BoardError;
    fn try_from(cells: [u32; CELLS]) -> Result<Self, Self::Error> { Board::from_cells(&cells) }
}

impl TryFrom<&[u32]> for Board {
    type Error = BoardError;
    fn try_from(cells: &[u32]) -> Result<Self, Self::Error> { Board::from_cells(cells) }
}

/// Rotate a board one quarter turn counter-clockwise.
///
/// `new[r][c] = old[c][3 - r]`, so sliding the result left slides the input up.
pub fn rotate(board: Board) -> Board {
    let mut out = [0u32; CELLS];
    for (i, slot) in out.iter_mut().enumerate() {
        let (r, c) = (i / 4, i % 4);
        *slot = board.0[c * 4 + (3 - r)];
    }
    Board(out)
}

/// Compact a row to the left, merging each adjacent equal pair once.
///
/// Returns the new row and the sum of merged tiles.
pub fn slide_left_row(row: [u32; 4]) -> ([u32; 4], u64) {
    let mut compact = [0u32; 4];
    let mut len = 0;
    for &v in row.iter().filter(|&&v| v != 0) {
        compact[len] = v;
        len += 1;
    }
    let mut out = [0u32; 4];
    let mut score = 0u64;
    let (mut i, mut w) = (0, 0);
    while i < len {
        if i + 1 < len && compact[i] == compact[i + 1] {
            let merged = compact[i] * 2;
            out[w] = merged;
            score += merged as u64;
            i += 2;
        } else {
            out[w] = compact[i];
            i += 1;
        }
        w += 1;
    }
    (out, score)
}

/// Slide every row left independently.
pub fn move_left(board: Board) -> (Board, u64) {
    let mut out = [0u32; CELLS];
    let mut score = 0u64;
    for r in 0..4 {
        let (row, delta) = slide_left_row(board.row(r));
        out[r * 4..r * 4 + 4].copy_from_slice(&row);
        score += delta;
    }
    (Board(out), score)
}

/// Slide/merge tiles in `dir`. The returned board is rotated back into the
/// input's orientation before anyone can observe it.
pub fn shift(board: Board, dir: Move) -> Shift {
    let turns = dir.rotations();
    let view = board.rotate_n(turns);
    let (moved, score) = move_left(view);
    Shift { board: moved.rotate_n((4 - turns) % 4), score, changed: moved != view }
}

/// True if no move in any direction changes the board.
pub fn is_game_over(board: Board) -> bool {
    Move::ALL.iter().all(|&dir| !shift(board, dir).changed)
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> u32 { if rng.gen_range(0..10) < 9 { 2 } else { 4 } }

fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}
