use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, BoardError};

/// A direction to move/merge tiles.
///
/// The declaration order (up, down, left, right) is the fixed enumeration
/// order used everywhere a tie has to be broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All four directions in tie-break order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Canonical lowercase token ("up", "down", "left", "right").
    pub fn as_str(self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        }
    }

    /// Clockwise quarter turns that bring this direction onto "slide left".
    #[inline]
    fn quarter_turns(self) -> usize {
        match self {
            Move::Left => 0,
            Move::Down => 1,
            Move::Right => 2,
            Move::Up => 3,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Move {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Move::Up),
            "down" => Ok(Move::Down),
            "left" => Ok(Move::Left),
            "right" => Ok(Move::Right),
            _ => Err(AdvisorError::UnknownDirection(s.to_string())),
        }
    }
}

pub const SIZE: usize = 4;

/// Largest tile a board may hold. Two tiles of this value do not merge, so
/// every board the engine produces passes validation again.
pub const MAX_TILE: u32 = 1 << 30;

type Tile = u32;
type Line = [Tile; SIZE];
type Grid = [Line; SIZE];
type Score = u64;

/// A 4x4 board of tile values, row-major. `0` is an empty cell.
///
/// Boards built through [`Board::try_from_rows`] (or deserialized) are
/// validated; every engine operation keeps cells at zero or a power of two.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i64>>", into = "Vec<Vec<u32>>")]
pub struct Board(Grid);

/// Result of applying one direction to a board. No tile is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub board: Board,
    /// Sum of the values created by merges.
    pub gained: Score,
    /// `(row, col)` of every merged tile on the resulting board, sorted row-major.
    pub merges: Vec<(usize, usize)>,
    /// True when the resulting board differs from the input.
    pub valid: bool,
}

impl Board {
    /// A constant empty board.
    pub const EMPTY: Board = Board([[0; SIZE]; SIZE]);

    /// Build a board from rows of raw integers, rejecting anything that is not
    /// a 4x4 grid of zeros and powers of two >= 2.
    ///
    /// ```
    /// use advisor_2048::engine::Board;
    /// let b = Board::try_from_rows(&[vec![2, 0, 0, 0], vec![0; 4], vec![0; 4], vec![0, 0, 0, 4]]).unwrap();
    /// assert_eq!(b.count_empty(), 14);
    /// assert!(Board::try_from_rows(&[vec![3, 0, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]]).is_err());
    /// ```
    pub fn try_from_rows(rows: &[Vec<i64>]) -> Result<Self, BoardError> {
        if rows.len() != SIZE {
            return Err(BoardError::RowCount(rows.len()));
        }
        let mut grid = [[0; SIZE]; SIZE];
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != SIZE {
                return Err(BoardError::RowLength { row, len: cells.len() });
            }
            for (col, &value) in cells.iter().enumerate() {
                grid[row][col] = validate_tile(row, col, value)?;
            }
        }
        Ok(Board(grid))
    }

    /// Construct directly from a grid. Cells must already be zero or powers of two.
    pub fn from_grid(grid: [[u32; SIZE]; SIZE]) -> Result<Self, BoardError> {
        let rows: Vec<Vec<i64>> = grid
            .iter()
            .map(|line| line.iter().map(|&v| v as i64).collect())
            .collect();
        Self::try_from_rows(&rows)
    }

    /// Borrow the rows of this board.
    #[inline]
    pub fn rows(&self) -> &[[u32; SIZE]; SIZE] { &self.0 }

    /// Value at `(row, col)`; 0 if empty.
    #[inline]
    pub fn tile(&self, row: usize, col: usize) -> u32 { self.0[row][col] }

    /// Return a copy with `value` placed at `(row, col)`.
    ///
    /// Callers pass 2 or 4 onto an empty cell; the engine never places anything else.
    #[inline]
    pub fn with_tile(self, row: usize, col: usize, value: u32) -> Self {
        let mut grid = self.0;
        grid[row][col] = value;
        Board(grid)
    }

    /// Apply `dir` and report merges, gained score and validity.
    ///
    /// ```
    /// use advisor_2048::engine::{Board, Move};
    /// let b = Board::try_from_rows(&[vec![2, 2, 4, 0], vec![0; 4], vec![0; 4], vec![0; 4]]).unwrap();
    /// let out = b.simulate(Move::Left);
    /// assert_eq!(out.board.rows()[0], [4, 4, 0, 0]);
    /// assert_eq!(out.gained, 4);
    /// assert_eq!(out.merges, vec![(0, 0)]);
    /// assert!(out.valid);
    /// ```
    #[inline]
    pub fn simulate(self, dir: Move) -> MoveOutcome { simulate(self, dir) }

    /// The board after sliding/merging in `dir` (no tile insert).
    #[inline]
    pub fn shift(self, dir: Move) -> Self { simulate(self, dir).board }

    /// Directions that change the board, in enumeration order.
    pub fn legal_moves(self) -> Vec<Move> {
        Move::ALL.into_iter().filter(|&dir| self.shift(dir) != self).collect()
    }

    /// Return true if no direction changes the board.
    ///
    /// ```
    /// use advisor_2048::engine::Board;
    /// // Nothing slides on an empty board.
    /// assert!(Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { is_game_over(self) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> usize { count_empty(self) }

    /// Highest tile value present (0 for an empty board).
    #[inline]
    pub fn highest_tile(self) -> u32 { get_highest_tile_val(self) }

    /// Sum of every tile on the board.
    #[inline]
    pub fn tile_sum(self) -> u64 {
        self.0.iter().flatten().map(|&v| v as u64).sum()
    }

    /// Coordinates of the empty cells in row-major order.
    pub fn empty_cells(self) -> Vec<(usize, usize)> {
        let mut cells = Vec::with_capacity(SIZE * SIZE);
        for (row, line) in self.0.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if value == 0 {
                    cells.push((row, col));
                }
            }
        }
        cells
    }
}

fn validate_tile(row: usize, col: usize, value: i64) -> Result<Tile, BoardError> {
    if value < 0 {
        return Err(BoardError::Negative { row, col, value });
    }
    if value > MAX_TILE as i64 {
        return Err(BoardError::TooLarge { row, col, value });
    }
    if value == 0 {
        return Ok(0);
    }
    let tile = value as Tile;
    if tile < 2 || !tile.is_power_of_two() {
        return Err(BoardError::NotPowerOfTwo { row, col, value });
    }
    Ok(tile)
}

impl TryFrom<Vec<Vec<i64>>> for Board {
    type Error = BoardError;
    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self, Self::Error> { Board::try_from_rows(&rows) }
}

impl From<Board> for Vec<Vec<u32>> {
    fn from(b: Board) -> Self { b.0.iter().map(|line| line.to_vec()).collect() }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for (idx, line) in self.0.iter().enumerate() {
            let cells: Vec<String> = line.iter().map(format_val).collect();
            writeln!(f, "{}", cells.join("|"))?;
            if idx + 1 < SIZE {
                writeln!(f, "-------------------------------")?;
            }
        }
        Ok(())
    }
}

/// Slide/merge tiles in `direction`, reporting everything a caller needs to
/// render or score the move. No randomness.
///
/// Every direction is rotated onto the single slide-left primitive and the
/// result (and merge coordinates) are rotated back.
pub fn simulate(board: Board, direction: Move) -> MoveOutcome {
    let turns = direction.quarter_turns();
    let undo = (SIZE - turns) % SIZE;
    let rotated = rotate_cw(board.0, turns);

    let mut shifted = [[0; SIZE]; SIZE];
    let mut gained = 0;
    let mut merges = Vec::new();
    for (row, line) in rotated.iter().enumerate() {
        let (new_line, line_gain, merged_at) = shift_line_left(*line);
        shifted[row] = new_line;
        gained += line_gain;
        merges.extend(merged_at.into_iter().map(|col| rotate_point_cw((row, col), undo)));
    }
    merges.sort_unstable();

    let result = Board(rotate_cw(shifted, undo));
    MoveOutcome { board: result, gained, merges, valid: result != board }
}

/// Slide/merge tiles in `direction`. No randomness.
pub fn shift(board: Board, direction: Move) -> Board { simulate(board, direction).board }

/// True if no move in any direction changes the board.
pub fn is_game_over(board: Board) -> bool {
    for direction in Move::ALL {
        if shift(board, direction) != board {
            return false;
        }
    }
    true
}

/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> usize {
    board.0.iter().flatten().filter(|&&v| v == 0).count()
}

pub fn get_highest_tile_val(board: Board) -> Tile {
    board.0.iter().flatten().copied().max().unwrap_or(0)
}

/// The slide-left primitive on one line: compress, merge once per tile,
/// compress, pad. Returns the new line, the score gained and the indices
/// (in the new line) that hold a merged tile.
pub(crate) fn shift_line_left(line: Line) -> (Line, Score, Vec<usize>) {
    let tiles: Vec<Tile> = line.iter().copied().filter(|&v| v != 0).collect();

    let mut merged: Vec<Tile> = Vec::with_capacity(SIZE);
    let mut merged_at = Vec::new();
    let mut gained = 0;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] && tiles[i] < MAX_TILE {
            let val = tiles[i] * 2;
            gained += val as Score;
            merged_at.push(merged.len());
            merged.push(val);
            i += 2;
        } else {
            merged.push(tiles[i]);
            i += 1;
        }
    }

    let mut out = [0; SIZE];
    for (slot, val) in out.iter_mut().zip(merged) {
        *slot = val;
    }
    (out, gained, merged_at)
}

fn rotate_cw(grid: Grid, turns: usize) -> Grid {
    let mut out = grid;
    for _ in 0..turns {
        let src = out;
        for (row, line) in src.iter().enumerate() {
            for (col, &val) in line.iter().enumerate() {
                let (r, c) = rotate_point_cw((row, col), 1);
                out[r][c] = val;
            }
        }
    }
    out
}

#[inline]
fn rotate_point_cw((row, col): (usize, usize), turns: usize) -> (usize, usize) {
    (0..turns).fold((row, col), |(r, c), _| (c, SIZE - 1 - r))
}

fn format_val(val: &Tile) -> String {
    match val {
        0 => String::from("       "),
        &x => format!("{:^7}", x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(rows: [[i64; 4]; 4]) -> Board {
        let rows: Vec<Vec<i64>> = rows.iter().map(|r| r.to_vec()).collect();
        Board::try_from_rows(&rows).unwrap()
    }

    #[test]
    fn it_shift_line_left() {
        assert_eq!(shift_line_left([0, 0, 0, 0]), ([0, 0, 0, 0], 0, vec![]));
        assert_eq!(shift_line_left([2, 4, 2, 4]), ([2, 4, 2, 4], 0, vec![]));
        assert_eq!(shift_line_left([2, 2, 4, 4]), ([4, 8, 0, 0], 12, vec![0, 1]));
        assert_eq!(shift_line_left([2, 0, 0, 2]), ([4, 0, 0, 0], 4, vec![0]));
        assert_eq!(shift_line_left([2, 2, 4, 0]), ([4, 4, 0, 0], 4, vec![0]));
    }

    #[test]
    fn it_does_not_cascade_merges() {
        assert_eq!(shift_line_left([4, 2, 2, 0]), ([4, 4, 0, 0], 4, vec![1]));
        assert_eq!(shift_line_left([2, 2, 2, 2]), ([4, 4, 0, 0], 8, vec![0, 1]));
        assert_eq!(shift_line_left([2, 2, 2, 0]), ([4, 2, 0, 0], 4, vec![0]));
    }

    #[test]
    fn test_move_left() {
        let b = board([[2, 2, 0, 0], [0, 4, 4, 0], [2, 0, 2, 0], [8, 8, 8, 8]]);
        let out = simulate(b, Move::Left);
        assert_eq!(out.board, board([[4, 0, 0, 0], [8, 0, 0, 0], [4, 0, 0, 0], [16, 16, 0, 0]]));
        assert_eq!(out.gained, 4 + 8 + 4 + 32);
        assert_eq!(out.merges, vec![(0, 0), (1, 0), (2, 0), (3, 0), (3, 1)]);
        assert!(out.valid);
    }

    #[test]
    fn test_move_right() {
        let b = board([[2, 2, 0, 0], [0, 4, 4, 0], [2, 0, 2, 0], [8, 8, 8, 8]]);
        let out = simulate(b, Move::Right);
        assert_eq!(out.board, board([[0, 0, 0, 4], [0, 0, 0, 8], [0, 0, 0, 4], [0, 0, 16, 16]]));
        assert_eq!(out.gained, 48);
        assert_eq!(out.merges, vec![(0, 3), (1, 3), (2, 3), (3, 2), (3, 3)]);
    }

    #[test]
    fn test_move_up() {
        let b = board([[2, 0, 2, 8], [2, 4, 0, 8], [0, 4, 2, 8], [0, 0, 0, 8]]);
        let out = simulate(b, Move::Up);
        assert_eq!(out.board, board([[4, 8, 4, 16], [0, 0, 0, 16], [0, 0, 0, 0], [0, 0, 0, 0]]));
        assert_eq!(out.gained, 4 + 8 + 4 + 32);
        assert_eq!(out.merges, vec![(0, 0), (0, 1), (0, 2), (0, 3), (1, 3)]);
    }

    #[test]
    fn test_move_down() {
        let b = board([[2, 0, 2, 8], [2, 4, 0, 8], [0, 4, 2, 8], [0, 0, 0, 8]]);
        let out = simulate(b, Move::Down);
        assert_eq!(out.board, board([[0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 16], [4, 8, 4, 16]]));
        assert_eq!(out.merges, vec![(2, 3), (3, 0), (3, 1), (3, 2), (3, 3)]);
    }

    #[test]
    fn test_gapped_pair_merges_into_corner() {
        let b = board([[2, 0, 2, 0], [0; 4], [0; 4], [0; 4]]);
        let out = simulate(b, Move::Left);
        assert_eq!(out.board, board([[4, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(out.gained, 4);
        assert_eq!(out.merges, vec![(0, 0)]);
    }

    #[test]
    fn test_no_op_is_invalid() {
        let b = board([[2, 0, 0, 0], [4, 0, 0, 0], [8, 0, 0, 0], [16, 0, 0, 0]]);
        let out = simulate(b, Move::Left);
        assert!(!out.valid);
        assert_eq!(out.board, b);
        assert_eq!(out.gained, 0);
        assert!(out.merges.is_empty());
        assert!(simulate(b, Move::Right).valid);
    }

    #[test]
    fn test_pure_slide_is_valid() {
        let b = board([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]]);
        let out = simulate(b, Move::Left);
        assert!(out.valid);
        assert_eq!(out.gained, 0);
        assert!(out.merges.is_empty());
    }

    #[test]
    fn it_rotates_back_to_identity() {
        let b = board([[2, 4, 8, 16], [32, 64, 128, 256], [512, 1024, 2048, 4096], [0, 2, 0, 4]]);
        for turns in 0..4 {
            let there = rotate_cw(b.0, turns);
            assert_eq!(rotate_cw(there, (4 - turns) % 4), b.0);
        }
        assert_eq!(rotate_point_cw((0, 0), 1), (0, 3));
        assert_eq!(rotate_point_cw((3, 0), 1), (0, 0));
    }

    #[test]
    fn test_game_over_no_moves() {
        let b = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(is_game_over(b));
        assert!(b.legal_moves().is_empty());
    }

    #[test]
    fn test_game_not_over_can_merge_vertical() {
        let b = board([[2, 4, 8, 16], [2, 8, 16, 32], [4, 16, 32, 64], [8, 32, 64, 128]]);
        assert!(!is_game_over(b));
        assert_eq!(b.legal_moves(), vec![Move::Up, Move::Down]);
    }

    #[test]
    fn it_count_empty() {
        let b = board([[2, 2, 2, 2], [0; 4], [2, 2, 2, 2], [0; 4]]);
        assert_eq!(count_empty(b), 8);
        assert_eq!(Board::EMPTY.count_empty(), 16);
        assert_eq!(b.empty_cells().len(), 8);
        assert_eq!(b.empty_cells()[0], (1, 0));
    }

    #[test]
    fn it_get_highest_tile_val() {
        assert_eq!(get_highest_tile_val(Board::EMPTY), 0);
        let b = board([[2, 0, 0, 0], [0, 1024, 0, 0], [0; 4], [0, 0, 0, 8]]);
        assert_eq!(b.highest_tile(), 1024);
        assert_eq!(b.tile_sum(), 1034);
    }

    #[test]
    fn it_rejects_malformed_boards() {
        let three_rows = vec![vec![0; 4]; 3];
        assert_eq!(Board::try_from_rows(&three_rows), Err(BoardError::RowCount(3)));
        let short_row = vec![vec![0; 4], vec![0; 3], vec![0; 4], vec![0; 4]];
        assert_eq!(Board::try_from_rows(&short_row), Err(BoardError::RowLength { row: 1, len: 3 }));
        let negative = vec![vec![0; 4], vec![0; 4], vec![0, -2, 0, 0], vec![0; 4]];
        assert!(matches!(Board::try_from_rows(&negative), Err(BoardError::Negative { row: 2, col: 1, .. })));
        for bad in [1, 3, 6, 12] {
            let rows = vec![vec![bad, 0, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
            assert!(matches!(Board::try_from_rows(&rows), Err(BoardError::NotPowerOfTwo { .. })));
        }
        let huge = vec![vec![1 << 31, 0, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        assert!(matches!(Board::try_from_rows(&huge), Err(BoardError::TooLarge { .. })));
        let big = vec![vec![1 << 18, 0, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]];
        assert_eq!(Board::try_from_rows(&big).unwrap().highest_tile(), 262144);
    }

    #[test]
    fn it_stops_merging_at_the_tile_cap() {
        let cap = MAX_TILE as i64;
        let b = board([[cap, cap, 0, 0], [cap / 2, cap / 2, 0, 0], [0; 4], [0; 4]]);
        let out = simulate(b, Move::Left);
        assert_eq!(out.board, board([[cap, cap, 0, 0], [cap, 0, 0, 0], [0; 4], [0; 4]]));
        assert_eq!(out.gained, MAX_TILE as u64);
        assert_eq!(out.merges, vec![(1, 0)]);

        let rows: Vec<Vec<i64>> = Vec::from(out.board).into_iter().map(|r| r.into_iter().map(i64::from).collect()).collect();
        assert_eq!(Board::try_from_rows(&rows), Ok(out.board));
    }

    #[test]
    fn it_parses_direction_tokens() {
        assert_eq!("up".parse::<Move>().unwrap(), Move::Up);
        assert_eq!(" Down ".parse::<Move>().unwrap(), Move::Down);
        assert_eq!("LEFT".parse::<Move>().unwrap(), Move::Left);
        assert_eq!("right".parse::<Move>().unwrap(), Move::Right);
        assert!(matches!("sideways".parse::<Move>(), Err(AdvisorError::UnknownDirection(_))));
        assert!(matches!("".parse::<Move>(), Err(AdvisorError::UnknownDirection(_))));
        assert_eq!(Move::Right.to_string(), "right");
    }

    #[test]
    fn it_orders_directions_for_tie_breaks() {
        let mut dirs = vec![Move::Right, Move::Left, Move::Down, Move::Up];
        dirs.sort();
        assert_eq!(dirs, Move::ALL.to_vec());
    }

    #[test]
    fn it_serializes_boards_as_rows() {
        let b = board([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 4]]);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[[2,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,4]]");
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
        assert!(serde_json::from_str::<Board>("[[2,0,0,0],[0,0,0,0],[0,0,0,0]]").is_err());
        assert!(serde_json::from_str::<Board>("[[2.5,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0]]").is_err());
    }

    #[test]
    fn test_display_format() {
        let b = board([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 2048]]);
        let text = b.to_string();
        assert!(text.contains("2048"));
        assert!(text.contains("----"));
    }
}
