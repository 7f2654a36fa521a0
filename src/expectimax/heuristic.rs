//! Fixed-weight board heuristic.
//!
//! `evaluate = 2.7·empty + 1.5·log2(max tile) + 0.08·smoothness + 0.9·monotonicity`.
//! The weights are quoted verbatim in explanation text, so they are constants.

use serde::Serialize;

use crate::engine::{Board, SIZE};

const EMPTY_WEIGHT: f64 = 2.7;
const MAX_TILE_WEIGHT: f64 = 1.5;
const SMOOTHNESS_WEIGHT: f64 = 0.08;
const MONOTONICITY_WEIGHT: f64 = 0.9;

/// Highest possible monotonicity: 3 pairs in each of 4 rows and 4 columns.
pub const MAX_MONOTONICITY: u32 = 24;

/// The raw board features the heuristic combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardFeatures {
    pub empty: usize,
    pub max_tile: u32,
    pub smoothness: i64,
    pub monotonicity: u32,
}

impl BoardFeatures {
    pub fn of(board: Board) -> Self {
        Self {
            empty: board.count_empty(),
            max_tile: board.highest_tile(),
            smoothness: calc_smoothness(board),
            monotonicity: calc_monotonicity(board),
        }
    }

    /// Weighted sum of the features.
    pub fn score(&self) -> f64 {
        let max_tile = self.max_tile.max(1) as f64;
        EMPTY_WEIGHT * self.empty as f64
            + MAX_TILE_WEIGHT * max_tile.log2()
            + SMOOTHNESS_WEIGHT * self.smoothness as f64
            + MONOTONICITY_WEIGHT * self.monotonicity as f64
    }
}

/// Heuristic desirability of a board. Deterministic and side-effect free.
///
/// ```
/// use advisor_2048::engine::Board;
/// use advisor_2048::expectimax::heuristic::evaluate;
/// // 16 empty cells and all 24 pairs trivially non-increasing.
/// assert_eq!(evaluate(Board::EMPTY), 2.7 * 16.0 + 0.9 * 24.0);
/// ```
#[inline]
pub fn evaluate(board: Board) -> f64 { BoardFeatures::of(board).score() }

/// Negative sum of absolute differences between orthogonal neighbours.
pub fn calc_smoothness(board: Board) -> i64 {
    let rows = board.rows();
    let mut smoothness = 0i64;
    for row in 0..SIZE {
        for col in 0..SIZE {
            let here = rows[row][col] as i64;
            if col + 1 < SIZE {
                smoothness -= (here - rows[row][col + 1] as i64).abs();
            }
            if row + 1 < SIZE {
                smoothness -= (here - rows[row + 1][col] as i64).abs();
            }
        }
    }
    smoothness
}

/// Adjacent pairs that are non-increasing left-to-right in rows plus
/// top-to-bottom in columns.
pub fn calc_monotonicity(board: Board) -> u32 {
    let rows = board.rows();
    let mut pairs = 0;
    for i in 0..SIZE {
        for j in 0..SIZE - 1 {
            if rows[i][j] >= rows[i][j + 1] {
                pairs += 1;
            }
            if rows[j][i] >= rows[j + 1][i] {
                pairs += 1;
            }
        }
    }
    pairs
}
