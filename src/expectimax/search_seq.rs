use std::collections::HashMap;

use tracing::trace;

use crate::engine::{simulate, Board, Move};

use super::heuristic::evaluate;
use super::{
    best_branch, BranchEval, Node, SearchConfig, SearchPolicy, SearchStats, MAX_SEARCH_DEPTH, SPAWN_FOUR_PROB,
    SPAWN_TWO_PROB,
};

type MemoKey = (Board, u32, Node);

/// Scratch state for one search call: node counter and optional memo.
pub(crate) struct SearchCtx {
    memo: Option<HashMap<MemoKey, f64>>,
    pub(crate) nodes: u64,
}

impl SearchCtx {
    pub(crate) fn new(cache_enabled: bool) -> Self {
        Self { memo: cache_enabled.then(HashMap::new), nodes: 0 }
    }
}

/// Expected value of `board` searched `depth` plies deep.
///
/// `is_player_turn` picks the node kind at the root. Depth 0, or a board
/// with no empty cell, returns the heuristic directly. Depths above
/// [`MAX_SEARCH_DEPTH`] are capped.
///
/// ```
/// use advisor_2048::engine::Board;
/// use advisor_2048::expectimax::{search, heuristic::evaluate};
/// let b = Board::try_from_rows(&[vec![2, 0, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]]).unwrap();
/// assert_eq!(search(b, 0, false), evaluate(b));
/// assert!(search(b, 2, true).is_finite());
/// ```
pub fn search(board: Board, depth: u32, is_player_turn: bool) -> f64 {
    let node = if is_player_turn { Node::Player } else { Node::Chance };
    let mut ctx = SearchCtx::new(false);
    expectimax(&mut ctx, board, node, depth.min(MAX_SEARCH_DEPTH))
}

pub(crate) fn expectimax(ctx: &mut SearchCtx, board: Board, node: Node, depth: u32) -> f64 {
    ctx.nodes += 1;
    if depth == 0 || board.count_empty() == 0 {
        return evaluate(board);
    }
    if let Some(&cached) = ctx.memo.as_ref().and_then(|memo| memo.get(&(board, depth, node))) {
        return cached;
    }
    let score = match node {
        Node::Player => evaluate_player(ctx, board, depth),
        Node::Chance => evaluate_chance(ctx, board, depth),
    };
    if let Some(memo) = ctx.memo.as_mut() {
        memo.insert((board, depth, node), score);
    }
    score
}

fn evaluate_player(ctx: &mut SearchCtx, board: Board, depth: u32) -> f64 {
    let mut best: Option<f64> = None;
    for direction in Move::ALL {
        let outcome = simulate(board, direction);
        if !outcome.valid {
            continue;
        }
        let score = expectimax(ctx, outcome.board, Node::Chance, depth - 1);
        best = Some(best.map_or(score, |b| b.max(score)));
    }
    best.unwrap_or_else(|| evaluate(board))
}

fn evaluate_chance(ctx: &mut SearchCtx, board: Board, depth: u32) -> f64 {
    let empties = board.empty_cells();
    let mut total = 0.0;
    for &(row, col) in &empties {
        for (value, prob) in [(2, SPAWN_TWO_PROB), (4, SPAWN_FOUR_PROB)] {
            total += prob * expectimax(ctx, board.with_tile(row, col, value), Node::Player, depth - 1);
        }
    }
    total / empties.len() as f64
}

/// Score one root direction: simulate it, then treat the spawn that follows
/// as the next (chance) ply.
pub(crate) fn root_branch(ctx: &mut SearchCtx, board: Board, dir: Move, depth: u32) -> BranchEval {
    let outcome = simulate(board, dir);
    if !outcome.valid {
        return BranchEval { dir, ev: 0.0, legal: false, after: outcome.board };
    }
    let ev = expectimax(ctx, outcome.board, Node::Chance, depth.saturating_sub(1));
    trace!(%dir, ev, "root branch");
    BranchEval { dir, ev, legal: true, after: outcome.board }
}

/// Single-threaded Expectimax search.
#[derive(Debug, Clone, Default)]
pub struct Expectimax {
    cfg: SearchConfig,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(SearchConfig::default()) }

    pub fn with_config(cfg: SearchConfig) -> Self { Self { cfg } }

    /// Compute EV for each direction.
    ///
    /// Returns a fixed array in order `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&self, board: Board, depth: u32) -> ([BranchEval; 4], SearchStats) {
        let depth = depth.min(self.cfg.depth_cap());
        let mut ctx = SearchCtx::new(self.cfg.cache_enabled);
        let branches = Move::ALL.map(|dir| root_branch(&mut ctx, board, dir, depth));
        (branches, SearchStats { nodes: ctx.nodes })
    }

    /// Best direction, or `None` if nothing moves.
    ///
    /// ```
    /// use advisor_2048::engine::{Board, Move};
    /// use advisor_2048::expectimax::Expectimax;
    /// let b = Board::try_from_rows(&[vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]]).unwrap();
    /// assert!(Expectimax::new().best_move(b, 2).is_some());
    /// assert_eq!(Expectimax::new().best_move(Board::EMPTY, 2), None);
    /// ```
    pub fn best_move(&self, board: Board, depth: u32) -> Option<Move> {
        let (branches, _) = self.branch_evals(board, depth);
        best_branch(&branches).map(|branch| branch.dir)
    }

    /// EV at root (player node).
    pub fn state_value(&self, board: Board, depth: u32) -> f64 {
        let mut ctx = SearchCtx::new(self.cfg.cache_enabled);
        expectimax(&mut ctx, board, Node::Player, depth.min(self.cfg.depth_cap()))
    }
}

impl SearchPolicy for Expectimax {
    fn branch_evals(&self, board: Board, depth: u32) -> ([BranchEval; 4], SearchStats) {
        Expectimax::branch_evals(self, board, depth)
    }

    fn config(&self) -> &SearchConfig { &self.cfg }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(rows: [[i64; 4]; 4]) -> Board {
        let rows: Vec<Vec<i64>> = rows.iter().map(|r| r.to_vec()).collect();
        Board::try_from_rows(&rows).unwrap()
    }

    fn sample() -> Board {
        board([[2, 2, 4, 0], [0, 8, 0, 2], [4, 0, 0, 0], [16, 2, 0, 0]])
    }

    #[test]
    fn test_depth_zero_is_heuristic() {
        for b in [Board::EMPTY, sample(), board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]])] {
            assert_eq!(search(b, 0, true), evaluate(b));
            assert_eq!(search(b, 0, false), evaluate(b));
        }
    }

    #[test]
    fn test_full_board_is_terminal() {
        // Merges exist, but with no empty cell the node is terminal.
        let b = board([[2, 2, 4, 8], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]]);
        assert_eq!(search(b, 3, true), evaluate(b));
        assert_eq!(search(b, 3, false), evaluate(b));
    }

    #[test]
    fn test_no_valid_move_falls_back_to_heuristic() {
        assert_eq!(search(Board::EMPTY, 2, true), evaluate(Board::EMPTY));
    }

    #[test]
    fn test_player_depth_one_is_best_child() {
        let b = sample();
        let expected = Move::ALL
            .iter()
            .map(|&d| simulate(b, d))
            .filter(|o| o.valid)
            .map(|o| evaluate(o.board))
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(search(b, 1, true), expected);
    }

    #[test]
    fn test_chance_depth_one_weights_spawns() {
        let b = board([[2, 4, 8, 16], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 0]]);
        let e2 = evaluate(b.with_tile(3, 3, 2));
        let e4 = evaluate(b.with_tile(3, 3, 4));
        assert_eq!(search(b, 1, false), (0.9 * e2 + 0.1 * e4) / 1.0);
    }

    #[test]
    fn test_chance_averages_cells_equally() {
        let b = board([[2, 4, 8, 16], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 0, 0]]);
        let cell = |c: usize| 0.9 * evaluate(b.with_tile(3, c, 2)) + 0.1 * evaluate(b.with_tile(3, c, 4));
        let expected = (cell(2) + cell(3)) / 2.0;
        assert!((search(b, 1, false) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_memo_matches_plain_search() {
        let b = sample();
        let plain = Expectimax::new();
        let cached = Expectimax::with_config(SearchConfig { cache_enabled: true, ..Default::default() });
        let (p, p_stats) = plain.branch_evals(b, 3);
        let (c, c_stats) = cached.branch_evals(b, 3);
        for (x, y) in p.iter().zip(c.iter()) {
            assert_eq!(x.legal, y.legal);
            assert_eq!(x.ev.to_bits(), y.ev.to_bits());
        }
        assert!(c_stats.nodes <= p_stats.nodes);
    }

    #[test]
    fn test_branch_evals_marks_illegal() {
        let b = board([[2, 0, 0, 0], [4, 0, 0, 0], [8, 0, 0, 0], [16, 0, 0, 0]]);
        let (branches, _) = Expectimax::new().branch_evals(b, 2);
        let legal: Vec<Move> = branches.iter().filter(|br| br.legal).map(|br| br.dir).collect();
        assert_eq!(legal, vec![Move::Right]);
        assert_eq!(branches[2].dir, Move::Left);
        assert_eq!(branches[2].after, b);
    }

    #[test]
    fn test_root_depth_zero_compares_one_ply() {
        let b = sample();
        let (branches, _) = Expectimax::new().branch_evals(b, 0);
        for br in branches.iter().filter(|br| br.legal) {
            assert_eq!(br.ev, evaluate(br.after));
        }
    }

    #[test]
    fn test_state_value_matches_search() {
        let b = sample();
        assert_eq!(Expectimax::new().state_value(b, 2), search(b, 2, true));
    }
}
