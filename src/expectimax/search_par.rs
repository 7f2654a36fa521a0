use rayon::prelude::*;

use crate::engine::{Board, Move};

use super::search_seq::{root_branch, SearchCtx};
use super::{best_branch, BranchEval, SearchConfig, SearchPolicy, SearchStats};

/// Parallel Expectimax: the four root branches run on the rayon pool.
///
/// Each branch gets its own scratch context, so results are bit-identical to
/// [`super::Expectimax`] and nothing is shared between branches or calls.
#[derive(Debug, Clone, Default)]
pub struct ExpectimaxParallel {
    cfg: SearchConfig,
}

impl ExpectimaxParallel {
    pub fn new() -> Self { Self::with_config(SearchConfig::default()) }

    pub fn with_config(cfg: SearchConfig) -> Self { Self { cfg } }

    /// Compute the best move using parallel expectimax.
    #[inline]
    pub fn best_move(&self, board: Board, depth: u32) -> Option<Move> {
        let (branches, _) = self.branch_evals(board, depth);
        best_branch(&branches).map(|branch| branch.dir)
    }

    /// Compute EV for each direction in parallel.
    ///
    /// Returns a fixed array in order `[Up, Down, Left, Right]`. Shallow
    /// searches (below `par_min_depth`) stay on the calling thread.
    pub fn branch_evals(&self, board: Board, depth: u32) -> ([BranchEval; 4], SearchStats) {
        let depth = depth.min(self.cfg.depth_cap());
        let cache = self.cfg.cache_enabled;
        let eval_one = |dir: Move| {
            let mut ctx = SearchCtx::new(cache);
            let branch = root_branch(&mut ctx, board, dir, depth);
            (branch, ctx.nodes)
        };
        let results: Vec<(BranchEval, u64)> = if depth >= self.cfg.par_min_depth {
            Move::ALL.par_iter().map(|&dir| eval_one(dir)).collect()
        } else {
            Move::ALL.iter().map(|&dir| eval_one(dir)).collect()
        };

        let nodes = results.iter().map(|(_, n)| n).sum();
        let branches = [results[0].0, results[1].0, results[2].0, results[3].0];
        (branches, SearchStats { nodes })
    }
}

impl SearchPolicy for ExpectimaxParallel {
    fn branch_evals(&self, board: Board, depth: u32) -> ([BranchEval; 4], SearchStats) {
        ExpectimaxParallel::branch_evals(self, board, depth)
    }

    fn config(&self) -> &SearchConfig { &self.cfg }
}
