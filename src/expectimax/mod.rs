//! Expectimax search over player (max) and chance (spawn) nodes.
//!
//! This module provides two policy implementations:
//! - [`Expectimax`]: single-threaded expectimax.
//! - [`ExpectimaxParallel`]: rayon-based, evaluates the root branches in parallel.
//!
//! Both share the same surface through [`SearchPolicy`] and produce identical
//! branch values. Neither keeps state between calls: node counts are returned
//! with each evaluation and the optional memo lives only for one call.
//!
//! Quick start
//! ```
//! use advisor_2048::engine::Board;
//! use advisor_2048::expectimax::{search, heuristic::evaluate, Expectimax, SearchPolicy};
//!
//! let b = Board::try_from_rows(&[vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0, 0, 0, 4]]).unwrap();
//! // Depth 0 is the bare heuristic.
//! assert_eq!(search(b, 0, true), evaluate(b));
//!
//! let ex = Expectimax::new();
//! let (branches, stats) = ex.branch_evals(b, 2);
//! assert_eq!(branches.len(), 4);
//! assert!(stats.nodes > 0);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Move};
use crate::error::AdvisorError;

pub mod heuristic;
mod search_par;
mod search_seq;

pub use search_par::ExpectimaxParallel;
pub use search_seq::{search, Expectimax};

/// Default search depth for recommendations.
pub const DEFAULT_DEPTH: u32 = 2;

/// Hard ceiling on search depth. Recursion never goes deeper than this.
pub const MAX_SEARCH_DEPTH: u32 = 6;

/// Probability of a spawned tile being a 2 (the rest are 4s).
pub(crate) const SPAWN_TWO_PROB: f64 = 0.9;
pub(crate) const SPAWN_FOUR_PROB: f64 = 0.1;

/// Configurable knobs for search. Defaults give the plain base search at depth 2.
///
/// - `depth`: depth used when a request does not name one.
/// - `max_depth`: largest depth a request may ask for (never above [`MAX_SEARCH_DEPTH`]).
/// - `cache_enabled`: memoize subtree values within a single call.
/// - `par_min_depth`: below this depth the parallel policy evaluates sequentially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub depth: u32,
    pub max_depth: u32,
    pub cache_enabled: bool,
    pub par_min_depth: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { depth: DEFAULT_DEPTH, max_depth: MAX_SEARCH_DEPTH, cache_enabled: false, par_min_depth: 2 }
    }
}

impl SearchConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, AdvisorError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The effective depth ceiling.
    #[inline]
    pub fn depth_cap(&self) -> u32 { self.max_depth.min(MAX_SEARCH_DEPTH) }

    /// Turn a requested depth into a usable one.
    ///
    /// Negative depths behave like 0 (one-ply heuristic comparison);
    /// depths above the cap are rejected rather than silently truncated.
    pub fn resolve_depth(&self, requested: i64) -> Result<u32, AdvisorError> {
        let cap = self.depth_cap();
        if requested > cap as i64 {
            return Err(AdvisorError::DepthTooLarge { requested, max: cap });
        }
        Ok(requested.max(0) as u32)
    }
}

/// Per-branch expected value at the root.
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op for the current board.
/// - `after` is the board right after the move, before any spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
    pub after: Board,
}

/// Basic search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
}

/// Anything that can score the four root branches of a board.
pub trait SearchPolicy {
    /// Evaluate every direction from `board`, in `[Up, Down, Left, Right]` order.
    fn branch_evals(&self, board: Board, depth: u32) -> ([BranchEval; 4], SearchStats);

    /// The search configuration this policy runs with.
    fn config(&self) -> &SearchConfig;
}

/// Pick the legal branch with the strictly greatest EV.
///
/// Exact ties keep the earliest direction in `[Up, Down, Left, Right]`.
pub fn best_branch(branches: &[BranchEval; 4]) -> Option<&BranchEval> {
    let mut best: Option<&BranchEval> = None;
    for branch in branches.iter().filter(|b| b.legal) {
        match best {
            Some(current) if branch.ev <= current.ev => {}
            _ => best = Some(branch),
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Node {
    Player,
    Chance,
}
