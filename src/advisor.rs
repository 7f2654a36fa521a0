//! Move recommendation with a human-readable explanation and optional coaching.
//!
//! ```
//! use advisor_2048::advisor::MoveAdvisor;
//! use advisor_2048::engine::{Board, Move};
//!
//! let b = Board::try_from_rows(&[vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]]).unwrap();
//! let advisor = MoveAdvisor::new();
//! let rec = advisor.recommend(b, 2).unwrap();
//! assert!(rec.best_move.is_some());
//! assert!(rec.explanation.contains("Expected utility"));
//!
//! let coached = advisor.recommend_with_coaching(b, 2, Some(Move::Up)).unwrap();
//! assert!(coached.coaching.is_some());
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::engine::{Board, Move};
use crate::error::AdvisorError;
use crate::expectimax::heuristic::BoardFeatures;
use crate::expectimax::{best_branch, Expectimax, SearchConfig, SearchPolicy, SearchStats};

/// Explanation used when no direction changes the board.
pub const NO_VALID_MOVES: &str = "No valid moves available.";

const RATIONALE: &str = "Chose move with highest expected utility.";

/// Features of the board the recommended move leads to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveDetails {
    pub empty_after: usize,
    pub max_after: u32,
    pub smoothness_after: i64,
    pub monotonicity_after: u32,
    pub eval: f64,
}

impl From<BoardFeatures> for MoveDetails {
    fn from(f: BoardFeatures) -> Self {
        Self {
            empty_after: f.empty,
            max_after: f.max_tile,
            smoothness_after: f.smoothness,
            monotonicity_after: f.monotonicity,
            eval: f.score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// `None` when no direction is valid.
    pub best_move: Option<Move>,
    /// Expected score per valid direction only.
    pub scores: BTreeMap<Move, f64>,
    pub explanation: String,
    pub details: Option<MoveDetails>,
    pub coaching: Option<String>,
    pub stats: SearchStats,
}

/// Runs one root search over all four directions and picks the best.
#[derive(Debug, Clone, Default)]
pub struct MoveAdvisor<P = Expectimax> {
    policy: P,
}

impl MoveAdvisor<Expectimax> {
    pub fn new() -> Self { Self { policy: Expectimax::new() } }

    pub fn with_config(cfg: SearchConfig) -> Self { Self { policy: Expectimax::with_config(cfg) } }
}

impl<P: SearchPolicy> MoveAdvisor<P> {
    pub fn with_policy(policy: P) -> Self { Self { policy } }

    pub fn config(&self) -> &SearchConfig { self.policy.config() }

    /// Recommend a direction for `board` searching `depth` plies.
    ///
    /// Depths at or below zero compare the moves by heuristic alone; depths
    /// above the configured cap are rejected.
    pub fn recommend(&self, board: Board, depth: i64) -> Result<Recommendation, AdvisorError> {
        let depth = self.config().resolve_depth(depth)?;
        let (branches, stats) = self.policy.branch_evals(board, depth);

        let scores: BTreeMap<Move, f64> =
            branches.iter().filter(|b| b.legal).map(|b| (b.dir, b.ev)).collect();

        let Some(best) = best_branch(&branches) else {
            debug!(depth, nodes = stats.nodes, "no valid moves");
            return Ok(Recommendation {
                best_move: None,
                scores,
                explanation: NO_VALID_MOVES.to_string(),
                details: None,
                coaching: None,
                stats,
            });
        };

        let details = MoveDetails::from(BoardFeatures::of(best.after));
        debug!(depth, nodes = stats.nodes, best = %best.dir, ev = best.ev, "recommendation");
        Ok(Recommendation {
            best_move: Some(best.dir),
            scores,
            explanation: explain(best.ev, &details),
            details: Some(details),
            coaching: None,
            stats,
        })
    }

    /// Like [`Self::recommend`], additionally comparing the player's move
    /// with the recommendation.
    pub fn recommend_with_coaching(
        &self,
        board: Board,
        depth: i64,
        player_move: Option<Move>,
    ) -> Result<Recommendation, AdvisorError> {
        let mut rec = self.recommend(board, depth)?;
        rec.coaching = player_move.and_then(|mv| coaching_message(&rec, mv));
        Ok(rec)
    }
}

/// One of two fixed messages comparing `player_move` with the recommendation.
/// `None` when there is nothing to recommend.
pub fn coaching_message(rec: &Recommendation, player_move: Move) -> Option<String> {
    let best = rec.best_move?;
    if best == player_move {
        return Some(format!("👍 Nice! Playing {player_move} matches the recommended move."));
    }
    let best_ev = rec.scores.get(&best).copied().unwrap_or_default();
    Some(format!(
        "💡 You played {player_move}, but {best} has the higher expected utility ({}).",
        fmt_utility(best_ev)
    ))
}

fn explain(ev: f64, details: &MoveDetails) -> String {
    format!(
        "🤖 Expected utility: {} | Empty tiles after move: {} | Max tile after move: {} | Monotonicity: {} | Reason: {}",
        fmt_utility(ev),
        details.empty_after,
        details.max_after,
        details.monotonicity_after,
        RATIONALE
    )
}

#[inline]
fn round2(x: f64) -> f64 { (x * 100.0).round() / 100.0 }

/// Two-decimal rounding printed in shortest form, keeping one decimal on
/// whole numbers (`3.0`, `47.5`, `47.54`).
fn fmt_utility(x: f64) -> String {
    let r = round2(x);
    if r.fract() == 0.0 {
        format!("{r:.1}")
    } else {
        r.to_string()
    }
}
