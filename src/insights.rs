//! Rule-based coaching tips derived from board features.
//!
//! Tips never name a direction; the advisor is consulted only to know whether
//! any move exists at all.

use crate::advisor::{MoveAdvisor, Recommendation};
use crate::engine::Board;
use crate::error::AdvisorError;
use crate::expectimax::heuristic::{BoardFeatures, MAX_MONOTONICITY};
use crate::expectimax::SearchPolicy;

const CROWDED_AT: usize = 6;
const SMALL_TILE_BELOW: u32 = 128;
const BIG_TILE_AT: u32 = 512;
const TIGHT_AT: usize = 4;
const ORDERED_AT: u32 = 6;

const STRUCTURE_TIP: &str =
    "🧩 Favour merges along your strongest row or column instead of breaking its structure.";

/// Ordered advisory strings for `board`, using the default advisor.
///
/// ```
/// use advisor_2048::engine::Board;
/// use advisor_2048::insights::insights;
/// let b = Board::try_from_rows(&[vec![2, 2, 0, 0], vec![0; 4], vec![0; 4], vec![0; 4]]).unwrap();
/// let tips = insights(b, 2).unwrap();
/// assert_eq!(tips.len(), 4);
/// ```
pub fn insights(board: Board, depth: i64) -> Result<Vec<String>, AdvisorError> {
    insights_with(&MoveAdvisor::new(), board, depth)
}

/// Like [`insights`] with a caller-supplied advisor.
pub fn insights_with<P: SearchPolicy>(
    advisor: &MoveAdvisor<P>,
    board: Board,
    depth: i64,
) -> Result<Vec<String>, AdvisorError> {
    let rec = advisor.recommend(board, depth)?;
    Ok(insights_for(board, Some(&rec)))
}

/// Apply every rule in order. `rec` only decides whether the final
/// structural tip is added.
pub fn insights_for(board: Board, rec: Option<&Recommendation>) -> Vec<String> {
    let f = BoardFeatures::of(board);
    let mut tips = Vec::with_capacity(4);

    tips.push(if f.empty <= CROWDED_AT {
        format!("⚠️ The board is getting crowded: only {} empty cells remain. Prioritise merges that open space.", f.empty)
    } else {
        format!("✅ Good spacing: {} empty cells give you room to manoeuvre.", f.empty)
    });

    tips.push(if f.max_tile < SMALL_TILE_BELOW {
        format!("📈 Your largest tile is {}. Merge smaller tiles early to build toward bigger ones.", f.max_tile)
    } else if f.max_tile >= BIG_TILE_AT && f.empty <= TIGHT_AT {
        "⚠️ Big tiles and little space: you are close to running out of room.".to_string()
    } else {
        format!("🏁 Keep your largest tile ({}) anchored in a corner.", f.max_tile)
    });

    tips.push(if f.monotonicity < ORDERED_AT {
        format!(
            "🔀 Rows and columns are out of order (monotonicity {}/{}). Keep values decreasing toward one edge.",
            f.monotonicity, MAX_MONOTONICITY
        )
    } else {
        format!(
            "👌 Tiles are well ordered (monotonicity {}/{}). Keep building along that gradient.",
            f.monotonicity, MAX_MONOTONICITY
        )
    });

    if rec.and_then(|r| r.best_move).is_some() {
        tips.push(STRUCTURE_TIP.to_string());
    }
    tips
}
