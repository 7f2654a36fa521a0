//! JSON request/response surface used by the `advisor serve` loop.
//!
//! Requests are tagged by `"type"`:
//!
//! ```json
//! {"type": "move", "board": [[2,2,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0]], "direction": "left", "score": 0}
//! {"type": "recommend", "board": [[...]], "depth": 2, "player_move": "up"}
//! {"type": "insights", "board": [[...]], "depth": 2}
//! ```
//!
//! Boards travel as raw integer rows and are validated before anything runs;
//! a bad board, an unknown direction or an oversized depth produces
//! `{"type": "error", "message": ...}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::advisor::MoveAdvisor;
use crate::engine::{Board, Move};
use crate::error::AdvisorError;
use crate::expectimax::SearchPolicy;
use crate::insights::insights_for;
use crate::session::{GameSession, SpawnEvent, SpawnSource};

/// Board rows as sent by the caller, validated by [`handle_request`].
pub type RawBoard = Vec<Vec<i64>>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Move {
        board: RawBoard,
        direction: String,
        #[serde(default)]
        score: u64,
    },
    Recommend {
        board: RawBoard,
        #[serde(default)]
        depth: Option<i64>,
        #[serde(default)]
        player_move: Option<String>,
    },
    Insights {
        board: RawBoard,
        #[serde(default)]
        depth: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveResponse {
    pub board: Board,
    pub score: u64,
    pub gained: u64,
    pub moved: bool,
    pub merges: Vec<(usize, usize)>,
    pub spawned: Option<SpawnEvent>,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendResponse {
    pub best_move: Option<Move>,
    pub scores: BTreeMap<Move, f64>,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coaching: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Move(MoveResponse),
    Recommend(RecommendResponse),
    Insights(InsightsResponse),
    Error { message: String },
}

/// Execute one decoded request.
///
/// Move requests run through a throwaway [`GameSession`] built from the
/// supplied board and score, drawing any spawn from `spawns`.
pub fn handle_request<P, S>(
    req: Request,
    advisor: &MoveAdvisor<P>,
    spawns: &mut S,
) -> Result<Response, AdvisorError>
where
    P: SearchPolicy,
    S: SpawnSource,
{
    let default_depth = advisor.config().depth as i64;
    match req {
        Request::Move { board, direction, score } => {
            let board = Board::try_from_rows(&board)?;
            let dir: Move = direction.parse()?;
            let mut session = GameSession::from_board(board, score, spawns);
            let report = session.play(dir);
            Ok(Response::Move(MoveResponse {
                board: session.board(),
                score: report.score,
                gained: report.outcome.gained,
                moved: report.outcome.valid,
                merges: report.outcome.merges,
                spawned: report.spawned,
                game_over: report.game_over,
            }))
        }
        Request::Recommend { board, depth, player_move } => {
            let board = Board::try_from_rows(&board)?;
            let player_move = player_move.map(|token| token.parse::<Move>()).transpose()?;
            let rec = advisor.recommend_with_coaching(board, depth.unwrap_or(default_depth), player_move)?;
            Ok(Response::Recommend(RecommendResponse {
                best_move: rec.best_move,
                scores: rec.scores,
                explanation: rec.explanation,
                coaching: rec.coaching,
            }))
        }
        Request::Insights { board, depth } => {
            let board = Board::try_from_rows(&board)?;
            let rec = advisor.recommend(board, depth.unwrap_or(default_depth))?;
            Ok(Response::Insights(InsightsResponse { insights: insights_for(board, Some(&rec)) }))
        }
    }
}

/// Decode, execute and encode one JSON request. Never fails: errors are
/// reported as an `error` response.
pub fn handle_json<P, S>(line: &str, advisor: &MoveAdvisor<P>, spawns: &mut S) -> String
where
    P: SearchPolicy,
    S: SpawnSource,
{
    let response = serde_json::from_str::<Request>(line)
        .map_err(AdvisorError::from)
        .and_then(|req| handle_request(req, advisor, spawns))
        .unwrap_or_else(|err| {
            warn!(%err, "rejected request");
            Response::Error { message: err.to_string() }
        });
    serde_json::to_string(&response)
        .unwrap_or_else(|err| serde_json::json!({ "type": "error", "message": err.to_string() }).to_string())
}
