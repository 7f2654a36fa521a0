//! advisor_2048: a 2048 move advisor built on an Expectimax search
//!
//! This crate provides:
//! - A validated 4×4 `Board` with move simulation (`engine` module)
//! - A weighted board heuristic and Expectimax search, single-threaded and parallel (`expectimax`)
//! - Move recommendations with explanations and coaching (`advisor`) plus board tips (`insights`)
//! - A caller-owned game session with injectable tile spawning (`session`)
//! - A JSON request/response surface (`protocol`)
//!
//! Quick start:
//! ```
//! use advisor_2048::advisor::MoveAdvisor;
//! use advisor_2048::engine::{Board, Move};
//!
//! let board = Board::try_from_rows(&[
//!     vec![2, 2, 4, 0],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 0, 0],
//! ])
//! .unwrap();
//!
//! let out = board.simulate(Move::Left);
//! assert_eq!(out.board.rows()[0], [4, 4, 0, 0]);
//! assert_eq!(out.gained, 4);
//!
//! let rec = MoveAdvisor::new().recommend(board, 2).unwrap();
//! assert!(rec.best_move.is_some());
//! ```
//!
//! The free functions in [`engine`] (`simulate`, `is_game_over`, ...) mirror
//! the `Board` methods.
pub mod advisor;
pub mod engine;
pub mod error;
pub mod expectimax;
pub mod insights;
pub mod logging;
pub mod protocol;
pub mod session;

pub use advisor::{MoveAdvisor, Recommendation};
pub use engine::{Board, Move, MoveOutcome};
pub use error::{AdvisorError, BoardError};
pub use expectimax::{Expectimax, ExpectimaxParallel, SearchConfig, SearchPolicy};
pub use session::{FixedSpawns, GameSession, RandomSpawns, SpawnSource};
