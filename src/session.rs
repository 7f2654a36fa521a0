//! Game session: the caller-owned board, cumulative score and tile spawning.
//!
//! The search never spawns tiles; only a session does, through a
//! [`SpawnSource`] so tests and replays can script every spawn.
//!
//! ```
//! use advisor_2048::engine::Move;
//! use advisor_2048::session::{FixedSpawns, GameSession};
//!
//! // Two opening tiles, then one spawn per valid move.
//! let spawns = FixedSpawns::new(vec![(0, 2), (0, 2), (0, 4)]);
//! let mut game = GameSession::new(spawns);
//! assert_eq!(game.board().rows()[0], [2, 2, 0, 0]);
//!
//! let report = game.play(Move::Left);
//! assert_eq!(report.outcome.gained, 4);
//! assert_eq!(game.score(), 4);
//! assert_eq!(report.spawned.map(|s| (s.row, s.col, s.value)), Some((0, 1, 4)));
//! ```

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::engine::{simulate, Board, Move, MoveOutcome};

/// A tile placed by the session after a valid move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpawnEvent {
    pub row: usize,
    pub col: usize,
    pub value: u32,
}

/// Where spawn decisions come from.
///
/// [`spawn_tile`] reduces `pick_cell` modulo the empty count and places a 2
/// for any value other than 4.
pub trait SpawnSource {
    /// Index into the row-major list of `n_empty` empty cells (`n_empty > 0`).
    fn pick_cell(&mut self, n_empty: usize) -> usize;
    /// Value of the new tile: 2 or 4.
    fn pick_value(&mut self) -> u32;
}

impl<S: SpawnSource + ?Sized> SpawnSource for &mut S {
    fn pick_cell(&mut self, n_empty: usize) -> usize { (**self).pick_cell(n_empty) }
    fn pick_value(&mut self) -> u32 { (**self).pick_value() }
}

/// Uniform cell choice; a 2 nine times in ten, otherwise a 4.
#[derive(Debug, Clone)]
pub struct RandomSpawns<R = StdRng>(pub R);

impl RandomSpawns<StdRng> {
    /// Deterministic source seeded from `seed`.
    pub fn seeded(seed: u64) -> Self { RandomSpawns(StdRng::seed_from_u64(seed)) }

    /// Source seeded from OS entropy.
    pub fn from_entropy() -> Self { RandomSpawns(StdRng::from_entropy()) }
}

impl<R: Rng> SpawnSource for RandomSpawns<R> {
    fn pick_cell(&mut self, n_empty: usize) -> usize { self.0.gen_range(0..n_empty) }

    fn pick_value(&mut self) -> u32 {
        if self.0.gen_range(0..10) < 9 { 2 } else { 4 }
    }
}

/// Replays scripted `(cell index, value)` spawns. Once exhausted it keeps
/// placing a 2 in the first empty cell. Indices wrap around the empty count.
#[derive(Debug, Clone)]
pub struct FixedSpawns {
    script: VecDeque<(usize, u32)>,
    pending_value: u32,
}

impl FixedSpawns {
    pub fn new(script: Vec<(usize, u32)>) -> Self {
        Self { script: script.into(), pending_value: 2 }
    }
}

impl Default for FixedSpawns {
    fn default() -> Self { Self::new(Vec::new()) }
}

impl SpawnSource for FixedSpawns {
    fn pick_cell(&mut self, n_empty: usize) -> usize {
        let (idx, value) = self.script.pop_front().unwrap_or((0, 2));
        self.pending_value = value;
        idx % n_empty
    }

    fn pick_value(&mut self) -> u32 { self.pending_value }
}

/// Place one tile on a random empty cell. `None` if the board is full.
pub fn spawn_tile<S: SpawnSource + ?Sized>(board: Board, source: &mut S) -> Option<(Board, SpawnEvent)> {
    let empties = board.empty_cells();
    if empties.is_empty() {
        return None;
    }
    let (row, col) = empties[source.pick_cell(empties.len()) % empties.len()];
    let value = match source.pick_value() {
        4 => 4,
        _ => 2,
    };
    Some((board.with_tile(row, col, value), SpawnEvent { row, col, value }))
}

/// What happened on one [`GameSession::play`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReport {
    pub outcome: MoveOutcome,
    pub spawned: Option<SpawnEvent>,
    /// Cumulative session score after the move.
    pub score: u64,
    pub game_over: bool,
}

/// A single game owned by the caller.
#[derive(Debug, Clone)]
pub struct GameSession<S = RandomSpawns> {
    board: Board,
    score: u64,
    game_over: bool,
    spawns: S,
}

impl<S: SpawnSource> GameSession<S> {
    /// Start a game with two spawned tiles.
    pub fn new(spawns: S) -> Self {
        let mut session = Self::from_board(Board::EMPTY, 0, spawns);
        session.reset();
        session
    }

    /// Resume from an existing board and score without spawning.
    pub fn from_board(board: Board, score: u64, spawns: S) -> Self {
        Self { board, score, game_over: board.is_game_over(), spawns }
    }

    /// Clear the board and score and spawn the two opening tiles.
    pub fn reset(&mut self) {
        self.board = Board::EMPTY;
        self.score = 0;
        for _ in 0..2 {
            if let Some((board, _)) = spawn_tile(self.board, &mut self.spawns) {
                self.board = board;
            }
        }
        self.game_over = self.board.is_game_over();
        info!(board = ?self.board, "new game");
    }

    /// Apply `dir`. A valid move adds its score and spawns one tile;
    /// an invalid one leaves everything untouched.
    pub fn play(&mut self, dir: Move) -> MoveReport {
        let outcome = simulate(self.board, dir);
        let mut spawned = None;
        if outcome.valid {
            self.score += outcome.gained;
            self.board = outcome.board;
            if let Some((board, event)) = spawn_tile(self.board, &mut self.spawns) {
                self.board = board;
                spawned = Some(event);
            }
            self.game_over = self.board.is_game_over();
            if self.game_over {
                info!(score = self.score, highest = self.board.highest_tile(), "game over");
            }
        }
        MoveReport { outcome, spawned, score: self.score, game_over: self.game_over }
    }

    pub fn board(&self) -> Board { self.board }

    pub fn score(&self) -> u64 { self.score }

    pub fn is_game_over(&self) -> bool { self.game_over }
}
