use std::io;

/// Reasons a decoded board is rejected before any simulation or search runs.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board must have 4 rows, got {0}")]
    RowCount(usize),
    #[error("row {row} must have 4 cells, got {len}")]
    RowLength { row: usize, len: usize },
    #[error("cell ({row}, {col}) is negative: {value}")]
    Negative { row: usize, col: usize, value: i64 },
    #[error("cell ({row}, {col}) = {value} is neither empty nor a power of two >= 2")]
    NotPowerOfTwo { row: usize, col: usize, value: i64 },
    #[error("cell ({row}, {col}) = {value} exceeds the largest supported tile")]
    TooLarge { row: usize, col: usize, value: i64 },
}

#[derive(thiserror::Error, Debug)]
pub enum AdvisorError {
    #[error("invalid board: {0}")]
    Board(#[from] BoardError),
    #[error("unknown direction {0:?}; expected one of up, down, left, right")]
    UnknownDirection(String),
    #[error("search depth {requested} exceeds the maximum of {max}")]
    DepthTooLarge { requested: i64, max: u32 },
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
