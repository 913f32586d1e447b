//! Error types shared across the engine.
//!
//! Notation errors come from the text-facing collaborators, board errors from
//! rejected initial layouts, and search errors from the search boundary.

use thiserror::Error;

/// Malformed external notation (FEN, coordinates, long algebraic, book rows).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("invalid square coordinate: {0}")]
    InvalidSquare(String),

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid long algebraic move: {0}")]
    InvalidMoveText(String),

    #[error("move {0} is not legal in this position")]
    IllegalMove(String),

    #[error("invalid opening book data: {0}")]
    InvalidBook(String),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// An initial layout or counter set that cannot form a board.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("square index {0} is out of range (must be 0-63)")]
    SquareOutOfRange(u8),

    #[error("square {0} holds more than one piece")]
    SquareOccupied(String),

    #[error("pawn placed on terminal rank at {0}")]
    PawnOnTerminalRank(String),

    #[error("en-passant target {0} is not on the third or sixth rank")]
    InvalidEnPassant(String),

    #[error("{0} has more than one king")]
    MultipleKings(String),
}

/// Failures caught at the search boundary.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("failed to start search timer: {0}")]
    TimerSpawn(#[from] std::io::Error),

    #[error("search worker panicked: {0}")]
    Panicked(String),

    #[error("internal search failure: {0}")]
    Internal(String),
}

/// A protocol command the front-end rejects. The session reports it and
/// keeps running.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("incomplete command: missing {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error(transparent)]
    Notation(#[from] NotationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type NotationResult<T> = Result<T, NotationError>;
