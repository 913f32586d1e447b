//! Square and bitboard conversions for algebraic coordinates.
//!
//! Converts between human-readable coordinates (e.g., `e4`) and the checked
//! `Square` type reused by the FEN, long algebraic, and protocol layers.

use std::str::FromStr;

use crate::errors::{NotationError, NotationResult};
use crate::game_state::chess_types::Square;

/// Convert algebraic notation (for example: "e4") to a square.
pub fn algebraic_to_square(text: &str) -> NotationResult<Square> {
    let bytes = text.as_bytes();
    if bytes.len() != 2 {
        return Err(NotationError::InvalidSquare(text.to_owned()));
    }

    let file = bytes[0];
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(NotationError::InvalidSquare(text.to_owned()));
    }

    Square::from_file_rank(file - b'a', rank - b'1')
        .ok_or_else(|| NotationError::InvalidSquare(text.to_owned()))
}

/// Convert a one-hot bitboard to algebraic notation.
pub fn bitboard_to_algebraic(bitboard: u64) -> NotationResult<String> {
    if bitboard.count_ones() != 1 {
        return Err(NotationError::InvalidSquare(format!(
            "bitboard {bitboard:#018x} must have exactly one set bit"
        )));
    }
    Square::lowest(bitboard)
        .map(|square| square.to_string())
        .ok_or_else(|| NotationError::InvalidSquare(format!("{bitboard:#018x}")))
}

impl FromStr for Square {
    type Err = NotationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        algebraic_to_square(text)
    }
}
