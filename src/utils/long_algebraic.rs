//! Long algebraic (UCI) move text, resolved against a position.
//!
//! Text like `e2e4` or `e7e8q` names only the squares and a promotion; the
//! move flags, capture metadata and castling rook come from the matching
//! legal move, so anything that parses is also playable.

use crate::errors::{NotationError, NotationResult};
use crate::game_state::board::Board;
use crate::game_state::chess_types::{PieceKind, Square};
use crate::moves::move_descriptions::Move;
use crate::utils::algebraic::algebraic_to_square;

/// The squares and promotion named by a move text, before legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveText {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

pub fn parse_move_text(text: &str) -> NotationResult<MoveText> {
    let invalid = || NotationError::InvalidMoveText(text.to_owned());
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(invalid());
    }

    let from = algebraic_to_square(&text[0..2]).map_err(|_| invalid())?;
    let to = algebraic_to_square(&text[2..4]).map_err(|_| invalid())?;
    let promotion = match text.as_bytes().get(4) {
        None => None,
        Some(b'n') => Some(PieceKind::Knight),
        Some(b'b') => Some(PieceKind::Bishop),
        Some(b'r') => Some(PieceKind::Rook),
        Some(b'q') => Some(PieceKind::Queen),
        Some(_) => return Err(invalid()),
    };

    Ok(MoveText { from, to, promotion })
}

pub fn parse_long_algebraic(text: &str, board: &Board) -> NotationResult<Move> {
    let wanted = parse_move_text(text)?;
    board
        .legal_moves()
        .into_iter()
        .find(|mv| {
            mv.from() == wanted.from && mv.to() == wanted.to && mv.promotion() == wanted.promotion
        })
        .ok_or_else(|| NotationError::IllegalMove(text.to_owned()))
}
