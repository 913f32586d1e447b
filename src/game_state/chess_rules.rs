//! Canonical chess-rule constants.
//!
//! Starting layout, fixed castling squares and the rank conventions that
//! move tables and move application share.

use crate::game_state::chess_types::*;

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Back-rank order from the a-file to the h-file.
pub const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Halfmove clock value at which the fifty-move rule draws the game.
pub const FIFTY_MOVE_HALFMOVES: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

/// Fixed squares involved in one castling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingSquares {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// The square the king crosses; it must not be attacked.
    pub transit: Square,
    /// Squares between king and rook that must be empty.
    pub empty_mask: u64,
    pub right: CastlingRights,
}

const fn sq(index: usize) -> Square {
    Square::from_index(index)
}

pub const fn castling_squares(color: Color, side: CastleSide) -> CastlingSquares {
    match (color, side) {
        (Color::Light, CastleSide::Kingside) => CastlingSquares {
            king_from: sq(4),
            king_to: sq(6),
            rook_from: sq(7),
            rook_to: sq(5),
            transit: sq(5),
            empty_mask: (1 << 5) | (1 << 6),
            right: CASTLE_LIGHT_KINGSIDE,
        },
        (Color::Light, CastleSide::Queenside) => CastlingSquares {
            king_from: sq(4),
            king_to: sq(2),
            rook_from: sq(0),
            rook_to: sq(3),
            transit: sq(3),
            empty_mask: (1 << 1) | (1 << 2) | (1 << 3),
            right: CASTLE_LIGHT_QUEENSIDE,
        },
        (Color::Dark, CastleSide::Kingside) => CastlingSquares {
            king_from: sq(60),
            king_to: sq(62),
            rook_from: sq(63),
            rook_to: sq(61),
            transit: sq(61),
            empty_mask: (1 << 61) | (1 << 62),
            right: CASTLE_DARK_KINGSIDE,
        },
        (Color::Dark, CastleSide::Queenside) => CastlingSquares {
            king_from: sq(60),
            king_to: sq(58),
            rook_from: sq(56),
            rook_to: sq(59),
            transit: sq(59),
            empty_mask: (1 << 57) | (1 << 58) | (1 << 59),
            right: CASTLE_DARK_QUEENSIDE,
        },
    }
}

/// Both castling rights of one color.
#[inline]
pub const fn castling_rights_of(color: Color) -> CastlingRights {
    match color {
        Color::Light => CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE,
        Color::Dark => CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE,
    }
}

/// The right lost when a rook leaves, or is captured on, `square`.
#[inline]
pub const fn rook_home_right(square: Square) -> CastlingRights {
    match square.index() {
        0 => CASTLE_LIGHT_QUEENSIDE,
        7 => CASTLE_LIGHT_KINGSIDE,
        56 => CASTLE_DARK_QUEENSIDE,
        63 => CASTLE_DARK_KINGSIDE,
        _ => 0,
    }
}

#[inline]
pub const fn pawn_start_rank(color: Color) -> u8 {
    match color {
        Color::Light => 1,
        Color::Dark => 6,
    }
}

/// Rank a pawn must stand on to capture en passant.
#[inline]
pub const fn en_passant_rank(color: Color) -> u8 {
    match color {
        Color::Light => 4,
        Color::Dark => 3,
    }
}

#[inline]
pub const fn pawn_direction(color: Color) -> i8 {
    match color {
        Color::Light => 1,
        Color::Dark => -1,
    }
}

#[inline]
pub const fn promotion_rank(color: Color) -> u8 {
    match color {
        Color::Light => 7,
        Color::Dark => 0,
    }
}

/// Promotion choices, strongest first so ordering tries the queen early.
pub const PROMOTION_KINDS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];
