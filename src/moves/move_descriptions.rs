//! Move value type and its flag bits.
//!
//! A `Move` is self-contained: it names the moving piece and its origin, the
//! target square, the flags that constrain how the target may be occupied,
//! and (for special moves only) an auxiliary square and mask.

use std::fmt;

use crate::game_state::chess_types::{Piece, PieceKind, Square};

pub type MoveFlags = u8;

/// Target must hold an enemy piece (pawn diagonal captures).
pub const FLAG_CAPTURE_ONLY: MoveFlags = 1 << 0;
/// Target must be empty (pawn pushes, castling).
pub const FLAG_NON_CAPTURE_ONLY: MoveFlags = 1 << 1;
/// Captures the pawn on the auxiliary square.
pub const FLAG_EN_PASSANT: MoveFlags = 1 << 2;
pub const FLAG_PROMOTES: MoveFlags = 1 << 3;
pub const FLAG_CASTLE_KINGSIDE: MoveFlags = 1 << 4;
pub const FLAG_CASTLE_QUEENSIDE: MoveFlags = 1 << 5;

pub const FLAG_CASTLE: MoveFlags = FLAG_CASTLE_KINGSIDE | FLAG_CASTLE_QUEENSIDE;

#[derive(Clone, Copy)]
pub struct Move {
    piece: Piece,
    from: Square,
    to: Square,
    flags: MoveFlags,
    promotion: Option<PieceKind>,
    /// En passant: the captured pawn's square. Castling: the king's transit square.
    aux_square: Option<Square>,
    /// Castling: squares that must be empty.
    aux_mask: u64,
}

impl Move {
    #[inline]
    pub const fn new(piece: Piece, from: Square, to: Square, flags: MoveFlags) -> Self {
        Self {
            piece,
            from,
            to,
            flags,
            promotion: None,
            aux_square: None,
            aux_mask: 0,
        }
    }

    #[inline]
    pub const fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self.flags |= FLAG_PROMOTES;
        self
    }

    #[inline]
    pub const fn with_aux(mut self, square: Square, mask: u64) -> Self {
        self.aux_square = Some(square);
        self.aux_mask = mask;
        self
    }

    #[inline]
    pub const fn piece(&self) -> Piece {
        self.piece
    }

    #[inline]
    pub const fn from(&self) -> Square {
        self.from
    }

    #[inline]
    pub const fn to(&self) -> Square {
        self.to
    }

    #[inline]
    pub const fn flags(&self) -> MoveFlags {
        self.flags
    }

    #[inline]
    pub const fn has_flag(&self, flag: MoveFlags) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub const fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    #[inline]
    pub const fn aux_square(&self) -> Option<Square> {
        self.aux_square
    }

    #[inline]
    pub const fn aux_mask(&self) -> u64 {
        self.aux_mask
    }

    #[inline]
    pub const fn is_castle(&self) -> bool {
        self.flags & FLAG_CASTLE != 0
    }

    #[inline]
    pub const fn is_en_passant(&self) -> bool {
        self.flags & FLAG_EN_PASSANT != 0
    }

    /// Pawn advancing two ranks from its start rank.
    #[inline]
    pub const fn is_double_push(&self) -> bool {
        self.piece.is_kind(PieceKind::Pawn) && self.from.file() == self.to.file() && {
            let diff = self.from.rank() as i8 - self.to.rank() as i8;
            diff == 2 || diff == -2
        }
    }
}

/// Equal iff origin, target, flags and promotion match.
impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.piece == other.piece
            && self.from == other.from
            && self.to == other.to
            && self.flags == other.flags
            && self.promotion == other.promotion
    }
}

impl Eq for Move {}

impl std::hash::Hash for Move {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.piece.hash(state);
        self.from.hash(state);
        self.to.hash(state);
        self.flags.hash(state);
        self.promotion.hash(state);
    }
}

/// Long algebraic text, e.g. `e2e4` or `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.fen_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self} {:?} flags={:#08b})", self.piece, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_types::Color;

    fn sq(index: u8) -> Square {
        Square::new(index).expect("test square is on the board")
    }

    #[test]
    fn equality_ignores_auxiliary_data() {
        let king = Piece::new(Color::Light, PieceKind::King);
        let a = Move::new(king, sq(4), sq(6), FLAG_CASTLE_KINGSIDE).with_aux(sq(5), 0x60);
        let b = Move::new(king, sq(4), sq(6), FLAG_CASTLE_KINGSIDE);
        assert_eq!(a, b);

        let plain = Move::new(king, sq(4), sq(6), 0);
        assert_ne!(a, plain);
    }

    #[test]
    fn promotion_sets_flag_and_renders_suffix() {
        let pawn = Piece::new(Color::Light, PieceKind::Pawn);
        let mv = Move::new(pawn, sq(52), sq(60), FLAG_NON_CAPTURE_ONLY)
            .with_promotion(PieceKind::Queen);
        assert!(mv.has_flag(FLAG_PROMOTES));
        assert_eq!(mv.to_string(), "e7e8q");
    }

    #[test]
    fn double_push_detection() {
        let pawn = Piece::new(Color::Dark, PieceKind::Pawn);
        let double = Move::new(pawn, sq(52), sq(36), FLAG_NON_CAPTURE_ONLY);
        let single = Move::new(pawn, sq(52), sq(44), FLAG_NON_CAPTURE_ONLY);
        assert!(double.is_double_push());
        assert!(!single.is_double_push());
    }
}
