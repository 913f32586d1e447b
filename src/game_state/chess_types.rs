//! Primitive chess types: colors, piece kinds, bit-tagged pieces and squares.
//!
//! Everything here is a small `Copy` value with no behavior beyond encoding
//! and decoding. Bitboards are plain `u64` masks with bit `n` = square `n`.

use std::fmt;

use crate::errors::BoardError;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Light, Color::Dark];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Color::Light => 0,
            Color::Dark => 1,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// +1 for light, -1 for dark; converts light-perspective scores to side-to-move.
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Color::Light => 1,
            Color::Dark => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Light => f.write_str("light"),
            Color::Dark => f.write_str("dark"),
        }
    }
}

/// Piece kind (color is represented separately for cache-friendly layouts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        }
    }

    #[inline]
    pub const fn from_index(index: usize) -> Option<PieceKind> {
        match index {
            0 => Some(PieceKind::Pawn),
            1 => Some(PieceKind::Knight),
            2 => Some(PieceKind::Bishop),
            3 => Some(PieceKind::Rook),
            4 => Some(PieceKind::Queen),
            5 => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Bishops, rooks and queens attack along rays that can be blocked.
    #[inline]
    pub const fn is_slider(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }

    #[inline]
    pub const fn fen_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

const KIND_BITS: u8 = 0b0011_1111;
const LIGHT_BIT: u8 = 1 << 6;
const DARK_BIT: u8 = 1 << 7;

/// A colored piece, tagged so color and kind test independently.
///
/// Bits 0..6 hold a one-hot kind, bit 6 marks light and bit 7 marks dark.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece(u8);

impl Piece {
    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        let color_bit = match color {
            Color::Light => LIGHT_BIT,
            Color::Dark => DARK_BIT,
        };
        Piece(color_bit | (1 << kind.index()))
    }

    #[inline]
    pub const fn color(self) -> Color {
        if self.0 & LIGHT_BIT != 0 {
            Color::Light
        } else {
            Color::Dark
        }
    }

    #[inline]
    pub const fn kind(self) -> PieceKind {
        match (self.0 & KIND_BITS).trailing_zeros() {
            0 => PieceKind::Pawn,
            1 => PieceKind::Knight,
            2 => PieceKind::Bishop,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            _ => PieceKind::King,
        }
    }

    #[inline]
    pub const fn is_kind(self, kind: PieceKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    #[inline]
    pub const fn is_color(self, color: Color) -> bool {
        match color {
            Color::Light => self.0 & LIGHT_BIT != 0,
            Color::Dark => self.0 & DARK_BIT != 0,
        }
    }

    /// FEN letter: uppercase for light, lowercase for dark.
    #[inline]
    pub fn fen_char(self) -> char {
        let c = self.kind().fen_char();
        match self.color() {
            Color::Light => c.to_ascii_uppercase(),
            Color::Dark => c,
        }
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Piece({:?} {:?})", self.color(), self.kind())
    }
}

/// Board square index (`0..=63`), file = index % 8, rank = index / 8.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// Fails for indices outside `0..=63`.
    #[inline]
    pub fn new(index: u8) -> Result<Self, BoardError> {
        if index < 64 {
            Ok(Square(index))
        } else {
            Err(BoardError::SquareOutOfRange(index))
        }
    }

    /// Callers guarantee `index < 64`; used by table builders that iterate `0..64`.
    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Square((index & 63) as u8)
    }

    #[inline]
    pub const fn from_file_rank(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    #[inline]
    pub const fn mask(self) -> u64 {
        1u64 << self.0
    }

    /// Step by file/rank deltas, `None` when leaving the board.
    #[inline]
    pub const fn offset(self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let file = self.file() as i8 + file_delta;
        let rank = self.rank() as i8 + rank_delta;
        if file < 0 || file > 7 || rank < 0 || rank > 7 {
            None
        } else {
            Some(Square((rank * 8 + file) as u8))
        }
    }

    /// Lowest set square of a non-empty bitboard.
    #[inline]
    pub const fn lowest(bitboard: u64) -> Option<Self> {
        if bitboard == 0 {
            None
        } else {
            Some(Square(bitboard.trailing_zeros() as u8))
        }
    }
}

impl TryFrom<u8> for Square {
    type Error = BoardError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Square::new(index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = char::from(b'a' + self.file());
        let rank = char::from(b'1' + self.rank());
        write!(f, "{file}{rank}")
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({self})")
    }
}

/// Iterate the squares of a bitboard from a1 upward.
#[inline]
pub fn squares_of(mut bitboard: u64) -> impl Iterator<Item = Square> {
    std::iter::from_fn(move || {
        let sq = Square::lowest(bitboard)?;
        bitboard &= bitboard - 1;
        Some(sq)
    })
}

/// A piece standing on a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacedPiece {
    pub piece: Piece,
    pub square: Square,
}

impl PlacedPiece {
    #[inline]
    pub const fn new(color: Color, kind: PieceKind, square: Square) -> Self {
        Self {
            piece: Piece::new(color, kind),
            square,
        }
    }
}

/// Compact castling rights bitmask.
pub type CastlingRights = u8;

pub const CASTLE_LIGHT_KINGSIDE: CastlingRights = 1 << 0;
pub const CASTLE_LIGHT_QUEENSIDE: CastlingRights = 1 << 1;
pub const CASTLE_DARK_KINGSIDE: CastlingRights = 1 << 2;
pub const CASTLE_DARK_QUEENSIDE: CastlingRights = 1 << 3;
pub const CASTLE_ALL: CastlingRights = 0b1111;
