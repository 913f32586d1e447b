//! Immutable board representation.
//!
//! A `Board` pairs two per-color bitboard sets with the game counters of one
//! snapshot. It is never mutated after construction: move application builds
//! a brand-new board, so boards can be cached, shared across threads, or used
//! as search-tree nodes without any undo bookkeeping.

use crate::errors::BoardError;
use crate::game_state::chess_rules::BACK_RANK;
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_apply::apply_move;
use crate::move_generation::legal_move_checks::{attackers_of, is_in_check};
use crate::move_generation::legal_move_generator::{legal_moves, legal_moves_for_piece};
use crate::moves::move_descriptions::Move;
use crate::search::board_scoring::{BoardScorer, TaperedScorer};
use crate::search::zobrist::compute_position_hash;

/// One color's pieces: a mask per piece kind plus their union.
///
/// Masks of one set are pairwise disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PieceSet {
    masks: [u64; 6],
    union: u64,
}

impl PieceSet {
    pub const EMPTY: PieceSet = PieceSet {
        masks: [0; 6],
        union: 0,
    };

    #[inline]
    pub fn from_masks(masks: [u64; 6]) -> Self {
        let union = masks.iter().fold(0u64, |acc, bb| acc | bb);
        Self { masks, union }
    }

    #[inline]
    pub const fn mask(&self, kind: PieceKind) -> u64 {
        self.masks[kind.index()]
    }

    #[inline]
    pub const fn masks(&self) -> [u64; 6] {
        self.masks
    }

    #[inline]
    pub const fn union(&self) -> u64 {
        self.union
    }

    #[inline]
    pub const fn count(&self, kind: PieceKind) -> u32 {
        self.masks[kind.index()].count_ones()
    }

    /// Peek which kind (if any) occupies `square`.
    #[inline]
    pub fn kind_at(&self, square: Square) -> Option<PieceKind> {
        let bit = square.mask();
        if self.union & bit == 0 {
            return None;
        }
        PieceKind::ALL
            .into_iter()
            .find(|kind| self.masks[kind.index()] & bit != 0)
    }
}

/// Game counters paired 1:1 with a board snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameCounters {
    pub active_color: Color,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    /// Halfmoves since the last pawn move or capture.
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl Default for GameCounters {
    fn default() -> Self {
        Self {
            active_color: Color::Light,
            castling_rights: 0,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    sets: [PieceSet; 2],
    counters: GameCounters,
    last_move: Option<Move>,
    hash: u64,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// No pieces, light to move, no castling rights.
    pub fn empty() -> Self {
        Self::from_sets([PieceSet::EMPTY; 2], GameCounters::default())
    }

    pub fn starting_position() -> Self {
        let mut light = [0u64; 6];
        let mut dark = [0u64; 6];
        for (file, kind) in BACK_RANK.iter().enumerate() {
            light[kind.index()] |= 1u64 << file;
            dark[kind.index()] |= 1u64 << (56 + file);
        }
        light[PieceKind::Pawn.index()] = 0x0000_0000_0000_FF00;
        dark[PieceKind::Pawn.index()] = 0x00FF_0000_0000_0000;

        Self::from_sets(
            [PieceSet::from_masks(light), PieceSet::from_masks(dark)],
            GameCounters {
                castling_rights: CASTLE_ALL,
                ..GameCounters::default()
            },
        )
    }

    /// Build a board from an explicit piece layout and counters.
    ///
    /// Rejects layouts the move tables cannot represent: shared squares,
    /// pawns on a terminal rank, a second king, or an en-passant target off
    /// the third/sixth rank.
    pub fn from_layout<I>(pieces: I, counters: GameCounters) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = PlacedPiece>,
    {
        let mut masks = [[0u64; 6]; 2];
        let mut occupied = 0u64;

        for placed in pieces {
            let bit = placed.square.mask();
            if occupied & bit != 0 {
                return Err(BoardError::SquareOccupied(placed.square.to_string()));
            }
            let kind = placed.piece.kind();
            let color = placed.piece.color();
            if kind == PieceKind::Pawn && (placed.square.rank() == 0 || placed.square.rank() == 7)
            {
                return Err(BoardError::PawnOnTerminalRank(placed.square.to_string()));
            }
            if kind == PieceKind::King && masks[color.index()][kind.index()] != 0 {
                return Err(BoardError::MultipleKings(color.to_string()));
            }
            masks[color.index()][kind.index()] |= bit;
            occupied |= bit;
        }

        if let Some(ep) = counters.en_passant {
            if ep.rank() != 2 && ep.rank() != 5 {
                return Err(BoardError::InvalidEnPassant(ep.to_string()));
            }
        }

        Ok(Self::from_sets(
            [PieceSet::from_masks(masks[0]), PieceSet::from_masks(masks[1])],
            counters,
        ))
    }

    fn from_sets(sets: [PieceSet; 2], counters: GameCounters) -> Self {
        let hash = compute_position_hash(
            [sets[0].masks(), sets[1].masks()],
            counters.active_color,
            counters.castling_rights,
            counters.en_passant,
        );
        Self {
            sets,
            counters,
            last_move: None,
            hash,
        }
    }

    /// Assemble a successor board whose hash was maintained incrementally.
    #[inline]
    pub(crate) fn from_successor_parts(
        sets: [PieceSet; 2],
        counters: GameCounters,
        last_move: Move,
        hash: u64,
    ) -> Self {
        Self {
            sets,
            counters,
            last_move: Some(last_move),
            hash,
        }
    }

    #[inline]
    pub const fn active_color(&self) -> Color {
        self.counters.active_color
    }

    #[inline]
    pub const fn counters(&self) -> &GameCounters {
        &self.counters
    }

    #[inline]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.counters.castling_rights
    }

    #[inline]
    pub const fn has_castling_right(&self, right: CastlingRights) -> bool {
        self.counters.castling_rights & right != 0
    }

    #[inline]
    pub const fn en_passant(&self) -> Option<Square> {
        self.counters.en_passant
    }

    #[inline]
    pub const fn halfmove_clock(&self) -> u16 {
        self.counters.halfmove_clock
    }

    #[inline]
    pub const fn fullmove_number(&self) -> u16 {
        self.counters.fullmove_number
    }

    /// The move that produced this board, kept for notation and analysis only.
    #[inline]
    pub const fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    #[inline]
    pub const fn position_hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub const fn pieces(&self, color: Color) -> &PieceSet {
        &self.sets[color.index()]
    }

    #[inline]
    pub(crate) const fn sets(&self) -> [PieceSet; 2] {
        self.sets
    }

    #[inline]
    pub const fn occupancy(&self) -> u64 {
        self.sets[0].union | self.sets[1].union
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        Color::ALL.into_iter().find_map(|color| {
            self.sets[color.index()]
                .kind_at(square)
                .map(|kind| Piece::new(color, kind))
        })
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        Square::lowest(self.sets[color.index()].mask(PieceKind::King))
    }

    /// All pieces of one color, pawns first, each kind from a1 upward.
    pub fn placed_pieces(&self, color: Color) -> impl Iterator<Item = PlacedPiece> + '_ {
        PieceKind::ALL.into_iter().flat_map(move |kind| {
            squares_of(self.sets[color.index()].mask(kind))
                .map(move |square| PlacedPiece::new(color, kind, square))
        })
    }

    #[inline]
    pub fn apply_move(&self, mv: &Move) -> Board {
        apply_move(self, mv)
    }

    #[inline]
    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(self)
    }

    #[inline]
    pub fn legal_moves_for(&self, placed: PlacedPiece) -> Vec<Move> {
        legal_moves_for_piece(self, placed)
    }

    #[inline]
    pub fn attackers_of(
        &self,
        square: Square,
        color: Color,
    ) -> impl Iterator<Item = PlacedPiece> + '_ {
        attackers_of(self, square, color)
    }

    #[inline]
    pub fn is_in_check(&self) -> bool {
        is_in_check(self)
    }

    /// Static evaluation from light's perspective.
    #[inline]
    pub fn score(&self) -> i32 {
        TaperedScorer.score(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::zobrist::compute_position_hash;

    fn sq(index: u8) -> Square {
        Square::new(index).expect("test square is on the board")
    }

    #[test]
    fn starting_position_layout() {
        let board = Board::starting_position();
        assert_eq!(board.active_color(), Color::Light);
        assert_eq!(board.castling_rights(), CASTLE_ALL);
        assert_eq!(board.occupancy().count_ones(), 32);
        assert_eq!(board.pieces(Color::Light).union(), 0xFFFF);
        assert_eq!(board.pieces(Color::Dark).union(), 0xFFFF_0000_0000_0000);
        assert_eq!(board.king_square(Color::Dark), Some(sq(60)));
        assert_eq!(
            board.piece_at(sq(3)),
            Some(Piece::new(Color::Light, PieceKind::Queen))
        );
        assert_eq!(board.piece_at(sq(27)), None);
    }

    #[test]
    fn piece_sets_are_disjoint() {
        let board = Board::starting_position();
        for color in Color::ALL {
            let set = board.pieces(color);
            let mut seen = 0u64;
            for kind in PieceKind::ALL {
                assert_eq!(seen & set.mask(kind), 0);
                seen |= set.mask(kind);
            }
            assert_eq!(seen, set.union());
        }
        assert_eq!(
            board.pieces(Color::Light).union() & board.pieces(Color::Dark).union(),
            0
        );
    }

    #[test]
    fn layout_rejects_shared_squares() {
        let err = Board::from_layout(
            [
                PlacedPiece::new(Color::Light, PieceKind::King, sq(4)),
                PlacedPiece::new(Color::Dark, PieceKind::Rook, sq(4)),
            ],
            GameCounters::default(),
        )
        .expect_err("two pieces on e1 must be rejected");
        assert_eq!(err, BoardError::SquareOccupied("e1".to_owned()));
    }

    #[test]
    fn layout_rejects_pawn_on_terminal_rank_and_bad_en_passant() {
        let pawn = Board::from_layout(
            [PlacedPiece::new(Color::Dark, PieceKind::Pawn, sq(3))],
            GameCounters::default(),
        );
        assert!(matches!(pawn, Err(BoardError::PawnOnTerminalRank(_))));

        let ep = Board::from_layout(
            [],
            GameCounters {
                en_passant: Some(sq(28)),
                ..GameCounters::default()
            },
        );
        assert!(matches!(ep, Err(BoardError::InvalidEnPassant(_))));
    }

    #[test]
    fn layout_rejects_second_king() {
        let kings = Board::from_layout(
            [
                PlacedPiece::new(Color::Light, PieceKind::King, sq(4)),
                PlacedPiece::new(Color::Light, PieceKind::King, sq(12)),
            ],
            GameCounters::default(),
        );
        assert!(matches!(kings, Err(BoardError::MultipleKings(_))));
    }

    #[test]
    fn layout_hash_matches_full_recompute() {
        let board = Board::starting_position();
        let rebuilt = Board::from_layout(
            board
                .placed_pieces(Color::Light)
                .chain(board.placed_pieces(Color::Dark))
                .collect::<Vec<_>>(),
            *board.counters(),
        )
        .expect("starting layout is valid");
        assert_eq!(rebuilt.position_hash(), board.position_hash());
        assert_eq!(
            board.position_hash(),
            compute_position_hash(
                [
                    board.pieces(Color::Light).masks(),
                    board.pieces(Color::Dark).masks()
                ],
                Color::Light,
                CASTLE_ALL,
                None
            )
        );
    }

    #[test]
    fn hash_ignores_clocks() {
        let king_only = |halfmove_clock, fullmove_number| {
            Board::from_layout(
                [
                    PlacedPiece::new(Color::Light, PieceKind::King, sq(4)),
                    PlacedPiece::new(Color::Dark, PieceKind::King, sq(60)),
                ],
                GameCounters {
                    halfmove_clock,
                    fullmove_number,
                    ..GameCounters::default()
                },
            )
            .expect("kings-only layout is valid")
        };
        assert_eq!(
            king_only(0, 1).position_hash(),
            king_only(37, 80).position_hash()
        );
    }
}
