//! Pure move application: `Board` in, brand-new `Board` out.
//!
//! The position hash is maintained incrementally alongside the piece sets.

use crate::game_state::board::{Board, GameCounters, PieceSet};
use crate::game_state::chess_rules::*;
use crate::game_state::chess_types::*;
use crate::moves::move_descriptions::{Move, FLAG_CASTLE_KINGSIDE};
use crate::search::zobrist::{castling_key, en_passant_key, piece_square_key, side_to_move_key};

/// Apply a move produced by legal move generation.
///
/// Moves that did not come from the generator are not validated.
#[inline]
pub fn apply_move(board: &Board, mv: &Move) -> Board {
    apply_move_with_capture(board, mv).0
}

/// Apply a move and report the kind of piece it captured, if any.
pub fn apply_move_with_capture(board: &Board, mv: &Move) -> (Board, Option<PieceKind>) {
    let mover = mv.piece().color();
    let enemy = mover.opposite();
    let moved = mv.piece().kind();
    let from = mv.from();
    let to = mv.to();

    let mut sets = board.sets();
    let mut masks = [sets[0].masks(), sets[1].masks()];
    let mut hash = board.position_hash();
    let counters = board.counters();

    let capture_square = if mv.is_en_passant() {
        mv.aux_square().unwrap_or(to)
    } else {
        to
    };
    let captured = sets[enemy.index()].kind_at(capture_square);
    if let Some(kind) = captured {
        masks[enemy.index()][kind.index()] &= !capture_square.mask();
        hash ^= piece_square_key(enemy, kind, capture_square);
    }

    masks[mover.index()][moved.index()] &= !from.mask();
    hash ^= piece_square_key(mover, moved, from);

    let placed = mv.promotion().unwrap_or(moved);
    masks[mover.index()][placed.index()] |= to.mask();
    hash ^= piece_square_key(mover, placed, to);

    if mv.is_castle() {
        let side = if mv.has_flag(FLAG_CASTLE_KINGSIDE) {
            CastleSide::Kingside
        } else {
            CastleSide::Queenside
        };
        let squares = castling_squares(mover, side);
        let rooks = &mut masks[mover.index()][PieceKind::Rook.index()];
        *rooks = (*rooks & !squares.rook_from.mask()) | squares.rook_to.mask();
        hash ^= piece_square_key(mover, PieceKind::Rook, squares.rook_from);
        hash ^= piece_square_key(mover, PieceKind::Rook, squares.rook_to);
    }

    let mut castling_rights = counters.castling_rights;
    if moved == PieceKind::King {
        castling_rights &= !castling_rights_of(mover);
    }
    if moved == PieceKind::Rook {
        castling_rights &= !rook_home_right(from);
    }
    if captured == Some(PieceKind::Rook) {
        castling_rights &= !rook_home_right(capture_square);
    }
    hash ^= castling_key(counters.castling_rights) ^ castling_key(castling_rights);

    let en_passant = if mv.is_double_push() {
        Square::from_file_rank(from.file(), (from.rank() + to.rank()) / 2)
    } else {
        None
    };
    hash ^= en_passant_key(counters.en_passant) ^ en_passant_key(en_passant);
    hash ^= side_to_move_key();

    let halfmove_clock = if moved == PieceKind::Pawn || captured.is_some() {
        0
    } else {
        counters.halfmove_clock.saturating_add(1)
    };
    let fullmove_number = if mover == Color::Dark {
        counters.fullmove_number.saturating_add(1)
    } else {
        counters.fullmove_number
    };

    sets[mover.index()] = PieceSet::from_masks(masks[mover.index()]);
    sets[enemy.index()] = PieceSet::from_masks(masks[enemy.index()]);

    let next = Board::from_successor_parts(
        sets,
        GameCounters {
            active_color: enemy,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        },
        *mv,
        hash,
    );
    (next, captured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::zobrist::compute_position_hash;
    use crate::utils::fen_generator::generate_fen;
    use crate::utils::fen_parser::parse_fen;
    use crate::utils::long_algebraic::parse_long_algebraic;

    fn play(board: &Board, text: &str) -> Board {
        let mv = parse_long_algebraic(text, board).expect("move is legal in test position");
        apply_move(board, &mv)
    }

    fn recomputed_hash(board: &Board) -> u64 {
        compute_position_hash(
            [
                board.pieces(Color::Light).masks(),
                board.pieces(Color::Dark).masks(),
            ],
            board.active_color(),
            board.castling_rights(),
            board.en_passant(),
        )
    }

    #[test]
    fn double_push_sets_en_passant_and_resets_clock() {
        let board = play(&Board::starting_position(), "e2e4");
        assert_eq!(
            generate_fen(&board),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        assert_eq!(
            board.last_move().map(ToString::to_string),
            Some("e2e4".to_owned())
        );
    }

    #[test]
    fn fullmove_increments_after_dark() {
        let board = play(&Board::starting_position(), "g1f3");
        assert_eq!(board.fullmove_number(), 1);
        assert_eq!(board.halfmove_clock(), 1);
        let board = play(&board, "g8f6");
        assert_eq!(board.fullmove_number(), 2);
        assert_eq!(board.halfmove_clock(), 2);
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn en_passant_removes_the_passed_pawn() {
        let board = parse_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").expect("valid FEN");
        let next = play(&board, "e5d6");
        assert_eq!(generate_fen(&next), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 2");
        assert_eq!(next.position_hash(), recomputed_hash(&next));
    }

    #[test]
    fn castling_relocates_rook_and_clears_rights() {
        let board = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 3 10").expect("valid FEN");
        let kingside = play(&board, "e1g1");
        assert_eq!(
            generate_fen(&kingside),
            "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 4 10"
        );
        let queenside = play(&kingside, "e8c8");
        assert_eq!(
            generate_fen(&queenside),
            "2kr3r/8/8/8/8/8/8/R4RK1 w - - 5 11"
        );
        assert_eq!(queenside.position_hash(), recomputed_hash(&queenside));
    }

    #[test]
    fn rook_moves_and_captures_clear_single_rights() {
        let board = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("valid FEN");
        let next = play(&board, "a1a8");
        assert_eq!(
            next.castling_rights(),
            CASTLE_LIGHT_KINGSIDE | CASTLE_DARK_KINGSIDE
        );
        assert_eq!(next.halfmove_clock(), 0);
        assert_eq!(next.position_hash(), recomputed_hash(&next));
    }

    #[test]
    fn promotion_replaces_the_pawn() {
        let board = parse_fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1").expect("valid FEN");
        let next = play(&board, "a7b8n");
        assert_eq!(generate_fen(&next), "1N2k3/8/8/8/8/8/8/4K3 b - - 0 1");
        assert_eq!(next.pieces(Color::Light).count(PieceKind::Pawn), 0);
        assert_eq!(next.position_hash(), recomputed_hash(&next));
    }

    #[test]
    fn incremental_hash_tracks_a_game() {
        let mut board = Board::starting_position();
        let game = [
            "e2e4", "d7d5", "e4d5", "g8f6", "f1b5", "c7c6", "d5c6", "d8a5", "c6b7", "e8d8", "b7a8q",
        ];
        for text in game {
            board = play(&board, text);
            assert_eq!(
                board.position_hash(),
                recomputed_hash(&board),
                "after {text}"
            );
        }
    }
}
