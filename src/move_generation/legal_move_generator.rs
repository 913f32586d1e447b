//! Legal move generation by ray walk and simulation.
//!
//! Each piece's precomputed rays are scanned in order. A candidate that
//! passes the occupancy and special-move filters is applied to a scratch
//! board and kept only if the mover's king is not attacked afterwards. This
//! covers pins, discovered checks through en passant, and king steps into
//! attacked squares without any pin bookkeeping.

use crate::game_state::board::Board;
use crate::game_state::chess_rules::{castling_squares, CastleSide};
use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_apply::apply_move_with_capture;
use crate::move_generation::legal_move_checks::{is_attacked, is_in_check, is_king_attacked};
use crate::moves::move_descriptions::{
    Move, FLAG_CAPTURE_ONLY, FLAG_CASTLE_KINGSIDE, FLAG_NON_CAPTURE_ONLY,
};
use crate::moves::move_vectors::move_vectors;

/// A legal move together with the position it produces.
#[derive(Debug, Clone)]
pub struct GeneratedMove {
    pub mv: Move,
    pub board_after: Board,
    pub captured: Option<PieceKind>,
}

impl GeneratedMove {
    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Whether the move leaves the opponent in check.
    #[inline]
    pub fn gives_check(&self) -> bool {
        is_in_check(&self.board_after)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scope {
    All,
    CapturesOnly,
}

/// Every legal move for the side to move, with resulting boards.
pub fn legal_successors(board: &Board) -> Vec<GeneratedMove> {
    collect_for_side(board, Scope::All)
}

/// Legal captures (including en passant) for the side to move.
pub fn legal_captures(board: &Board) -> Vec<GeneratedMove> {
    collect_for_side(board, Scope::CapturesOnly)
}

pub fn legal_moves(board: &Board) -> Vec<Move> {
    legal_successors(board).into_iter().map(|g| g.mv).collect()
}

/// Legal moves of one piece. Empty unless the piece stands on its square and
/// belongs to the side to move.
pub fn legal_moves_for_piece(board: &Board, placed: PlacedPiece) -> Vec<Move> {
    let present = board.piece_at(placed.square) == Some(placed.piece);
    if !present || placed.piece.color() != board.active_color() {
        return Vec::new();
    }
    let mut out = Vec::new();
    walk_piece(board, placed, Scope::All, &mut out);
    out.into_iter().map(|g| g.mv).collect()
}

fn collect_for_side(board: &Board, scope: Scope) -> Vec<GeneratedMove> {
    let mut out = Vec::with_capacity(48);
    for placed in board.placed_pieces(board.active_color()) {
        walk_piece(board, placed, scope, &mut out);
    }
    out
}

fn walk_piece(board: &Board, placed: PlacedPiece, scope: Scope, out: &mut Vec<GeneratedMove>) {
    let mover = placed.piece.color();
    let friendly = board.pieces(mover).union();
    let enemy = board.pieces(mover.opposite()).union();

    for ray in move_vectors().rays(placed.piece, placed.square) {
        for mv in ray {
            let target = mv.to().mask();
            if friendly & target != 0 {
                break;
            }
            let occupied = enemy & target != 0;

            if mv.is_castle() {
                if scope == Scope::All && castle_allowed(board, mv) {
                    push_if_legal(board, mv, out);
                }
                continue;
            }

            if mv.is_en_passant() {
                if en_passant_allowed(board, mv) {
                    push_if_legal(board, mv, out);
                }
                continue;
            }

            if mv.has_flag(FLAG_CAPTURE_ONLY) && !occupied {
                continue;
            }
            if mv.has_flag(FLAG_NON_CAPTURE_ONLY) && occupied {
                break;
            }

            if scope == Scope::All || occupied {
                push_if_legal(board, mv, out);
            }

            // The first occupied square ends the ray whether or not the move survived.
            if occupied {
                break;
            }
        }
    }
}

fn push_if_legal(board: &Board, mv: &Move, out: &mut Vec<GeneratedMove>) {
    let (board_after, captured) = apply_move_with_capture(board, mv);
    if !is_king_attacked(&board_after, mv.piece().color()) {
        out.push(GeneratedMove {
            mv: *mv,
            board_after,
            captured,
        });
    }
}

fn castle_allowed(board: &Board, mv: &Move) -> bool {
    let color = mv.piece().color();
    let side = if mv.has_flag(FLAG_CASTLE_KINGSIDE) {
        CastleSide::Kingside
    } else {
        CastleSide::Queenside
    };
    let squares = castling_squares(color, side);

    if !board.has_castling_right(squares.right) {
        return false;
    }
    if board.pieces(color).mask(PieceKind::Rook) & squares.rook_from.mask() == 0 {
        return false;
    }
    if board.occupancy() & mv.aux_mask() != 0 {
        return false;
    }
    let transit = mv.aux_square().unwrap_or(squares.transit);
    [mv.from(), transit, mv.to()]
        .into_iter()
        .all(|square| !is_attacked(board, square, color))
}

fn en_passant_allowed(board: &Board, mv: &Move) -> bool {
    if board.en_passant() != Some(mv.to()) {
        return false;
    }
    let enemy_pawns = board
        .pieces(mv.piece().color().opposite())
        .mask(PieceKind::Pawn);
    mv.aux_square()
        .is_some_and(|victim| enemy_pawns & victim.mask() != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fen_parser::parse_fen;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    fn sq(text: &str) -> Square {
        text.parse().expect("valid test square")
    }

    fn texts(moves: &[Move]) -> Vec<String> {
        let mut out: Vec<String> = moves.iter().map(ToString::to_string).collect();
        out.sort();
        out
    }

    #[test]
    fn starting_position_has_sixteen_pawn_and_four_knight_moves() {
        let board = Board::starting_position();
        let moves = legal_moves(&board);
        assert_eq!(moves.len(), 20);
        let pawns = moves
            .iter()
            .filter(|m| m.piece().is_kind(PieceKind::Pawn))
            .count();
        let knights = moves
            .iter()
            .filter(|m| m.piece().is_kind(PieceKind::Knight))
            .count();
        assert_eq!((pawns, knights), (16, 4));
    }

    #[test]
    fn castling_through_attacked_transit_is_rejected() {
        // The dark rook on f8 covers f1.
        let board = parse_fen("4kr2/8/8/8/8/8/8/4K2R w K - 0 1").expect("valid FEN");
        assert!(legal_moves(&board).iter().all(|m| !m.is_castle()));

        let open = parse_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").expect("valid FEN");
        assert!(legal_moves(&open).iter().any(|m| m.to_string() == "e1g1"));
    }

    #[test]
    fn castling_out_of_check_or_without_rook_is_rejected() {
        let in_check = parse_fen("4r1k1/8/8/8/8/8/8/4K2R w K - 0 1").expect("valid FEN");
        assert!(legal_moves(&in_check).iter().all(|m| !m.is_castle()));

        let no_rook = parse_fen("4k3/8/8/8/8/8/8/4K3 w K - 0 1").expect("valid FEN");
        assert!(legal_moves(&no_rook).iter().all(|m| !m.is_castle()));
    }

    #[test]
    fn queenside_castle_needs_the_b_file_square_empty() {
        let blocked = parse_fen("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1").expect("valid FEN");
        assert!(legal_moves(&blocked).iter().all(|m| !m.is_castle()));
        // b1 itself may be attacked; only the king's path matters.
        let attacked_b1 = parse_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").expect("valid FEN");
        let moves = legal_moves(&attacked_b1);
        assert!(moves.iter().any(|m| m.to_string() == "e1c1"));
    }

    #[test]
    fn blocked_pawn_has_no_double_push() {
        let board = parse_fen("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1").expect("valid FEN");
        let pawn_moves = legal_moves_for_piece(
            &board,
            PlacedPiece::new(Color::Light, PieceKind::Pawn, sq("e2")),
        );
        assert!(pawn_moves.is_empty());

        let far_block = parse_fen("4k3/8/8/8/4n3/8/4P3/4K3 w - - 0 1").expect("valid FEN");
        let pawn_moves = legal_moves_for_piece(
            &far_block,
            PlacedPiece::new(Color::Light, PieceKind::Pawn, sq("e2")),
        );
        assert_eq!(texts(&pawn_moves), ["e2e3"]);
    }

    #[test]
    fn en_passant_exposing_the_king_is_rejected() {
        // Capturing d5xe6 would clear the fifth rank between the rook and the king.
        let board = parse_fen("8/8/8/r2Pp2K/8/8/8/4k3 w - e6 0 2").expect("valid FEN");
        assert!(legal_moves(&board).iter().all(|m| !m.is_en_passant()));

        let safe = parse_fen("8/8/8/3Pp3/8/8/8/K3k3 w - e6 0 2").expect("valid FEN");
        assert!(legal_moves(&safe).iter().any(|m| m.is_en_passant()));
    }

    #[test]
    fn pinned_piece_moves_only_along_the_pin() {
        let board = parse_fen("4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1").expect("valid FEN");
        let rook_moves = legal_moves_for_piece(
            &board,
            PlacedPiece::new(Color::Light, PieceKind::Rook, sq("e2")),
        );
        assert_eq!(
            texts(&rook_moves),
            ["e2e3", "e2e4", "e2e5", "e2e6", "e2e7", "e2e8"]
        );
    }

    #[test]
    fn no_legal_move_leaves_own_king_attacked() {
        let board = parse_fen(KIWIPETE).expect("valid FEN");
        let successors = legal_successors(&board);
        assert_eq!(successors.len(), 48);
        for generated in &successors {
            assert!(!is_king_attacked(&generated.board_after, Color::Light));
        }
    }

    #[test]
    fn captures_only_filter_matches_full_generation() {
        let board = parse_fen(KIWIPETE).expect("valid FEN");
        let mut from_full: Vec<String> = legal_successors(&board)
            .into_iter()
            .filter(GeneratedMove::is_capture)
            .map(|g| g.mv.to_string())
            .collect();
        let mut captures: Vec<String> = legal_captures(&board)
            .into_iter()
            .map(|g| g.mv.to_string())
            .collect();
        from_full.sort();
        captures.sort();
        assert_eq!(captures, from_full);
        assert_eq!(captures.len(), 8);
    }

    #[test]
    fn foreign_piece_has_no_moves() {
        let board = Board::starting_position();
        let dark_knight = PlacedPiece::new(Color::Dark, PieceKind::Knight, sq("g8"));
        assert!(legal_moves_for_piece(&board, dark_knight).is_empty());
        let ghost = PlacedPiece::new(Color::Light, PieceKind::Queen, sq("e4"));
        assert!(legal_moves_for_piece(&board, ghost).is_empty());
    }
}
