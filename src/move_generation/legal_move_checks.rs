//! Attack and check inspection.
//!
//! Candidates come from the precomputed threat masks; sliders are then
//! confirmed by testing the travel mask between candidate and target against
//! the board occupancy.

use crate::game_state::board::Board;
use crate::game_state::chess_types::*;
use crate::moves::threat_tables::threats;
use crate::moves::travel_masks::travel_mask;

#[inline]
pub fn king_square(board: &Board, color: Color) -> Option<Square> {
    board.king_square(color)
}

/// Pieces of the opponent of `color` that attack `square`.
///
/// The iterator is lazy: callers that only need to know whether any attacker
/// exists stop after the first hit.
pub fn attackers_of(
    board: &Board,
    square: Square,
    color: Color,
) -> impl Iterator<Item = PlacedPiece> + '_ {
    let attacker = color.opposite();
    let occupancy = board.occupancy();
    let set = board.pieces(attacker);

    PieceKind::ALL.into_iter().flat_map(move |kind| {
        let candidates = set.mask(kind) & threats(attacker, kind, square);
        squares_of(candidates)
            .filter(move |from| {
                !kind.is_slider() || travel_mask(from.index(), square.index()) & occupancy == 0
            })
            .map(move |from| PlacedPiece::new(attacker, kind, from))
    })
}

/// Whether any opponent of `color` attacks `square`.
#[inline]
pub fn is_attacked(board: &Board, square: Square, color: Color) -> bool {
    attackers_of(board, square, color).next().is_some()
}

/// Whether `color`'s king is attacked. A board without that king is never in check.
#[inline]
pub fn is_king_attacked(board: &Board, color: Color) -> bool {
    king_square(board, color).is_some_and(|king| is_attacked(board, king, color))
}

/// Whether the side to move is in check.
#[inline]
pub fn is_in_check(board: &Board) -> bool {
    is_king_attacked(board, board.active_color())
}
