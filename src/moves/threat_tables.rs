//! Per (color, piece kind, square) threat masks.
//!
//! `threats(color, kind, target)` is the set of origin squares from which a
//! `color` piece of `kind` could attack `target` on an empty board. The masks
//! are derived from the move vectors themselves: every vector that is allowed
//! to capture marks its origin as a threat to its target. Attacker lookup
//! intersects these with real occupancy and then checks for blockers.

use std::sync::OnceLock;

use crate::game_state::chess_types::*;
use crate::moves::move_descriptions::{FLAG_EN_PASSANT, FLAG_NON_CAPTURE_ONLY};
use crate::moves::move_vectors::move_vectors;

#[derive(Debug)]
pub struct ThreatTable {
    masks: [[[u64; 64]; 6]; 2],
}

static THREATS: OnceLock<ThreatTable> = OnceLock::new();

#[inline]
pub fn threat_table() -> &'static ThreatTable {
    THREATS.get_or_init(ThreatTable::build)
}

/// Origins from which a `color` `kind` threatens `target`.
#[inline]
pub fn threats(color: Color, kind: PieceKind, target: Square) -> u64 {
    threat_table().masks[color.index()][kind.index()][target.index()]
}

impl ThreatTable {
    fn build() -> Self {
        let vectors = move_vectors();
        let mut masks = [[[0u64; 64]; 6]; 2];

        for color in Color::ALL {
            for kind in PieceKind::ALL {
                let piece = Piece::new(color, kind);
                for origin in 0..64 {
                    let from = Square::from_index(origin);
                    for mv in vectors.rays(piece, from).iter().flatten() {
                        // Pushes, castling and en passant never capture on their target.
                        if mv.has_flag(FLAG_NON_CAPTURE_ONLY) || mv.has_flag(FLAG_EN_PASSANT) {
                            continue;
                        }
                        masks[color.index()][kind.index()][mv.to().index()] |= from.mask();
                    }
                }
            }
        }

        Self { masks }
    }
}

#[cfg(test)]
mod tests {
    use super::threats;
    use crate::game_state::chess_types::*;

    fn sq(index: u8) -> Square {
        Square::new(index).expect("test square is on the board")
    }

    #[test]
    fn light_pawn_threats_come_from_below() {
        let e4 = sq(28);
        let d3_f3 = (1u64 << 19) | (1u64 << 21);
        assert_eq!(threats(Color::Light, PieceKind::Pawn, e4), d3_f3);
    }

    #[test]
    fn dark_pawn_threats_come_from_above() {
        let e4 = sq(28);
        let d5_f5 = (1u64 << 35) | (1u64 << 37);
        assert_eq!(threats(Color::Dark, PieceKind::Pawn, e4), d5_f5);
    }

    #[test]
    fn knight_threats_are_symmetric_with_knight_moves() {
        let d4 = sq(27);
        assert_eq!(threats(Color::Light, PieceKind::Knight, d4).count_ones(), 8);
        assert_eq!(
            threats(Color::Dark, PieceKind::Knight, sq(0)).count_ones(),
            2
        );
    }

    #[test]
    fn king_threats_exclude_castling_targets() {
        let g1 = sq(6);
        let e1 = 1u64 << 4;
        assert_eq!(threats(Color::Light, PieceKind::King, g1) & e1, 0);
        assert_eq!(threats(Color::Light, PieceKind::King, g1).count_ones(), 5);
    }

    #[test]
    fn rook_threats_span_rank_and_file() {
        let d4 = sq(27);
        assert_eq!(threats(Color::Dark, PieceKind::Rook, d4).count_ones(), 14);
        assert_eq!(threats(Color::Light, PieceKind::Queen, d4).count_ones(), 27);
    }
}
