//! Precomputed move vectors for every (piece kind, color, square).
//!
//! Each entry is a list of rays. A ray is an ordered run of candidate moves
//! that a consumer scans until the first occupied target: sliders get one ray
//! per direction, leapers get a one-move ray per destination, and pawns get a
//! push ray plus one ray per capture or promotion choice. The tables ignore
//! occupancy entirely; legality is decided by the generator.

use std::sync::OnceLock;

use crate::game_state::chess_rules::*;
use crate::game_state::chess_types::*;
use crate::moves::move_descriptions::*;

pub type Ray = Vec<Move>;

pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

pub const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

#[derive(Debug)]
pub struct MoveVectorTable {
    // Indexed by `(color * 6 + kind) * 64 + square`.
    entries: Vec<Vec<Ray>>,
}

static VECTORS: OnceLock<MoveVectorTable> = OnceLock::new();

/// The process-wide table, built on first use and read-only afterwards.
#[inline]
pub fn move_vectors() -> &'static MoveVectorTable {
    VECTORS.get_or_init(MoveVectorTable::build)
}

impl MoveVectorTable {
    #[inline]
    pub fn rays(&self, piece: Piece, square: Square) -> &[Ray] {
        &self.entries[slot(piece.color(), piece.kind(), square)]
    }

    fn build() -> Self {
        let mut entries = vec![Vec::new(); 2 * 6 * 64];

        for color in Color::ALL {
            for kind in PieceKind::ALL {
                for index in 0..64 {
                    let square = Square::from_index(index);
                    let piece = Piece::new(color, kind);
                    entries[slot(color, kind, square)] = match kind {
                        PieceKind::Pawn => pawn_rays(piece, square),
                        PieceKind::Knight => leaper_rays(piece, square, &KNIGHT_OFFSETS),
                        PieceKind::Bishop => slider_rays(piece, square, &BISHOP_DIRECTIONS),
                        PieceKind::Rook => slider_rays(piece, square, &ROOK_DIRECTIONS),
                        PieceKind::Queen => {
                            let mut rays = slider_rays(piece, square, &ROOK_DIRECTIONS);
                            rays.extend(slider_rays(piece, square, &BISHOP_DIRECTIONS));
                            rays
                        }
                        PieceKind::King => {
                            let mut rays = leaper_rays(piece, square, &KING_OFFSETS);
                            rays.extend(castling_rays(piece, square));
                            rays
                        }
                    };
                }
            }
        }

        Self { entries }
    }
}

#[inline]
fn slot(color: Color, kind: PieceKind, square: Square) -> usize {
    (color.index() * 6 + kind.index()) * 64 + square.index()
}

fn leaper_rays(piece: Piece, from: Square, offsets: &[(i8, i8)]) -> Vec<Ray> {
    offsets
        .iter()
        .filter_map(|&(df, dr)| from.offset(df, dr))
        .map(|to| vec![Move::new(piece, from, to, 0)])
        .collect()
}

fn slider_rays(piece: Piece, from: Square, directions: &[(i8, i8)]) -> Vec<Ray> {
    let mut rays = Vec::with_capacity(directions.len());
    for &(df, dr) in directions {
        let mut ray = Vec::new();
        let mut cursor = from.offset(df, dr);
        while let Some(to) = cursor {
            ray.push(Move::new(piece, from, to, 0));
            cursor = to.offset(df, dr);
        }
        if !ray.is_empty() {
            rays.push(ray);
        }
    }
    rays
}

fn pawn_rays(piece: Piece, from: Square) -> Vec<Ray> {
    let color = piece.color();
    // Terminal ranks never hold a pawn to move.
    if from.rank() == 0 || from.rank() == 7 {
        return Vec::new();
    }

    let forward = pawn_direction(color);
    let mut rays = Vec::new();

    if let Some(one) = from.offset(0, forward) {
        if one.rank() == promotion_rank(color) {
            for kind in PROMOTION_KINDS {
                rays.push(vec![
                    Move::new(piece, from, one, FLAG_NON_CAPTURE_ONLY).with_promotion(kind)
                ]);
            }
        } else {
            let mut push = vec![Move::new(piece, from, one, FLAG_NON_CAPTURE_ONLY)];
            if from.rank() == pawn_start_rank(color) {
                if let Some(two) = one.offset(0, forward) {
                    push.push(Move::new(piece, from, two, FLAG_NON_CAPTURE_ONLY));
                }
            }
            rays.push(push);
        }
    }

    for side in [-1i8, 1i8] {
        let Some(target) = from.offset(side, forward) else {
            continue;
        };
        if target.rank() == promotion_rank(color) {
            for kind in PROMOTION_KINDS {
                rays.push(vec![
                    Move::new(piece, from, target, FLAG_CAPTURE_ONLY).with_promotion(kind)
                ]);
            }
        } else {
            rays.push(vec![Move::new(piece, from, target, FLAG_CAPTURE_ONLY)]);
        }

        if from.rank() == en_passant_rank(color) {
            if let Some(victim) = from.offset(side, 0) {
                rays.push(vec![
                    Move::new(piece, from, target, FLAG_EN_PASSANT).with_aux(victim, victim.mask())
                ]);
            }
        }
    }

    rays
}

fn castling_rays(piece: Piece, from: Square) -> Vec<Ray> {
    let mut rays = Vec::new();
    for (side, flag) in [
        (CastleSide::Kingside, FLAG_CASTLE_KINGSIDE),
        (CastleSide::Queenside, FLAG_CASTLE_QUEENSIDE),
    ] {
        let squares = castling_squares(piece.color(), side);
        if squares.king_from == from {
            rays.push(vec![Move::new(
                piece,
                from,
                squares.king_to,
                flag | FLAG_NON_CAPTURE_ONLY,
            )
            .with_aux(squares.transit, squares.empty_mask)]);
        }
    }
    rays
}
