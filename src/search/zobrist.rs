//! Zobrist position keys.
//!
//! Keys come from a fixed-seed splitmix64 stream, so hashes are stable across
//! runs. A hash covers placement, side to move, castling rights and the
//! en-passant file; clocks and the last move are left out, so transpositions
//! hash identically.

use std::sync::OnceLock;

use crate::game_state::chess_types::*;

/// Deterministic key material: one key per (color, kind, square), one per
/// castling-rights mask, one per en-passant file and the side-to-move toggle.
#[derive(Debug)]
struct ZobristKeys {
    placement: [[[u64; 64]; 6]; 2],
    castling: [u64; 16],
    en_passant_file: [u64; 8],
    dark_to_move: u64,
}

const ZOBRIST_SEED: u64 = 0x5EED_C0DE_2468_ACE0;

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

#[inline]
fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(|| {
        let mut stream = SplitMix64(ZOBRIST_SEED);
        ZobristKeys {
            placement: std::array::from_fn(|_| {
                std::array::from_fn(|_| std::array::from_fn(|_| stream.next_key()))
            }),
            castling: std::array::from_fn(|_| stream.next_key()),
            en_passant_file: std::array::from_fn(|_| stream.next_key()),
            dark_to_move: stream.next_key(),
        }
    })
}

struct SplitMix64(u64);

impl SplitMix64 {
    #[inline]
    fn next_key(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

#[inline]
pub fn piece_square_key(color: Color, piece: PieceKind, square: Square) -> u64 {
    keys().placement[color.index()][piece.index()][square.index()]
}

/// Key for a castling-rights mask; only the low four bits are used.
#[inline]
pub fn castling_key(castling_rights: CastlingRights) -> u64 {
    keys().castling[usize::from(castling_rights & CASTLE_ALL)]
}

/// Key for an en-passant target, by file. No target contributes nothing.
#[inline]
pub fn en_passant_key(en_passant: Option<Square>) -> u64 {
    en_passant.map_or(0, |sq| keys().en_passant_file[usize::from(sq.file())])
}

/// Toggled in whenever dark is to move.
#[inline]
pub fn side_to_move_key() -> u64 {
    keys().dark_to_move
}

/// Full key from scratch. Moves update it incrementally instead.
pub fn compute_position_hash(
    pieces: [[u64; 6]; 2],
    active_color: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
) -> u64 {
    let placement = Color::ALL
        .into_iter()
        .flat_map(|color| PieceKind::ALL.into_iter().map(move |kind| (color, kind)))
        .flat_map(|(color, kind)| {
            squares_of(pieces[color.index()][kind.index()])
                .map(move |sq| piece_square_key(color, kind, sq))
        })
        .fold(0u64, |acc, key| acc ^ key);

    let side = if active_color == Color::Dark {
        side_to_move_key()
    } else {
        0
    };
    placement ^ side ^ castling_key(castling_rights) ^ en_passant_key(en_passant)
}
