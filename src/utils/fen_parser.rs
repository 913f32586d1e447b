//! FEN-to-Board parser.
//!
//! Parses the six Forsyth-Edwards fields into a piece layout plus game
//! counters and hands them to the validating `Board` constructor. The two
//! clock fields may be omitted, as in EPD records.

use crate::errors::{NotationError, NotationResult};
use crate::game_state::board::{Board, GameCounters};
use crate::game_state::chess_types::*;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> NotationResult<Board> {
    let invalid = |what: &str| NotationError::InvalidFen(format!("{what} in '{fen}'"));
    let mut parts = fen.split_whitespace();

    let mut required = |what: &str| parts.next().ok_or_else(|| invalid(what));
    let board_part = required("missing board layout")?;
    let side_part = required("missing side to move")?;
    let castling_part = required("missing castling rights")?;
    let en_passant_part = required("missing en-passant square")?;
    let halfmove_part = parts.next().unwrap_or("0");
    let fullmove_part = parts.next().unwrap_or("1");
    if parts.next().is_some() {
        return Err(invalid("extra trailing fields"));
    }

    let pieces = parse_board(board_part)?;
    let counters = GameCounters {
        active_color: parse_side_to_move(side_part)?,
        castling_rights: parse_castling_rights(castling_part)?,
        en_passant: parse_en_passant_square(en_passant_part)?,
        halfmove_clock: halfmove_part
            .parse::<u16>()
            .map_err(|_| invalid("invalid halfmove clock"))?,
        fullmove_number: fullmove_part
            .parse::<u16>()
            .map_err(|_| invalid("invalid fullmove number"))?
            .max(1),
    };

    Ok(Board::from_layout(pieces, counters)?)
}

fn parse_board(board_part: &str) -> NotationResult<Vec<PlacedPiece>> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(NotationError::InvalidFen(format!(
            "board layout must contain 8 ranks: '{board_part}'"
        )));
    }

    let mut pieces = Vec::with_capacity(32);
    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank_idx as u8;
        let mut file = 0u8;

        for ch in rank_str.chars() {
            if let Some(empty) = ch.to_digit(10) {
                if !(1..=8).contains(&empty) {
                    return Err(NotationError::InvalidFen(format!(
                        "invalid empty-square count '{ch}'"
                    )));
                }
                file += empty as u8;
                continue;
            }

            let (color, kind) = piece_from_fen_char(ch).ok_or_else(|| {
                NotationError::InvalidFen(format!("invalid piece character '{ch}'"))
            })?;
            let square = Square::from_file_rank(file, rank).ok_or_else(|| {
                NotationError::InvalidFen(format!("rank '{rank_str}' has too many files"))
            })?;
            pieces.push(PlacedPiece::new(color, kind, square));
            file += 1;
        }

        if file != 8 {
            return Err(NotationError::InvalidFen(format!(
                "rank '{rank_str}' does not sum to 8 files"
            )));
        }
    }

    Ok(pieces)
}

fn parse_side_to_move(side_part: &str) -> NotationResult<Color> {
    match side_part {
        "w" => Ok(Color::Light),
        "b" => Ok(Color::Dark),
        _ => Err(NotationError::InvalidFen(format!("invalid side to move '{side_part}'"))),
    }
}

fn parse_castling_rights(castling_part: &str) -> NotationResult<CastlingRights> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        rights |= match ch {
            'K' => CASTLE_LIGHT_KINGSIDE,
            'Q' => CASTLE_LIGHT_QUEENSIDE,
            'k' => CASTLE_DARK_KINGSIDE,
            'q' => CASTLE_DARK_QUEENSIDE,
            _ => {
                return Err(NotationError::InvalidFen(format!(
                    "invalid castling rights character '{ch}'"
                )))
            }
        };
    }
    Ok(rights)
}

fn parse_en_passant_square(en_passant_part: &str) -> NotationResult<Option<Square>> {
    if en_passant_part == "-" {
        return Ok(None);
    }
    Ok(Some(algebraic_to_square(en_passant_part)?))
}

fn piece_from_fen_char(ch: char) -> Option<(Color, PieceKind)> {
    let color = if ch.is_ascii_uppercase() {
        Color::Light
    } else {
        Color::Dark
    };
    let lower = ch.to_ascii_lowercase();
    PieceKind::ALL
        .into_iter()
        .find(|kind| kind.fen_char() == lower)
        .map(|kind| (color, kind))
}
