use crate::game_state::board::Board;
use crate::game_state::chess_types::*;

pub fn generate_fen(board: &Board) -> String {
    let side_to_move = match board.active_color() {
        Color::Light => "w",
        Color::Dark => "b",
    };
    let en_passant = board
        .en_passant()
        .map_or_else(|| "-".to_owned(), |square| square.to_string());

    format!(
        "{} {} {} {} {} {}",
        generate_board_field(board),
        side_to_move,
        generate_castling_field(board.castling_rights()),
        en_passant,
        board.halfmove_clock(),
        board.fullmove_number()
    )
}

fn generate_board_field(board: &Board) -> String {
    let mut out = String::with_capacity(64);

    for rank in (0..8u8).rev() {
        let mut empty_count = 0u8;

        for file in 0..8u8 {
            let piece = Square::from_file_rank(file, rank).and_then(|sq| board.piece_at(sq));
            match piece {
                Some(piece) => {
                    if empty_count > 0 {
                        out.push(char::from(b'0' + empty_count));
                        empty_count = 0;
                    }
                    out.push(piece.fen_char());
                }
                None => empty_count += 1,
            }
        }

        if empty_count > 0 {
            out.push(char::from(b'0' + empty_count));
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out
}

fn generate_castling_field(castling_rights: CastlingRights) -> String {
    let out: String = [
        (CASTLE_LIGHT_KINGSIDE, 'K'),
        (CASTLE_LIGHT_QUEENSIDE, 'Q'),
        (CASTLE_DARK_KINGSIDE, 'k'),
        (CASTLE_DARK_QUEENSIDE, 'q'),
    ]
    .into_iter()
    .filter(|(right, _)| castling_rights & right != 0)
    .map(|(_, ch)| ch)
    .collect();

    if out.is_empty() {
        "-".to_owned()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::generate_fen;
    use crate::game_state::board::Board;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::utils::fen_parser::parse_fen;

    #[test]
    fn starting_position_round_trips() {
        assert_eq!(
            generate_fen(&Board::starting_position()),
            STARTING_POSITION_FEN
        );
    }

    #[test]
    fn fields_survive_a_parse() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w Kq c6 0 2",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 12 40",
        ] {
            let board = parse_fen(fen).expect("FEN should parse");
            assert_eq!(generate_fen(&board), fen);
        }
    }

    #[test]
    fn empty_board_uses_placeholders() {
        assert_eq!(generate_fen(&Board::empty()), "8/8/8/8/8/8/8/8 w - - 0 1");
    }
}
