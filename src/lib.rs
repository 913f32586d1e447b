//! Crate root module declarations for the Vector Chess engine.
//!
//! Exposes the board model, the vector-based move generation, the search
//! and its tables, and the notation and protocol collaborators so the binary,
//! tests and benches can import stable module paths.

pub mod errors;

pub mod game_state {
    pub mod board;
    pub mod chess_rules;
    pub mod chess_types;
}

pub mod moves {
    pub mod move_descriptions;
    pub mod move_vectors;
    pub mod threat_tables;
    pub mod travel_masks;
}

pub mod move_generation {
    pub mod legal_move_apply;
    pub mod legal_move_checks;
    pub mod legal_move_generator;
    pub mod perft;
}

pub mod search {
    pub mod board_scoring;
    pub mod iterative_deepening;
    pub mod search_tables;
    pub mod search_timer;
    pub mod time_management;
    pub mod transposition_table;
    pub mod zobrist;
}

pub mod tables {
    pub mod opening_book;
}

pub mod uci {
    pub mod uci_top;
}

pub mod utils {
    pub mod algebraic;
    pub mod fen_generator;
    pub mod fen_parser;
    pub mod long_algebraic;
}
