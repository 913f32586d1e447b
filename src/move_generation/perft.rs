//! Move-path enumeration used as a move generator oracle.

use std::thread;

use crate::errors::SearchError;
use crate::game_state::board::Board;
use crate::move_generation::legal_move_generator::{legal_successors, GeneratedMove};
use crate::moves::move_descriptions::Move;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.checkmates += rhs.checkmates;
    }

    fn leaf(generated: &GeneratedMove) -> Self {
        let gives_check = generated.gives_check();
        Self {
            nodes: 1,
            captures: u64::from(generated.is_capture()),
            en_passant: u64::from(generated.mv.is_en_passant()),
            castles: u64::from(generated.mv.is_castle()),
            promotions: u64::from(generated.mv.promotion().is_some()),
            checks: u64::from(gives_check),
            checkmates: u64::from(
                gives_check && legal_successors(&generated.board_after).is_empty(),
            ),
        }
    }
}

/// Leaf count only; the last ply is counted without being expanded.
pub fn perft_nodes(board: &Board, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let successors = legal_successors(board);
    if depth == 1 {
        return successors.len() as u64;
    }
    successors
        .iter()
        .map(|generated| perft_nodes(&generated.board_after, depth - 1))
        .sum()
}

/// Leaf count with per-leaf move statistics.
pub fn perft(board: &Board, depth: u8) -> PerftCounts {
    if depth == 0 {
        return PerftCounts {
            nodes: 1,
            ..PerftCounts::default()
        };
    }
    let mut total = PerftCounts::default();
    for generated in legal_successors(board) {
        perft_recurse(&generated, depth, 1, &mut total);
    }
    total
}

fn perft_recurse(
    generated: &GeneratedMove,
    search_depth: u8,
    current_depth: u8,
    counts: &mut PerftCounts,
) {
    if current_depth == search_depth {
        counts.merge(PerftCounts::leaf(generated));
        return;
    }
    for child in legal_successors(&generated.board_after) {
        perft_recurse(&child, search_depth, current_depth + 1, counts);
    }
}

/// Leaf counts per root move, in generation order.
pub fn perft_divide(board: &Board, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    legal_successors(board)
        .into_iter()
        .map(|generated| (generated.mv, perft_nodes(&generated.board_after, depth - 1)))
        .collect()
}

/// `perft` with one scoped worker per root move.
pub fn perft_multi_threaded(board: &Board, depth: u8) -> Result<PerftCounts, SearchError> {
    if depth == 0 {
        return Ok(perft(board, 0));
    }
    let root_moves = legal_successors(board);

    thread::scope(|scope| {
        let handles: Vec<_> = root_moves
            .iter()
            .map(|generated| {
                scope.spawn(move || {
                    let mut local = PerftCounts::default();
                    perft_recurse(generated, depth, 1, &mut local);
                    local
                })
            })
            .collect();

        let mut total = PerftCounts::default();
        for handle in handles {
            let local = handle
                .join()
                .map_err(|_| SearchError::Panicked("perft worker thread panicked".to_owned()))?;
            total.merge(local);
        }
        Ok(total)
    })
}
