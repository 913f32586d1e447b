//! Opening-book support with TSV import compatible with public opening datasets.
//!
//! Opening lines are replayed from the starting position and every position
//! along them is indexed by its hash, so lookups work whatever move order led
//! to the position.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::Rng;
use tracing::warn;

use crate::errors::{NotationError, NotationResult};
use crate::game_state::board::Board;
use crate::moves::move_descriptions::Move;
use crate::utils::long_algebraic::parse_long_algebraic;

const EMBEDDED_TSV: &str = include_str!("data/opening_book.tsv");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookMove {
    pub mv: Move,
    pub weight: u32,
}

#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    by_hash: HashMap<u64, Vec<BookMove>>,
}

impl OpeningBook {
    /// The small table compiled into the binary. A table that fails to
    /// parse is logged and replaced by an empty book.
    pub fn embedded() -> Self {
        Self::from_tsv_str(EMBEDDED_TSV).unwrap_or_else(|err| {
            warn!(%err, "embedded opening book is unusable; continuing without it");
            Self::default()
        })
    }

    pub fn from_tsv_path(path: impl AsRef<Path>) -> NotationResult<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            NotationError::InvalidBook(format!("failed reading {}: {e}", path.display()))
        })?;
        Self::from_tsv_str(&data)
    }

    /// Parse a TSV with a `uci` (or `moves`) column of space-separated long
    /// algebraic moves and an optional `weight`/`count`/`plays` column.
    pub fn from_tsv_str(tsv: &str) -> NotationResult<Self> {
        let mut lines = tsv.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| NotationError::InvalidBook("opening TSV is empty".to_owned()))?;

        let mut uci_idx = None;
        let mut moves_idx = None;
        let mut weight_idx = None;
        for (i, name) in header.split('\t').enumerate() {
            match name.trim().to_ascii_lowercase().as_str() {
                "uci" => uci_idx = Some(i),
                "moves" => moves_idx = Some(i),
                "weight" | "count" | "plays" => weight_idx = Some(i),
                _ => {}
            }
        }
        let sequence_idx = uci_idx.or(moves_idx).ok_or_else(|| {
            NotationError::InvalidBook("opening TSV needs a 'uci' or 'moves' column".to_owned())
        })?;

        let mut weights: HashMap<u64, Vec<BookMove>> = HashMap::new();

        for line in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            let sequence = fields
                .get(sequence_idx)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    NotationError::InvalidBook(format!("missing moves in row '{line}'"))
                })?;
            let row_weight = weight_idx
                .and_then(|idx| fields.get(idx))
                .and_then(|w| w.trim().parse::<u32>().ok())
                .unwrap_or(1)
                .max(1);

            let mut board = Board::starting_position();
            for token in sequence.split_whitespace() {
                let mv = parse_long_algebraic(token, &board).map_err(|e| {
                    NotationError::InvalidBook(format!("move '{token}' in row '{line}': {e}"))
                })?;
                let row = weights.entry(board.position_hash()).or_default();
                match row.iter_mut().find(|known| known.mv == mv) {
                    Some(known) => known.weight = known.weight.saturating_add(row_weight),
                    None => row.push(BookMove {
                        mv,
                        weight: row_weight,
                    }),
                }
                board = board.apply_move(&mv);
            }
        }

        Ok(Self { by_hash: weights })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Known moves for a position hash; empty when the position is unknown.
    pub fn moves_for(&self, position_hash: u64) -> &[BookMove] {
        self.by_hash
            .get(&position_hash)
            .map_or(&[], |row| row.as_slice())
    }

    pub fn choose_weighted_move<R: Rng + ?Sized>(
        &self,
        position_hash: u64,
        rng: &mut R,
    ) -> Option<Move> {
        let moves = self.moves_for(position_hash);
        let first = moves.first()?;

        let total_weight: u64 = moves.iter().map(|m| u64::from(m.weight)).sum();
        if total_weight == 0 {
            return Some(first.mv);
        }

        let mut pick = rng.random_range(0..total_weight);
        for m in moves {
            let w = u64::from(m.weight);
            if pick < w {
                return Some(m.mv);
            }
            pick -= w;
        }

        Some(first.mv)
    }
}
