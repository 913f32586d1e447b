//! Per-search move-ordering and draw-detection tables.

use std::collections::HashMap;

use crate::moves::move_descriptions::Move;

pub const MAX_PLY: usize = 64;
const KILLER_SLOTS: usize = 2;

/// Quiet moves that caused a beta cutoff, remembered per ply.
#[derive(Debug, Clone)]
pub struct KillerTable {
    slots: [[Option<Move>; KILLER_SLOTS]; MAX_PLY],
}

impl Default for KillerTable {
    fn default() -> Self {
        Self {
            slots: [[None; KILLER_SLOTS]; MAX_PLY],
        }
    }
}

impl KillerTable {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Record a cutoff move; the newest killer takes the first slot.
    pub fn register(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.slots.get_mut(ply) else {
            return;
        };
        if slot[0] == Some(mv) {
            return;
        }
        slot[1] = slot[0];
        slot[0] = Some(mv);
    }

    #[inline]
    pub fn is_killer(&self, ply: usize, mv: &Move) -> bool {
        self.slots
            .get(ply)
            .is_some_and(|slot| slot.iter().any(|k| k.as_ref() == Some(mv)))
    }
}

/// Occurrence counts of position hashes on the current game and search path.
#[derive(Debug, Clone, Default)]
pub struct RepetitionTable {
    counts: HashMap<u64, u8>,
}

impl RepetitionTable {
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn push(&mut self, hash: u64) {
        *self.counts.entry(hash).or_insert(0) += 1;
    }

    pub fn pop(&mut self, hash: u64) {
        if let Some(count) = self.counts.get_mut(&hash) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&hash);
            }
        }
    }

    #[inline]
    pub fn count(&self, hash: u64) -> u8 {
        self.counts.get(&hash).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::board::Board;

    #[test]
    fn killers_shift_and_ignore_duplicates() {
        let moves = Board::starting_position().legal_moves();
        let mut killers = KillerTable::default();
        killers.register(3, moves[0]);
        killers.register(3, moves[0]);
        killers.register(3, moves[1]);
        assert!(killers.is_killer(3, &moves[0]));
        assert!(killers.is_killer(3, &moves[1]));
        killers.register(3, moves[2]);
        assert!(!killers.is_killer(3, &moves[0]));
        assert!(!killers.is_killer(4, &moves[2]));
        killers.register(MAX_PLY + 5, moves[2]);
        killers.clear();
        assert!(!killers.is_killer(3, &moves[2]));
    }

    #[test]
    fn repetition_counts_follow_push_and_pop() {
        let mut table = RepetitionTable::default();
        table.push(42);
        table.push(42);
        assert_eq!(table.count(42), 2);
        table.pop(42);
        assert_eq!(table.count(42), 1);
        table.pop(42);
        table.pop(42);
        assert_eq!(table.count(42), 0);
    }
}
