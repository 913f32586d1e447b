//! Fixed-size transposition table keyed by position hash.
//!
//! Slots are addressed by `hash % len`, replaced depth-preferred, and aged by
//! a generation counter that advances once per search.

use crate::moves::move_descriptions::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub key: u64,
    /// Remaining depth the score was searched to.
    pub depth: u8,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TTStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    entry: Option<TTEntry>,
    generation: u8,
}

#[derive(Debug, Clone)]
pub struct TranspositionTable {
    slots: Vec<Slot>,
    generation: u8,
    stats: TTStats,
}

impl TranspositionTable {
    /// Entries this many generations old are overwritten unconditionally.
    const STALE_AGE: u8 = 4;
    /// A shallower entry may still evict a deeper one within this margin.
    const DEPTH_MARGIN: u8 = 2;
    const HASHFULL_SAMPLE: usize = 1000;

    pub fn new_with_mb(size_mb: usize) -> Self {
        let budget = size_mb.max(1).saturating_mul(1 << 20);
        Self::with_entries(budget / std::mem::size_of::<Slot>())
    }

    pub fn with_entries(count: usize) -> Self {
        Self {
            slots: vec![Slot::default(); count.max(1)],
            generation: 0,
            stats: TTStats::default(),
        }
    }

    /// Start a new search: entries written from now on count as current.
    #[inline]
    pub fn new_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.stats = TTStats::default();
    }

    pub fn clear(&mut self) {
        self.slots.fill(Slot::default());
        self.generation = 0;
        self.stats = TTStats::default();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> TTStats {
        self.stats
    }

    #[inline]
    fn slot_index(&self, key: u64) -> usize {
        (key % self.slots.len() as u64) as usize
    }

    /// Look up `key`, refreshing the slot's age on a hit.
    pub fn probe(&mut self, key: u64) -> Option<TTEntry> {
        self.stats.probes += 1;
        let generation = self.generation;
        let idx = self.slot_index(key);
        let slot = &mut self.slots[idx];
        let hit = slot.entry.filter(|e| e.key == key)?;
        slot.generation = generation;
        self.stats.hits += 1;
        Some(hit)
    }

    /// Read an entry without touching statistics or its age.
    #[inline]
    pub fn peek(&self, key: u64) -> Option<TTEntry> {
        let slot = &self.slots[self.slot_index(key)];
        slot.entry.filter(|e| e.key == key)
    }

    pub fn store(&mut self, entry: TTEntry) {
        self.stats.stores += 1;
        let generation = self.generation;
        let idx = self.slot_index(entry.key);
        let slot = &mut self.slots[idx];

        let stored = match slot.entry {
            None => entry,
            Some(old) if old.key == entry.key => {
                if entry.depth < old.depth && entry.bound != Bound::Exact {
                    return;
                }
                TTEntry {
                    best_move: entry.best_move.or(old.best_move),
                    ..entry
                }
            }
            Some(old) => {
                let stale = generation.wrapping_sub(slot.generation) >= Self::STALE_AGE;
                if !stale && entry.depth.saturating_add(Self::DEPTH_MARGIN) < old.depth {
                    return;
                }
                entry
            }
        };
        *slot = Slot {
            entry: Some(stored),
            generation,
        };
    }

    /// Permille of sampled slots written during the current generation.
    pub fn hashfull(&self) -> u32 {
        let sample = &self.slots[..self.slots.len().min(Self::HASHFULL_SAMPLE)];
        let used = sample
            .iter()
            .filter(|slot| slot.entry.is_some() && slot.generation == self.generation)
            .count();
        (used * 1000 / sample.len()) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::{Bound, TTEntry, TranspositionTable};
    use crate::game_state::board::Board;

    fn entry(key: u64, depth: u8, score: i32, bound: Bound) -> TTEntry {
        TTEntry {
            key,
            depth,
            score,
            bound,
            best_move: None,
        }
    }

    #[test]
    fn store_and_probe_round_trip() {
        let mut tt = TranspositionTable::new_with_mb(1);
        let best = Board::starting_position().legal_moves()[0];
        tt.store(TTEntry {
            best_move: Some(best),
            ..entry(123, 5, 42, Bound::Exact)
        });
        let got = tt.probe(123).expect("entry should exist");
        assert_eq!(got.depth, 5);
        assert_eq!(got.score, 42);
        assert_eq!(got.best_move, Some(best));
        assert_eq!(tt.stats().hits, 1);
    }

    #[test]
    fn depth_preferred_replacement() {
        let mut tt = TranspositionTable::new_with_mb(1);
        let key = 555;
        tt.store(entry(key, 2, 1, Bound::Upper));
        tt.store(entry(key, 1, 9, Bound::Lower));
        assert_eq!(tt.probe(key).expect("exists").score, 1);
        tt.store(entry(key, 6, 3, Bound::Lower));
        let got = tt.probe(key).expect("exists");
        assert_eq!(got.depth, 6);
        assert_eq!(got.score, 3);
    }

    #[test]
    fn colliding_keys_share_a_slot() {
        let mut tt = TranspositionTable::with_entries(8);
        tt.store(entry(3, 4, 10, Bound::Exact));
        tt.store(entry(11, 4, 20, Bound::Exact));
        assert!(tt.peek(3).is_none());
        assert_eq!(tt.peek(11).expect("replaced").score, 20);
    }

    #[test]
    fn hashfull_counts_current_generation_only() {
        let mut tt = TranspositionTable::with_entries(10);
        for key in 0..5 {
            tt.store(entry(key, 1, 0, Bound::Exact));
        }
        assert_eq!(tt.hashfull(), 500);
        tt.new_generation();
        assert_eq!(tt.hashfull(), 0);
        tt.clear();
        assert!(tt.peek(1).is_none());
    }
}
