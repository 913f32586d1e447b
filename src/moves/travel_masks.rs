//! Between-squares masks for every (origin, destination) pair.
//!
//! `TRAVEL_MASKS[a][b]` holds the squares strictly between `a` and `b` when
//! they share a rank, file or diagonal, and zero otherwise. A sliding attack
//! from `a` to `b` is blocked iff this mask intersects the occupancy.

pub static TRAVEL_MASKS: [[u64; 64]; 64] = generate_travel_masks();

#[inline]
pub fn travel_mask(from: usize, to: usize) -> u64 {
    TRAVEL_MASKS[from][to]
}

const fn generate_travel_masks() -> [[u64; 64]; 64] {
    let mut table = [[0u64; 64]; 64];
    let mut from = 0usize;

    while from < 64 {
        let mut to = 0usize;
        while to < 64 {
            table[from][to] = between(from as i32, to as i32);
            to += 1;
        }
        from += 1;
    }

    table
}

const fn between(from: i32, to: i32) -> u64 {
    let file_delta = (to % 8) - (from % 8);
    let rank_delta = (to / 8) - (from / 8);

    let aligned = file_delta == 0
        || rank_delta == 0
        || file_delta == rank_delta
        || file_delta == -rank_delta;
    if from == to || !aligned {
        return 0;
    }

    let file_step = signum(file_delta);
    let rank_step = signum(rank_delta);
    let mut file = (from % 8) + file_step;
    let mut rank = (from / 8) + rank_step;
    let mut mask = 0u64;

    while file != to % 8 || rank != to / 8 {
        mask |= 1u64 << (rank * 8 + file);
        file += file_step;
        rank += rank_step;
    }

    mask
}

const fn signum(value: i32) -> i32 {
    if value > 0 {
        1
    } else if value < 0 {
        -1
    } else {
        0
    }
}
