//! Move budgeting and the depth-time model.
//!
//! The front-end passes raw clock data; `allocate_budget_ms` turns it into a
//! per-move budget. During a search, `DepthTimeModel` fits
//! `time ≈ a·e^(b·depth)` to the completed iterations and predicts whether the
//! next depth fits in what is left of the budget.

use std::time::Duration;

use crate::game_state::board::Board;
use crate::game_state::chess_types::Color;

/// Budget used for `go infinite`; only an explicit stop ends such a search.
pub const INFINITE_BUDGET_MS: u64 = 24 * 60 * 60 * 1000;

/// Budget used when `go` carries no clock information at all.
pub const DEFAULT_BUDGET_MS: u64 = 1_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u8>,
    pub movetime_ms: Option<u64>,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub movestogo: Option<u16>,
    pub infinite: bool,
}

/// Milliseconds to spend on the move for the side to move on `board`.
pub fn allocate_budget_ms(board: &Board, params: &GoParams) -> u64 {
    if params.infinite {
        return INFINITE_BUDGET_MS;
    }
    if let Some(movetime) = params.movetime_ms {
        return movetime.max(1);
    }

    let (remaining, increment) = match board.active_color() {
        Color::Light => (params.wtime_ms, params.winc_ms),
        Color::Dark => (params.btime_ms, params.binc_ms),
    };
    match remaining {
        Some(remaining) => clock_budget_ms(board, remaining, increment, params.movestogo),
        // Depth-limited searches still need a timer; give them room.
        None if params.depth.is_some() => INFINITE_BUDGET_MS,
        None => DEFAULT_BUDGET_MS,
    }
}

fn clock_budget_ms(
    board: &Board,
    remaining_ms: u64,
    inc_ms: Option<u64>,
    movestogo: Option<u16>,
) -> u64 {
    let ply = u64::from(board.fullmove_number().saturating_sub(1)) * 2
        + u64::from(board.active_color() == Color::Dark);
    let expected_moves_left = if let Some(mtg) = movestogo {
        u64::from(mtg.max(1))
    } else if ply < 20 {
        40
    } else if ply < 60 {
        28
    } else {
        18
    };

    let reserve = (remaining_ms / 25)
        .max(100)
        .min(remaining_ms.saturating_sub(1));
    let usable = remaining_ms.saturating_sub(reserve);
    let base = usable / expected_moves_left;
    let inc_bonus = inc_ms.unwrap_or(0).saturating_mul(3) / 4;
    let target = base.saturating_add(inc_bonus);

    let min_budget = if remaining_ms < 1_000 { 5 } else { 15 };
    let max_budget = (remaining_ms / 4).max(1);
    target.max(min_budget).min(max_budget)
}

/// Exponential fit of iteration time against depth.
#[derive(Debug, Clone, Default)]
pub struct DepthTimeModel {
    samples: Vec<(u8, f64)>,
}

impl DepthTimeModel {
    const WINDOW: usize = 6;
    // Sub-millisecond timings are noise; flooring keeps the logarithm tame.
    const FLOOR_MS: f64 = 1.0;

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Record the wall time spent on one completed depth.
    pub fn record(&mut self, depth: u8, elapsed: Duration) {
        let ms = (elapsed.as_secs_f64() * 1000.0).max(Self::FLOOR_MS);
        self.samples.push((depth, ms));
        if self.samples.len() > Self::WINDOW {
            self.samples.remove(0);
        }
    }

    /// Predicted time for `depth`, or `None` with fewer than two samples.
    pub fn predict(&self, depth: u8) -> Option<Duration> {
        if self.samples.len() < 2 {
            return None;
        }
        let n = self.samples.len() as f64;
        let mean_x = self.samples.iter().map(|&(d, _)| f64::from(d)).sum::<f64>() / n;
        let mean_y = self.samples.iter().map(|&(_, t)| t.ln()).sum::<f64>() / n;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for &(d, t) in &self.samples {
            let dx = f64::from(d) - mean_x;
            sxy += dx * (t.ln() - mean_y);
            sxx += dx * dx;
        }
        if sxx == 0.0 {
            return None;
        }
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let predicted = (intercept + slope * f64::from(depth)).exp();

        // A deeper iteration never costs less than the last one did.
        let last = self.samples.last().map_or(0.0, |&(_, t)| t);
        let ms = predicted.max(last);
        Duration::try_from_secs_f64(ms / 1000.0).ok()
    }

    /// Whether `depth` is expected to finish inside `budget` given `elapsed`.
    ///
    /// Without a usable fit the answer is yes; the timer still bounds the search.
    pub fn next_depth_fits(&self, depth: u8, elapsed: Duration, budget: Duration) -> bool {
        match self.predict(depth) {
            Some(predicted) => elapsed.saturating_add(predicted) <= budget,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fen_parser::parse_fen;

    #[test]
    fn movetime_and_infinite_win_over_clocks() {
        let board = Board::starting_position();
        let fixed = GoParams {
            movetime_ms: Some(250),
            wtime_ms: Some(60_000),
            ..GoParams::default()
        };
        assert_eq!(allocate_budget_ms(&board, &fixed), 250);
        let infinite = GoParams {
            infinite: true,
            ..GoParams::default()
        };
        assert_eq!(allocate_budget_ms(&board, &infinite), INFINITE_BUDGET_MS);
        assert_eq!(
            allocate_budget_ms(&board, &GoParams::default()),
            DEFAULT_BUDGET_MS
        );
    }

    #[test]
    fn clock_budget_uses_the_side_to_move() {
        let board = parse_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 40").expect("valid FEN");
        let params = GoParams {
            wtime_ms: Some(1_000),
            btime_ms: Some(60_000),
            binc_ms: Some(1_000),
            ..GoParams::default()
        };
        let budget = allocate_budget_ms(&board, &params);
        // 57_600 usable over 18 moves plus 750 of increment.
        assert_eq!(budget, 57_600 / 18 + 750);
    }

    #[test]
    fn tiny_clocks_never_panic_and_stay_below_a_quarter() {
        let board = Board::starting_position();
        for remaining in [0, 1, 7, 50, 120, 999] {
            let params = GoParams {
                wtime_ms: Some(remaining),
                ..GoParams::default()
            };
            let budget = allocate_budget_ms(&board, &params);
            assert!(budget >= 1);
            assert!(budget <= (remaining / 4).max(1));
        }
    }

    #[test]
    fn model_extrapolates_exponential_growth() {
        let mut model = DepthTimeModel::default();
        assert!(model.predict(2).is_none());
        model.record(1, Duration::from_millis(10));
        model.record(2, Duration::from_millis(40));
        model.record(3, Duration::from_millis(160));
        let predicted = model.predict(4).expect("three samples fit");
        let ms = predicted.as_secs_f64() * 1000.0;
        assert!((ms - 640.0).abs() < 1.0, "predicted {ms}");

        let budget = Duration::from_millis(700);
        assert!(!model.next_depth_fits(4, Duration::from_millis(210), budget));
        assert!(model.next_depth_fits(4, Duration::from_millis(50), budget));
    }

    #[test]
    fn model_without_fit_allows_the_next_depth() {
        let mut model = DepthTimeModel::default();
        model.record(1, Duration::from_millis(900));
        assert!(model.next_depth_fits(2, Duration::from_millis(900), Duration::from_millis(1000)));
        model.clear();
        assert!(model.predict(5).is_none());
    }
}
