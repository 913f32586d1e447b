//! Iterative deepening search with negamax alpha-beta pruning.
//!
//! One `SearchEngine` owns the transposition, killer and repetition tables
//! and reuses them across searches; every search advances the table
//! generation and clears the per-search state before its first iteration.
//! Cancellation is cooperative: a timer thread flips the engine's stop flag
//! and the recursion unwinds with neutral scores that the driver discards.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::errors::SearchError;
use crate::game_state::board::Board;
use crate::game_state::chess_rules::FIFTY_MOVE_HALFMOVES;
use crate::move_generation::legal_move_generator::{
    legal_captures, legal_successors, GeneratedMove,
};
use crate::moves::move_descriptions::Move;
use crate::search::board_scoring::*;
use crate::search::search_tables::{KillerTable, RepetitionTable};
use crate::search::search_timer::{SearchTimer, StopHandle};
use crate::search::time_management::DepthTimeModel;
use crate::search::transposition_table::{Bound, TTEntry, TranspositionTable};
use crate::tables::opening_book::OpeningBook;

pub const MAX_DEPTH_CEILING: u8 = 64;
const INFINITY: i32 = MATE_SCORE + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub max_depth: u8,
    pub hash_mb: usize,
    pub own_book: bool,
    pub quiescence_max_ply: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            hash_mb: 16,
            own_book: true,
            quiescence_max_ply: 12,
        }
    }
}

/// Receives protocol progress lines and failure reports from a search.
pub trait InfoSink {
    fn info(&mut self, line: &str);
    fn exception(&mut self, message: &str);
}

impl InfoSink for Vec<String> {
    fn info(&mut self, line: &str) {
        self.push(line.to_owned());
    }

    fn exception(&mut self, message: &str) {
        self.push(format!("info string error {message}"));
    }
}

/// Writes each line to an `io::Write` in a single call, ignoring write
/// failures.
#[derive(Debug)]
pub struct WriterSink<W: Write>(pub W);

impl<W: Write> InfoSink for WriterSink<W> {
    fn info(&mut self, line: &str) {
        let text = format!("{line}\n");
        let _ = self.0.write_all(text.as_bytes());
        let _ = self.0.flush();
    }

    fn exception(&mut self, message: &str) {
        self.info(&format!("info string error {message}"));
    }
}

/// Score as reported to the outside: centipawns or moves to mate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScore {
    Centipawns(i32),
    /// Positive when the side to move mates, negative when it is mated.
    Mate(i32),
}

impl SearchScore {
    pub fn from_raw(score: i32) -> Self {
        if score >= MATE_THRESHOLD {
            SearchScore::Mate((MATE_SCORE - score + 1) / 2)
        } else if score <= -MATE_THRESHOLD {
            SearchScore::Mate(-(MATE_SCORE + score) / 2)
        } else {
            SearchScore::Centipawns(score)
        }
    }
}

impl std::fmt::Display for SearchScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchScore::Centipawns(cp) => write!(f, "cp {cp}"),
            SearchScore::Mate(moves) => write!(f, "mate {moves}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub budget_ms: u64,
    /// Overrides the configured depth for this search only.
    pub max_depth: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: SearchScore,
    pub depth: u8,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub pv: Vec<Move>,
    pub from_book: bool,
}

pub struct SearchEngine<S: BoardScorer = TaperedScorer> {
    config: SearchConfig,
    scorer: S,
    tt: TranspositionTable,
    killers: KillerTable,
    repetitions: RepetitionTable,
    game_history: Vec<u64>,
    book: Option<OpeningBook>,
    stop: StopHandle,
    time_model: DepthTimeModel,
    nodes: u64,
    iteration_depth: u8,
    root_best: Option<Move>,
}

impl SearchEngine<TaperedScorer> {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_scorer(config, TaperedScorer)
    }
}

impl Default for SearchEngine<TaperedScorer> {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl<S: BoardScorer> SearchEngine<S> {
    pub fn with_scorer(config: SearchConfig, scorer: S) -> Self {
        let config = SearchConfig {
            max_depth: config.max_depth.clamp(1, MAX_DEPTH_CEILING),
            ..config
        };
        Self {
            tt: TranspositionTable::new_with_mb(config.hash_mb),
            config,
            scorer,
            killers: KillerTable::default(),
            repetitions: RepetitionTable::default(),
            game_history: Vec::new(),
            book: Some(OpeningBook::embedded()),
            stop: StopHandle::default(),
            time_model: DepthTimeModel::default(),
            nodes: 0,
            iteration_depth: 0,
            root_best: None,
        }
    }

    #[inline]
    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn set_max_depth(&mut self, depth: u8) {
        self.config.max_depth = depth.clamp(1, MAX_DEPTH_CEILING);
    }

    pub fn set_hash_mb(&mut self, hash_mb: usize) {
        self.config.hash_mb = hash_mb.max(1);
        self.tt = TranspositionTable::new_with_mb(self.config.hash_mb);
    }

    pub fn set_own_book(&mut self, enabled: bool) {
        self.config.own_book = enabled;
    }

    pub fn set_opening_book(&mut self, book: Option<OpeningBook>) {
        self.book = book;
    }

    /// Hashes of the positions already played in this game, oldest first,
    /// excluding the position about to be searched.
    pub fn set_game_history(&mut self, hashes: Vec<u64>) {
        self.game_history = hashes;
    }

    /// Forget everything learned from the previous game.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.game_history.clear();
    }

    /// Handle that cancels the next (or running) search on this engine.
    #[inline]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    #[inline]
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn find_best_move(
        &mut self,
        board: &Board,
        time_budget_ms: u64,
        sink: &mut dyn InfoSink,
    ) -> Result<Option<Move>, SearchError> {
        let limits = SearchLimits {
            budget_ms: time_budget_ms,
            max_depth: None,
        };
        Ok(self.search(board, limits, sink)?.best_move)
    }

    /// Run one search. Failures are reported through `sink` before they are
    /// returned; a panic is reported and then resumed.
    pub fn search(
        &mut self,
        board: &Board,
        limits: SearchLimits,
        sink: &mut dyn InfoSink,
    ) -> Result<SearchReport, SearchError> {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.run(board, limits, &mut *sink)));
        // A stop aimed at this search must not leak into the next one.
        self.stop = StopHandle::default();

        match outcome {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(err)) => {
                error!(%err, "search failed");
                sink.exception(&err.to_string());
                Err(err)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "search panicked");
                sink.exception(&SearchError::Panicked(message).to_string());
                panic::resume_unwind(payload)
            }
        }
    }

    fn run(
        &mut self,
        board: &Board,
        limits: SearchLimits,
        sink: &mut dyn InfoSink,
    ) -> Result<SearchReport, SearchError> {
        let started = Instant::now();
        self.tt.new_generation();
        self.killers.clear();
        self.time_model.clear();
        self.nodes = 0;

        let root_moves = legal_successors(board);
        if root_moves.is_empty() {
            let score = if board.is_in_check() {
                -MATE_SCORE
            } else {
                DRAW_SCORE
            };
            return Ok(self.report(None, score, 0, started, Vec::new(), false));
        }

        if let Some(mv) = self.book_move(board, &root_moves) {
            debug!(book_move = %mv, "playing book move");
            sink.info(&format!("info string book move {mv}"));
            return Ok(self.report(Some(mv), 0, 0, started, vec![mv], true));
        }

        let budget = Duration::from_millis(limits.budget_ms.max(1));
        let stop = self.stop.clone();
        let _timer = SearchTimer::start(budget, stop.clone())?;

        self.repetitions.clear();
        for &hash in &self.game_history {
            self.repetitions.push(hash);
        }
        self.repetitions.push(board.position_hash());

        let max_depth = limits
            .max_depth
            .unwrap_or(self.config.max_depth)
            .clamp(1, MAX_DEPTH_CEILING);
        let sign = board.active_color().sign();

        let mut best_move = Some(root_moves[0].mv);
        let mut best_score = 0;
        let mut reached_depth = 0;
        let mut pv = Vec::new();

        for depth in 1..=max_depth {
            self.iteration_depth = depth;
            self.root_best = None;
            let iteration_started = Instant::now();

            let score = self.evaluate(board, 0, -INFINITY, INFINITY, sign);
            if stop.is_stopped() {
                debug!(depth, "iteration abandoned on stop");
                break;
            }

            self.time_model.record(depth, iteration_started.elapsed());
            best_move = self.root_best.or(best_move);
            best_score = score;
            reached_depth = depth;
            pv = self.principal_variation(board, best_move, depth);

            let elapsed_ms = started.elapsed().as_millis() as u64;
            debug!(
                depth,
                nodes = self.nodes,
                score,
                elapsed_ms,
                "iteration complete"
            );
            sink.info(&self.info_line(depth, score, elapsed_ms, &pv));

            if let Some(plies) = mate_distance(score) {
                if plies <= i32::from(depth) {
                    debug!(depth, plies, "forced mate resolved");
                    break;
                }
            }
            if depth < max_depth
                && !self
                    .time_model
                    .next_depth_fits(depth + 1, started.elapsed(), budget)
            {
                debug!(
                    next_depth = depth + 1,
                    "time model predicts the next depth will not fit"
                );
                break;
            }
        }

        Ok(self.report(best_move, best_score, reached_depth, started, pv, false))
    }

    fn book_move(&self, board: &Board, root_moves: &[GeneratedMove]) -> Option<Move> {
        if !self.config.own_book {
            return None;
        }
        let book = self.book.as_ref()?;
        let hash = board.position_hash();
        let candidate = book.choose_weighted_move(hash, &mut rand::rng())?;
        root_moves
            .iter()
            .map(|g| g.mv)
            .find(|mv| *mv == candidate)
    }

    fn report(
        &self,
        best_move: Option<Move>,
        score: i32,
        depth: u8,
        started: Instant,
        pv: Vec<Move>,
        from_book: bool,
    ) -> SearchReport {
        SearchReport {
            best_move,
            score: SearchScore::from_raw(score),
            depth,
            nodes: self.nodes,
            elapsed_ms: started.elapsed().as_millis() as u64,
            pv,
            from_book,
        }
    }

    fn info_line(&self, depth: u8, score: i32, elapsed_ms: u64, pv: &[Move]) -> String {
        let nps = self.nodes.saturating_mul(1000) / elapsed_ms.max(1);
        let pv_text: Vec<String> = pv.iter().map(ToString::to_string).collect();
        format!(
            "info depth {depth} nodes {} nps {nps} hashfull {} score {} time {elapsed_ms} pv {}",
            self.nodes,
            self.tt.hashfull(),
            SearchScore::from_raw(score),
            pv_text.join(" ")
        )
    }

    /// Negamax over plies `depth..iteration_depth`, quiescence beyond.
    ///
    /// `depth` counts plies from the root; `sign` is +1 when light is to move.
    fn evaluate(
        &mut self,
        board: &Board,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
        sign: i32,
    ) -> i32 {
        if self.stop.is_stopped() {
            return 0;
        }
        if depth > 0 && board.halfmove_clock() >= FIFTY_MOVE_HALFMOVES {
            // Mate delivered on the hundredth halfmove still stands.
            if board.is_in_check() && legal_successors(board).is_empty() {
                return -(MATE_SCORE - i32::from(depth));
            }
            return DRAW_SCORE;
        }
        if depth >= self.iteration_depth {
            return self.quiesce(board, depth, alpha, beta, sign, 0);
        }
        self.nodes += 1;

        let ply = i32::from(depth);
        let remaining = self.iteration_depth - depth;
        let hash = board.position_hash();
        let alpha_orig = alpha;

        let tt_entry = self.tt.probe(hash);
        if let Some(entry) = tt_entry {
            if depth > 0 && entry.depth >= remaining {
                let score = score_from_tt(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return score,
                    Bound::Lower => alpha = alpha.max(score),
                    Bound::Upper => beta = beta.min(score),
                }
                if alpha >= beta {
                    return score;
                }
            }
        }

        let successors = legal_successors(board);
        if successors.is_empty() {
            return if board.is_in_check() {
                -(MATE_SCORE - ply)
            } else {
                DRAW_SCORE
            };
        }

        let tt_move = tt_entry.and_then(|e| e.best_move);
        let ordered = self.order_moves(successors, depth as usize, tt_move);

        let mut best_score = -INFINITY;
        let mut best_move = None;

        for generated in ordered {
            let child_hash = generated.board_after.position_hash();
            let score = if self.repetitions.count(child_hash) >= 2 {
                DRAW_SCORE
            } else {
                self.repetitions.push(child_hash);
                let score =
                    -self.evaluate(&generated.board_after, depth + 1, -beta, -alpha, -sign);
                self.repetitions.pop(child_hash);
                score
            };
            if self.stop.is_stopped() {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(generated.mv);
            }
            if score > alpha {
                alpha = score;
                if depth == 0 {
                    self.root_best = Some(generated.mv);
                }
            }
            if alpha >= beta {
                if !generated.is_capture() {
                    self.killers.register(depth as usize, generated.mv);
                }
                self.store(hash, remaining, best_score, ply, Bound::Lower, best_move);
                return best_score;
            }
        }

        if best_score <= alpha_orig {
            self.store(hash, remaining, best_score, ply, Bound::Upper, None);
        } else {
            self.store(hash, remaining, best_score, ply, Bound::Exact, best_move);
        }
        if depth == 0 && self.root_best.is_none() {
            self.root_best = best_move;
        }
        best_score
    }

    /// Capture-only continuation; every evasion is searched while in check.
    fn quiesce(
        &mut self,
        board: &Board,
        depth: u8,
        mut alpha: i32,
        beta: i32,
        sign: i32,
        qply: u8,
    ) -> i32 {
        if self.stop.is_stopped() {
            return 0;
        }
        self.nodes += 1;
        let ply = i32::from(depth);

        if board.is_in_check() {
            let evasions = legal_successors(board);
            if evasions.is_empty() {
                return -(MATE_SCORE - ply);
            }
            if qply >= self.config.quiescence_max_ply {
                return sign * self.scorer.score(board);
            }
            let mut best = -INFINITY;
            for generated in self.order_moves(evasions, depth as usize, None) {
                let score = -self.quiesce(
                    &generated.board_after,
                    depth + 1,
                    -beta,
                    -alpha,
                    -sign,
                    qply + 1,
                );
                if self.stop.is_stopped() {
                    return 0;
                }
                best = best.max(score);
                alpha = alpha.max(score);
                if alpha >= beta {
                    break;
                }
            }
            return best;
        }

        let stand_pat = sign * self.scorer.score(board);
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);
        if qply >= self.config.quiescence_max_ply {
            return alpha;
        }

        for generated in self.order_moves(legal_captures(board), depth as usize, None) {
            let score = -self.quiesce(
                &generated.board_after,
                depth + 1,
                -beta,
                -alpha,
                -sign,
                qply + 1,
            );
            if self.stop.is_stopped() {
                return 0;
            }
            if score >= beta {
                return beta;
            }
            alpha = alpha.max(score);
        }
        alpha
    }

    fn order_moves(
        &self,
        successors: Vec<GeneratedMove>,
        ply: usize,
        tt_move: Option<Move>,
    ) -> Vec<GeneratedMove> {
        let mut keyed: Vec<(i32, GeneratedMove)> = successors
            .into_iter()
            .map(|generated| (self.order_key(&generated, ply, tt_move), generated))
            .collect();
        // Stable: ties keep generation order.
        keyed.sort_by_key(|(key, _)| Reverse(*key));
        keyed.into_iter().map(|(_, generated)| generated).collect()
    }

    fn order_key(&self, generated: &GeneratedMove, ply: usize, tt_move: Option<Move>) -> i32 {
        const TT_MOVE: i32 = 1_000_000;
        const EXACT_CHILD: i32 = 900_000;
        const CAPTURE: i32 = 500_000;
        const KILLER: i32 = 400_000;
        const CHECK: i32 = 300_000;

        if tt_move == Some(generated.mv) {
            return TT_MOVE;
        }
        let child = self.tt.peek(generated.board_after.position_hash());
        if child.is_some_and(|entry| entry.bound == Bound::Exact) {
            return EXACT_CHILD;
        }
        if let Some(victim) = generated.captured {
            return CAPTURE + piece_value(victim) - piece_value(generated.mv.piece().kind());
        }
        if self.killers.is_killer(ply, &generated.mv) {
            return KILLER;
        }
        if generated.gives_check() {
            return CHECK;
        }
        0
    }

    fn store(
        &mut self,
        key: u64,
        depth: u8,
        score: i32,
        ply: i32,
        bound: Bound,
        best_move: Option<Move>,
    ) {
        self.tt.store(TTEntry {
            key,
            depth,
            score: score_to_tt(score, ply),
            bound,
            best_move,
        });
    }

    /// Root best move followed by the table's best moves, legal and acyclic.
    fn principal_variation(&self, board: &Board, first: Option<Move>, max_len: u8) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut seen = HashSet::new();
        let mut current = board.clone();
        let mut next = first;

        while let Some(mv) = next {
            if pv.len() >= usize::from(max_len) || !seen.insert(current.position_hash()) {
                break;
            }
            let successors = legal_successors(&current);
            let Some(generated) = successors.into_iter().find(|g| g.mv == mv) else {
                break;
            };
            pv.push(mv);
            current = generated.board_after;
            let hash = current.position_hash();
            next = self.tt.peek(hash).and_then(|e| e.best_move);
        }
        pv
    }
}

/// Plies to mate for a mate score, `None` otherwise.
fn mate_distance(score: i32) -> Option<i32> {
    (score.abs() >= MATE_THRESHOLD).then(|| MATE_SCORE - score.abs())
}

#[inline]
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

#[inline]
fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::legal_move_generator::legal_moves;
    use crate::search::time_management::INFINITE_BUDGET_MS;
    use crate::utils::fen_parser::parse_fen;

    fn engine_without_book(max_depth: u8) -> SearchEngine {
        let mut engine = SearchEngine::new(SearchConfig {
            max_depth,
            hash_mb: 1,
            own_book: false,
            ..SearchConfig::default()
        });
        engine.set_opening_book(None);
        engine
    }

    #[test]
    fn finds_mate_in_one_well_before_the_budget() {
        let board = parse_fen("6k1/5Q2/6K1/8/8/8/8/8 w - - 0 1").expect("valid FEN");
        let mut engine = engine_without_book(32);
        let mut lines = Vec::<String>::new();
        let started = Instant::now();
        let best = engine
            .find_best_move(&board, 10_000, &mut lines)
            .expect("search succeeds")
            .expect("a move exists");
        assert!(started.elapsed() < Duration::from_secs(5));

        let after = board.apply_move(&best);
        assert!(after.is_in_check());
        assert!(legal_moves(&after).is_empty());
        assert!(
            lines.iter().any(|line| line.contains("score mate 1")),
            "{lines:?}"
        );
    }

    #[test]
    fn wins_a_hanging_queen() {
        let board = parse_fen("4k3/8/8/8/8/8/4q3/4KQ2 w - - 0 1").expect("valid FEN");
        let mut engine = engine_without_book(3);
        let best = engine
            .find_best_move(&board, 5_000, &mut Vec::<String>::new())
            .expect("search succeeds")
            .expect("a move exists");
        assert_eq!(best.to().to_string(), "e2");
    }

    #[test]
    fn info_lines_carry_every_field() {
        let mut engine = engine_without_book(2);
        let mut lines = Vec::<String>::new();
        engine
            .find_best_move(&Board::starting_position(), 5_000, &mut lines)
            .expect("search succeeds");
        let last = lines.last().expect("at least one iteration reported");
        let fields = [
            "info depth 2",
            " nodes ",
            " nps ",
            " hashfull ",
            " score cp ",
            " time ",
            " pv ",
        ];
        for field in fields {
            assert!(last.contains(field), "missing {field:?} in {last}");
        }
    }

    #[test]
    fn no_legal_moves_returns_none() {
        let stalemate = parse_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("valid FEN");
        let mut engine = engine_without_book(4);
        let best = engine
            .find_best_move(&stalemate, 1_000, &mut Vec::<String>::new())
            .expect("search succeeds");
        assert!(best.is_none());
    }

    #[test]
    fn stop_before_search_still_yields_a_legal_move_and_is_consumed() {
        let board = Board::starting_position();
        let mut engine = engine_without_book(6);
        engine.stop();
        let best = engine
            .find_best_move(&board, 5_000, &mut Vec::<String>::new())
            .expect("search succeeds")
            .expect("fallback move");
        assert!(legal_moves(&board).contains(&best));
        assert!(!engine.stop_handle().is_stopped());
    }

    #[test]
    fn repeated_position_scores_as_draw() {
        // Light is a rook down and its only move, Kg1, repeats the position a third time.
        let board = parse_fen("k7/8/8/8/8/8/r7/7K w - - 0 1").expect("valid FEN");
        let mut engine = engine_without_book(3);
        let mut history = Vec::new();
        let mut probe = board.clone();
        for text in ["h1g1", "a2b2", "g1h1", "b2a2", "h1g1", "a2b2", "g1h1", "b2a2"] {
            history.push(probe.position_hash());
            let mv = legal_moves(&probe)
                .into_iter()
                .find(|m| m.to_string() == text)
                .expect("shuffle move is legal");
            probe = probe.apply_move(&mv);
        }
        assert_eq!(probe.position_hash(), board.position_hash());
        engine.set_game_history(history);
        let report = engine
            .search(
                &probe,
                SearchLimits {
                    budget_ms: 5_000,
                    max_depth: Some(3),
                },
                &mut Vec::<String>::new(),
            )
            .expect("search succeeds");
        assert_eq!(
            report.best_move.map(|m| m.to_string()),
            Some("h1g1".to_owned())
        );
        assert_eq!(report.score, SearchScore::Centipawns(DRAW_SCORE));
    }

    #[test]
    fn book_move_is_played_without_search() {
        let book = OpeningBook::from_tsv_str("uci\ne2e4\n").expect("book parses");
        let mut engine = SearchEngine::new(SearchConfig {
            hash_mb: 1,
            ..SearchConfig::default()
        });
        engine.set_opening_book(Some(book));
        let report = engine
            .search(
                &Board::starting_position(),
                SearchLimits {
                    budget_ms: 1_000,
                    max_depth: None,
                },
                &mut Vec::<String>::new(),
            )
            .expect("search succeeds");
        assert!(report.from_book);
        assert_eq!(
            report.best_move.map(|m| m.to_string()),
            Some("e2e4".to_owned())
        );
        assert_eq!(report.nodes, 0);
    }

    #[test]
    fn mate_on_the_hundredth_halfmove_beats_the_fifty_move_draw() {
        let board = parse_fen("k7/8/1K6/8/8/8/8/7R w - - 99 80").expect("valid FEN");
        let mut engine = engine_without_book(3);
        let mut lines = Vec::<String>::new();
        let report = engine
            .search(
                &board,
                SearchLimits {
                    budget_ms: 5_000,
                    max_depth: Some(3),
                },
                &mut lines,
            )
            .expect("search succeeds");
        assert_eq!(
            report.best_move.map(|m| m.to_string()),
            Some("h1h8".to_owned())
        );
        assert_eq!(report.score, SearchScore::Mate(1));
        assert_eq!(report.depth, 1, "{lines:?}");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("score mate 1"), "{lines:?}");
    }

    #[test]
    fn quiet_move_on_the_hundredth_halfmove_is_a_draw() {
        // After Rh2 black still has Kb8, so the fifty-move rule applies at once.
        let board = parse_fen("k7/8/1K6/8/8/8/8/7R w - - 99 80").expect("valid FEN");
        let rook_lift = legal_moves(&board)
            .into_iter()
            .find(|m| m.to_string() == "h1h2")
            .expect("h1h2 is legal");
        let after = board.apply_move(&rook_lift);
        assert_eq!(after.halfmove_clock(), FIFTY_MOVE_HALFMOVES);
        let mut engine = engine_without_book(2);
        engine.iteration_depth = 2;
        let sign = after.active_color().sign();
        assert_eq!(
            engine.evaluate(&after, 1, -INFINITY, INFINITY, sign),
            DRAW_SCORE
        );
    }

    struct PanickingScorer;

    impl BoardScorer for PanickingScorer {
        fn score(&self, _board: &Board) -> i32 {
            panic!("scorer exploded")
        }
    }

    #[test]
    fn worker_panic_is_reported_then_resumed() {
        let config = SearchConfig {
            max_depth: 2,
            hash_mb: 1,
            own_book: false,
            ..SearchConfig::default()
        };
        let mut engine = SearchEngine::with_scorer(config, PanickingScorer);
        let mut lines = Vec::<String>::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.search(
                &Board::starting_position(),
                SearchLimits {
                    budget_ms: 5_000,
                    max_depth: None,
                },
                &mut lines,
            )
        }));

        let payload = outcome.expect_err("the panic reaches the caller");
        assert_eq!(panic_message(payload.as_ref()), "scorer exploded");
        assert_eq!(
            lines,
            vec!["info string error search worker panicked: scorer exploded".to_owned()]
        );
        assert!(!engine.stop_handle().is_stopped());
    }

    /// Tapered evaluation that sleeps first, so search time tracks node count.
    struct SlowScorer(Duration);

    impl BoardScorer for SlowScorer {
        fn score(&self, board: &Board) -> i32 {
            std::thread::sleep(self.0);
            TaperedScorer.score(board)
        }
    }

    fn slow_engine() -> SearchEngine<SlowScorer> {
        let config = SearchConfig {
            max_depth: 8,
            hash_mb: 1,
            own_book: false,
            ..SearchConfig::default()
        };
        SearchEngine::with_scorer(config, SlowScorer(Duration::from_millis(3)))
    }

    #[test]
    fn driver_skips_a_depth_the_time_model_says_cannot_fit() {
        let board = Board::starting_position();

        let calibration = slow_engine()
            .search(
                &board,
                SearchLimits {
                    budget_ms: INFINITE_BUDGET_MS,
                    max_depth: Some(2),
                },
                &mut Vec::<String>::new(),
            )
            .expect("calibration search succeeds");
        assert_eq!(calibration.depth, 2);

        // Room for depths 1 and 2 with slack, but less than depth 2 again,
        // which is the least the model can predict for depth 3.
        let budget_ms = calibration.elapsed_ms + calibration.elapsed_ms / 3;
        let mut lines = Vec::<String>::new();
        let report = slow_engine()
            .search(
                &board,
                SearchLimits {
                    budget_ms,
                    max_depth: None,
                },
                &mut lines,
            )
            .expect("search succeeds");

        assert_eq!(report.depth, 2, "{lines:?}");
        assert_eq!(lines.len(), 2);
        assert!(
            report.elapsed_ms < budget_ms,
            "ended at {}ms, budget {budget_ms}ms",
            report.elapsed_ms
        );
    }

    #[test]
    fn mate_scores_convert_to_move_counts() {
        assert_eq!(SearchScore::from_raw(MATE_SCORE - 1), SearchScore::Mate(1));
        assert_eq!(SearchScore::from_raw(MATE_SCORE - 3), SearchScore::Mate(2));
        assert_eq!(
            SearchScore::from_raw(-(MATE_SCORE - 2)),
            SearchScore::Mate(-1)
        );
        assert_eq!(SearchScore::from_raw(35), SearchScore::Centipawns(35));
        assert_eq!(
            score_from_tt(score_to_tt(MATE_SCORE - 5, 3), 3),
            MATE_SCORE - 5
        );
    }
}
