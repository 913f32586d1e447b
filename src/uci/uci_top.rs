//! UCI protocol front-end and command loop.
//!
//! Parses UCI commands, maintains the current position and game history,
//! hands `go` requests to a search worker thread and emits protocol output.
//! The worker owns the `SearchEngine` while it searches and returns it when
//! joined; `stop` raises the engine's stop handle and joins.

use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{error, warn};

use crate::errors::{ProtocolError, SearchError};
use crate::game_state::board::Board;
use crate::move_generation::perft::perft_divide;
use crate::search::iterative_deepening::{
    InfoSink, SearchConfig, SearchEngine, SearchLimits, WriterSink, MAX_DEPTH_CEILING,
};
use crate::search::search_timer::StopHandle;
use crate::search::time_management::{allocate_budget_ms, GoParams};
use crate::tables::opening_book::OpeningBook;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;
use crate::utils::long_algebraic::parse_long_algebraic;

const UCI_ENGINE_NAME: &str = "Vector Chess";
const UCI_ENGINE_AUTHOR: &str = "the Vector Chess developers";
const MAX_HASH_MB: usize = 4096;
const BOOK_FILE_OPTION: &str = "option name BookFile type string default <empty>";

pub fn run_stdio_loop() -> io::Result<()> {
    let stdin = io::stdin();
    let mut session = UciSession::new(io::stdout());

    for line in stdin.lock().lines() {
        if session.handle_command(&line?)? {
            return Ok(());
        }
    }

    // Input closed: let a bounded search finish so its bestmove is printed.
    session.finish_search(false);
    Ok(())
}

/// Line-serialized writer shared by the command loop and the search worker.
#[derive(Debug)]
pub struct SharedWriter<W>(Arc<Mutex<W>>);

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl<W: Write> SharedWriter<W> {
    /// A panicked writer thread leaves the sink usable.
    fn lock(&self) -> MutexGuard<'_, W> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        let mut guard = self.lock();
        guard.write_all(format!("{text}\n").as_bytes())?;
        guard.flush()
    }
}

struct SearchWorker {
    stop: StopHandle,
    infinite: bool,
    handle: JoinHandle<Option<SearchEngine>>,
}

pub struct UciSession<W: Write + Send + 'static> {
    out: SharedWriter<W>,
    board: Board,
    /// Hashes of the positions played before `board`, oldest first.
    history: Vec<u64>,
    config: SearchConfig,
    book: Option<OpeningBook>,
    engine: Option<SearchEngine>,
    worker: Option<SearchWorker>,
}

impl<W: Write + Send + 'static> UciSession<W> {
    pub fn new(out: W) -> Self {
        let config = SearchConfig::default();
        let book = Some(OpeningBook::embedded());
        Self {
            out: SharedWriter(Arc::new(Mutex::new(out))),
            board: Board::starting_position(),
            history: Vec::new(),
            config,
            engine: Some(build_engine(config, book.clone())),
            book,
            worker: None,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn is_searching(&self) -> bool {
        self.worker.is_some()
    }

    /// Handle one input line. Returns `true` when the session should end.
    pub fn handle_command(&mut self, line: &str) -> io::Result<bool> {
        let trimmed = line.trim();
        let mut parts = trimmed.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(false);
        };

        match cmd {
            "uci" => {
                self.out.line(&format!("id name {UCI_ENGINE_NAME}"))?;
                self.out.line(&format!("id author {UCI_ENGINE_AUTHOR}"))?;
                self.out.line(&format!(
                    "option name Hash type spin default {} min 1 max {MAX_HASH_MB}",
                    SearchConfig::default().hash_mb
                ))?;
                self.out.line(&format!(
                    "option name OwnBook type check default {}",
                    SearchConfig::default().own_book
                ))?;
                self.out.line(&format!(
                    "option name MaxDepth type spin default {} min 1 max {MAX_DEPTH_CEILING}",
                    SearchConfig::default().max_depth
                ))?;
                self.out.line(BOOK_FILE_OPTION)?;
                self.out.line("uciok")?;
            }
            "isready" => self.out.line("readyok")?,
            "ucinewgame" => {
                self.finish_search(true);
                self.board = Board::starting_position();
                self.history.clear();
                if let Some(engine) = self.engine.as_mut() {
                    engine.new_game();
                }
            }
            "position" => {
                if let Err(err) = self.handle_position(trimmed) {
                    self.reject("position", &err)?;
                }
            }
            "go" => {
                if let Err(err) = self.handle_go(trimmed) {
                    self.reject("go", &err)?;
                    self.out.line("bestmove 0000")?;
                }
            }
            "stop" => self.finish_search(true),
            "setoption" => {
                self.finish_search(true);
                if let Err(err) = self.handle_setoption(trimmed) {
                    self.reject("setoption", &err)?;
                }
            }
            "d" => {
                let fen = generate_fen(&self.board);
                let key = self.board.position_hash();
                self.out.line(&format!("Fen: {fen}"))?;
                self.out.line(&format!("Key: {key:016X}"))?;
            }
            "perft" => {
                if let Err(err) = self.handle_perft(parts.next()) {
                    self.reject("perft", &err)?;
                }
            }
            "quit" => {
                self.finish_search(true);
                return Ok(true);
            }
            other => warn!(command = other, "ignoring unknown command"),
        }

        Ok(false)
    }

    fn reject(&mut self, command: &str, err: &ProtocolError) -> io::Result<()> {
        warn!(command, %err, "rejected command");
        let text = format!("info string {command} error: {err}");
        self.out.line(&text)
    }

    fn handle_position(&mut self, line: &str) -> Result<(), ProtocolError> {
        let mut tokens = line.split_whitespace().skip(1).peekable();

        let mut board = match tokens.next() {
            Some("startpos") => Board::starting_position(),
            Some("fen") => {
                let mut fen_parts = Vec::new();
                while let Some(&next) = tokens.peek() {
                    if next == "moves" {
                        break;
                    }
                    fen_parts.push(next);
                    tokens.next();
                }
                if fen_parts.is_empty() {
                    return Err(ProtocolError::Missing("FEN after 'position fen'"));
                }
                parse_fen(&fen_parts.join(" "))?
            }
            Some(other) => {
                return Err(ProtocolError::InvalidValue {
                    field: "position".to_owned(),
                    value: other.to_owned(),
                })
            }
            None => return Err(ProtocolError::Missing("'startpos' or 'fen'")),
        };

        let mut history = Vec::new();
        if tokens.next() == Some("moves") {
            for text in tokens {
                let mv = parse_long_algebraic(text, &board)?;
                history.push(board.position_hash());
                board = board.apply_move(&mv);
            }
        }

        self.board = board;
        self.history = history;
        Ok(())
    }

    fn handle_go(&mut self, line: &str) -> Result<(), ProtocolError> {
        self.finish_search(true);
        let params = parse_go_params(line)?;
        let limits = SearchLimits {
            budget_ms: allocate_budget_ms(&self.board, &params),
            max_depth: params.depth,
        };

        let mut engine = self.take_engine();
        engine.set_game_history(self.history.clone());
        let stop = engine.stop_handle();
        let board = self.board.clone();
        let mut out = self.out.clone();

        let spawned = thread::Builder::new()
            .name("search-worker".to_owned())
            .spawn(move || {
                let mut sink = WriterSink(out.clone());
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    engine.search(&board, limits, &mut sink as &mut dyn InfoSink)
                }));
                let (best_move, engine) = match outcome {
                    Ok(Ok(report)) => (report.best_move, Some(engine)),
                    Ok(Err(_)) => (board.legal_moves().first().copied(), Some(engine)),
                    Err(_) => (board.legal_moves().first().copied(), None),
                };
                let reply = best_move.map_or_else(|| "0000".to_owned(), |mv| mv.to_string());
                if let Err(err) = out.line(&format!("bestmove {reply}")) {
                    error!(%err, "failed to write bestmove");
                }
                engine
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(SearchWorker {
                    stop,
                    infinite: params.infinite,
                    handle,
                });
                Ok(())
            }
            Err(err) => {
                let err = SearchError::Internal(format!("failed to spawn search worker: {err}"));
                error!(%err, "search not started");
                Err(err.into())
            }
        }
    }

    /// Join the running search, if any. With `stop` set the search is
    /// cancelled first; otherwise an infinite search is still cancelled
    /// and a bounded one runs to completion.
    pub fn finish_search(&mut self, stop: bool) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if stop || worker.infinite {
            worker.stop.stop();
        }
        match worker.handle.join() {
            Ok(Some(engine)) => self.engine = Some(engine),
            Ok(None) | Err(_) => {
                error!("search worker lost its engine; starting a fresh one");
                self.engine = None;
            }
        }
    }

    fn take_engine(&mut self) -> SearchEngine {
        self.engine
            .take()
            .unwrap_or_else(|| build_engine(self.config, self.book.clone()))
    }

    fn engine_mut(&mut self) -> &mut SearchEngine {
        let (config, book) = (self.config, &self.book);
        self.engine
            .get_or_insert_with(|| build_engine(config, book.clone()))
    }

    fn handle_setoption(&mut self, line: &str) -> Result<(), ProtocolError> {
        let mut name_tokens = Vec::new();
        let mut value_tokens = Vec::new();
        let mut in_value = None;
        for tok in line.split_whitespace().skip(1) {
            match tok {
                "name" if in_value.is_none() => in_value = Some(false),
                "value" if in_value == Some(false) => in_value = Some(true),
                _ if in_value == Some(false) => name_tokens.push(tok),
                _ if in_value == Some(true) => value_tokens.push(tok),
                _ => {}
            }
        }
        if name_tokens.is_empty() {
            return Err(ProtocolError::Missing("option name"));
        }
        let name = name_tokens.join(" ");
        let value = value_tokens.join(" ");
        let invalid = || ProtocolError::InvalidValue {
            field: name.clone(),
            value: value.clone(),
        };

        if name.eq_ignore_ascii_case("Hash") {
            let hash_mb = value.parse::<usize>().map_err(|_| invalid())?;
            self.config.hash_mb = hash_mb.clamp(1, MAX_HASH_MB);
            let hash_mb = self.config.hash_mb;
            self.engine_mut().set_hash_mb(hash_mb);
        } else if name.eq_ignore_ascii_case("OwnBook") {
            let enabled = parse_check(&value).ok_or_else(invalid)?;
            self.config.own_book = enabled;
            self.engine_mut().set_own_book(enabled);
        } else if name.eq_ignore_ascii_case("MaxDepth") {
            let depth = value.parse::<u8>().map_err(|_| invalid())?;
            if !(1..=MAX_DEPTH_CEILING).contains(&depth) {
                return Err(invalid());
            }
            self.config.max_depth = depth;
            self.engine_mut().set_max_depth(depth);
        } else if name.eq_ignore_ascii_case("BookFile") {
            let book = if value.is_empty() || value == "<empty>" {
                OpeningBook::embedded()
            } else {
                OpeningBook::from_tsv_path(PathBuf::from(&value))?
            };
            self.book = Some(book.clone());
            self.engine_mut().set_opening_book(Some(book));
        } else {
            return Err(ProtocolError::UnknownOption(name));
        }

        Ok(())
    }

    fn handle_perft(&mut self, depth: Option<&str>) -> Result<(), ProtocolError> {
        let text = depth.ok_or(ProtocolError::Missing("perft depth"))?;
        let depth = text.parse::<u8>().map_err(|_| ProtocolError::InvalidValue {
            field: "perft depth".to_owned(),
            value: text.to_owned(),
        })?;

        let divide = perft_divide(&self.board, depth);
        let total: u64 = divide.iter().map(|(_, nodes)| nodes).sum();
        let write = |out: &mut SharedWriter<W>| -> io::Result<()> {
            for (mv, nodes) in &divide {
                out.line(&format!("{mv}: {nodes}"))?;
            }
            out.line("")?;
            out.line(&format!("Nodes searched: {total}"))
        };
        Ok(write(&mut self.out)?)
    }
}

fn build_engine(config: SearchConfig, book: Option<OpeningBook>) -> SearchEngine {
    let mut engine = SearchEngine::new(config);
    engine.set_opening_book(book);
    engine
}

fn parse_check(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_go_params(line: &str) -> Result<GoParams, ProtocolError> {
    fn number<T: std::str::FromStr>(field: &str, value: Option<&&str>) -> Result<T, ProtocolError> {
        let value = value.ok_or_else(|| ProtocolError::InvalidValue {
            field: field.to_owned(),
            value: String::new(),
        })?;
        value.parse::<T>().map_err(|_| ProtocolError::InvalidValue {
            field: field.to_owned(),
            value: (*value).to_owned(),
        })
    }

    let mut params = GoParams::default();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut i = 0usize;
    while i < tokens.len() {
        let field = tokens[i];
        match field {
            "depth" => {
                i += 1;
                let depth = number::<u8>(field, tokens.get(i))?;
                params.depth = Some(depth.clamp(1, MAX_DEPTH_CEILING));
            }
            "movetime" => {
                i += 1;
                params.movetime_ms = Some(number(field, tokens.get(i))?);
            }
            "wtime" => {
                i += 1;
                params.wtime_ms = Some(number(field, tokens.get(i))?);
            }
            "btime" => {
                i += 1;
                params.btime_ms = Some(number(field, tokens.get(i))?);
            }
            "winc" => {
                i += 1;
                params.winc_ms = Some(number(field, tokens.get(i))?);
            }
            "binc" => {
                i += 1;
                params.binc_ms = Some(number(field, tokens.get(i))?);
            }
            "movestogo" => {
                i += 1;
                params.movestogo = Some(number(field, tokens.get(i))?);
            }
            "infinite" => params.infinite = true,
            _ => {}
        }
        i += 1;
    }
    Ok(params)
}
