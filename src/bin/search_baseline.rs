//! Fixed-depth search and perft baseline runner.
//!
//! Usage:
//! `cargo run --release --bin search_baseline`
//! `cargo run --release --bin search_baseline -- --depth 6 --perft 4`

use std::error::Error;
use std::time::Instant;

use vector_chess::move_generation::perft::perft_multi_threaded;
use vector_chess::search::iterative_deepening::{SearchConfig, SearchEngine, SearchLimits};
use vector_chess::search::time_management::INFINITE_BUDGET_MS;
use vector_chess::utils::fen_parser::parse_fen;

fn parse_arg_u8(flag: &str, default: u8) -> u8 {
    let args: Vec<String> = std::env::args().collect();
    args.windows(2)
        .find(|pair| pair[0] == flag)
        .and_then(|pair| pair[1].parse::<u8>().ok())
        .map_or(default, |v| v.max(1))
}

fn run_case(name: &str, fen: &str, depth: u8, perft_depth: u8) -> Result<(), Box<dyn Error>> {
    let board = parse_fen(fen)?;
    let mut engine = SearchEngine::new(SearchConfig {
        own_book: false,
        ..SearchConfig::default()
    });
    let mut lines: Vec<String> = Vec::new();
    let report = engine.search(
        &board,
        SearchLimits {
            budget_ms: INFINITE_BUDGET_MS,
            max_depth: Some(depth),
        },
        &mut lines,
    )?;
    let best = match report.best_move {
        Some(mv) => mv.to_string(),
        None => "none".to_owned(),
    };
    println!(
        "{name}: depth={} nodes={} elapsed_ms={} score={} best_move={best}",
        report.depth, report.nodes, report.elapsed_ms, report.score
    );

    let started = Instant::now();
    let counts = perft_multi_threaded(&board, perft_depth)?;
    let elapsed_ms = started.elapsed().as_millis().max(1) as u64;
    println!(
        "{name}: perft({perft_depth}) nodes={} captures={} checks={} nps={}",
        counts.nodes,
        counts.captures,
        counts.checks,
        counts.nodes.saturating_mul(1000) / elapsed_ms
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let depth = parse_arg_u8("--depth", 5);
    let perft_depth = parse_arg_u8("--perft", 3);
    let suite = [
        ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        (
            "classical_mid",
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        ),
        (
            "tactical",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        ),
        ("end_kpk", "8/8/8/8/8/4k3/4P3/4K3 w - - 0 1"),
    ];
    println!("baseline run: depth={depth} perft={perft_depth}");
    for (name, fen) in suite {
        run_case(name, fen, depth, perft_depth)?;
    }
    Ok(())
}
