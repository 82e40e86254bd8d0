//! Coach's Challenge CLI
//!
//! Play a challenge against the coach in the terminal, or check a challenge
//! file before shipping it.
//!
//! Env variables:
//!   COACH_LOG         : tracing filter (default "warn")
//!   COACH_LOG_FORMAT  : "pretty" (default) or "json"

mod telemetry;

use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use chess_core::{sq, Color, Position};
use coach::{ChallengeRegistry, ChallengeSession, ConfigError, MoveResult};

fn print_usage() {
    println!("Coach's Challenge");
    println!();
    println!("Usage:");
    println!("  coach list [--file PATH]");
    println!("  coach play <challenge-id> [--seed N] [--json] [--file PATH]");
    println!("  coach validate [PATH]");
    println!();
    println!("While playing, enter moves as from/to squares (e2e4, or e7e8n to underpromote).");
    println!("  moves <square>  - list legal moves from a square");
    println!("  board           - show the board again");
    println!("  quit            - leave the challenge");
    println!();
    println!("Examples:");
    println!("  coach play guard-the-queen --seed 42");
    println!("  coach validate my_challenges.toml");
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn load_registry(args: &[String]) -> Result<ChallengeRegistry, ConfigError> {
    match flag_value(args, "--file") {
        Some(path) => ChallengeRegistry::load(path),
        None => ChallengeRegistry::builtin(),
    }
}

fn run_list(args: &[String]) -> ExitCode {
    let registry = match load_registry(args) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{:<20} {:>5}  {:<6} {:<14} {}", "ID", "LEVEL", "SIDE", "COACH", "TITLE");
    for cfg in registry.iter() {
        println!(
            "{:<20} {:>5}  {:<6} {:<14} {}",
            cfg.id,
            cfg.level,
            side_name(cfg.player),
            format!("{:?}", cfg.opponent).to_lowercase(),
            cfg.narrative.title
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(args: &[String]) -> ExitCode {
    let result = match args.first() {
        Some(path) => ChallengeRegistry::load(path),
        None => ChallengeRegistry::builtin(),
    };
    match result {
        Ok(registry) => {
            println!("{} challenge(s) OK", registry.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_play(args: &[String]) -> ExitCode {
    let Some(id) = args.first() else {
        eprintln!("Error: play requires a challenge id");
        print_usage();
        return ExitCode::FAILURE;
    };

    let registry = match load_registry(args) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let Some(config) = registry.get(id) else {
        eprintln!("Unknown challenge: {}", id);
        eprintln!("Run `coach list` to see what is available.");
        return ExitCode::FAILURE;
    };

    let seed: u64 = flag_value(args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(rand::random);
    let json = args.iter().any(|a| a == "--json");

    let mut session = match ChallengeSession::seeded(config, seed) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !json {
        let cfg = session.config();
        println!("=== {} (level {}) ===", cfg.narrative.title, cfg.level);
        println!("{}", cfg.narrative.briefing);
        println!("You play {}. Coach seed: {}", side_name(cfg.player), seed);
        println!();
        print_board(&session.snapshot().position, session.config().player);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while !session.state().finished {
        if !json {
            print!("[{} left] your move> ", session.moves_remaining());
            // A failed flush only delays the prompt.
            let _ = io::stdout().flush();
        }
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let input = line.trim();
        match input.split_whitespace().collect::<Vec<_>>().as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["board"] => print_board(&session.snapshot().position, session.config().player),
            ["moves", square] => show_moves(&session, square),
            [text] => {
                let result = session.attempt_uci(text);
                if json {
                    match serde_json::to_string(&result) {
                        Ok(line) => println!("{}", line),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                } else {
                    report(&session, &result);
                }
            }
            _ => println!("Enter a move like e2e4, or `moves e2`, `board`, `quit`."),
        }
    }

    if !json {
        println!();
        println!("Moves: {}", session.history().join(" "));
        if let Some(closing) = session.closing_message() {
            println!("{}", closing);
        }
    }
    match session.state().pass {
        Some(false) => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    }
}

fn report(session: &ChallengeSession, result: &MoveResult) {
    if let Some(reason) = result.rejection {
        println!("Not accepted ({:?}).", reason);
        return;
    }
    if let Some(mv) = result.player_move {
        println!("You played {}.", mv);
    }
    if let Some(mv) = result.bot_move {
        println!("Coach replies {}.", mv);
    }
    let st = result.state;
    println!(
        "Captures: {}  Material: {:+}  Moves: {}/{}",
        st.captures_by_player,
        st.material_score,
        st.moves_played,
        session.config().win.max_plies
    );
    print_board(&session.snapshot().position, session.config().player);
    if st.finished {
        match (st.pass, st.fail_reason) {
            (Some(true), _) => println!("=== Challenge passed ==="),
            (_, Some(reason)) => println!("=== Challenge failed: {:?} ===", reason),
            _ => {}
        }
    }
}

fn show_moves(session: &ChallengeSession, square: &str) {
    let Some(from) = chess_core::coord_to_sq(square) else {
        println!("Not a square: {}", square);
        return;
    };
    let moves: Vec<String> = session
        .legal_moves(from)
        .iter()
        .map(|m| m.to_uci())
        .collect();
    if moves.is_empty() {
        println!("No legal moves from {}.", square);
    } else {
        println!("{}", moves.join(" "));
    }
}

fn side_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Board from the learner's side, uppercase for White.
fn print_board(pos: &Position, viewer: Color) {
    let ranks: Vec<i8> = match viewer {
        Color::White => (0..8).rev().collect(),
        Color::Black => (0..8).collect(),
    };
    let files: Vec<i8> = match viewer {
        Color::White => (0..8).collect(),
        Color::Black => (0..8).rev().collect(),
    };
    for &rank in &ranks {
        let row: String = files
            .iter()
            .map(|&file| {
                sq(file, rank)
                    .and_then(|s| pos.piece_at(s))
                    .map_or('.', |pc| pc.fen_char())
            })
            .flat_map(|c| [' ', c])
            .collect();
        println!(" {}{}", rank + 1, row);
    }
    let footer: String = files
        .iter()
        .flat_map(|&f| [' ', char::from(b'a' + f as u8)])
        .collect();
    println!("  {}", footer);
}

fn main() -> ExitCode {
    telemetry::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "list" => run_list(rest),
        "play" => run_play(rest),
        "validate" => run_validate(rest),
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}
