//! Coach's Challenge engine
//!
//! A short scripted match between a learner and a rule-based coach:
//! - [`config`]: authored challenge definitions, validated once at startup
//! - [`eval`]: material scoring and the blunder tests
//! - [`bot`]: the coach's deliberately fallible move choice
//! - [`engine`]: the pure turn transition and termination rules
//! - [`session`]: one owner per learner, and a per-key session table
//!
//! Chess rules come from `chess_core`.
//!
//! # Usage
//!
//! ```no_run
//! use coach::{ChallengeRegistry, ChallengeSession};
//! use chess_core::coord_to_sq;
//!
//! let registry = ChallengeRegistry::builtin().expect("built-in challenges are valid");
//! let config = registry.get("guard-the-queen").unwrap();
//! let mut session = ChallengeSession::seeded(config, 7).unwrap();
//! let result = session.attempt_move(coord_to_sq("d1").unwrap(), coord_to_sq("f3").unwrap());
//! println!("{:?} -> {}", result.state, session.fen());
//! ```

pub mod bot;
pub mod config;
pub mod engine;
mod error;
pub mod eval;
pub mod session;

#[cfg(test)]
mod engine_tests;

pub use bot::{decide, BotProfile, Coach, Opponent, Scripted};
pub use config::{ChallengeConfig, ChallengeRegistry, Narrative, WinCondition, WinKind};
pub use engine::{
    attempt, attempt_promoting, parse_move_text, replay, ChallengeState, FailReason, Match, MoveResult,
    Rejection,
};
pub use error::ConfigError;
pub use session::{ChallengeSession, SessionRegistry, SharedSession};
