//! The coach's move choice.
//!
//! The coach looks exactly one ply ahead and keeps no memory between moves.
//! Its mistakes are deliberate and calibrated: with a fixed probability it
//! leaves a piece where the learner can take it for free. All randomness
//! comes from the `Rng` passed in, so a seeded generator replays the same
//! match move for move.

use std::cmp::Reverse;

use chess_core::{Move, PieceKind, Position};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::eval::{is_hanging, is_square_defended, piece_value};

/// Chance that the coach makes its profile's deliberate mistake on a move.
pub const MISTAKE_PROBABILITY: f64 = 0.30;

/// How the coach plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotProfile {
    /// Entry level: sometimes pushes a pawn or the queen onto a square the
    /// learner can take for free, otherwise plays a random safe move.
    Naive,
    /// Intermediate: takes any free piece it sees, sometimes hangs a knight
    /// or bishop, otherwise plays a random safe move.
    Opportunistic,
}

/// Pick the coach's move in `pos`, the side to move being the coach.
/// Returns `None` only when there is no legal move.
pub fn decide<R: Rng + ?Sized>(pos: &Position, profile: BotProfile, rng: &mut R) -> Option<Move> {
    let moves = pos.legal_moves();
    if moves.is_empty() {
        return None;
    }
    match profile {
        BotProfile::Naive => decide_naive(pos, &moves, rng),
        BotProfile::Opportunistic => decide_opportunistic(pos, &moves, rng),
    }
}

fn decide_naive<R: Rng + ?Sized>(pos: &Position, moves: &[Move], rng: &mut R) -> Option<Move> {
    if rng.gen_bool(MISTAKE_PROBABILITY) {
        let gifts = hanging_moves(pos, moves, &[PieceKind::Pawn, PieceKind::Queen]);
        if let Some(&mv) = gifts.choose(rng) {
            debug!(target: "coach", mv = %mv, "naive coach leaves a gift");
            return Some(mv);
        }
    }
    safe_or_any(pos, moves, rng)
}

fn decide_opportunistic<R: Rng + ?Sized>(pos: &Position, moves: &[Move], rng: &mut R) -> Option<Move> {
    if let Some(mv) = best_free_capture(pos, moves) {
        debug!(target: "coach", mv = %mv, "opportunistic coach takes a free piece");
        return Some(mv);
    }
    if rng.gen_bool(MISTAKE_PROBABILITY) {
        let gifts = hanging_moves(pos, moves, &[PieceKind::Knight, PieceKind::Bishop]);
        if let Some(&mv) = gifts.choose(rng) {
            debug!(target: "coach", mv = %mv, "opportunistic coach hangs a minor piece");
            return Some(mv);
        }
    }
    safe_or_any(pos, moves, rng)
}

/// The most valuable capture the learner cannot answer by recapturing.
/// Ties go to the earlier move in generation order.
pub fn best_free_capture(pos: &Position, moves: &[Move]) -> Option<Move> {
    let learner = pos.side_to_move().other();
    let mut grabs: Vec<(i32, Move)> = moves
        .iter()
        .filter_map(|&m| {
            let victim = m.captured?;
            let next = pos.apply_move(m).ok()?;
            (!is_square_defended(&next, m.to, learner)).then_some((piece_value(victim), m))
        })
        .collect();
    // Stable sort keeps generation order among equal values.
    grabs.sort_by_key(|&(value, _)| Reverse(value));
    grabs.first().map(|&(_, m)| m)
}

/// Moves by one of `kinds` that leave the moved piece hanging.
pub fn hanging_moves(pos: &Position, moves: &[Move], kinds: &[PieceKind]) -> Vec<Move> {
    moves
        .iter()
        .copied()
        .filter(|m| {
            pos.piece_at(m.from)
                .is_some_and(|pc| kinds.contains(&pc.kind))
        })
        .filter(|m| leaves_hanging(pos, m))
        .collect()
}

/// A move is unsafe when it puts the mover's queen or king on a hanging square.
pub fn is_safe(pos: &Position, mv: &Move) -> bool {
    match pos.piece_at(mv.from).map(|pc| pc.kind) {
        Some(PieceKind::Queen | PieceKind::King) => !leaves_hanging(pos, mv),
        _ => true,
    }
}

fn leaves_hanging(pos: &Position, mv: &Move) -> bool {
    let mover = pos.side_to_move();
    match pos.apply_move(*mv) {
        Ok(next) => is_hanging(&next, mv.to, mover),
        Err(_) => false,
    }
}

fn safe_or_any<R: Rng + ?Sized>(pos: &Position, moves: &[Move], rng: &mut R) -> Option<Move> {
    let safe: Vec<Move> = moves.iter().copied().filter(|m| is_safe(pos, m)).collect();
    let pool = if safe.is_empty() { moves } else { &safe[..] };
    pool.choose(rng).copied()
}

/// Anything that can answer the learner's move. The engine calls `reply`
/// exactly once per coach ply.
pub trait Opponent: Send {
    fn reply(&mut self, pos: &Position, profile: BotProfile) -> Option<Move>;

    fn name(&self) -> &str {
        "Coach"
    }
}

/// The production opponent: [`decide`] driven by its own generator.
#[derive(Debug, Clone)]
pub struct Coach<R = StdRng> {
    rng: R,
}

impl<R: Rng> Coach<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl Coach<StdRng> {
    /// Reproducible coach; the same seed plays the same replies.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> Opponent for Coach<R> {
    fn reply(&mut self, pos: &Position, profile: BotProfile) -> Option<Move> {
        decide(pos, profile, &mut self.rng)
    }
}

/// Plays recorded replies in order, for replaying a transcript.
///
/// When the script runs out, or a recorded reply is not legal in the
/// position reached, it falls back to the first legal move.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    replies: Vec<String>,
    next: usize,
    repeat: bool,
}

impl Scripted {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            next: 0,
            repeat: false,
        }
    }

    /// Start again from the first reply when the script is used up.
    pub fn cycle<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repeat: true,
            ..Self::new(replies)
        }
    }
}

impl Opponent for Scripted {
    fn reply(&mut self, pos: &Position, _profile: BotProfile) -> Option<Move> {
        if self.repeat && !self.replies.is_empty() {
            self.next %= self.replies.len();
        }
        let recorded = self.replies.get(self.next).and_then(|txt| pos.parse_uci_move(txt));
        self.next += 1;
        if recorded.is_none() {
            warn!(target: "coach", fen = %pos.to_fen(), "scripted reply unavailable, playing first legal move");
        }
        recorded.or_else(|| pos.legal_moves().first().copied())
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}
