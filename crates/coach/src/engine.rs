//! The challenge turn cycle as a pure transition.
//!
//! [`attempt`] takes the current [`Match`] and a learner move and returns the
//! next `Match` together with a [`MoveResult`]. It never mutates its input,
//! so a rejected move hands back an identical match and any match can be
//! replayed from its config and a move list.

use chess_core::{coord_to_sq, Color, Move, PieceKind, Position};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bot::Opponent;
use crate::config::ChallengeConfig;
use crate::error::ConfigError;
use crate::eval::{exposed_score, is_net_blunder, is_queen_blunder, material_score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailReason {
    /// Level 0: the queen was left where the coach could take her for free.
    QueenBlunder,
    /// A single move exposed three or more points of material.
    Blunder,
    /// The learner used up the move allowance without winning.
    Timeout,
    /// The coach mated the learner.
    Checkmated,
    /// Nobody can move and nobody is in check.
    Stalemate,
}

/// Why a move was not played. Rejections leave the match untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rejection {
    AlreadyFinished,
    NotPlayerTurn,
    Illegal,
}

/// Per-match counters and outcome.
///
/// Once `finished` is set the state never changes again. When finished,
/// `pass == Some(true)` exactly when `fail_reason` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeState {
    /// Learner plies only; coach replies are not counted.
    pub moves_played: u32,
    pub captures_by_player: u32,
    /// Learner material minus coach material.
    pub material_score: i32,
    pub blundered: bool,
    pub queen_blundered: bool,
    pub finished: bool,
    pub pass: Option<bool>,
    pub fail_reason: Option<FailReason>,
}

impl ChallengeState {
    fn finish_pass(&mut self) {
        debug_assert!(!self.finished);
        self.finished = true;
        self.pass = Some(true);
        self.fail_reason = None;
    }

    fn finish_fail(&mut self, reason: FailReason) {
        debug_assert!(!self.finished);
        self.finished = true;
        self.pass = Some(false);
        self.fail_reason = Some(reason);
        match reason {
            FailReason::QueenBlunder => {
                self.blundered = true;
                self.queen_blundered = true;
            }
            FailReason::Blunder => self.blundered = true,
            _ => {}
        }
    }
}

/// Everything a match needs between moves: the position and the counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub position: Position,
    pub state: ChallengeState,
}

impl Match {
    /// The opening position of `config`, with fresh counters.
    pub fn start(config: &ChallengeConfig) -> Result<Self, ConfigError> {
        let position = config.start_position()?;
        let state = ChallengeState {
            material_score: material_score(&position, config.player),
            ..ChallengeState::default()
        };
        Ok(Self { position, state })
    }

    pub fn fen(&self) -> String {
        self.position.to_fen()
    }

    pub fn is_player_turn(&self, player: Color) -> bool {
        !self.state.finished && self.position.side_to_move() == player
    }
}

/// What one call to [`attempt`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_move: Option<Move>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_fen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_move: Option<Move>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_fen: Option<String>,
    pub state: ChallengeState,
}

impl MoveResult {
    fn rejected(reason: Rejection, state: ChallengeState) -> Self {
        Self {
            accepted: false,
            rejection: Some(reason),
            player_move: None,
            player_fen: None,
            bot_move: None,
            bot_fen: None,
            state,
        }
    }

    /// The position after everything this call played.
    pub fn final_fen(&self) -> Option<&str> {
        self.bot_fen.as_deref().or(self.player_fen.as_deref())
    }
}

/// Play the learner's `from -> to`, judge it, and let the coach answer.
///
/// Termination is judged only after the learner's ply, first match wins:
/// queen blunder (level 0 only), net blunder, move allowance used up, win
/// condition met. The coach replies only while the match is still active.
/// A pawn reaching the last rank becomes a queen.
pub fn attempt(
    config: &ChallengeConfig,
    current: &Match,
    from: u8,
    to: u8,
    opponent: &mut dyn Opponent,
) -> (Match, MoveResult) {
    attempt_promoting(config, current, from, to, None, opponent)
}

/// [`attempt`] with the promotion piece chosen. A `Some` piece on a move
/// that does not promote is rejected as illegal.
pub fn attempt_promoting(
    config: &ChallengeConfig,
    current: &Match,
    from: u8,
    to: u8,
    promo: Option<PieceKind>,
    opponent: &mut dyn Opponent,
) -> (Match, MoveResult) {
    let reject = |reason: Rejection| {
        debug!(target: "coach", id = %config.id, from, to, ?reason, "move rejected");
        (current.clone(), MoveResult::rejected(reason, current.state))
    };

    if current.state.finished {
        return reject(Rejection::AlreadyFinished);
    }
    let player = config.player;
    let before = &current.position;
    if before.side_to_move() != player {
        return reject(Rejection::NotPlayerTurn);
    }
    let Some(mv) = before.find_promotion(from, to, promo) else {
        return reject(Rejection::Illegal);
    };
    let after = match before.apply_move(mv) {
        Ok(pos) => pos,
        Err(_) => return reject(Rejection::Illegal),
    };

    let mut state = current.state;
    let prev_score = state.material_score;
    state.moves_played += 1;
    if mv.is_capture() {
        state.captures_by_player += 1;
    }
    state.material_score = material_score(&after, player);

    if config.is_entry_level() && is_queen_blunder(before, &after, player, &mv) {
        state.finish_fail(FailReason::QueenBlunder);
    } else if is_net_blunder(prev_score, exposed_score(&after, player)) {
        state.finish_fail(FailReason::Blunder);
    } else if state.moves_played >= config.win.max_plies {
        state.finish_fail(FailReason::Timeout);
    } else if config.win.is_met(&state) {
        state.finish_pass();
    }
    debug!(
        target: "coach",
        id = %config.id,
        mv = %mv,
        moves_played = state.moves_played,
        score = state.material_score,
        "learner move accepted"
    );

    let mut result = MoveResult {
        accepted: true,
        rejection: None,
        player_move: Some(mv),
        player_fen: Some(after.to_fen()),
        bot_move: None,
        bot_fen: None,
        state,
    };

    let mut position = after;
    if !state.finished {
        match opponent.reply(&position, config.opponent) {
            Some(reply) => {
                position = position.apply_move(reply).unwrap_or_else(|e| {
                    panic!("{} produced {e} in {}", opponent.name(), position.to_fen())
                });
                state.material_score = material_score(&position, player);
                result.bot_move = Some(reply);
                result.bot_fen = Some(position.to_fen());
                if !position.has_legal_moves() {
                    state.finish_fail(if position.in_check(player) {
                        FailReason::Checkmated
                    } else {
                        FailReason::Stalemate
                    });
                }
            }
            None if position.in_check(config.coach_color()) => state.finish_pass(),
            None => state.finish_fail(FailReason::Stalemate),
        }
    }

    if state.finished {
        info!(
            target: "coach",
            id = %config.id,
            pass = ?state.pass,
            reason = ?state.fail_reason,
            moves_played = state.moves_played,
            "challenge finished"
        );
    }
    result.state = state;
    (Match { position, state }, result)
}

/// Split long algebraic text (`e2e4`, `e7e8n`) into squares and an optional
/// promotion piece. Anything else, including trailing characters, is `None`.
pub fn parse_move_text(text: &str) -> Option<(u8, u8, Option<PieceKind>)> {
    let text = text.trim();
    let from = coord_to_sq(text.get(0..2)?)?;
    let to = coord_to_sq(text.get(2..4)?)?;
    let promo = match text.get(4..)? {
        "" => None,
        suffix => {
            let mut chars = suffix.chars();
            let kind = chars.next().and_then(PieceKind::from_char)?;
            if chars.next().is_some() || matches!(kind, PieceKind::Pawn | PieceKind::King) {
                return None;
            }
            Some(kind)
        }
    };
    Some((from, to, promo))
}

/// Re-run a list of learner moves (long algebraic, e.g. `e2e4`) from the
/// start of `config`. Stops after the first rejected move, or before the
/// first one [`parse_move_text`] cannot read, returning the match as it
/// stood and every result so far.
pub fn replay<'a>(
    config: &ChallengeConfig,
    moves: impl IntoIterator<Item = &'a str>,
    opponent: &mut dyn Opponent,
) -> Result<(Match, Vec<MoveResult>), ConfigError> {
    let mut current = Match::start(config)?;
    let mut results = Vec::new();
    for text in moves {
        let Some((from, to, promo)) = parse_move_text(text) else {
            break;
        };
        let (next, result) = attempt_promoting(config, &current, from, to, promo, opponent);
        let accepted = result.accepted;
        current = next;
        results.push(result);
        if !accepted {
            break;
        }
    }
    Ok((current, results))
}
