//! Challenge definitions and the registry that validates them.
//!
//! Challenges are authored data: a starting position, which side the learner
//! plays, the coach's profile, what counts as a win, and the copy shown
//! around the match. They are loaded and validated once at startup, then
//! shared read-only (`Arc`) by every session that plays them.
//!
//! The built-in set lives in `challenges.toml` next to this crate's manifest:
//!
//! ```toml
//! [[challenge]]
//! id = "guard-the-queen"
//! level = 0
//! fen = "3qk3/ppp5/8/8/8/8/PPP5/3QK3 w - - 0 1"
//! player = "white"
//! opponent = "naive"
//! win = { kind = "captures", target = 3, maxPlies = 15 }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chess_core::{Color, Position};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bot::BotProfile;
use crate::engine::{ChallengeState, FailReason};
use crate::error::ConfigError;

const BUILTIN_CHALLENGES: &str = include_str!("../challenges.toml");

/// What the learner has to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WinKind {
    /// Capture at least `target` opposing pieces.
    Captures,
    /// Reach a material score of at least `target`.
    MaterialLead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinCondition {
    pub kind: WinKind,
    pub target: i32,
    /// Learner plies allowed before the match times out.
    pub max_plies: u32,
}

impl WinCondition {
    pub fn is_met(&self, state: &ChallengeState) -> bool {
        match self.kind {
            WinKind::Captures => i64::from(state.captures_by_player) >= i64::from(self.target),
            WinKind::MaterialLead => state.material_score >= self.target,
        }
    }
}

/// Copy shown before and after the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub title: String,
    pub briefing: String,
    pub success: String,
    pub failure: String,
    /// Overrides `failure` when the match ends on a hung queen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queen_blunder: Option<String>,
    /// Overrides `failure` when the learner runs out of moves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl Narrative {
    /// The closing line for a finished match.
    pub fn closing(&self, state: &ChallengeState) -> &str {
        match state.fail_reason {
            None => &self.success,
            Some(FailReason::QueenBlunder) => self.queen_blunder.as_deref().unwrap_or(&self.failure),
            Some(FailReason::Timeout) => self.timeout.as_deref().unwrap_or(&self.failure),
            Some(_) => &self.failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeConfig {
    pub id: String,
    /// Skill tier. Level 0 is the entry lesson, where hanging the queen is
    /// its own failure.
    pub level: u8,
    pub fen: String,
    pub player: Color,
    pub opponent: BotProfile,
    pub win: WinCondition,
    pub narrative: Narrative,
}

impl ChallengeConfig {
    pub fn coach_color(&self) -> Color {
        self.player.other()
    }

    pub fn is_entry_level(&self) -> bool {
        self.level == 0
    }

    /// Parse the starting position and check it against the rest of the
    /// definition.
    pub fn start_position(&self) -> Result<Position, ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyId);
        }
        let pos = Position::from_fen(&self.fen).map_err(|source| ConfigError::InvalidFen {
            id: self.id.clone(),
            source,
        })?;
        if pos.side_to_move() != self.player {
            return Err(ConfigError::WrongSideToMove {
                id: self.id.clone(),
                expected: self.player,
                actual: pos.side_to_move(),
            });
        }
        if !pos.has_legal_moves() {
            return Err(ConfigError::NoPlayerMoves {
                id: self.id.clone(),
            });
        }
        let bad_win = |reason| ConfigError::InvalidWinCondition {
            id: self.id.clone(),
            reason,
        };
        if self.win.max_plies == 0 {
            return Err(bad_win("maxPlies must be at least 1"));
        }
        if self.win.target <= 0 {
            return Err(bad_win("target must be positive"));
        }
        Ok(pos)
    }
}

#[derive(Debug, Deserialize)]
struct ChallengeFile {
    #[serde(default, rename = "challenge")]
    challenges: Vec<ChallengeConfig>,
}

/// Every challenge the application can start, validated up front.
#[derive(Debug, Clone, Default)]
pub struct ChallengeRegistry {
    challenges: Vec<Arc<ChallengeConfig>>,
}

impl ChallengeRegistry {
    /// Validate all definitions and build the registry. Fails on the first
    /// bad definition or duplicate id.
    pub fn new(configs: Vec<ChallengeConfig>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for cfg in &configs {
            cfg.start_position()?;
            if !seen.insert(cfg.id.clone()) {
                return Err(ConfigError::DuplicateId(cfg.id.clone()));
            }
            debug!(target: "coach", id = %cfg.id, level = cfg.level, "challenge validated");
        }
        let mut challenges: Vec<_> = configs.into_iter().map(Arc::new).collect();
        challenges.sort_by_key(|c| c.level);
        info!(target: "coach", count = challenges.len(), "challenge registry ready");
        Ok(Self { challenges })
    }

    /// The challenges shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_CHALLENGES)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let file: ChallengeFile = toml::from_str(src)?;
        Self::new(file.challenges)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ChallengeConfig>> {
        self.challenges.iter().find(|c| c.id == id).cloned()
    }

    /// Challenges ordered by level, authoring order within a level.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ChallengeConfig>> {
        self.challenges.iter()
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}
