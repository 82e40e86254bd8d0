//! One learner playing one challenge, and the per-key table that keeps
//! concurrent learners apart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chess_core::{Move, PieceKind};
use tracing::{debug, info};

use crate::bot::{Coach, Opponent};
use crate::config::ChallengeConfig;
use crate::engine::{attempt_promoting, parse_move_text, ChallengeState, Match, MoveResult, Rejection};
use crate::error::ConfigError;

/// A single match in progress. Owns its coach and the current [`Match`];
/// every move goes through [`attempt_promoting`].
pub struct ChallengeSession {
    config: Arc<ChallengeConfig>,
    current: Match,
    opponent: Box<dyn Opponent>,
    history: Vec<String>,
}

impl std::fmt::Debug for ChallengeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeSession")
            .field("challenge", &self.config.id)
            .field("opponent", &self.opponent.name())
            .field("current", &self.current)
            .field("history", &self.history)
            .finish()
    }
}

impl ChallengeSession {
    pub fn new(config: Arc<ChallengeConfig>, opponent: Box<dyn Opponent>) -> Result<Self, ConfigError> {
        let current = Match::start(&config)?;
        info!(target: "coach", id = %config.id, opponent = opponent.name(), "session started");
        Ok(Self {
            config,
            current,
            opponent,
            history: Vec::new(),
        })
    }

    /// A session whose coach replays the same choices for the same seed.
    pub fn seeded(config: Arc<ChallengeConfig>, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, Box::new(Coach::seeded(seed)))
    }

    pub fn fen(&self) -> String {
        self.current.fen()
    }

    pub fn state(&self) -> ChallengeState {
        self.current.state
    }

    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    /// The position and counters as they stand.
    pub fn snapshot(&self) -> &Match {
        &self.current
    }

    /// Learner and coach plies played so far, long algebraic.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn attempt_move(&mut self, from: u8, to: u8) -> MoveResult {
        self.play(from, to, None)
    }

    fn play(&mut self, from: u8, to: u8, promo: Option<PieceKind>) -> MoveResult {
        let (next, result) = attempt_promoting(
            &self.config,
            &self.current,
            from,
            to,
            promo,
            self.opponent.as_mut(),
        );
        if result.accepted {
            self.history.extend(
                [result.player_move, result.bot_move]
                    .into_iter()
                    .flatten()
                    .map(|m| m.to_uci()),
            );
        }
        self.current = next;
        result
    }

    /// Like [`attempt_move`](Self::attempt_move) for text such as `e2e4` or
    /// `e7e8n`. Text that does not parse is rejected as illegal.
    pub fn attempt_uci(&mut self, text: &str) -> MoveResult {
        let text = text.trim();
        match parse_move_text(text) {
            Some((from, to, promo)) => self.play(from, to, promo),
            None => {
                debug!(target: "coach", input = text, "unparseable move");
                let reason = if self.current.state.finished {
                    Rejection::AlreadyFinished
                } else {
                    Rejection::Illegal
                };
                MoveResult {
                    accepted: false,
                    rejection: Some(reason),
                    player_move: None,
                    player_fen: None,
                    bot_move: None,
                    bot_fen: None,
                    state: self.current.state,
                }
            }
        }
    }

    /// Legal moves from `square` in the current position, for highlighting.
    pub fn legal_moves(&self, square: u8) -> Vec<Move> {
        self.current.position.legal_moves_from(square)
    }

    pub fn is_player_turn(&self) -> bool {
        self.current.is_player_turn(self.config.player)
    }

    pub fn moves_remaining(&self) -> u32 {
        self.config
            .win
            .max_plies
            .saturating_sub(self.current.state.moves_played)
    }

    /// Closing copy once the match is over.
    pub fn closing_message(&self) -> Option<&str> {
        let state = &self.current.state;
        state.finished.then(|| self.config.narrative.closing(state))
    }
}

pub type SharedSession = Arc<Mutex<ChallengeSession>>;

/// Sessions by key. Each session sits behind its own lock, so requests for
/// one learner serialize while different learners never share an engine.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session` under `key`, replacing any earlier session there.
    pub fn insert(&self, key: impl Into<String>, session: ChallengeSession) -> SharedSession {
        let key = key.into();
        let shared = Arc::new(Mutex::new(session));
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if sessions.insert(key.clone(), Arc::clone(&shared)).is_some() {
            debug!(target: "coach", %key, "session replaced");
        }
        shared
    }

    pub fn get(&self, key: &str) -> Option<SharedSession> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(key).cloned()
    }

    /// Run `f` with exclusive access to the session under `key`.
    pub fn with_session<T>(&self, key: &str, f: impl FnOnce(&mut ChallengeSession) -> T) -> Option<T> {
        let shared = self.get(key)?;
        let mut session = shared.lock().unwrap_or_else(|e| e.into_inner());
        Some(f(&mut session))
    }

    /// Drop the session under `key`. Nothing else needs cleaning up.
    pub fn remove(&self, key: &str) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
