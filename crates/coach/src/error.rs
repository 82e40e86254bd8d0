use chess_core::{Color, FenError};
use thiserror::Error;

/// Authoring errors in challenge definitions. These are fatal at load time:
/// a registry that fails validation is never handed to a session.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("challenge '{id}': invalid starting position: {source}")]
    InvalidFen {
        id: String,
        #[source]
        source: FenError,
    },
    #[error("challenge '{id}': starting position has {actual:?} to move but the learner plays {expected:?}")]
    WrongSideToMove {
        id: String,
        expected: Color,
        actual: Color,
    },
    #[error("challenge '{id}': the learner has no legal move in the starting position")]
    NoPlayerMoves { id: String },
    #[error("challenge '{id}': {reason}")]
    InvalidWinCondition { id: String, reason: &'static str },
    #[error("challenge id '{0}' is defined more than once")]
    DuplicateId(String),
    #[error("challenge id must not be empty")]
    EmptyId,
    #[error("failed to parse challenge file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
