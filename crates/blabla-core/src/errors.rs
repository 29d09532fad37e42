use std::path::PathBuf;

use crate::schema::DecodeError;
use crate::transport::SessionState;

/// Core error type for the bot.
///
/// Adapter crates map their specific failures into this type so the poll loop
/// can classify every failure the same way (recover vs terminate).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("http status {status} ({reason}) for {operation}")]
    Transport {
        operation: String,
        status: u16,
        reason: String,
    },

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("identity mismatch: expected bot named {expected:?}, got {found}")]
    IdentityMismatch { expected: String, found: String },

    #[error("cursor store error: {path}: {reason}")]
    Store { path: PathBuf, reason: String },

    #[error("{operation} is not allowed while the session is {state}")]
    SessionState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("external error: {0}")]
    External(String),
}

/// Connection-level break in the middle of an exchange.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The caller cancelled the exchange (abort handle or forced session abort).
    #[error("connection aborted")]
    Aborted,

    /// The peer went away: reset, closed mid-response, or a stuck request timed out.
    #[error("connection reset: {reason}")]
    Reset { reason: String },
}

impl Error {
    /// A quiet peer disconnect is the only failure the poll loop recovers from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Connection(ConnectionError::Reset { .. }))
    }

    pub fn store(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Error::Store {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
