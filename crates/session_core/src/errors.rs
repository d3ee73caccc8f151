//! Error taxonomy for the dispatch boundary.
//!
//! Every failure that can cross from the dispatch core to the gateway is
//! classified here first. The gateway turns a `DispatchError` into an error
//! envelope using its stable wire code; it never sees raw engine or store
//! internals.

use crate::session::{GameType, SessionId};
use thiserror::Error;

/// Errors produced by a game engine while applying a command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The command belongs to a different game family than this engine.
    #[error("command addressed to the wrong engine")]
    WrongEngine,

    /// The engine recognizes the family but not this command shape.
    #[error("unsupported command")]
    UnsupportedCommand,

    /// A snapshot from another engine kind was offered for restore.
    #[error("snapshot does not belong to the {expected} engine")]
    SnapshotMismatch { expected: GameType },

    /// A domain rule rejected the command. Expected and recoverable.
    #[error("{0}")]
    Rule(String),
}

/// Errors from the session store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Errors from the event sink.
///
/// Publish failures never fail a command; the dispatch service logs them
/// and moves on. The type exists so sinks report something richer than a
/// bare string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    #[error("event publish failed: {0}")]
    Publish(String),
}

/// The classified error surface of the dispatch core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// The envelope carried a command without a session identifier.
    #[error("command is missing a session id")]
    MissingSessionId,

    /// A start-session request named no players.
    #[error("start request names no host player")]
    MissingHost,

    /// The addressed session does not exist.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The session exists but was created without a game type.
    #[error("session {0} has no game type")]
    SessionTypeUnset(SessionId),

    /// No engine is registered for the session's game type.
    #[error("no engine registered for game type {0}")]
    EngineNotFound(GameType),

    /// The command shape is not recognized by the owning engine.
    #[error("unsupported command for this session")]
    UnsupportedCommand,

    /// The command belongs to a different game family.
    #[error("command does not apply to a {expected} session")]
    WrongEngine { expected: GameType },

    /// A stored snapshot could not be restored into the selected engine.
    #[error("stored snapshot does not match the {expected} engine")]
    SnapshotMismatch { expected: GameType },

    /// A domain rule rejected the command.
    #[error("{0}")]
    Rule(String),

    /// The store failed to load or save.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// Stable wire code reported to clients. Never derived from `Display`
    /// output, so messages can change without breaking clients.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::MissingSessionId => "MISSING_SESSION_ID",
            DispatchError::MissingHost => "MISSING_HOST",
            DispatchError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            DispatchError::SessionTypeUnset(_) => "SESSION_TYPE_UNSET",
            DispatchError::EngineNotFound(_) => "ENGINE_NOT_FOUND",
            DispatchError::UnsupportedCommand => "UNSUPPORTED_COMMAND",
            DispatchError::WrongEngine { .. } => "WRONG_ENGINE",
            DispatchError::SnapshotMismatch { .. } => "SNAPSHOT_MISMATCH",
            DispatchError::Rule(_) => "RULE_VIOLATION",
            DispatchError::Store(_) => "STORAGE_ERROR",
        }
    }

    /// Classify an engine failure for a session of the given type.
    pub fn from_engine(err: EngineError, expected: GameType) -> Self {
        match err {
            EngineError::WrongEngine => DispatchError::WrongEngine { expected },
            EngineError::UnsupportedCommand => DispatchError::UnsupportedCommand,
            EngineError::SnapshotMismatch { expected } => {
                DispatchError::SnapshotMismatch { expected }
            }
            EngineError::Rule(msg) => DispatchError::Rule(msg),
        }
    }
}
