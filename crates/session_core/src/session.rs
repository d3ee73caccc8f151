//! Core session types.
//!
//! The session is the write-side aggregate for one game instance: who is
//! playing, which engine owns it, and where it is in its lifecycle. Wrapper
//! types keep session and player identifiers from being confused with each
//! other or with plain strings.

use serde::{Deserialize, Serialize};

/// Unique identifier for a game session.
///
/// Opaque to everything except the id generator that minted it. Assigned at
/// creation and immutable for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The game family that owns a session.
///
/// Set exactly once at creation. A session whose type is `Unspecified`
/// cannot receive commands; no engine will ever claim it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    #[default]
    Unspecified,
    Trivia,
    Puzzle,
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameType::Unspecified => "unspecified",
            GameType::Trivia => "trivia",
            GameType::Puzzle => "puzzle",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle status of a session.
///
/// Sessions are `Created` at construction. Transitions past `Created` are
/// owned by callers outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Unspecified,
    Created,
    Active,
    Ended,
    Cancelled,
}

/// The write-side aggregate root for one game instance.
///
/// `id` and `game_type` never change after creation. `player_ids` is ordered
/// with the host first; it may grow via join operations handled elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub game_type: GameType,
    pub player_ids: Vec<PlayerId>,
    pub status: SessionStatus,
    /// Creation time in epoch milliseconds, taken from the injected clock.
    pub created_at: u64,
    /// Opaque reference to an externally defined ruleset.
    pub ruleset_id: String,
}

impl Session {
    pub fn new(
        id: SessionId,
        game_type: GameType,
        player_ids: Vec<PlayerId>,
        created_at: u64,
        ruleset_id: String,
    ) -> Self {
        Self {
            id,
            game_type,
            player_ids,
            status: SessionStatus::Created,
            created_at,
            ruleset_id,
        }
    }
}

/// Ruleset parameters for trivia sessions.
///
/// Referenced by `ruleset_id`; carried here as a value object so callers can
/// validate a ruleset before wiring it to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriviaRules {
    pub num_questions: u32,
    pub seconds_per_question: u32,
    pub negative_marking: bool,
    pub categories: Vec<String>,
    pub max_players: u32,
}

impl TriviaRules {
    pub fn game_type(&self) -> GameType {
        GameType::Trivia
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_questions == 0 {
            return Err("trivia ruleset needs at least one question".to_string());
        }
        if self.max_players == 0 {
            return Err("trivia ruleset needs at least one player slot".to_string());
        }
        Ok(())
    }
}

/// Ruleset parameters for puzzle sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleRules {
    pub difficulty: String,
    pub allow_hints: bool,
    pub time_limit_seconds: u32,
    pub max_players: u32,
}

impl PuzzleRules {
    pub fn game_type(&self) -> GameType {
        GameType::Puzzle
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_players == 0 {
            return Err("puzzle ruleset needs at least one player slot".to_string());
        }
        Ok(())
    }
}
