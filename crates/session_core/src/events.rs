//! Domain events produced by engines and the dispatch service.
//!
//! Events are immutable facts: a stable name, an occurrence timestamp, and
//! event-specific fields. They carry no behavior. The enum is closed on
//! purpose - translation at the transport boundary matches exhaustively, so
//! adding a variant without wiring it up fails to compile.

use crate::session::{PlayerId, Session, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum DomainEvent {
    /// A new session was created and persisted.
    #[serde(rename = "session.started")]
    SessionStarted { session: Session, occurred_at: u64 },

    /// A puzzle piece moved between two in-bounds positions.
    #[serde(rename = "puzzle.piece_moved")]
    PieceMoved {
        session_id: SessionId,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
        occurred_at: u64,
    },

    /// The most recent puzzle move was undone.
    #[serde(rename = "puzzle.move_undone")]
    MoveUndone {
        session_id: SessionId,
        occurred_at: u64,
    },

    /// A trivia answer was accepted and scored.
    #[serde(rename = "trivia.answer_accepted")]
    AnswerAccepted {
        session_id: SessionId,
        player_id: PlayerId,
        delta: i64,
        total: i64,
        occurred_at: u64,
    },

    /// A trivia hint was revealed to the session.
    #[serde(rename = "trivia.hint_revealed")]
    HintRevealed {
        session_id: SessionId,
        hint: String,
        occurred_at: u64,
    },
}

impl DomainEvent {
    /// Stable event name, also used as the sink topic.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::SessionStarted { .. } => "session.started",
            DomainEvent::PieceMoved { .. } => "puzzle.piece_moved",
            DomainEvent::MoveUndone { .. } => "puzzle.move_undone",
            DomainEvent::AnswerAccepted { .. } => "trivia.answer_accepted",
            DomainEvent::HintRevealed { .. } => "trivia.hint_revealed",
        }
    }

    /// When the event happened, in epoch milliseconds from the injected clock.
    pub fn occurred_at(&self) -> u64 {
        match self {
            DomainEvent::SessionStarted { occurred_at, .. }
            | DomainEvent::PieceMoved { occurred_at, .. }
            | DomainEvent::MoveUndone { occurred_at, .. }
            | DomainEvent::AnswerAccepted { occurred_at, .. }
            | DomainEvent::HintRevealed { occurred_at, .. } => *occurred_at,
        }
    }
}
