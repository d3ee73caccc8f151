//! Mapping between wire envelope bodies and dispatch-core types.
//!
//! This is the only module that knows both vocabularies. Command extraction
//! is partial (event bodies and unknown bodies yield `None`); event
//! translation is total and matches exhaustively, so a new domain event
//! without a wire form fails to compile here.

use crate::protocol::{Envelope, EnvelopeBody};
use session_core::{AppCommand, DomainEvent, GameType, PlayerId, SessionId};

/// Parses a wire game type string. Unrecognized names map to
/// `Unspecified`, mirroring how unknown enum values decode elsewhere on
/// the wire; the session then exists but refuses commands until fixed.
pub fn game_type_from_wire(name: &str) -> GameType {
    match name {
        "puzzle" => GameType::Puzzle,
        "trivia" => GameType::Trivia,
        _ => GameType::Unspecified,
    }
}

/// Extracts the addressed session id from a command body.
pub fn session_id_from_body(body: &EnvelopeBody) -> Option<SessionId> {
    match body {
        EnvelopeBody::MovePiece { session_id, .. }
        | EnvelopeBody::UndoMove { session_id }
        | EnvelopeBody::SubmitAnswer { session_id, .. }
        | EnvelopeBody::RevealHint { session_id } => Some(SessionId::from(session_id.as_str())),
        _ => None,
    }
}

/// Translates a command body into a dispatch-core command. Event bodies,
/// errors, and unknown bodies are not commands and yield `None`.
pub fn command_from_body(body: &EnvelopeBody) -> Option<AppCommand> {
    match body {
        EnvelopeBody::MovePiece {
            from_x,
            from_y,
            to_x,
            to_y,
            ..
        } => Some(AppCommand::MovePiece {
            from_x: *from_x,
            from_y: *from_y,
            to_x: *to_x,
            to_y: *to_y,
        }),
        EnvelopeBody::UndoMove { .. } => Some(AppCommand::UndoMove),
        EnvelopeBody::SubmitAnswer {
            player_id, answer, ..
        } => Some(AppCommand::SubmitAnswer {
            player_id: PlayerId::from(player_id.as_str()),
            answer: answer.clone(),
        }),
        EnvelopeBody::RevealHint { .. } => Some(AppCommand::RevealHint),
        _ => None,
    }
}

/// Renders one domain event as a wire envelope echoing the triggering
/// request's correlation id.
pub fn envelope_from_event(correlation_id: &str, event: &DomainEvent) -> Envelope {
    let body = match event {
        DomainEvent::SessionStarted {
            session,
            occurred_at,
        } => EnvelopeBody::SessionStarted {
            session: session.clone(),
            occurred_at: *occurred_at,
        },
        DomainEvent::PieceMoved {
            session_id,
            from_x,
            from_y,
            to_x,
            to_y,
            occurred_at,
        } => EnvelopeBody::PieceMoved {
            session_id: session_id.as_str().to_string(),
            from_x: *from_x,
            from_y: *from_y,
            to_x: *to_x,
            to_y: *to_y,
            occurred_at: *occurred_at,
        },
        DomainEvent::MoveUndone {
            session_id,
            occurred_at,
        } => EnvelopeBody::MoveUndone {
            session_id: session_id.as_str().to_string(),
            occurred_at: *occurred_at,
        },
        DomainEvent::AnswerAccepted {
            session_id,
            player_id,
            delta,
            total,
            occurred_at,
        } => EnvelopeBody::AnswerAccepted {
            session_id: session_id.as_str().to_string(),
            player_id: player_id.as_str().to_string(),
            delta: *delta,
            total: *total,
            occurred_at: *occurred_at,
        },
        DomainEvent::HintRevealed {
            session_id,
            hint,
            occurred_at,
        } => EnvelopeBody::HintRevealed {
            session_id: session_id.as_str().to_string(),
            hint: hint.clone(),
            occurred_at: *occurred_at,
        },
    };

    Envelope::new(correlation_id, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_type_names_parse_and_unknown_falls_back() {
        assert_eq!(game_type_from_wire("puzzle"), GameType::Puzzle);
        assert_eq!(game_type_from_wire("trivia"), GameType::Trivia);
        assert_eq!(game_type_from_wire("chess"), GameType::Unspecified);
    }

    #[test]
    fn command_bodies_carry_their_session_id() {
        let body = EnvelopeBody::RevealHint {
            session_id: "s-7".into(),
        };
        assert_eq!(session_id_from_body(&body), Some(SessionId::from("s-7")));
        assert_eq!(session_id_from_body(&EnvelopeBody::Unknown), None);
    }

    #[test]
    fn event_bodies_are_not_commands() {
        let body = EnvelopeBody::MoveUndone {
            session_id: "s-7".into(),
            occurred_at: 1,
        };
        assert_eq!(command_from_body(&body), None);
        assert_eq!(command_from_body(&EnvelopeBody::Unknown), None);
    }

    #[test]
    fn answer_accepted_event_becomes_an_envelope_with_the_request_id() {
        let event = DomainEvent::AnswerAccepted {
            session_id: SessionId::from("s-1"),
            player_id: PlayerId::from("alice"),
            delta: 10,
            total: 20,
            occurred_at: 99,
        };

        let envelope = envelope_from_event("req-9", &event);
        assert_eq!(envelope.correlation_id, "req-9");
        assert_eq!(
            envelope.body,
            Some(EnvelopeBody::AnswerAccepted {
                session_id: "s-1".into(),
                player_id: "alice".into(),
                delta: 10,
                total: 20,
                occurred_at: 99,
            })
        );
    }
}
