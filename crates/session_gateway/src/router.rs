//! Envelope routing onto the dispatch core.
//!
//! The router owns no connection state and no game rules. It inspects one
//! decoded envelope, picks the operation (start a session, dispatch a
//! command, or ignore), and renders the resulting events as response
//! envelopes that all echo the request's correlation id.

use crate::protocol::{Envelope, EnvelopeBody};
use crate::translate;
use session_core::{DispatchError, DomainEvent, GameService, PlayerId};
use std::sync::Arc;
use tracing::debug;

pub struct Router {
    service: Arc<GameService>,
}

impl Router {
    pub fn new(service: Arc<GameService>) -> Self {
        Self { service }
    }

    /// Routes one envelope. Returns the ordered response envelopes to write
    /// back on this connection; an empty list means the envelope required no
    /// reply (missing body, unknown body, or an event echoed by a confused
    /// client).
    ///
    /// A `DispatchError` is a per-envelope failure - the caller reports it
    /// and keeps the connection alive.
    pub async fn route(&self, envelope: &Envelope) -> Result<Vec<Envelope>, DispatchError> {
        let Some(body) = &envelope.body else {
            debug!(correlation_id = %envelope.correlation_id, "envelope without body ignored");
            return Ok(Vec::new());
        };

        match body {
            EnvelopeBody::StartSession {
                host_player_id,
                game_type,
                ruleset_id,
            } => {
                self.handle_start(
                    &envelope.correlation_id,
                    host_player_id,
                    game_type,
                    ruleset_id,
                )
                .await
            }
            _ => match translate::command_from_body(body) {
                Some(command) => {
                    let session_id = translate::session_id_from_body(body)
                        .filter(|id| !id.as_str().is_empty())
                        .ok_or(DispatchError::MissingSessionId)?;

                    let events = self.service.handle_command(session_id, command).await?;
                    Ok(self.render(&envelope.correlation_id, &events))
                }
                None => {
                    debug!(correlation_id = %envelope.correlation_id, "non-command envelope ignored");
                    Ok(Vec::new())
                }
            },
        }
    }

    async fn handle_start(
        &self,
        correlation_id: &str,
        host_player_id: &str,
        game_type: &str,
        ruleset_id: &str,
    ) -> Result<Vec<Envelope>, DispatchError> {
        if host_player_id.is_empty() {
            return Err(DispatchError::MissingHost);
        }

        // The response renders the exact event list the service published,
        // so clients and the sink see the same timestamps.
        let (_, events) = self
            .service
            .start_session(
                PlayerId::from(host_player_id),
                translate::game_type_from_wire(game_type),
                ruleset_id.to_string(),
            )
            .await?;

        Ok(self.render(correlation_id, &events))
    }

    /// One response envelope per event, in event order.
    fn render(&self, correlation_id: &str, events: &[DomainEvent]) -> Vec<Envelope> {
        events
            .iter()
            .map(|event| translate::envelope_from_event(correlation_id, event))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_core::providers::{FixedRandom, SequenceClock, SequenceIds};
    use session_core::{EngineRegistry, GameType, MemorySessionStore, NullSink, SessionStatus};

    fn router() -> Router {
        let clock = Arc::new(SequenceClock::new(vec![100, 101, 102, 103]));
        let engines = Arc::new(EngineRegistry::new(clock.clone(), Arc::new(FixedRandom(0))));
        let service = Arc::new(GameService::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(NullSink),
            clock,
            Arc::new(SequenceIds::new(vec!["sess-1"])),
            engines,
        ));
        Router::new(service)
    }

    fn start_envelope(host: &str, game_type: &str) -> Envelope {
        Envelope::new(
            "req-start",
            EnvelopeBody::StartSession {
                host_player_id: host.into(),
                game_type: game_type.into(),
                ruleset_id: "default".into(),
            },
        )
    }

    #[tokio::test]
    async fn start_responds_with_the_created_session() {
        let router = router();
        let responses = router.route(&start_envelope("alice", "trivia")).await.unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].correlation_id, "req-start");
        let Some(EnvelopeBody::SessionStarted { session, .. }) = &responses[0].body else {
            panic!("expected session_started");
        };
        assert_eq!(session.id.as_str(), "sess-1");
        assert_eq!(session.game_type, GameType::Trivia);
        assert_eq!(session.status, SessionStatus::Created);
    }

    #[tokio::test]
    async fn start_without_a_host_is_rejected() {
        let router = router();
        let err = router.route(&start_envelope("", "trivia")).await.unwrap_err();
        assert_eq!(err, DispatchError::MissingHost);
    }

    #[tokio::test]
    async fn command_responses_echo_the_correlation_id() {
        let router = router();
        router.route(&start_envelope("alice", "trivia")).await.unwrap();

        let envelope = Envelope::new(
            "req-answer",
            EnvelopeBody::SubmitAnswer {
                session_id: "sess-1".into(),
                player_id: "alice".into(),
                answer: "42".into(),
            },
        );
        let responses = router.route(&envelope).await.unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].correlation_id, "req-answer");
        assert!(matches!(
            responses[0].body,
            Some(EnvelopeBody::AnswerAccepted { delta: 10, total: 10, .. })
        ));
    }

    #[tokio::test]
    async fn command_with_empty_session_id_is_rejected() {
        let router = router();
        let envelope = Envelope::new(
            "req-x",
            EnvelopeBody::UndoMove {
                session_id: String::new(),
            },
        );
        let err = router.route(&envelope).await.unwrap_err();
        assert_eq!(err, DispatchError::MissingSessionId);
    }

    #[tokio::test]
    async fn bodyless_unknown_and_event_envelopes_are_ignored() {
        let router = router();

        let bodyless = Envelope {
            correlation_id: "req-a".into(),
            body: None,
        };
        assert!(router.route(&bodyless).await.unwrap().is_empty());

        let unknown = Envelope::new("req-b", EnvelopeBody::Unknown);
        assert!(router.route(&unknown).await.unwrap().is_empty());

        let echoed_event = Envelope::new(
            "req-c",
            EnvelopeBody::MoveUndone {
                session_id: "sess-1".into(),
                occurred_at: 5,
            },
        );
        assert!(router.route(&echoed_event).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rule_violations_surface_as_dispatch_errors() {
        let router = router();
        router.route(&start_envelope("alice", "puzzle")).await.unwrap();

        let envelope = Envelope::new(
            "req-undo",
            EnvelopeBody::UndoMove {
                session_id: "sess-1".into(),
            },
        );
        let err = router.route(&envelope).await.unwrap_err();
        assert_eq!(err.code(), "RULE_VIOLATION");
    }
}
