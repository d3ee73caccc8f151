//! The command dispatch core.
//!
//! `GameService` executes one operation against one session end to end:
//! load, select engine, hydrate, apply, persist, publish, respond. There is
//! no internal retry - a failed step surfaces as a classified
//! [`DispatchError`] and the gateway reports it to the client.

use crate::commands::AppCommand;
use crate::engine::{EngineCommand, PuzzleCommand, TriviaCommand};
use crate::errors::DispatchError;
use crate::events::DomainEvent;
use crate::providers::{Clock, IdGenerator};
use crate::registry::EngineRegistry;
use crate::session::{GameType, PlayerId, Session, SessionId};
use crate::sink::EventSink;
use crate::store::SessionStore;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct GameService {
    store: Arc<dyn SessionStore>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    engines: Arc<EngineRegistry>,
}

impl GameService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        engines: Arc<EngineRegistry>,
    ) -> Self {
        Self {
            store,
            sink,
            clock,
            ids,
            engines,
        }
    }

    /// Creates and persists a new session with the host as its first player.
    ///
    /// Publishes `session.started` (best effort) and returns the created
    /// session together with the event list exactly as published, so the
    /// gateway responds with the same fact and timestamp the sink saw.
    pub async fn start_session(
        &self,
        host: PlayerId,
        game_type: GameType,
        ruleset_id: String,
    ) -> Result<(Session, Vec<DomainEvent>), DispatchError> {
        let session = Session::new(
            SessionId::from(self.ids.generate()),
            game_type,
            vec![host],
            self.clock.now_millis(),
            ruleset_id,
        );

        self.store.save(&session, None).await?;
        debug!(session_id = %session.id, game_type = %session.game_type, "session created");

        let events = vec![DomainEvent::SessionStarted {
            session: session.clone(),
            occurred_at: self.clock.now_millis(),
        }];
        self.publish_all(&events).await;

        Ok((session, events))
    }

    /// Applies one command to one session, strict order:
    /// load, type check, engine select, hydrate, translate, apply, persist,
    /// publish. Returns the full ordered event list; the gateway decides how
    /// to fan it out.
    pub async fn handle_command(
        &self,
        session_id: SessionId,
        command: AppCommand,
    ) -> Result<Vec<DomainEvent>, DispatchError> {
        let Some((session, snapshot)) = self.store.load(&session_id).await? else {
            return Err(DispatchError::SessionNotFound(session_id));
        };

        if session.game_type == GameType::Unspecified {
            return Err(DispatchError::SessionTypeUnset(session_id));
        }

        // Engine absence for a known type is a configuration error, never
        // silently dropped.
        let Some(mut engine) = self.engines.create(session.game_type) else {
            return Err(DispatchError::EngineNotFound(session.game_type));
        };

        if let Some(snapshot) = snapshot {
            engine
                .restore(snapshot)
                .map_err(|e| DispatchError::from_engine(e, session.game_type))?;
        }

        let engine_command = translate_command(session.game_type, &command)?;

        let (next, events) = engine
            .apply(&session, &engine_command)
            .map_err(|e| DispatchError::from_engine(e, session.game_type))?;

        // Session and snapshot persist together; no load of this key can see
        // one without the other.
        self.store.save(&next, Some(engine.snapshot())).await?;

        self.publish_all(&events).await;

        Ok(events)
    }

    /// Publishes events in order. Failures are logged and swallowed: the
    /// state is already committed, and events are notifications, not part of
    /// the consistency boundary.
    async fn publish_all(&self, events: &[DomainEvent]) {
        for event in events {
            let payload = match serde_json::to_value(event) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(topic = event.name(), error = %e, "failed to serialize event");
                    continue;
                }
            };
            if let Err(e) = self.sink.publish(event.name(), payload).await {
                warn!(topic = event.name(), error = %e, "event publish failed; continuing");
            }
        }
    }
}

/// Translates an application command into the engine family that owns the
/// session's type. A command from the other family is a wrong-engine error,
/// distinct from a shape the engine does not recognize.
fn translate_command(
    game_type: GameType,
    command: &AppCommand,
) -> Result<EngineCommand, DispatchError> {
    match game_type {
        GameType::Puzzle => match command {
            AppCommand::MovePiece {
                from_x,
                from_y,
                to_x,
                to_y,
            } => Ok(EngineCommand::Puzzle(PuzzleCommand::MovePiece {
                from_x: *from_x,
                from_y: *from_y,
                to_x: *to_x,
                to_y: *to_y,
            })),
            AppCommand::UndoMove => Ok(EngineCommand::Puzzle(PuzzleCommand::UndoMove)),
            AppCommand::SubmitAnswer { .. } | AppCommand::RevealHint => {
                Err(DispatchError::WrongEngine {
                    expected: GameType::Puzzle,
                })
            }
        },
        GameType::Trivia => match command {
            AppCommand::SubmitAnswer { player_id, answer } => {
                Ok(EngineCommand::Trivia(TriviaCommand::SubmitAnswer {
                    player_id: player_id.clone(),
                    answer: answer.clone(),
                }))
            }
            AppCommand::RevealHint => Ok(EngineCommand::Trivia(TriviaCommand::RevealHint)),
            AppCommand::MovePiece { .. } | AppCommand::UndoMove => {
                Err(DispatchError::WrongEngine {
                    expected: GameType::Trivia,
                })
            }
        },
        GameType::Unspecified => Err(DispatchError::UnsupportedCommand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SinkError;
    use crate::providers::{FixedRandom, SequenceClock, SequenceIds};
    use crate::session::SessionStatus;
    use crate::store::MemorySessionStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Sink double that records everything it is asked to publish.
    #[derive(Default)]
    struct CollectingSink {
        published: Mutex<Vec<(String, serde_json::Value)>>,
    }

    #[async_trait]
    impl EventSink for CollectingSink {
        async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), SinkError> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
            Ok(())
        }
    }

    /// Sink double that fails every publish.
    struct FailingSink;

    #[async_trait]
    impl EventSink for FailingSink {
        async fn publish(
            &self,
            _topic: &str,
            _payload: serde_json::Value,
        ) -> Result<(), SinkError> {
            Err(SinkError::Publish("broker unreachable".to_string()))
        }
    }

    struct Fixture {
        service: GameService,
        store: Arc<MemorySessionStore>,
        sink: Arc<CollectingSink>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemorySessionStore::new());
        let sink = Arc::new(CollectingSink::default());
        let clock = Arc::new(SequenceClock::new(vec![1_000, 1_001, 1_002, 1_003, 1_004]));
        let ids = Arc::new(SequenceIds::new(vec!["sess-1", "sess-2"]));
        let engines = Arc::new(EngineRegistry::new(clock.clone(), Arc::new(FixedRandom(0))));
        let service = GameService::new(
            store.clone(),
            sink.clone(),
            clock,
            ids,
            engines,
        );
        Fixture {
            service,
            store,
            sink,
        }
    }

    #[tokio::test]
    async fn start_session_persists_host_and_created_status() {
        let fx = fixture();

        let (session, events) = fx
            .service
            .start_session(PlayerId::from("alice"), GameType::Trivia, "default".into())
            .await
            .unwrap();

        assert_eq!(session.id, SessionId::from("sess-1"));
        assert_eq!(session.player_ids, vec![PlayerId::from("alice")]);
        assert_eq!(session.status, SessionStatus::Created);
        assert_eq!(session.created_at, 1_000);
        assert_eq!(events.len(), 1);

        let (stored, snapshot) = fx
            .store
            .load(&session.id)
            .await
            .unwrap()
            .expect("session stored");
        assert_eq!(stored, session);
        assert!(snapshot.is_none());

        let published = fx.sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "session.started");
    }

    #[tokio::test]
    async fn start_session_returns_the_event_it_published() {
        let fx = fixture();

        let (_, events) = fx
            .service
            .start_session(PlayerId::from("alice"), GameType::Trivia, "default".into())
            .await
            .unwrap();

        // The caller sees the same fact with the same timestamp the sink got;
        // no second clock reading sneaks in between publish and response.
        let published = fx.sink.published.lock().unwrap();
        assert_eq!(
            serde_json::to_value(&events[0]).unwrap(),
            published[0].1
        );
        let DomainEvent::SessionStarted { occurred_at, .. } = &events[0] else {
            panic!("expected session_started");
        };
        assert_eq!(published[0].1["occurred_at"], *occurred_at);
    }

    #[tokio::test]
    async fn trivia_scenario_scores_ten_then_twenty() {
        let fx = fixture();
        let (session, _) = fx
            .service
            .start_session(PlayerId::from("alice"), GameType::Trivia, "default".into())
            .await
            .unwrap();

        let answer = AppCommand::SubmitAnswer {
            player_id: PlayerId::from("alice"),
            answer: "42".to_string(),
        };

        let events = fx
            .service
            .handle_command(session.id.clone(), answer.clone())
            .await
            .unwrap();
        let DomainEvent::AnswerAccepted { delta, total, .. } = &events[0] else {
            panic!("expected answer_accepted");
        };
        assert_eq!((*delta, *total), (10, 10));

        let events = fx
            .service
            .handle_command(session.id.clone(), answer)
            .await
            .unwrap();
        let DomainEvent::AnswerAccepted { delta, total, .. } = &events[0] else {
            panic!("expected answer_accepted");
        };
        assert_eq!((*delta, *total), (10, 20));
    }

    #[tokio::test]
    async fn puzzle_scenario_move_undo_then_undo_fails() {
        let fx = fixture();
        let (session, _) = fx
            .service
            .start_session(PlayerId::from("host"), GameType::Puzzle, "default".into())
            .await
            .unwrap();

        let events = fx
            .service
            .handle_command(
                session.id.clone(),
                AppCommand::MovePiece {
                    from_x: 0,
                    from_y: 0,
                    to_x: 1,
                    to_y: 1,
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            events[0],
            DomainEvent::PieceMoved {
                from_x: 0,
                from_y: 0,
                to_x: 1,
                to_y: 1,
                ..
            }
        ));

        let events = fx
            .service
            .handle_command(session.id.clone(), AppCommand::UndoMove)
            .await
            .unwrap();
        assert!(matches!(events[0], DomainEvent::MoveUndone { .. }));

        let err = fx
            .service
            .handle_command(session.id.clone(), AppCommand::UndoMove)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RULE_VIOLATION");
    }

    #[tokio::test]
    async fn out_of_bounds_move_rejects_without_saving_history() {
        let fx = fixture();
        let (session, _) = fx
            .service
            .start_session(PlayerId::from("host"), GameType::Puzzle, "default".into())
            .await
            .unwrap();

        let err = fx
            .service
            .handle_command(
                session.id.clone(),
                AppCommand::MovePiece {
                    from_x: 0,
                    from_y: 0,
                    to_x: 9,
                    to_y: 9,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RULE_VIOLATION");

        // A failed apply never persists; undo still sees an empty history.
        let err = fx
            .service
            .handle_command(session.id, AppCommand::UndoMove)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RULE_VIOLATION");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let fx = fixture();
        let err = fx
            .service
            .handle_command(SessionId::from("ghost"), AppCommand::RevealHint)
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::SessionNotFound(SessionId::from("ghost")));
    }

    #[tokio::test]
    async fn session_without_a_type_is_rejected() {
        let fx = fixture();
        let session = Session::new(
            SessionId::from("untyped"),
            GameType::Unspecified,
            vec![PlayerId::from("alice")],
            1,
            String::new(),
        );
        fx.store.save(&session, None).await.unwrap();

        let err = fx
            .service
            .handle_command(session.id.clone(), AppCommand::RevealHint)
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::SessionTypeUnset(session.id));
    }

    #[tokio::test]
    async fn command_for_the_other_game_family_is_wrong_engine() {
        let fx = fixture();
        let (session, _) = fx
            .service
            .start_session(PlayerId::from("alice"), GameType::Trivia, "default".into())
            .await
            .unwrap();

        let err = fx
            .service
            .handle_command(session.id, AppCommand::UndoMove)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::WrongEngine {
                expected: GameType::Trivia,
            }
        );
    }

    #[tokio::test]
    async fn hint_history_survives_across_dispatches() {
        let fx = fixture();
        let (session, _) = fx
            .service
            .start_session(PlayerId::from("alice"), GameType::Trivia, "default".into())
            .await
            .unwrap();

        fx.service
            .handle_command(session.id.clone(), AppCommand::RevealHint)
            .await
            .unwrap();
        fx.service
            .handle_command(session.id.clone(), AppCommand::RevealHint)
            .await
            .unwrap();

        let (_, snapshot) = fx.store.load(&session.id).await.unwrap().unwrap();
        let Some(crate::engine::EngineSnapshot::Trivia(state)) = snapshot else {
            panic!("expected trivia snapshot");
        };
        assert_eq!(state.hints.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_answers_from_two_players_score_independently() {
        let store = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(SequenceClock::new(vec![1_000]));
        let engines = Arc::new(EngineRegistry::new(clock.clone(), Arc::new(FixedRandom(0))));
        let service = Arc::new(GameService::new(
            store.clone(),
            Arc::new(CollectingSink::default()),
            clock,
            Arc::new(SequenceIds::new(vec!["sess-1"])),
            engines,
        ));

        let (session, _) = service
            .start_session(PlayerId::from("alice"), GameType::Trivia, "default".into())
            .await
            .unwrap();

        let submit = |player: &str| {
            let service = service.clone();
            let session_id = session.id.clone();
            let command = AppCommand::SubmitAnswer {
                player_id: PlayerId::from(player),
                answer: "42".to_string(),
            };
            tokio::spawn(async move { service.handle_command(session_id, command).await })
        };

        let alice_task = submit("alice");
        let bob_task = submit("bob");
        let alice = alice_task.await.unwrap().unwrap();
        let bob = bob_task.await.unwrap().unwrap();

        // Each dispatch is serialized internally, so a player's first answer
        // always totals exactly one delta regardless of interleaving.
        for events in [&alice, &bob] {
            let DomainEvent::AnswerAccepted { delta, total, .. } = &events[0] else {
                panic!("expected answer_accepted");
            };
            assert_eq!((*delta, *total), (10, 10));
        }

        // The memory store is last-save-wins across dispatches: the surviving
        // snapshot holds whichever write landed last, and every score in it
        // is one clean delta, never a blend of both players' writes.
        let (_, snapshot) = store.load(&session.id).await.unwrap().unwrap();
        let Some(crate::engine::EngineSnapshot::Trivia(state)) = snapshot else {
            panic!("expected trivia snapshot");
        };
        assert!(!state.scores.is_empty() && state.scores.len() <= 2);
        for total in state.scores.values() {
            assert_eq!(*total, 10);
        }
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_the_command() {
        let store = Arc::new(MemorySessionStore::new());
        let clock = Arc::new(SequenceClock::new(vec![1_000]));
        let engines = Arc::new(EngineRegistry::new(clock.clone(), Arc::new(FixedRandom(0))));
        let service = GameService::new(
            store.clone(),
            Arc::new(FailingSink),
            clock,
            Arc::new(SequenceIds::new(vec!["sess-1"])),
            engines,
        );

        let (session, _) = service
            .start_session(PlayerId::from("alice"), GameType::Trivia, "default".into())
            .await
            .unwrap();

        let events = service
            .handle_command(session.id.clone(), AppCommand::RevealHint)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);

        // Committed despite the sink failing.
        assert!(store.load(&session.id).await.unwrap().is_some());
    }
}
