//! Question-and-answer engine with cumulative scoring and a hint log.
//!
//! `SubmitAnswer` credits the answering player a fixed delta; `RevealHint`
//! appends to the revealed-hint log, so the log length never decreases.

use crate::engine::{EngineCommand, EngineSnapshot, GameEngine};
use crate::errors::EngineError;
use crate::events::DomainEvent;
use crate::providers::{Clock, RandomSource};
use crate::session::{GameType, PlayerId, Session};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Score credited for every accepted answer.
pub const ANSWER_SCORE_DELTA: i64 = 10;

// TODO: validate answers against the session's question set once rulesets
// carry question banks; every answer is accepted until then.
const HINT_POOL: &[&str] = &[
    "Think smaller.",
    "The first letter matters.",
    "It was already mentioned this round.",
    "Rhymes with the category name.",
];

/// Commands the trivia engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum TriviaCommand {
    SubmitAnswer { player_id: PlayerId, answer: String },
    RevealHint,
}

/// Engine-internal trivia state: per-player totals and revealed hints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriviaState {
    pub scores: HashMap<String, i64>,
    pub hints: Vec<String>,
}

impl TriviaState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct TriviaEngine {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    state: TriviaState,
}

impl TriviaEngine {
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            clock,
            random,
            state: TriviaState::new(),
        }
    }

    fn submit_answer(&mut self, session: &Session, player_id: &PlayerId) -> Vec<DomainEvent> {
        let total = self
            .state
            .scores
            .entry(player_id.as_str().to_string())
            .and_modify(|score| *score += ANSWER_SCORE_DELTA)
            .or_insert(ANSWER_SCORE_DELTA);

        vec![DomainEvent::AnswerAccepted {
            session_id: session.id.clone(),
            player_id: player_id.clone(),
            delta: ANSWER_SCORE_DELTA,
            total: *total,
            occurred_at: self.clock.now_millis(),
        }]
    }

    fn reveal_hint(&mut self, session: &Session) -> Vec<DomainEvent> {
        let hint = HINT_POOL[self.random.pick(HINT_POOL.len())].to_string();
        self.state.hints.push(hint.clone());

        vec![DomainEvent::HintRevealed {
            session_id: session.id.clone(),
            hint,
            occurred_at: self.clock.now_millis(),
        }]
    }
}

impl GameEngine for TriviaEngine {
    fn game_type(&self) -> GameType {
        GameType::Trivia
    }

    fn apply(
        &mut self,
        session: &Session,
        command: &EngineCommand,
    ) -> Result<(Session, Vec<DomainEvent>), EngineError> {
        let EngineCommand::Trivia(cmd) = command else {
            return Err(EngineError::WrongEngine);
        };

        let events = match cmd {
            TriviaCommand::SubmitAnswer { player_id, .. } => {
                self.submit_answer(session, player_id)
            }
            TriviaCommand::RevealHint => self.reveal_hint(session),
        };

        Ok((session.clone(), events))
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot::Trivia(self.state.clone())
    }

    fn restore(&mut self, snapshot: EngineSnapshot) -> Result<(), EngineError> {
        match snapshot {
            EngineSnapshot::Trivia(state) => {
                self.state = state;
                Ok(())
            }
            _ => Err(EngineError::SnapshotMismatch {
                expected: GameType::Trivia,
            }),
        }
    }
}
