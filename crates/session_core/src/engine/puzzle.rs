//! Turn-based piece-movement engine over a bounded grid.
//!
//! Tracks a move history with undo: `MovePiece` appends after a bounds
//! check, `UndoMove` pops the most recent move. Undoing an empty history is
//! a rule error, not a no-op.

use crate::engine::{EngineCommand, EngineSnapshot, GameEngine};
use crate::errors::EngineError;
use crate::events::DomainEvent;
use crate::providers::Clock;
use crate::session::{GameType, Session};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Commands the puzzle engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleCommand {
    MovePiece {
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    },
    UndoMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Pos,
    pub to: Pos,
}

/// Engine-internal puzzle state: grid dimensions and the move history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleState {
    pub width: i32,
    pub height: i32,
    pub history: Vec<Move>,
}

impl PuzzleState {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            history: Vec::new(),
        }
    }
}

/// Piece-movement engine. Fresh instances start on a 4x4 grid; a stored
/// snapshot restores whatever dimensions the session was created with.
pub struct PuzzleEngine {
    clock: Arc<dyn Clock>,
    state: PuzzleState,
}

impl PuzzleEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: PuzzleState::new(4, 4),
        }
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.state.width && y >= 0 && y < self.state.height
    }

    fn move_piece(
        &mut self,
        session: &Session,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    ) -> Result<Vec<DomainEvent>, EngineError> {
        // Legality check happens before any state mutation.
        if !self.in_bounds(from_x, from_y) || !self.in_bounds(to_x, to_y) {
            return Err(EngineError::Rule(format!(
                "move ({from_x},{from_y})->({to_x},{to_y}) is outside the {}x{} grid",
                self.state.width, self.state.height
            )));
        }

        self.state.history.push(Move {
            from: Pos { x: from_x, y: from_y },
            to: Pos { x: to_x, y: to_y },
        });

        Ok(vec![DomainEvent::PieceMoved {
            session_id: session.id.clone(),
            from_x,
            from_y,
            to_x,
            to_y,
            occurred_at: self.clock.now_millis(),
        }])
    }

    fn undo_move(&mut self, session: &Session) -> Result<Vec<DomainEvent>, EngineError> {
        if self.state.history.pop().is_none() {
            return Err(EngineError::Rule("nothing to undo".to_string()));
        }

        Ok(vec![DomainEvent::MoveUndone {
            session_id: session.id.clone(),
            occurred_at: self.clock.now_millis(),
        }])
    }
}

impl GameEngine for PuzzleEngine {
    fn game_type(&self) -> GameType {
        GameType::Puzzle
    }

    fn apply(
        &mut self,
        session: &Session,
        command: &EngineCommand,
    ) -> Result<(Session, Vec<DomainEvent>), EngineError> {
        let EngineCommand::Puzzle(cmd) = command else {
            return Err(EngineError::WrongEngine);
        };

        let events = match cmd {
            PuzzleCommand::MovePiece {
                from_x,
                from_y,
                to_x,
                to_y,
            } => self.move_piece(session, *from_x, *from_y, *to_x, *to_y)?,
            PuzzleCommand::UndoMove => self.undo_move(session)?,
        };

        Ok((session.clone(), events))
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot::Puzzle(self.state.clone())
    }

    fn restore(&mut self, snapshot: EngineSnapshot) -> Result<(), EngineError> {
        match snapshot {
            EngineSnapshot::Puzzle(state) => {
                self.state = state;
                Ok(())
            }
            _ => Err(EngineError::SnapshotMismatch {
                expected: GameType::Puzzle,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::trivia::TriviaState;
    use crate::providers::FixedClock;
    use crate::session::{PlayerId, SessionId};

    fn engine() -> PuzzleEngine {
        PuzzleEngine::new(Arc::new(FixedClock(1_000)))
    }

    fn session() -> Session {
        Session::new(
            SessionId::from("s-1"),
            GameType::Puzzle,
            vec![PlayerId::from("alice")],
            500,
            "default".to_string(),
        )
    }

    fn move_cmd(from: (i32, i32), to: (i32, i32)) -> EngineCommand {
        EngineCommand::Puzzle(PuzzleCommand::MovePiece {
            from_x: from.0,
            from_y: from.1,
            to_x: to.0,
            to_y: to.1,
        })
    }

    #[test]
    fn move_inside_grid_records_history_and_emits_event() {
        let mut engine = engine();
        let session = session();

        let (next, events) = engine.apply(&session, &move_cmd((0, 0), (1, 1))).unwrap();

        assert_eq!(next, session);
        assert_eq!(
            events,
            vec![DomainEvent::PieceMoved {
                session_id: session.id.clone(),
                from_x: 0,
                from_y: 0,
                to_x: 1,
                to_y: 1,
                occurred_at: 1_000,
            }]
        );
        let EngineSnapshot::Puzzle(state) = engine.snapshot() else {
            panic!("expected puzzle snapshot");
        };
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn out_of_bounds_move_is_rejected_before_mutation() {
        let mut engine = engine();
        let session = session();

        let err = engine
            .apply(&session, &move_cmd((0, 0), (4, 4)))
            .unwrap_err();
        assert!(matches!(err, EngineError::Rule(_)));

        let EngineSnapshot::Puzzle(state) = engine.snapshot() else {
            panic!("expected puzzle snapshot");
        };
        assert!(state.history.is_empty());
    }

    #[test]
    fn undo_pops_exactly_the_most_recent_move() {
        let mut engine = engine();
        let session = session();
        engine.apply(&session, &move_cmd((0, 0), (1, 1))).unwrap();
        engine.apply(&session, &move_cmd((1, 1), (2, 2))).unwrap();

        let (_, events) = engine
            .apply(&session, &EngineCommand::Puzzle(PuzzleCommand::UndoMove))
            .unwrap();
        assert!(matches!(events[0], DomainEvent::MoveUndone { .. }));

        let EngineSnapshot::Puzzle(state) = engine.snapshot() else {
            panic!("expected puzzle snapshot");
        };
        assert_eq!(
            state.history,
            vec![Move {
                from: Pos { x: 0, y: 0 },
                to: Pos { x: 1, y: 1 },
            }]
        );
    }

    #[test]
    fn undo_on_empty_history_errors_and_changes_nothing() {
        let mut engine = engine();
        let session = session();

        let err = engine
            .apply(&session, &EngineCommand::Puzzle(PuzzleCommand::UndoMove))
            .unwrap_err();
        assert!(matches!(err, EngineError::Rule(_)));

        let EngineSnapshot::Puzzle(state) = engine.snapshot() else {
            panic!("expected puzzle snapshot");
        };
        assert!(state.history.is_empty());
    }

    #[test]
    fn apply_does_not_mutate_the_input_session() {
        let mut engine = engine();
        let session = session();
        let before = session.clone();

        engine.apply(&session, &move_cmd((0, 0), (1, 1))).unwrap();
        assert_eq!(session, before);
    }

    #[test]
    fn wrong_command_family_is_rejected() {
        let mut engine = engine();
        let err = engine
            .apply(
                &session(),
                &EngineCommand::Trivia(crate::engine::trivia::TriviaCommand::RevealHint),
            )
            .unwrap_err();
        assert_eq!(err, EngineError::WrongEngine);
    }

    #[test]
    fn restoring_a_trivia_snapshot_fails_loudly() {
        let mut engine = engine();
        let err = engine
            .restore(EngineSnapshot::Trivia(TriviaState::new()))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::SnapshotMismatch {
                expected: GameType::Puzzle,
            }
        );
    }

    #[test]
    fn snapshot_is_a_value_copy_not_a_live_reference() {
        let mut engine = engine();
        let session = session();
        engine.apply(&session, &move_cmd((0, 0), (1, 1))).unwrap();

        let taken = engine.snapshot();
        engine.apply(&session, &move_cmd((1, 1), (2, 2))).unwrap();

        let EngineSnapshot::Puzzle(state) = taken else {
            panic!("expected puzzle snapshot");
        };
        assert_eq!(state.history.len(), 1);
    }
}
