//! The state-machine contract every game type satisfies.
//!
//! An engine is a pure command-application function over its own internal
//! state plus injected providers: `apply` maps (session, command) to a new
//! session value and a list of domain events. Engines that keep internal
//! substate expose it through `snapshot`/`restore` as a typed value the rest
//! of the system treats as opaque.

pub mod puzzle;
pub mod trivia;

use crate::errors::EngineError;
use crate::events::DomainEvent;
use crate::session::{GameType, Session};
use serde::{Deserialize, Serialize};

pub use puzzle::{PuzzleCommand, PuzzleEngine, PuzzleState};
pub use trivia::{TriviaCommand, TriviaEngine, TriviaState};

/// Engine command union, one family per game type.
///
/// The dispatch service translates transport-independent [`crate::AppCommand`]
/// values into this union before calling an engine; an engine handed the
/// wrong family answers [`EngineError::WrongEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Puzzle(PuzzleCommand),
    Trivia(TriviaCommand),
}

/// Typed union of engine-internal state, stored alongside a session.
///
/// The store and dispatch service never look inside; only the engine family
/// that produced a snapshot may restore it. Offering a snapshot to the wrong
/// engine fails loudly rather than silently coercing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum EngineSnapshot {
    Puzzle(PuzzleState),
    Trivia(TriviaState),
}

/// The state-machine contract.
///
/// `apply` must be deterministic given the same session, command, and
/// injected providers, and must never mutate the input session - it returns
/// a new session value even when nothing changed.
pub trait GameEngine: Send {
    /// Static identity, used by the registry.
    fn game_type(&self) -> GameType;

    /// The single state-transition function.
    fn apply(
        &mut self,
        session: &Session,
        command: &EngineCommand,
    ) -> Result<(Session, Vec<DomainEvent>), EngineError>;

    /// Value copy of the engine's internal state for persistence.
    fn snapshot(&self) -> EngineSnapshot;

    /// Install a previously taken snapshot of the same engine kind.
    fn restore(&mut self, snapshot: EngineSnapshot) -> Result<(), EngineError>;
}
