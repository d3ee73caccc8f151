//! Engine selection by game type.

use crate::engine::{GameEngine, PuzzleEngine, TriviaEngine};
use crate::providers::{Clock, RandomSource};
use crate::session::GameType;
use std::sync::Arc;

/// Builds the engine that owns a session's game type.
///
/// Returns `None` for `Unspecified` and for types with no registered engine,
/// so every caller handles absence explicitly instead of trusting a nullable
/// value. Engines are built fresh per dispatch and hydrated from the stored
/// snapshot; the registry itself holds only the injected providers.
pub struct EngineRegistry {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl EngineRegistry {
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self { clock, random }
    }

    pub fn create(&self, game_type: GameType) -> Option<Box<dyn GameEngine>> {
        match game_type {
            GameType::Puzzle => Some(Box::new(PuzzleEngine::new(self.clock.clone()))),
            GameType::Trivia => Some(Box::new(TriviaEngine::new(
                self.clock.clone(),
                self.random.clone(),
            ))),
            GameType::Unspecified => None,
        }
    }
}
