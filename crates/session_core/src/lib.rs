//! # Session Core - Domain and Dispatch Layer
//!
//! This crate holds everything the Parlor gateway needs that is not transport:
//! the session aggregate, the per-game-type engines, and the command dispatch
//! service that glues them to storage and event publication.
//!
//! ## Architecture
//!
//! * **Session** - The write-side aggregate for one game instance
//! * **Engines** - Pure state machines (`GameEngine`) selected per game type
//! * **Engine Registry** - Explicit engine lookup; absence is always `None`
//! * **Session Store** - Keyed storage contract plus an in-memory implementation
//! * **Event Sink** - Fire-and-forget domain event publication
//! * **Providers** - Injected clock, id, and randomness seams for determinism
//! * **Game Service** - The dispatch core: load, select, apply, persist, publish
//!
//! ## Design Philosophy
//!
//! Engines never touch storage or the network; the dispatch service never
//! interprets game rules. Everything that makes behavior nondeterministic
//! (time, ids, randomness) is injected, so the whole crate tests without a
//! runtime clock or socket in sight.

pub mod commands;
pub mod engine;
pub mod errors;
pub mod events;
pub mod providers;
pub mod registry;
pub mod service;
pub mod session;
pub mod sink;
pub mod store;

pub use commands::AppCommand;
pub use engine::{EngineCommand, EngineSnapshot, GameEngine};
pub use errors::{DispatchError, EngineError, SinkError, StoreError};
pub use events::DomainEvent;
pub use providers::{Clock, IdGenerator, RandomSource, SystemClock, ThreadRandom, UuidIds};
pub use registry::EngineRegistry;
pub use service::GameService;
pub use session::{GameType, PlayerId, Session, SessionId, SessionStatus};
pub use sink::{EventSink, NullSink};
pub use store::{MemorySessionStore, SessionStore};
