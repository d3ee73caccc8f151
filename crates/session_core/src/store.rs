//! Session storage contract and the in-memory implementation.
//!
//! The store keeps the session aggregate together with an opaque engine
//! snapshot it never interprets. Absence of a session is a `None`, not an
//! error - callers branch on it explicitly.

use crate::engine::EngineSnapshot;
use crate::errors::StoreError;
use crate::session::{Session, SessionId};
use async_trait::async_trait;
use dashmap::DashMap;

/// Durable-ish keyed storage for session aggregates plus engine snapshots.
///
/// Implementations must be safe for concurrent use from multiple connections
/// and must serialize saves for the same session key. A save is all-or-nothing
/// from the caller's point of view: no load ever observes a session without
/// its matching snapshot.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(
        &self,
        session: &Session,
        snapshot: Option<EngineSnapshot>,
    ) -> Result<(), StoreError>;

    async fn load(
        &self,
        id: &SessionId,
    ) -> Result<Option<(Session, Option<EngineSnapshot>)>, StoreError>;
}

/// Thread-safe in-memory store for development and tests.
///
/// Not persistent. Saves to the same key are last-write-wins; a durable
/// implementation wanting optimistic concurrency lives behind the same trait.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: DashMap<SessionId, (Session, Option<EngineSnapshot>)>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(
        &self,
        session: &Session,
        snapshot: Option<EngineSnapshot>,
    ) -> Result<(), StoreError> {
        self.entries
            .insert(session.id.clone(), (session.clone(), snapshot));
        Ok(())
    }

    async fn load(
        &self,
        id: &SessionId,
    ) -> Result<Option<(Session, Option<EngineSnapshot>)>, StoreError> {
        Ok(self.entries.get(id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::puzzle::PuzzleState;
    use crate::session::{GameType, PlayerId};

    fn session(id: &str) -> Session {
        Session::new(
            SessionId::from(id),
            GameType::Puzzle,
            vec![PlayerId::from("alice")],
            1_000,
            "default".to_string(),
        )
    }

    #[tokio::test]
    async fn load_after_save_round_trips_session_and_snapshot() {
        let store = MemorySessionStore::new();
        let saved = session("s-1");
        let snapshot = EngineSnapshot::Puzzle(PuzzleState::new(4, 4));

        store.save(&saved, Some(snapshot.clone())).await.unwrap();
        let (loaded, loaded_snapshot) = store
            .load(&SessionId::from("s-1"))
            .await
            .unwrap()
            .expect("session should exist");

        assert_eq!(loaded, saved);
        assert_eq!(loaded_snapshot, Some(snapshot));
    }

    #[tokio::test]
    async fn missing_session_is_none_not_an_error() {
        let store = MemorySessionStore::new();
        let loaded = store.load(&SessionId::from("nope")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_entry() {
        let store = MemorySessionStore::new();
        let mut s = session("s-1");
        store.save(&s, None).await.unwrap();

        s.player_ids.push(PlayerId::from("bob"));
        store.save(&s, None).await.unwrap();

        let (loaded, _) = store
            .load(&SessionId::from("s-1"))
            .await
            .unwrap()
            .expect("session should exist");
        assert_eq!(loaded.player_ids.len(), 2);
        assert_eq!(store.len(), 1);
    }
}
