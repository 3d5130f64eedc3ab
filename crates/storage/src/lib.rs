use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use mentor_core::ChatSession;
use parking_lot::RwLock;

/// Session-scoped storage for conversation logs. Nothing outlives the
/// process; budgets and chat history are never persisted.
pub trait SessionRepository: Send + Sync {
    async fn load_session(&self, session_id: &str) -> Result<Option<ChatSession>>;
    async fn upsert_session(&self, session: &ChatSession) -> Result<()>;
    async fn drop_session(&self, session_id: &str) -> Result<bool>;

    /// Applies `mutate` to the stored session, inserting `seed()` first when
    /// the id is unknown. The whole read-modify-write happens atomically
    /// with respect to other callers of the same store.
    async fn mutate_session<Seed, Mutate, T>(
        &self,
        session_id: &str,
        seed: Seed,
        mutate: Mutate,
    ) -> Result<T>
    where
        Seed: FnOnce() -> ChatSession + Send,
        Mutate: FnOnce(&mut ChatSession) -> T + Send,
        T: Send;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, ChatSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl SessionRepository for MemoryStore {
    async fn load_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn upsert_session(&self, session: &ChatSession) -> Result<()> {
        self.sessions
            .write()
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn drop_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.sessions.write().remove(session_id).is_some())
    }

    async fn mutate_session<Seed, Mutate, T>(
        &self,
        session_id: &str,
        seed: Seed,
        mutate: Mutate,
    ) -> Result<T>
    where
        Seed: FnOnce() -> ChatSession + Send,
        Mutate: FnOnce(&mut ChatSession) -> T + Send,
        T: Send,
    {
        let mut sessions = self.sessions.write();
        let session = sessions.entry(session_id.to_string()).or_insert_with(seed);
        Ok(mutate(session))
    }
}

#[cfg(test)]
mod tests {
    use mentor_core::{ProfileType, Sender};

    use super::*;

    #[tokio::test]
    async fn upsert_then_load_round_trips() {
        let store = MemoryStore::new();
        let mut session = ChatSession::new("s1", Some(ProfileType::Student));
        session.append_message("hello".to_string(), Sender::User);

        store.upsert_session(&session).await.unwrap();

        let loaded = store.load_session("s1").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.profile, Some(ProfileType::Student));
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let store = MemoryStore::new();
        assert!(store.load_session("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn drop_session_reports_presence() {
        let store = MemoryStore::new();
        store
            .upsert_session(&ChatSession::new("s1", None))
            .await
            .unwrap();

        assert!(store.drop_session("s1").await.unwrap());
        assert!(!store.drop_session("s1").await.unwrap());
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn mutate_session_seeds_missing_sessions() {
        let store = MemoryStore::new();

        let count = store
            .mutate_session(
                "s1",
                || ChatSession::new("s1", Some(ProfileType::Student)),
                |session| {
                    session.append_message("hello".to_string(), Sender::User);
                    session.messages.len()
                },
            )
            .await
            .unwrap();
        assert_eq!(count, 1);

        // The seed is only for unknown ids; an existing session is mutated
        // in place.
        let count = store
            .mutate_session(
                "s1",
                || panic!("session already exists"),
                |session| session.messages.len(),
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.session_count(), 1);
    }
}
