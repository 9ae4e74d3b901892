//! RPC-level session table (component H, spec §4.H): maps an opaque
//! session id handed to a client back to the identity and connection it
//! was issued for.

use std::collections::HashMap;

use holomush_common::Identifier;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
pub struct SessionRecord {
    pub character_id: Identifier,
    pub connection_id: Identifier,
    pub location_id: Identifier,
}

/// One table per running server, shared across every connection task.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: std::sync::Arc<RwLock<HashMap<Identifier, SessionRecord>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session_id: Identifier, record: SessionRecord) {
        self.sessions.write().await.insert(session_id, record);
    }

    pub async fn get(&self, session_id: Identifier) -> Option<SessionRecord> {
        self.sessions.read().await.get(&session_id).copied()
    }

    pub async fn remove(&self, session_id: Identifier) -> Option<SessionRecord> {
        self.sessions.write().await.remove(&session_id)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = SessionStore::new();
        let session_id = Identifier::new();
        let record = SessionRecord {
            character_id: Identifier::new(),
            connection_id: Identifier::new(),
            location_id: Identifier::new(),
        };
        store.insert(session_id, record).await;
        let fetched = store.get(session_id).await.unwrap();
        assert_eq!(fetched.character_id, record.character_id);
    }

    #[tokio::test]
    async fn remove_clears_the_entry() {
        let store = SessionStore::new();
        let session_id = Identifier::new();
        store
            .insert(
                session_id,
                SessionRecord {
                    character_id: Identifier::new(),
                    connection_id: Identifier::new(),
                    location_id: Identifier::new(),
                },
            )
            .await;
        assert!(store.remove(session_id).await.is_some());
        assert!(store.get(session_id).await.is_none());
    }

    #[tokio::test]
    async fn unknown_session_is_none() {
        let store = SessionStore::new();
        assert!(store.get(Identifier::new()).await.is_none());
    }
}
