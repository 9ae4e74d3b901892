//! Character presence and per-stream read cursors (component F, spec §4.F).
//!
//! One character can hold several live connections at once (multiple
//! clients attached to the same character). The manager tracks both the
//! set of open connections and, independently, how far each stream has
//! been read — reconnecting does not reset a cursor.

pub mod error;

use std::collections::{HashMap, HashSet};

pub use error::{Error, Result};
use holomush_common::Identifier;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct CharacterState {
    connections: HashSet<Identifier>,
    cursors: HashMap<String, Identifier>,
}

/// Presence and cursor bookkeeping for every character known to a running
/// server. Cheap to clone — clones share the same underlying table.
#[derive(Clone, Default)]
pub struct SessionManager {
    characters: std::sync::Arc<RwLock<HashMap<Identifier, CharacterState>>>,
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new live connection for `character_id`.
    pub async fn connect(&self, character_id: Identifier, connection_id: Identifier) {
        let mut characters = self.characters.write().await;
        characters.entry(character_id).or_default().connections.insert(connection_id);
    }

    /// Remove a connection. The character's cursors and remaining
    /// connections, if any, are left untouched.
    pub async fn disconnect(&self, character_id: Identifier, connection_id: Identifier) {
        let mut characters = self.characters.write().await;
        if let Some(state) = characters.get_mut(&character_id) {
            state.connections.remove(&connection_id);
        }
    }

    pub async fn is_online(&self, character_id: Identifier) -> bool {
        self.characters
            .read()
            .await
            .get(&character_id)
            .is_some_and(|state| !state.connections.is_empty())
    }

    pub async fn connection_count(&self, character_id: Identifier) -> usize {
        self.characters
            .read()
            .await
            .get(&character_id)
            .map_or(0, |state| state.connections.len())
    }

    /// Record the last event id a character has consumed on `stream`.
    ///
    /// Monotone: the stored cursor becomes `max(prior, id)`, so an update
    /// delivered out of order (e.g. a replay racing a live event) can never
    /// move a cursor backwards.
    pub async fn set_cursor(&self, character_id: Identifier, stream: impl Into<String>, id: Identifier) {
        let mut characters = self.characters.write().await;
        let cursor = characters.entry(character_id).or_default().cursors.entry(stream.into()).or_insert(id);
        if id > *cursor {
            *cursor = id;
        }
    }

    /// The cursor for `(character_id, stream)`, or `None` if the character
    /// has never read that stream.
    pub async fn cursor(&self, character_id: Identifier, stream: &str) -> Option<Identifier> {
        self.characters.read().await.get(&character_id)?.cursors.get(stream).copied()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connecting_marks_a_character_online() {
        let manager = SessionManager::new();
        let character = Identifier::new();
        let connection = Identifier::new();

        assert!(!manager.is_online(character).await);
        manager.connect(character, connection).await;
        assert!(manager.is_online(character).await);
    }

    #[tokio::test]
    async fn a_character_stays_online_while_any_connection_remains() {
        let manager = SessionManager::new();
        let character = Identifier::new();
        let (a, b) = (Identifier::new(), Identifier::new());

        manager.connect(character, a).await;
        manager.connect(character, b).await;
        manager.disconnect(character, a).await;

        assert!(manager.is_online(character).await);
        assert_eq!(manager.connection_count(character).await, 1);

        manager.disconnect(character, b).await;
        assert!(!manager.is_online(character).await);
    }

    #[tokio::test]
    async fn cursor_survives_disconnect_and_reconnect() {
        let manager = SessionManager::new();
        let character = Identifier::new();
        let connection = Identifier::new();
        let cursor_id = Identifier::new();

        manager.connect(character, connection).await;
        manager.set_cursor(character, "location:1", cursor_id).await;
        manager.disconnect(character, connection).await;

        assert_eq!(manager.cursor(character, "location:1").await, Some(cursor_id));
    }

    #[tokio::test]
    async fn unknown_character_has_no_cursor() {
        let manager = SessionManager::new();
        assert_eq!(manager.cursor(Identifier::new(), "location:1").await, None);
    }
}
