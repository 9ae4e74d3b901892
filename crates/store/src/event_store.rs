//! The append-only event log (component C, spec §4.C) — trait only, plus an
//! in-memory reference implementation for tests and standalone runs.

use std::collections::HashMap;

use async_trait::async_trait;
use holomush_common::{Event, Identifier, RequestContext};
use tokio::sync::Mutex;

use crate::error::Result;

/// Append-only log keyed by `(stream, id)`.
///
/// `last_event_id` returns `Ok(None)` for the "stream has no events yet"
/// sentinel rather than a magic identifier value.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, ctx: &RequestContext, event: Event) -> Result<()>;

    /// Events for `stream` strictly after `after`, ascending by id, capped
    /// at `limit`.
    async fn replay(
        &self,
        ctx: &RequestContext,
        stream: &str,
        after: Identifier,
        limit: usize,
    ) -> Result<Vec<Event>>;

    async fn last_event_id(&self, ctx: &RequestContext, stream: &str) -> Result<Option<Identifier>>;
}

/// Reference `EventStore` backed by an in-process map. Not a production
/// persistence layer — durability ends when the process exits.
#[derive(Default)]
pub struct InMemoryEventStore {
    streams: Mutex<HashMap<String, Vec<Event>>>,
}

impl InMemoryEventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, _ctx: &RequestContext, event: Event) -> Result<()> {
        let mut streams = self.streams.lock().await;
        streams.entry(event.stream.clone()).or_default().push(event);
        Ok(())
    }

    async fn replay(
        &self,
        _ctx: &RequestContext,
        stream: &str,
        after: Identifier,
        limit: usize,
    ) -> Result<Vec<Event>> {
        let streams = self.streams.lock().await;
        let events = streams
            .get(stream)
            .map(|events| {
                events
                    .iter()
                    .filter(|event| event.id > after)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(events)
    }

    async fn last_event_id(&self, _ctx: &RequestContext, stream: &str) -> Result<Option<Identifier>> {
        let streams = self.streams.lock().await;
        Ok(streams.get(stream).and_then(|events| events.last()).map(|event| event.id))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use holomush_common::{Actor, EventType};

    use super::*;

    fn event(stream: &str) -> Event {
        Event::new(stream, EventType::Say, Actor::character("c1"), b"{}".to_vec())
    }

    #[tokio::test]
    async fn append_then_replay_returns_events_strictly_after_cursor() {
        let store = InMemoryEventStore::new();
        let ctx = RequestContext::new();
        let e1 = event("location:1");
        let e2 = event("location:1");
        store.append(&ctx, e1.clone()).await.unwrap();
        store.append(&ctx, e2.clone()).await.unwrap();

        let replayed = store.replay(&ctx, "location:1", e1.id, 10).await.unwrap();
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].id, e2.id);
    }

    #[tokio::test]
    async fn replay_respects_limit() {
        let store = InMemoryEventStore::new();
        let ctx = RequestContext::new();
        for _ in 0..5 {
            store.append(&ctx, event("location:1")).await.unwrap();
        }
        let replayed = store.replay(&ctx, "location:1", Identifier::NIL, 2).await.unwrap();
        assert_eq!(replayed.len(), 2);
    }

    #[tokio::test]
    async fn last_event_id_is_none_for_empty_stream() {
        let store = InMemoryEventStore::new();
        let ctx = RequestContext::new();
        assert_eq!(store.last_event_id(&ctx, "location:1").await.unwrap(), None);

        let e = event("location:1");
        store.append(&ctx, e.clone()).await.unwrap();
        assert_eq!(store.last_event_id(&ctx, "location:1").await.unwrap(), Some(e.id));
    }
}
