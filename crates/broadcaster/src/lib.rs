//! Per-stream pub/sub fan-out (component E, spec §4.E).
//!
//! A `Broadcaster` holds one bounded channel per subscriber. Publishing is
//! lossy by design: a subscriber that falls behind has events dropped rather
//! than stalling the publisher or every other subscriber on the stream.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use holomush_common::Event;
use tokio::sync::{mpsc, RwLock};
use tracing::warn;

/// Default bound on a subscriber's event queue. Past this, `broadcast` drops
/// the oldest-pending event for that subscriber rather than blocking.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

struct Subscription {
    id: u64,
    tx: mpsc::Sender<Event>,
}

/// A live subscription. Dropping it unregisters from the broadcaster.
pub struct SubscriberHandle {
    stream: String,
    id: u64,
    rx: mpsc::Receiver<Event>,
    broadcaster: Broadcaster,
}

impl SubscriberHandle {
    /// Receive the next event for this subscription, or `None` once the
    /// broadcaster side has been dropped.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    #[must_use]
    pub fn stream(&self) -> &str {
        &self.stream
    }
}

/// Dropping a handle without calling [`Broadcaster::unsubscribe`] first still
/// unregisters it, but only eventually — the removal runs on a detached task
/// since `Drop` can't be `async`. Callers that need the subscriber table to
/// reflect the removal before they proceed (as `holomush-server`'s
/// `Subscribe` does) must call `unsubscribe` explicitly and await it.
impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        let broadcaster = self.broadcaster.clone();
        let stream = std::mem::take(&mut self.stream);
        let id = self.id;
        tokio::spawn(async move {
            broadcaster.remove(&stream, id).await;
        });
    }
}

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Fan-out hub. Cheap to clone — clones share the same subscriber table.
#[derive(Clone, Default)]
pub struct Broadcaster {
    inner: std::sync::Arc<RwLock<HashMap<String, Vec<Subscription>>>>,
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber on `stream` with the default queue bound.
    pub async fn subscribe(&self, stream: impl Into<String>) -> SubscriberHandle {
        self.subscribe_with_capacity(stream, DEFAULT_QUEUE_CAPACITY).await
    }

    pub async fn subscribe_with_capacity(&self, stream: impl Into<String>, capacity: usize) -> SubscriberHandle {
        let stream = stream.into();
        let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let mut subscribers = self.inner.write().await;
        subscribers.entry(stream.clone()).or_default().push(Subscription { id, tx });

        SubscriberHandle {
            stream,
            id,
            rx,
            broadcaster: self.clone(),
        }
    }

    /// Remove `handle`'s registration and wait for the removal to land.
    /// Unlike the unregistration a dropped handle triggers, this returns
    /// only once `subscriber_count` reflects the change.
    pub async fn unsubscribe(&self, handle: &SubscriberHandle) {
        self.remove(&handle.stream, handle.id).await;
    }

    async fn remove(&self, stream: &str, id: u64) {
        let mut subscribers = self.inner.write().await;
        if let Some(subs) = subscribers.get_mut(stream) {
            subs.retain(|sub| sub.id != id);
            if subs.is_empty() {
                subscribers.remove(stream);
            }
        }
    }

    /// Deliver `event` to every current subscriber of `event.stream`. A
    /// subscriber whose queue is full has the event dropped for it; every
    /// other subscriber still receives it.
    pub async fn broadcast(&self, event: Event) {
        let subscribers = self.inner.read().await;
        let Some(subs) = subscribers.get(&event.stream) else {
            return;
        };
        for sub in subs {
            if let Err(mpsc::error::TrySendError::Full(_)) = sub.tx.try_send(event.clone()) {
                warn!(stream = %event.stream, subscriber = sub.id, "subscriber queue full, dropping event");
            }
        }
    }

    pub async fn subscriber_count(&self, stream: &str) -> usize {
        self.inner.read().await.get(stream).map_or(0, Vec::len)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use holomush_common::{Actor, EventType};

    use super::*;

    fn event(stream: &str) -> Event {
        Event::new(stream, EventType::Say, Actor::character("c1"), Vec::new())
    }

    #[tokio::test]
    async fn subscriber_receives_events_on_its_stream_only() {
        let broadcaster = Broadcaster::new();
        let mut a = broadcaster.subscribe("location:1").await;
        let mut b = broadcaster.subscribe("location:2").await;

        broadcaster.broadcast(event("location:1")).await;

        let received = a.recv().await.unwrap();
        assert_eq!(received.stream, "location:1");
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(20), b.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn multiple_subscribers_on_the_same_stream_all_get_the_event() {
        let broadcaster = Broadcaster::new();
        let mut a = broadcaster.subscribe("location:1").await;
        let mut b = broadcaster.subscribe("location:1").await;

        broadcaster.broadcast(event("location:1")).await;

        assert!(a.recv().await.is_some());
        assert!(b.recv().await.is_some());
    }

    #[tokio::test]
    async fn dropping_a_handle_unsubscribes_it() {
        let broadcaster = Broadcaster::new();
        let handle = broadcaster.subscribe("location:1").await;
        assert_eq!(broadcaster.subscriber_count("location:1").await, 1);

        drop(handle);
        // Drop spawns the unregister task; give it a turn to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(broadcaster.subscriber_count("location:1").await, 0);
    }

    #[tokio::test]
    async fn explicit_unsubscribe_is_reflected_before_it_returns() {
        let broadcaster = Broadcaster::new();
        let handle = broadcaster.subscribe("location:1").await;
        assert_eq!(broadcaster.subscriber_count("location:1").await, 1);

        broadcaster.unsubscribe(&handle).await;
        assert_eq!(broadcaster.subscriber_count("location:1").await, 0);
    }

    #[tokio::test]
    async fn full_queue_drops_events_without_blocking_the_publisher() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe_with_capacity("location:1", 1).await;

        for _ in 0..5 {
            broadcaster.broadcast(event("location:1")).await;
        }

        assert!(sub.recv().await.is_some());
    }

    #[tokio::test]
    async fn broadcast_to_stream_with_no_subscribers_is_a_no_op() {
        let broadcaster = Broadcaster::new();
        broadcaster.broadcast(event("location:nobody-listening")).await;
    }
}
