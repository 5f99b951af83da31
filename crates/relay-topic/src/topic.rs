//! Per-topic subscription sets.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::message::TopicMessage;

/// Subscriber callback. Runs synchronously on the publishing thread; an
/// `Err` is logged and does not stop delivery to the remaining subscribers.
pub type SubscriberFn = dyn Fn(&TopicMessage) -> anyhow::Result<()> + Send + Sync;

/// Handle returned by [`Topic::connect`], used to disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    key: String,
    callback: Arc<SubscriberFn>,
}

/// A fan-out point holding an ordered set of subscribers.
///
/// Handles are created by the registry only, which guarantees one `Topic`
/// instance per path.
pub struct Topic {
    key: String,
    subscribers: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

/// Shared topic handle. Equal paths resolve to the identical `Arc`.
pub type TopicHandle = Arc<Topic>;

impl Topic {
    pub(crate) fn new(key: impl Into<String>) -> TopicHandle {
        Arc::new(Self {
            key: key.into(),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        })
    }

    /// Canonical topic key, e.g. `write@db.tbl#row`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Register a callback under `subscriber` as its identity key.
    ///
    /// Registration is idempotent per key: connecting an already-registered
    /// subscriber is a no-op that returns the existing id, so a handler can
    /// never be invoked twice for one publish.
    pub fn connect(
        &self,
        subscriber: impl Into<String>,
        callback: impl Fn(&TopicMessage) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> SubscriptionId {
        let subscriber = subscriber.into();
        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(existing) = subscribers.iter().find(|s| s.key == subscriber) {
            debug!(
                topic = %self.key,
                subscriber = %subscriber,
                "subscriber already connected"
            );
            return existing.id;
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(topic = %self.key, subscriber = %subscriber, "subscriber connected");
        subscribers.push(Subscription {
            id,
            key: subscriber,
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove a subscription. Returns `false` when the id is unknown
    /// (already disconnected).
    ///
    /// Disconnecting during an in-flight publish is safe: the publish
    /// iterates a snapshot, so the callback may still see the in-flight
    /// message but never a later one.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() < before;
        if removed {
            debug!(topic = %self.key, "subscriber disconnected");
        }
        removed
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Deliver `message` to every registered callback, in registration
    /// order, synchronously on the calling thread.
    ///
    /// A failing callback is logged with topic and subscriber context and
    /// delivery continues; subscriber failures are isolated per callback.
    pub fn publish(&self, message: &TopicMessage) {
        // Snapshot under the lock, invoke outside it, so callbacks can
        // connect/disconnect on this same topic without deadlocking.
        let snapshot: Vec<(String, Arc<SubscriberFn>)> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers
                .iter()
                .map(|s| (s.key.clone(), Arc::clone(&s.callback)))
                .collect()
        };

        debug!(topic = %self.key, subscribers = snapshot.len(), "publishing");
        for (subscriber, callback) in snapshot {
            if let Err(error) = callback(message) {
                error!(
                    topic = %self.key,
                    subscriber = %subscriber,
                    error = %error,
                    "subscriber failed, continuing delivery"
                );
            }
        }
    }
}

impl std::fmt::Debug for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("key", &self.key)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
