//! Live fan-out of accepted entries.
//!
//! [`SubscriptionHub`] keeps one bounded channel per observer. Publishing
//! never blocks: an observer whose buffer is full misses that entry, and an
//! observer whose receiver is gone is pruned.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::LogEntry;

/// Opaque handle naming one registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct HubInner {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<LogEntry>>>,
    buffer: usize,
}

impl HubInner {
    fn remove(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().remove(&id).is_some()
    }
}

/// Registry of live observers.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Debug, Clone)]
pub struct SubscriptionHub {
    inner: Arc<HubInner>,
}

impl Default for SubscriptionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionHub {
    /// Per-observer buffer used by [`SubscriptionHub::new`].
    pub const DEFAULT_BUFFER: usize = 1024;

    /// Creates a hub with the default per-observer buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer(Self::DEFAULT_BUFFER)
    }

    /// Creates a hub whose observers buffer up to `buffer` entries each.
    ///
    /// A zero buffer is raised to one.
    #[must_use]
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: Mutex::new(HashMap::new()),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Registers a new observer.
    ///
    /// The observer only sees entries published after this call returns.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let id = SubscriberId::new();
        self.inner.subscribers.lock().insert(id, tx);
        debug!(subscriber = %id, "observer subscribed");

        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Removes an observer. Returns false if it was not registered.
    ///
    /// Entries already buffered for the observer can still be drained.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            debug!(subscriber = %id, "observer unsubscribed");
        }
        removed
    }

    /// Delivers `entry` to every registered observer.
    ///
    /// Returns how many observers accepted it.
    pub fn publish(&self, entry: &LogEntry) -> usize {
        let mut subscribers = self.inner.subscribers.lock();
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, tx) in subscribers.iter() {
            match tx.try_send(entry.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = %id, "observer buffer full, entry dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            subscribers.remove(&id);
            debug!(subscriber = %id, "pruned closed observer");
        }

        delivered
    }

    /// Number of registered observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

/// Receiving side of one observer.
///
/// Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<LogEntry>,
    hub: Weak<HubInner>,
}

impl Subscription {
    /// This observer's id.
    #[must_use]
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next entry.
    ///
    /// Returns `None` once the observer has been unsubscribed and its
    /// buffer is drained, or the hub is gone.
    pub async fn recv(&mut self) -> Option<LogEntry> {
        self.rx.recv().await
    }

    /// Takes the next buffered entry without waiting.
    pub fn try_recv(&mut self) -> Option<LogEntry> {
        self.rx.try_recv().ok()
    }

    /// Turns the subscription into a stream of entries.
    ///
    /// Dropping the stream unsubscribes.
    pub fn into_stream(self) -> impl Stream<Item = LogEntry> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            let entry = sub.recv().await?;
            Some((entry, sub))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogLevel;
    use futures::StreamExt;

    fn make_entry(message: &str) -> LogEntry {
        LogEntry {
            level: LogLevel::Info,
            message: message.to_string(),
            resource_id: "server-1".to_string(),
            timestamp: "2024-01-15T12:00:00Z".to_string(),
            trace_id: "t".to_string(),
            span_id: "s".to_string(),
            commit: "c".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn publish_without_observers_delivers_nothing() {
        let hub = SubscriptionHub::new();
        assert_eq!(hub.publish(&make_entry("lonely")), 0);
    }

    #[tokio::test]
    async fn every_observer_receives_each_entry() {
        let hub = SubscriptionHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        assert_eq!(hub.publish(&make_entry("one")), 2);

        assert_eq!(a.recv().await.map(|e| e.message), Some("one".to_string()));
        assert_eq!(b.recv().await.map(|e| e.message), Some("one".to_string()));
    }

    #[test]
    fn new_observer_gets_no_backlog() {
        let hub = SubscriptionHub::new();
        let mut early = hub.subscribe();
        hub.publish(&make_entry("before"));

        let mut late = hub.subscribe();
        assert!(late.try_recv().is_none());

        hub.publish(&make_entry("after"));
        assert_eq!(late.try_recv().map(|e| e.message), Some("after".to_string()));
        assert_eq!(early.try_recv().map(|e| e.message), Some("before".to_string()));
        assert_eq!(early.try_recv().map(|e| e.message), Some("after".to_string()));
    }

    #[test]
    fn delivery_preserves_publish_order() {
        let hub = SubscriptionHub::new();
        let mut sub = hub.subscribe();
        for i in 0..20 {
            hub.publish(&make_entry(&format!("m{i}")));
        }
        for i in 0..20 {
            assert_eq!(sub.try_recv().map(|e| e.message), Some(format!("m{i}")));
        }
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let hub = SubscriptionHub::new();
        let sub = hub.subscribe();
        let id = sub.id();

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(&make_entry("nobody")), 0);
    }

    #[tokio::test]
    async fn unsubscribed_observer_stops_receiving() {
        let hub = SubscriptionHub::new();
        let mut sub = hub.subscribe();
        hub.publish(&make_entry("kept"));
        hub.unsubscribe(sub.id());
        hub.publish(&make_entry("missed"));

        assert_eq!(sub.recv().await.map(|e| e.message), Some("kept".to_string()));
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let hub = SubscriptionHub::new();
        let sub = hub.subscribe();
        let other = hub.subscribe();
        drop(sub);

        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.publish(&make_entry("x")), 1);
        drop(other);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn full_observer_misses_entry_but_stays_registered() {
        let hub = SubscriptionHub::with_buffer(2);
        let mut slow = hub.subscribe();
        let mut fast = hub.subscribe();

        for i in 0..3 {
            hub.publish(&make_entry(&format!("m{i}")));
            let _ = fast.try_recv();
        }

        assert_eq!(hub.subscriber_count(), 2);
        assert_eq!(slow.try_recv().map(|e| e.message), Some("m0".to_string()));
        assert_eq!(slow.try_recv().map(|e| e.message), Some("m1".to_string()));
        assert!(slow.try_recv().is_none());

        assert_eq!(hub.publish(&make_entry("m3")), 2);
        assert_eq!(slow.try_recv().map(|e| e.message), Some("m3".to_string()));
    }

    #[test]
    fn zero_buffer_is_raised_to_one() {
        let hub = SubscriptionHub::with_buffer(0);
        let mut sub = hub.subscribe();
        assert_eq!(hub.publish(&make_entry("fits")), 1);
        assert_eq!(hub.publish(&make_entry("dropped")), 0);
        assert_eq!(sub.try_recv().map(|e| e.message), Some("fits".to_string()));
    }

    #[test]
    fn subscription_outliving_hub_drops_cleanly() {
        let hub = SubscriptionHub::new();
        let mut sub = hub.subscribe();
        hub.publish(&make_entry("last"));
        drop(hub);

        assert_eq!(sub.try_recv().map(|e| e.message), Some("last".to_string()));
        assert!(sub.try_recv().is_none());
        drop(sub);
    }

    #[test]
    fn subscriber_ids_are_unique() {
        let hub = SubscriptionHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id().to_string(), b.id().to_string());
    }

    #[tokio::test]
    async fn stream_yields_entries_and_unsubscribes_on_drop() {
        let hub = SubscriptionHub::new();
        let stream = hub.subscribe().into_stream();
        hub.publish(&make_entry("a"));
        hub.publish(&make_entry("b"));

        let got: Vec<_> = stream.take(2).map(|e| e.message).collect().await;
        assert_eq!(got, ["a", "b"]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn clones_share_registry() {
        let hub = SubscriptionHub::new();
        let clone = hub.clone();
        let mut sub = clone.subscribe();

        assert_eq!(hub.subscriber_count(), 1);
        hub.publish(&make_entry("shared"));
        assert_eq!(sub.recv().await.map(|e| e.message), Some("shared".to_string()));
    }
}
