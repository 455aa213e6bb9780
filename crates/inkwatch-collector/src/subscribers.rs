//! Live alert subscribers.
//!
//! The registry is created once at startup and shared by cloning. Connection
//! handling (websockets, log sinks, ...) lives outside the engine: it calls
//! [`SubscriberRegistry::subscribe`] and drains the returned receiver.

use inkwatch_core::AlertEvent;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Default per-subscriber queue depth.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

struct Subscriber {
    id: Uuid,
    sender: mpsc::Sender<AlertEvent>,
}

/// A live subscription. Dropping it disconnects the subscriber.
#[derive(Debug)]
pub struct Subscription {
    /// Handle for [`SubscriberRegistry::unsubscribe`]
    pub id: Uuid,
    /// Incoming alerts
    pub receiver: mpsc::Receiver<AlertEvent>,
}

/// Delivery counts for one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers the event was queued for
    pub delivered: usize,
    /// Subscribers that were full or gone
    pub failed: usize,
}

/// Thread-safe fan-out of alert events.
#[derive(Clone)]
pub struct SubscriberRegistry {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    buffer: usize,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl SubscriberRegistry {
    /// Create an empty registry with the given per-subscriber queue depth.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            buffer: buffer.max(1),
        }
    }

    /// Register a new subscriber.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        self.subscribers
            .lock()
            .expect("acquire subscriber lock")
            .push(Subscriber { id, sender });
        tracing::debug!(%id, "subscriber connected");
        Subscription { id, receiver }
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        let mut subscribers = self.subscribers.lock().expect("acquire subscriber lock");
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        before != subscribers.len()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.lock().expect("acquire subscriber lock").len()
    }

    /// Whether nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue `event` for every subscriber without waiting.
    ///
    /// A full or closed subscriber is skipped; closed ones are removed.
    pub fn publish(&self, event: &AlertEvent) -> PublishReport {
        let mut report = PublishReport::default();
        let mut subscribers = self.subscribers.lock().expect("acquire subscriber lock");

        subscribers.retain(|subscriber| match subscriber.sender.try_send(event.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(id = %subscriber.id, "subscriber queue full, dropping alert");
                report.failed += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(id = %subscriber.id, "subscriber gone");
                report.failed += 1;
                false
            }
        });

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use inkwatch_core::AlertKind;

    fn event() -> AlertEvent {
        AlertEvent {
            kind: AlertKind::LowSupply,
            device_identity: "10.0.0.7".into(),
            device_name: "Reception".into(),
            supply: "Black".into(),
            level: "5".into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_block_others() {
        let registry = SubscriberRegistry::default();
        let mut first = registry.subscribe();
        let gone = registry.subscribe();
        let mut third = registry.subscribe();
        drop(gone);

        let alert = event();
        let report = registry.publish(&alert);

        assert_eq!(report, PublishReport { delivered: 2, failed: 1 });
        assert_eq!(registry.len(), 2);
        assert_eq!(first.receiver.recv().await, Some(alert.clone()));
        assert_eq!(third.receiver.recv().await, Some(alert));
    }

    #[test]
    fn test_full_queue_is_skipped_not_removed() {
        let registry = SubscriberRegistry::new(1);
        let _slow = registry.subscribe();

        assert_eq!(registry.publish(&event()).delivered, 1);
        assert_eq!(registry.publish(&event()), PublishReport { delivered: 0, failed: 1 });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = SubscriberRegistry::default();
        let sub = registry.subscribe();
        assert!(registry.unsubscribe(sub.id));
        assert!(!registry.unsubscribe(sub.id));
        assert!(registry.is_empty());
    }
}
