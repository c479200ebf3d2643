//! Broadcast hub for realtime score updates
//!
//! Owns the set of live subscriber connections. Publishing delivers the
//! update to every currently admitted subscriber, best-effort: each
//! subscriber is backed by an unbounded channel drained by its own socket
//! task, so one stalled connection never delays another, and a failed send
//! marks that subscriber for removal.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identity of one live subscriber connection.
pub type SubscriberId = Uuid;

/// Score update published to subscribers after each successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreUpdate {
    /// Attack likelihood as a whole-number percentage, 0-100.
    #[serde(rename = "ddosPercentage")]
    pub ddos_percentage: u8,
}

/// Broadcast hub owning the live subscriber set.
///
/// The mutex guards only membership changes and snapshots; it is never
/// held across a send.
pub struct Hub {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::UnboundedSender<String>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new subscriber.
    ///
    /// The returned receiver yields messages published after admission;
    /// no history is replayed.
    pub fn admit(&self) -> (SubscriberId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.lock().unwrap().insert(id, tx);
        info!("Subscriber {} admitted", id);
        (id, rx)
    }

    /// Deliver `update` to every currently admitted subscriber.
    ///
    /// Iterates a snapshot of the subscriber set and applies removals
    /// afterwards, so a dead subscriber cannot affect delivery to the
    /// others. Returns the number of subscribers the update reached.
    pub fn publish(&self, update: &ScoreUpdate) -> usize {
        let message = match serde_json::to_string(update) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to serialize score update: {}", e);
                return 0;
            }
        };

        let snapshot: Vec<(SubscriberId, mpsc::UnboundedSender<String>)> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, tx) in snapshot {
            if tx.send(message.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        for id in dead {
            debug!("Subscriber {} gone at publish time", id);
            self.remove(id);
        }

        delivered
    }

    /// Evict a subscriber. Idempotent; removing an unknown id is a no-op.
    pub fn remove(&self, id: SubscriberId) {
        if self.subscribers.lock().unwrap().remove(&id).is_some() {
            info!("Subscriber {} removed", id);
        }
    }

    /// Number of currently admitted subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_update_wire_format() {
        let update = ScoreUpdate { ddos_percentage: 82 };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"ddosPercentage":82}"#
        );
    }

    #[test]
    fn admit_grows_subscriber_count() {
        let hub = Hub::new();
        assert_eq!(hub.subscriber_count(), 0);

        let _a = hub.admit();
        assert_eq!(hub.subscriber_count(), 1);

        let _b = hub.admit();
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[test]
    fn publish_without_subscribers_reaches_nobody() {
        let hub = Hub::new();
        assert_eq!(hub.publish(&ScoreUpdate { ddos_percentage: 50 }), 0);
    }

    #[test]
    fn publish_reaches_all_open_subscribers() {
        let hub = Hub::new();
        let (_id1, mut rx1) = hub.admit();
        let (_id2, mut rx2) = hub.admit();

        assert_eq!(hub.publish(&ScoreUpdate { ddos_percentage: 42 }), 2);
        assert_eq!(rx1.try_recv().unwrap(), r#"{"ddosPercentage":42}"#);
        assert_eq!(rx2.try_recv().unwrap(), r#"{"ddosPercentage":42}"#);
    }

    #[test]
    fn dead_subscriber_does_not_block_delivery_to_others() {
        let hub = Hub::new();
        let (_dead_id, rx_dead) = hub.admit();
        let (_live_id, mut rx_live) = hub.admit();

        // Receiver gone: the subscriber's connection task has ended.
        drop(rx_dead);

        assert_eq!(hub.publish(&ScoreUpdate { ddos_percentage: 7 }), 1);
        assert_eq!(rx_live.try_recv().unwrap(), r#"{"ddosPercentage":7}"#);

        // The failed send evicted the dead subscriber.
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn late_subscriber_sees_only_later_values() {
        let hub = Hub::new();
        let (_early_id, mut rx_early) = hub.admit();

        hub.publish(&ScoreUpdate { ddos_percentage: 10 });

        let (_late_id, mut rx_late) = hub.admit();
        hub.publish(&ScoreUpdate { ddos_percentage: 20 });

        assert_eq!(rx_early.try_recv().unwrap(), r#"{"ddosPercentage":10}"#);
        assert_eq!(rx_early.try_recv().unwrap(), r#"{"ddosPercentage":20}"#);

        // Admitted between publishes: only the second value arrives.
        assert_eq!(rx_late.try_recv().unwrap(), r#"{"ddosPercentage":20}"#);
        assert!(rx_late.try_recv().is_err());
    }

    #[test]
    fn remove_is_idempotent() {
        let hub = Hub::new();
        let (id, _rx) = hub.admit();

        hub.remove(id);
        assert_eq!(hub.subscriber_count(), 0);

        // Removing again, or removing an id that never existed, is a no-op.
        hub.remove(id);
        hub.remove(Uuid::new_v4());
        assert_eq!(hub.subscriber_count(), 0);
    }
}
