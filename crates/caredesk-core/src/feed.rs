//! Row-level change feed.
//!
//! Every successful write made through [`crate::CareDesk`] is published here
//! after the write has been committed. Subscribers receive events for one
//! table over a channel and stop receiving once their [`Subscription`] is
//! cancelled or dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tables that publish change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Patients,
    AmbulanceBookings,
    Appointments,
    Prescriptions,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Patients => "patients",
            Table::AmbulanceBookings => "ambulance_bookings",
            Table::Appointments => "appointments",
            Table::Prescriptions => "prescriptions",
        }
    }
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    /// Storage key of the affected row
    pub key: String,
    /// Row after the change; `None` for deletes
    pub new_row: Option<serde_json::Value>,
}

struct Subscriber {
    table: Table,
    tx: Sender<ChangeEvent>,
}

#[derive(Default)]
struct FeedInner {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
}

impl FeedInner {
    fn remove(&self, id: u64) -> bool {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some()
    }
}

/// Publish/subscribe hub keyed by table.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    inner: Arc<FeedInner>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start receiving events for `table`.
    pub fn subscribe(&self, table: Table) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel();

        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Subscriber { table, tx });

        tracing::debug!(table = table.as_str(), subscription = id, "subscribed");

        Subscription {
            rx,
            handle: Unsubscriber {
                id,
                feed: Arc::downgrade(&self.inner),
            },
        }
    }

    /// Deliver `event` to every subscriber of its table. Subscribers whose
    /// receiving side is gone are dropped. Returns the number of deliveries.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let mut delivered = 0;
        subscribers.retain(|id, subscriber| {
            if subscriber.table != event.table {
                return true;
            }
            match subscriber.tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::warn!(subscription = id, "dropping disconnected subscriber");
                    false
                }
            }
        });

        tracing::trace!(
            table = event.table.as_str(),
            key = %event.key,
            delivered,
            "change published"
        );
        delivered
    }

    /// Number of live subscriptions across all tables.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Detached handle that cancels a subscription from another thread.
#[derive(Clone, Debug)]
pub struct Unsubscriber {
    id: u64,
    feed: Weak<FeedInner>,
}

impl Unsubscriber {
    /// Stop delivery. Safe to call any number of times, and after the feed
    /// itself is gone.
    pub fn cancel(&self) {
        if let Some(feed) = self.feed.upgrade() {
            if feed.remove(self.id) {
                tracing::debug!(subscription = self.id, "unsubscribed");
            }
        }
    }
}

/// Receiving side of a table subscription. Dropping it unsubscribes.
pub struct Subscription {
    rx: Receiver<ChangeEvent>,
    handle: Unsubscriber,
}

impl Subscription {
    /// Block until the next event. `None` once the subscription has been
    /// cancelled (or the feed dropped) and all queued events are drained.
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.rx.recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take a queued event without blocking.
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Handle that can cancel this subscription from elsewhere.
    pub fn unsubscriber(&self) -> Unsubscriber {
        self.handle.clone()
    }

    /// Stop delivery. Idempotent.
    pub fn unsubscribe(&self) {
        self.handle.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

impl std::fmt::Debug for FeedInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedInner")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(table: Table, kind: ChangeKind) -> ChangeEvent {
        ChangeEvent {
            table,
            kind,
            key: "k1".into(),
            new_row: None,
        }
    }

    #[test]
    fn test_delivers_only_matching_table() {
        let feed = ChangeFeed::new();
        let bookings = feed.subscribe(Table::AmbulanceBookings);
        let patients = feed.subscribe(Table::Patients);

        let delivered = feed.publish(event(Table::AmbulanceBookings, ChangeKind::Insert));
        assert_eq!(delivered, 1);

        let received = bookings.try_recv().unwrap();
        assert_eq!(received.kind, ChangeKind::Insert);
        assert!(patients.try_recv().is_none());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe(Table::AmbulanceBookings);
        assert_eq!(feed.subscriber_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(feed.subscriber_count(), 0);

        assert_eq!(feed.publish(event(Table::AmbulanceBookings, ChangeKind::Delete)), 0);
        assert!(sub.recv().is_none());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let feed = ChangeFeed::new();
        {
            let _sub = feed.subscribe(Table::Appointments);
            assert_eq!(feed.subscriber_count(), 1);
        }
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn test_cancel_after_feed_dropped() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe(Table::Prescriptions);
        let handle = sub.unsubscriber();
        drop(feed);

        handle.cancel();
        assert!(sub.recv_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_cancel_wakes_blocked_receiver() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe(Table::AmbulanceBookings);
        let handle = sub.unsubscriber();

        let waiter = std::thread::spawn(move || sub.recv());
        handle.cancel();

        assert!(waiter.join().unwrap().is_none());
    }
}
