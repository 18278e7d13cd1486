//! Snapshot publishing for live queries.
//!
//! A live query holds the latest fully-materialized result of some query
//! and hands out watch-channel receivers. Whenever a service commits a
//! write it republishes the affected query, and every subscriber observes
//! the new snapshot. Snapshots are latest-value-wins: a slow subscriber
//! skips intermediate states but can never observe an older snapshot after
//! a newer one, and a subscriber that panics or stalls has no effect on
//! the publisher or on other subscribers.

use tokio::sync::watch;

/// The publisher side of a live query.
#[derive(Debug)]
pub struct LiveQuery<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> LiveQuery<T> {
    /// Create a live query holding `initial` as its current snapshot.
    pub fn new(initial: T) -> Self {
        Self {
            sender: watch::Sender::new(initial),
        }
    }

    /// Replace the current snapshot and notify all subscribers.
    ///
    /// Publishing never blocks and succeeds even with no subscribers.
    pub fn publish(&self, snapshot: T) {
        self.sender.send_replace(snapshot);
    }

    /// Subscribe to the query.
    ///
    /// The receiver starts out already holding the current snapshot, so a
    /// late subscriber does not miss the present state.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Clone the current snapshot.
    pub fn snapshot(&self) -> T {
        self.sender.borrow().clone()
    }
}
