use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::watch;

use crate::model::{OrderId, RoutingStrategy};

/// A read-only view of a pending collection's progress, published by the
/// scheduler's per-order task so outside readers (status endpoints, tests)
/// can observe `received_count <= expected_count` without taking a lock on
/// the actor's internal state — the actor is the sole writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionSnapshot {
    pub received_count: usize,
    pub expected_count: usize,
    pub valid_count: usize,
}

/// Handle to one order's in-flight quote collection. Exists for exactly the
/// duration of the quote-collection phase — the scheduler removes it from
/// the [`QuoteStore`] the moment collection closes, which is what makes "a
/// pending collection exists iff the order is in the quote-collection phase"
/// true by construction rather than by convention.
pub struct PendingHandle {
    pub strategy: RoutingStrategy,
    snapshot_rx: watch::Receiver<CollectionSnapshot>,
    cancel_tx: watch::Sender<bool>,
}

impl PendingHandle {
    pub fn snapshot(&self) -> CollectionSnapshot {
        *self.snapshot_rx.borrow()
    }
}

/// Per-order table of in-flight quote collections. Keyed by order id so
/// writes never contend across orders; within one order, only the actor task
/// that owns its [`CollectionPublisher`] ever mutates the snapshot.
#[derive(Default)]
pub struct QuoteStore {
    pending: Mutex<HashMap<OrderId, PendingHandle>>,
}

/// The write side of a pending collection, held only by the scheduler's
/// per-order task for that order's lifetime.
pub struct CollectionPublisher {
    snapshot_tx: watch::Sender<CollectionSnapshot>,
    cancel_rx: watch::Receiver<bool>,
}

impl CollectionPublisher {
    pub fn publish(&self, snapshot: CollectionSnapshot) {
        let _ = self.snapshot_tx.send(snapshot);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    pub async fn cancelled(&mut self) {
        while !*self.cancel_rx.borrow() {
            if self.cancel_rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl QuoteStore {
    pub fn new() -> Self {
        QuoteStore::default()
    }

    /// Opens a pending collection for `order_id`, returning the publisher
    /// half for the scheduler's actor task to drive.
    pub fn begin(&self, order_id: OrderId, strategy: RoutingStrategy, expected_count: usize) -> CollectionPublisher {
        let (snapshot_tx, snapshot_rx) = watch::channel(CollectionSnapshot {
            expected_count,
            ..Default::default()
        });
        let (cancel_tx, cancel_rx) = watch::channel(false);

        self.pending.lock().unwrap().insert(
            order_id,
            PendingHandle { strategy, snapshot_rx, cancel_tx },
        );

        CollectionPublisher { snapshot_tx, cancel_rx }
    }

    /// Idempotent: removing an order not present (already released, or never
    /// started) is a no-op.
    pub fn end(&self, order_id: &OrderId) {
        self.pending.lock().unwrap().remove(order_id);
    }

    pub fn snapshot(&self, order_id: &OrderId) -> Option<CollectionSnapshot> {
        self.pending.lock().unwrap().get(order_id).map(PendingHandle::snapshot)
    }

    pub fn is_pending(&self, order_id: &OrderId) -> bool {
        self.pending.lock().unwrap().contains_key(order_id)
    }

    /// Best-effort: signals the order's actor task to abandon collection. A
    /// no-op if the order isn't currently collecting (already routed, or
    /// terminal).
    pub fn cancel(&self, order_id: &OrderId) -> bool {
        match self.pending.lock().unwrap().get(order_id) {
            Some(handle) => {
                let _ = handle.cancel_tx.send(true);
                true
            }
            None => false,
        }
    }
}
