use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::events::{Envelope, OrderEvent};
use crate::model::OrderId;

/// One order's event feed: a broadcast channel plus a replay log. Log and
/// broadcast-send happen under the same lock so there is no window in which
/// a new subscriber's replay snapshot and the live channel disagree about
/// which events have gone out — the total-ordering guarantee this is built
/// to provide would otherwise be a matter of luck.
pub struct OrderChannel {
    order_id: OrderId,
    tx: broadcast::Sender<Envelope>,
    log: Mutex<Vec<Envelope>>,
}

impl OrderChannel {
    pub fn new(order_id: OrderId) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(256);
        Arc::new(OrderChannel { order_id, tx, log: Mutex::new(Vec::new()) })
    }

    pub fn emit(&self, event: OrderEvent) -> Envelope {
        let envelope = Envelope::new(self.order_id.clone(), event);
        let mut log = self.log.lock().unwrap();
        log.push(envelope.clone());
        let _ = self.tx.send(envelope.clone());
        envelope
    }

    pub fn last(&self) -> Option<Envelope> {
        self.log.lock().unwrap().last().cloned()
    }

    fn replay_and_subscribe(&self) -> (Vec<Envelope>, broadcast::Receiver<Envelope>) {
        let log = self.log.lock().unwrap();
        (log.clone(), self.tx.subscribe())
    }
}

/// What attaching a session to an order yields, per the §4.5 contract.
pub enum SessionStream {
    /// The order doesn't exist: send one `error{not_found}` and close.
    NotFound,
    /// The order is already terminal: send the last known terminal event and
    /// close — no point opening a live subscription to a channel nothing
    /// will ever publish to again.
    Terminal(Envelope),
    /// Replay everything seen so far, then forward live events in order
    /// until the channel closes (order reaches a terminal state) or the
    /// receiver lags (dropped — see module docs on why we don't skip ahead).
    Live { replay: Vec<Envelope>, rx: broadcast::Receiver<Envelope> },
}

/// Subscribes streaming sessions to order event feeds. Does not mutate order
/// or collection state on any path, including errors — it only ever reads
/// and forwards.
#[derive(Default)]
pub struct SessionBroadcaster {
    channels: Mutex<HashMap<OrderId, Arc<OrderChannel>>>,
}

impl SessionBroadcaster {
    pub fn new() -> Self {
        SessionBroadcaster::default()
    }

    /// Opens the channel for a newly-submitted order. Called once, by the
    /// scheduler, before any quote jobs are enqueued.
    pub fn create(&self, order_id: OrderId) -> Arc<OrderChannel> {
        let channel = OrderChannel::new(order_id.clone());
        self.channels.lock().unwrap().insert(order_id, channel.clone());
        channel
    }

    pub fn get(&self, order_id: &OrderId) -> Option<Arc<OrderChannel>> {
        self.channels.lock().unwrap().get(order_id).cloned()
    }

    /// Unregisters an order's channel. Safe to call after the order reaches
    /// a terminal state or after a client disconnects; idempotent.
    pub fn remove(&self, order_id: &OrderId) {
        self.channels.lock().unwrap().remove(order_id);
    }

    /// A session attaching by order id, including reconnects to an order
    /// already in flight or already finished.
    pub fn attach(&self, order_id: &OrderId) -> SessionStream {
        let channel = match self.get(order_id) {
            Some(c) => c,
            None => return SessionStream::NotFound,
        };

        if let Some(last) = channel.last() {
            if last.is_terminal() {
                return SessionStream::Terminal(last);
            }
        }

        let (replay, rx) = channel.replay_and_subscribe();
        SessionStream::Live { replay, rx }
    }
}
