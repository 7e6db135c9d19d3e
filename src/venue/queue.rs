use std::sync::Arc;

use tokio::sync::mpsc;

use crate::broadcaster::OrderChannel;
use crate::error::EngineError;
use crate::model::{Order, OrderId, Quote};

/// One unit of work for a venue worker. A `Swap` job owns a snapshot of the
/// `Order` it is acting on — per the data-model invariant, the order is
/// mutated only by the scheduler or by the worker that currently holds the
/// active job, never both at once, so handing the worker its own copy to
/// mutate and persist is what makes that invariant hold without a lock.
pub enum Job {
    Quote {
        order_id: OrderId,
        token_in: String,
        token_out: String,
        amount: f64,
        result_tx: mpsc::UnboundedSender<WorkerMsg>,
    },
    Swap {
        order: Order,
        channel: Arc<OrderChannel>,
        result_tx: mpsc::UnboundedSender<WorkerMsg>,
    },
}

/// What a venue worker reports back to the scheduler's per-order task once a
/// job resolves. Distinct from the client-facing [`Envelope`] stream: this
/// is the internal orchestration channel the design notes call for ("worker
/// publishes on a typed event stream keyed by order id; the scheduler
/// subscribes once").
pub enum WorkerMsg {
    QuoteCompleted { venue: String, quote: Quote, retries: u32 },
    QuoteFailed { venue: String, error: EngineError, retries: u32 },
    SwapCompleted { order: Order, retries: u32 },
    SwapFailed { order: Order, error: EngineError, retries: u32 },
}

/// A FIFO job queue for one venue. Backed by an unbounded `tokio::mpsc`
/// channel here; the design notes call out that any queue meeting the
/// at-least-once, per-job-attempts, backoff contract is acceptable, and this
/// repo does not depend on the specific one.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl JobQueue {
    pub fn channel() -> (JobQueue, mpsc::UnboundedReceiver<Job>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (JobQueue { tx }, rx)
    }

    pub fn enqueue(&self, job: Job) -> Result<(), EngineError> {
        self.tx
            .send(job)
            .map_err(|_| EngineError::Internal("venue worker queue closed".into()))
    }
}
