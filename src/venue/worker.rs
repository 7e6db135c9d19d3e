use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::broadcaster::OrderChannel;
use crate::config::EngineConfig;
use crate::events::OrderEvent;
use crate::repository::{ActiveOrderCache, OrderRepository};

use super::queue::{Job, JobQueue, WorkerMsg};
use super::rate_limit::RateLimiter;
use super::retry::with_retries;
use super::VenueSimulator;

/// The caller-facing half of a venue worker: a venue identifier plus a
/// handle to enqueue jobs. The consumer loop itself runs detached in a
/// background task spawned by [`spawn`].
#[derive(Clone)]
pub struct VenueHandle {
    pub venue: String,
    queue: JobQueue,
}

impl VenueHandle {
    pub fn enqueue(&self, job: Job) -> Result<(), crate::error::EngineError> {
        self.queue.enqueue(job)
    }
}

/// Starts a venue worker's consumer loop and returns a handle to feed it.
/// Concurrency per worker is bounded by `config.worker_concurrency`
/// in-flight jobs; a sliding-window limiter additionally bounds job starts
/// to `config.worker_rate_limit` per second. Both gate job *starts* — once
/// admitted, a job runs to completion (including its own retries)
/// independently of later arrivals.
pub fn spawn(
    venue: impl Into<String>,
    simulator: Arc<dyn VenueSimulator>,
    config: Arc<EngineConfig>,
    repository: Arc<dyn OrderRepository>,
    cache: Arc<dyn ActiveOrderCache>,
) -> VenueHandle {
    let venue = venue.into();
    let (queue, rx) = JobQueue::channel();

    tokio::spawn(run(venue.clone(), rx, simulator, config, repository, cache));

    VenueHandle { venue, queue }
}

async fn run(
    venue: String,
    mut rx: tokio::sync::mpsc::UnboundedReceiver<Job>,
    simulator: Arc<dyn VenueSimulator>,
    config: Arc<EngineConfig>,
    repository: Arc<dyn OrderRepository>,
    cache: Arc<dyn ActiveOrderCache>,
) {
    let semaphore = Arc::new(Semaphore::new(config.worker_concurrency));
    let limiter = Arc::new(RateLimiter::new(config.worker_rate_limit.clone()));

    while let Some(job) = rx.recv().await {
        limiter.acquire().await;
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed while the worker loop owns it");

        let venue = venue.clone();
        let simulator = simulator.clone();
        let config = config.clone();
        let repository = repository.clone();
        let cache = cache.clone();

        tokio::spawn(async move {
            let _permit = permit;
            match job {
                Job::Quote { order_id, token_in, token_out, amount, result_tx } => {
                    run_quote_job(venue, simulator, &config, order_id, token_in, token_out, amount, result_tx).await;
                }
                Job::Swap { order, channel, result_tx } => {
                    run_swap_job(venue, simulator, &config, repository, cache, order, channel, result_tx).await;
                }
            }
        });
    }
}

async fn run_quote_job(
    venue: String,
    simulator: Arc<dyn VenueSimulator>,
    config: &EngineConfig,
    order_id: String,
    token_in: String,
    token_out: String,
    amount: f64,
    result_tx: tokio::sync::mpsc::UnboundedSender<WorkerMsg>,
) {
    println!("[worker:{venue}] quote_started order={order_id}");

    let attempt_venue = venue.clone();
    let result = with_retries(config.quote_retries, config.quote_backoff_base, || {
        let simulator = simulator.clone();
        let venue = attempt_venue.clone();
        let token_in = token_in.clone();
        let token_out = token_out.clone();
        async move { simulator.get_quote(&venue, &token_in, &token_out, amount).await }
    })
    .await;

    let msg = match result {
        Ok((quote, retries)) => {
            println!("[worker:{venue}] quote_completed order={order_id} output={:.6}", quote.expected_output);
            WorkerMsg::QuoteCompleted { venue, quote, retries }
        }
        Err(err) => {
            let permanent = to_permanent(err, &venue);
            println!("[worker:{venue}] quote_failed order={order_id} error={permanent}");
            WorkerMsg::QuoteFailed { venue, error: permanent, retries: config.quote_retries.saturating_sub(1) }
        }
    };

    let _ = result_tx.send(msg);
}

async fn run_swap_job(
    venue: String,
    simulator: Arc<dyn VenueSimulator>,
    config: &EngineConfig,
    repository: Arc<dyn OrderRepository>,
    cache: Arc<dyn ActiveOrderCache>,
    mut order: crate::model::Order,
    channel: Arc<OrderChannel>,
    result_tx: tokio::sync::mpsc::UnboundedSender<WorkerMsg>,
) {
    order.transition(crate::model::OrderStatus::Building);
    let order_id = order.id.clone();
    let token_in = order.token_in.clone();
    let token_out = order.token_out.clone();
    let amount = order.amount_in;

    let attempt_venue = venue.clone();
    let attempt_channel = channel.clone();
    let result = with_retries(config.swap_retries, config.swap_backoff_base, || {
        let simulator = simulator.clone();
        let venue = attempt_venue.clone();
        let token_in = token_in.clone();
        let token_out = token_out.clone();
        let channel = attempt_channel.clone();
        async move {
            channel.emit(OrderEvent::Building { dex: venue.clone(), stage: "building".into() });
            simulator.execute_swap(&venue, &token_in, &token_out, amount).await
        }
    })
    .await;

    match result {
        Ok((swap, retries)) => {
            order.transition(crate::model::OrderStatus::Submitted);
            channel.emit(OrderEvent::Submitted {
                dex: venue.clone(),
                stage: "submitted".into(),
                tx_hash: swap.tx_hash.clone(),
            });

            order.tx_hash = Some(swap.tx_hash.clone());
            order.amount_out = Some(swap.amount_out);
            order.executed_price = Some(swap.executed_price);
            order.retry_count = retries;
            order.transition(crate::model::OrderStatus::Confirmed);

            let persisted = persist_outcome(repository.as_ref(), cache.as_ref(), &order).await;
            if let Err(err) = persisted {
                println!("[worker:{venue}] WARNING failed to persist confirmed order={order_id}: {err}");
            }

            println!("[worker:{venue}] confirmed order={order_id} tx={}", swap.tx_hash);
            channel.emit(OrderEvent::Confirmed {
                dex: venue.clone(),
                tx_hash: swap.tx_hash,
                amount_out: swap.amount_out,
                executed_price: swap.executed_price,
            });

            let _ = result_tx.send(WorkerMsg::SwapCompleted { order, retries });
        }
        Err(err) => {
            let rejected = crate::error::EngineError::SwapRejected(err.to_string());
            order.retry_count = config.swap_retries.saturating_sub(1);
            order.fail(rejected.to_string());

            let persisted = persist_outcome(repository.as_ref(), cache.as_ref(), &order).await;
            if let Err(persist_err) = persisted {
                println!("[worker:{venue}] WARNING failed to persist failed order={order_id}: {persist_err}");
            }

            println!("[worker:{venue}] swap_rejected order={order_id} error={rejected}");
            channel.emit(OrderEvent::Failed { message: "swap failed".into(), error: rejected.kind().into() });

            let _ = result_tx.send(WorkerMsg::SwapFailed {
                order,
                error: rejected,
                retries: config.swap_retries.saturating_sub(1),
            });
        }
    }
}

/// Writes the swap's outcome with a single full `update_order`, since the
/// worker already holds the complete post-swap order. The scheduler, which
/// only ever flips status without new outcome fields, uses the lighter
/// `update_order_status` instead — see `scheduler::run_order`.
async fn persist_outcome(
    repository: &dyn OrderRepository,
    cache: &dyn ActiveOrderCache,
    order: &crate::model::Order,
) -> Result<(), crate::error::EngineError> {
    repository.update_order(order).await?;
    cache.update_active_order(order).await?;
    Ok(())
}

fn to_permanent(err: crate::error::EngineError, venue: &str) -> crate::error::EngineError {
    match err {
        crate::error::EngineError::VenueTransient { message, .. } => {
            crate::error::EngineError::VenuePermanent { venue: venue.to_string(), message }
        }
        other => other,
    }
}
