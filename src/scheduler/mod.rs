use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::broadcaster::{OrderChannel, SessionBroadcaster};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{OrderEvent, QuoteSummary};
use crate::hub::{RoutingHub, SelectedRoute};
use crate::model::{Order, OrderId, OrderStatus, Preferences, Quote};
use crate::repository::{ActiveOrderCache, OrderPatch, OrderRepository};
use crate::stats::StatsRegistry;
use crate::store::{CollectionPublisher, CollectionSnapshot, QuoteStore};
use crate::venue::queue::{Job, WorkerMsg};
use crate::venue::worker::VenueHandle;

/// The heart of the core: runs the fan-out, collect, route, dispatch-swap
/// pipeline for every order. One [`Scheduler`] is shared across all
/// in-flight orders; each order gets its own actor task, which is what makes
/// "single-writer per order" true without a lock on order state.
pub struct Scheduler {
    config: Arc<EngineConfig>,
    hub: Arc<RoutingHub>,
    store: Arc<QuoteStore>,
    stats: Arc<StatsRegistry>,
    broadcaster: Arc<SessionBroadcaster>,
    repository: Arc<dyn OrderRepository>,
    cache: Arc<dyn ActiveOrderCache>,
    venues: Vec<VenueHandle>,
}

impl Scheduler {
    pub fn new(
        config: Arc<EngineConfig>,
        hub: Arc<RoutingHub>,
        store: Arc<QuoteStore>,
        stats: Arc<StatsRegistry>,
        broadcaster: Arc<SessionBroadcaster>,
        repository: Arc<dyn OrderRepository>,
        cache: Arc<dyn ActiveOrderCache>,
        venues: Vec<VenueHandle>,
    ) -> Arc<Self> {
        Arc::new(Scheduler { config, hub, store, stats, broadcaster, repository, cache, venues })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Accepts a new order, opens its event channel, and spawns the per-order
    /// actor task that drives it to a terminal state. Returns immediately
    /// once the order is persisted and the channel exists — callers that
    /// need to stream events attach via `broadcaster()` right after.
    pub async fn submit_order(
        self: &Arc<Self>,
        order: Order,
        preferences: Option<Preferences>,
    ) -> Result<OrderId, EngineError> {
        self.repository.create_order(&order).await?;
        self.cache.set_active_order(&order).await?;

        let order_id = order.id.clone();
        let channel = self.broadcaster.create(order_id.clone());

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_order(order, preferences, channel).await;
        });

        Ok(order_id)
    }

    pub fn broadcaster(&self) -> &Arc<SessionBroadcaster> {
        &self.broadcaster
    }

    pub fn stats(&self) -> &Arc<StatsRegistry> {
        &self.stats
    }

    /// Best-effort: clears the pending collection, if one exists, so the
    /// actor's collection loop abandons further waiting on its next
    /// check. A no-op once the order has left the collection phase.
    pub fn cancel(&self, order_id: &OrderId) -> bool {
        self.store.cancel(order_id)
    }

    async fn run_order(self: Arc<Self>, mut order: Order, preferences: Option<Preferences>, channel: Arc<OrderChannel>) {
        let order_id = order.id.clone();
        channel.emit(OrderEvent::Pending { message: "order submitted".into() });
        self.stats.record_order_started(order.routing_strategy);

        let expected_count = self.venues.len();
        let publisher = self.store.begin(order_id.clone(), order.routing_strategy, expected_count);
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<WorkerMsg>();

        for venue in &self.venues {
            let job = Job::Quote {
                order_id: order_id.clone(),
                token_in: order.token_in.clone(),
                token_out: order.token_out.clone(),
                amount: order.amount_in,
                result_tx: result_tx.clone(),
            };
            if let Err(err) = venue.enqueue(job) {
                println!("[scheduler] WARNING failed to enqueue quote job venue={} order={order_id}: {err}", venue.venue);
            }
        }
        drop(result_tx);

        let collected = self
            .collect_quotes(&mut order, &channel, publisher, &mut result_rx, expected_count)
            .await;
        self.store.end(&order_id);

        let (quotes, total_received) = match collected {
            Some(collected) => collected,
            None => return, // already failed and persisted inside collect_quotes
        };

        if let Err(err) = self
            .route_and_dispatch(&mut order, &channel, quotes, total_received, preferences, &mut result_rx)
            .await
        {
            self.fail_order(&mut order, &channel, err).await;
        }
    }

    /// Drains the worker-report channel until the collection-completion rule
    /// is satisfied, publishing a snapshot after every arrival. Returns the
    /// accumulated valid quotes plus the total received count (successes and
    /// failures both) on success, or `None` if the order was already failed
    /// (no_quotes / deadline_exceeded) or cancelled.
    async fn collect_quotes(
        &self,
        order: &mut Order,
        channel: &Arc<OrderChannel>,
        mut publisher: CollectionPublisher,
        result_rx: &mut mpsc::UnboundedReceiver<WorkerMsg>,
        expected_count: usize,
    ) -> Option<(Vec<Quote>, usize)> {
        let start = Instant::now();
        let deadline = start + self.config.quote_deadline;

        let mut quotes: Vec<Quote> = Vec::new();
        let mut received_count = 0usize;
        let mut first_arrival = true;

        loop {
            if received_count >= expected_count {
                break;
            }

            tokio::select! {
                biased;

                _ = publisher.cancelled() => {
                    println!("[scheduler] order={} cancelled during collection", order.id);
                    return None;
                }

                msg = result_rx.recv() => {
                    let Some(msg) = msg else { break };
                    if first_arrival {
                        first_arrival = false;
                        order.transition(OrderStatus::Routing);
                        let _ = self.repository.update_order_status(&order.id, OrderStatus::Routing, None).await;
                    }

                    match msg {
                        WorkerMsg::QuoteCompleted { venue, quote, .. } => {
                            received_count += 1;
                            self.stats.record_quote_success(&venue);
                            let valid = quote.expected_output > 0.0;
                            channel.emit(OrderEvent::QuoteReceived {
                                dex: venue,
                                quote: summarize(&quote),
                                quotes_received: received_count,
                                total_expected: expected_count,
                            });
                            if valid {
                                quotes.push(quote);
                            }
                        }
                        WorkerMsg::QuoteFailed { venue, error, .. } => {
                            received_count += 1;
                            self.stats.record_quote_failure(&venue);
                            channel.emit(OrderEvent::QuoteFailed {
                                dex: venue,
                                error: error.to_string(),
                                quotes_received: received_count,
                                total_expected: expected_count,
                            });
                        }
                        // Swap messages cannot arrive before a swap job exists; ignore
                        // defensively rather than panic on a channel shared across phases.
                        WorkerMsg::SwapCompleted { .. } | WorkerMsg::SwapFailed { .. } => {}
                    }

                    publisher.publish(CollectionSnapshot {
                        received_count,
                        expected_count,
                        valid_count: quotes.len(),
                    });
                }

                _ = tokio::time::sleep_until(deadline) => {
                    if quotes.len() >= 2 {
                        break;
                    }
                    self.stats.record_collection_time(start.elapsed());
                    self.fail_order(order, channel, EngineError::DeadlineExceeded).await;
                    return None;
                }
            }
        }

        self.stats.record_collection_time(start.elapsed());

        if quotes.is_empty() {
            self.fail_order(order, channel, EngineError::NoQuotes).await;
            return None;
        }

        Some((quotes, received_count))
    }

    async fn route_and_dispatch(
        &self,
        order: &mut Order,
        channel: &Arc<OrderChannel>,
        quotes: Vec<Quote>,
        total_received: usize,
        preferences: Option<Preferences>,
        result_rx: &mut mpsc::UnboundedReceiver<WorkerMsg>,
    ) -> Result<(), EngineError> {
        let report = self.hub.validate(&quotes);
        if !report.valid {
            return Err(EngineError::Validation(report.errors.join("; ")));
        }

        order.transition(OrderStatus::Processing);
        self.repository.update_order_status(&order.id, OrderStatus::Processing, None).await?;

        channel.emit(OrderEvent::QuotesCollected {
            quotes: quotes.iter().map(summarize).collect(),
            valid_quotes: quotes.len(),
            total_received,
        });

        let analysis = self.hub.analyze(&quotes)?;
        let selected = self.hub.select(&quotes, order.routing_strategy, preferences.as_ref())?;

        order.selected_venue = Some(selected.venue.clone());
        channel.emit(OrderEvent::DexSelected {
            selected_route: SelectedRoute::from(&selected),
            strategy: order.routing_strategy,
            market_metrics: analysis.market_metrics,
            alternative_routes: analysis.strategy_analysis,
        });

        self.repository
            .update_order_status(
                &order.id,
                OrderStatus::Processing,
                Some(OrderPatch { selected_venue: order.selected_venue.clone(), ..Default::default() }),
            )
            .await?;

        let venue_handle = self
            .venues
            .iter()
            .find(|v| v.venue == selected.venue)
            .ok_or_else(|| EngineError::Internal(format!("selected venue '{}' has no worker", selected.venue)))?;

        let (swap_result_tx, mut swap_result_rx) = mpsc::unbounded_channel::<WorkerMsg>();
        venue_handle.enqueue(Job::Swap {
            order: order.clone(),
            channel: channel.clone(),
            result_tx: swap_result_tx,
        })?;

        // Quote jobs can still report in after collection closed (a venue
        // that answered just past the deadline); drain and ignore those on
        // the old channel while awaiting the swap's outcome on the new one.
        drain_late_quotes(result_rx);

        match swap_result_rx.recv().await {
            Some(WorkerMsg::SwapCompleted { order: finished, .. }) => {
                self.stats.record_execution_result(true);
                *order = finished;
                Ok(())
            }
            Some(WorkerMsg::SwapFailed { order: finished, error, .. }) => {
                self.stats.record_execution_result(false);
                *order = finished;
                // The worker already persisted and emitted `failed`; nothing
                // left to do here.
                let _ = error;
                Ok(())
            }
            Some(_) | None => Err(EngineError::Internal("swap worker closed without a result".into())),
        }
    }

    async fn fail_order(&self, order: &mut Order, channel: &Arc<OrderChannel>, cause: EngineError) {
        order.fail(cause.to_string());
        let patch = OrderPatch { error_message: order.error_message.clone(), ..Default::default() };
        if let Err(err) = self.repository.update_order_status(&order.id, OrderStatus::Failed, Some(patch)).await {
            println!("[scheduler] WARNING failed to persist failed order={}: {err}", order.id);
        }
        let _ = self.cache.update_active_order(order).await;
        channel.emit(OrderEvent::Failed { message: cause.to_string(), error: cause.kind().into() });
    }
}

fn summarize(quote: &Quote) -> QuoteSummary {
    QuoteSummary {
        dex: quote.venue.clone(),
        price: quote.price,
        estimated_output: quote.expected_output,
        slippage: quote.slippage,
        liquidity: quote.liquidity,
    }
}

fn drain_late_quotes(rx: &mut mpsc::UnboundedReceiver<WorkerMsg>) {
    while rx.try_recv().is_ok() {}
}
