#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dex_order_engine::api::DEMO_VENUES;
use dex_order_engine::broadcaster::{SessionStream, SessionBroadcaster};
use dex_order_engine::config::EngineConfig;
use dex_order_engine::events::Envelope;
use dex_order_engine::hub::RoutingHub;
use dex_order_engine::repository::{ActiveOrderCache, InMemoryCache, InMemoryRepository, OrderRepository};
use dex_order_engine::scheduler::Scheduler;
use dex_order_engine::stats::StatsRegistry;
use dex_order_engine::store::QuoteStore;
use dex_order_engine::venue::simulator::InMemorySimulator;
use dex_order_engine::venue::worker;

/// A fully wired engine backed by an [`InMemorySimulator`] the test keeps a
/// handle to, so it can script quote/swap responses before submitting an
/// order. Mirrors `api::build_state`, minus the HTTP layer.
pub struct Harness {
    pub scheduler: Arc<Scheduler>,
    pub simulator: Arc<InMemorySimulator>,
    pub repository: Arc<InMemoryRepository>,
}

/// Config tuned for fast, deterministic tests: short backoffs so a scripted
/// retry doesn't stall the test, a deadline generous enough that a handful
/// of in-memory round trips always finish inside it.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        quote_deadline: Duration::from_millis(500),
        quote_backoff_base: Duration::from_millis(1),
        swap_backoff_base: Duration::from_millis(1),
        ..EngineConfig::default()
    }
}

pub fn build(config: EngineConfig) -> Harness {
    build_with_simulator(config, Arc::new(InMemorySimulator::new()))
}

/// Like [`build`], but with a caller-supplied simulator — used when a test
/// needs every venue to share some property (e.g. latency) that the default
/// simulator doesn't have set going in.
pub fn build_with_simulator(config: EngineConfig, simulator: Arc<InMemorySimulator>) -> Harness {
    let config = Arc::new(config);
    let repository = Arc::new(InMemoryRepository::new());
    let repo_dyn: Arc<dyn OrderRepository> = repository.clone();
    let cache: Arc<dyn ActiveOrderCache> = Arc::new(InMemoryCache::new());

    let venues = DEMO_VENUES
        .iter()
        .map(|venue| worker::spawn(*venue, simulator.clone(), config.clone(), repo_dyn.clone(), cache.clone()))
        .collect();

    let hub = Arc::new(RoutingHub::new((*config).clone()));
    let store = Arc::new(QuoteStore::new());
    let stats = Arc::new(StatsRegistry::new());
    let broadcaster = Arc::new(SessionBroadcaster::new());

    let scheduler = Scheduler::new(config, hub, store, stats, broadcaster, repo_dyn, cache, venues);

    Harness { scheduler, simulator, repository }
}

/// Attaches to an order's event stream and collects everything up to and
/// including the terminal event, bounded by a timeout so a regression that
/// drops an order mid-flight fails the test instead of hanging it.
pub async fn drain_to_terminal(broadcaster: &SessionBroadcaster, order_id: &str) -> Vec<Envelope> {
    let work = async {
        match broadcaster.attach(&order_id.to_string()) {
            SessionStream::NotFound => panic!("order '{order_id}' has no event channel"),
            SessionStream::Terminal(envelope) => vec![envelope],
            SessionStream::Live { replay, mut rx } => {
                let mut events = replay;
                if events.last().is_some_and(Envelope::is_terminal) {
                    return events;
                }
                while let Ok(envelope) = rx.recv().await {
                    let terminal = envelope.is_terminal();
                    events.push(envelope);
                    if terminal {
                        break;
                    }
                }
                events
            }
        }
    };

    tokio::time::timeout(Duration::from_secs(5), work)
        .await
        .expect("order did not reach a terminal state in time")
}
