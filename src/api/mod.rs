pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod state;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::broadcaster::SessionBroadcaster;
use crate::config::EngineConfig;
use crate::hub::RoutingHub;
use crate::repository::{InMemoryCache, InMemoryRepository};
use crate::scheduler::Scheduler;
use crate::stats::StatsRegistry;
use crate::store::QuoteStore;
use crate::venue::simulator::InMemorySimulator;
use crate::venue::worker;

use self::rate_limit::RateLimiter;
use self::state::AppState;

/// The venues this demo wires up workers for. The set is otherwise
/// unconstrained by the core — any venue name the simulator and the speed
/// rank table agree on works.
pub const DEMO_VENUES: [&str; 4] = ["jupiter", "orca", "raydium", "meteora"];

/// Builds a fully wired [`AppState`] backed entirely by in-memory stand-ins:
/// [`InMemoryRepository`], [`InMemoryCache`], [`InMemorySimulator`]. Enough
/// to run the whole pipeline end to end for the demo binary and for tests;
/// explicitly not a production deployment.
pub fn build_state(config: EngineConfig) -> AppState {
    let config = Arc::new(config);
    let repository: Arc<dyn crate::repository::OrderRepository> = Arc::new(InMemoryRepository::new());
    let cache: Arc<dyn crate::repository::ActiveOrderCache> = Arc::new(InMemoryCache::new());
    let simulator = Arc::new(InMemorySimulator::new());

    let venues = DEMO_VENUES
        .iter()
        .map(|venue| worker::spawn(*venue, simulator.clone(), config.clone(), repository.clone(), cache.clone()))
        .collect();

    let hub = Arc::new(RoutingHub::new((*config).clone()));
    let store = Arc::new(QuoteStore::new());
    let stats = Arc::new(StatsRegistry::new());
    let broadcaster = Arc::new(SessionBroadcaster::new());

    let scheduler = Scheduler::new(config, hub, store, stats, broadcaster, repository.clone(), cache, venues);

    AppState { scheduler, repository, rate_limiter: Arc::new(RateLimiter::new()) }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(handlers::orders::submit_order).get(handlers::orders::list_orders))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route("/orders/{id}/events", get(handlers::stream::stream_events))
        .route("/stats", get(handlers::stats::get_stats))
        .route("/health", get(handlers::stats::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the demo HTTP/SSE adapter on `host:port`. Blocks until the
/// listener is closed.
pub async fn serve(host: &str, port: u16, config: EngineConfig) -> anyhow::Result<()> {
    let state = build_state(config);
    let app = router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    println!("[api] listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves once ctrl-c is received. In-flight requests (and the order
/// tasks they kicked off) are left to finish on their own; this only stops
/// the listener from accepting new connections.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        eprintln!("[api] failed to install ctrl-c handler, shutting down anyway");
        return;
    }
    println!("[api] shutdown signal received, draining connections");
}
