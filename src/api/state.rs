use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::repository::OrderRepository;
use crate::scheduler::Scheduler;

/// Everything an axum handler needs, cloned cheaply per request — every
/// field is already an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub repository: Arc<dyn OrderRepository>,
    pub rate_limiter: Arc<RateLimiter>,
}
