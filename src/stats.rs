use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use crate::model::RoutingStrategy;

#[derive(Debug, Clone, Default, Serialize)]
pub struct VenueCounts {
    pub success: u64,
    pub failure: u64,
}

/// Cumulative counters for the whole process. The only cross-order shared
/// mutable state in the system — everything else is scoped per order id.
/// Cheap enough to snapshot on every health probe, so `snapshot` clones
/// rather than streaming.
#[derive(Default)]
pub struct StatsRegistry {
    inner: Mutex<StatsInner>,
}

#[derive(Default, Clone)]
struct StatsInner {
    total_orders: u64,
    quotes_success: u64,
    quotes_failure: u64,
    per_venue: HashMap<String, VenueCounts>,
    per_strategy: HashMap<RoutingStrategy, u64>,
    executions_success: u64,
    executions_failure: u64,
    collection_time_total: Duration,
    collection_time_samples: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_orders: u64,
    pub quotes_success: u64,
    pub quotes_failure: u64,
    pub per_venue: HashMap<String, VenueCounts>,
    pub per_strategy: HashMap<RoutingStrategy, u64>,
    pub executions_success: u64,
    pub executions_failure: u64,
    pub mean_collection_time_ms: f64,
}

impl StatsRegistry {
    pub fn new() -> Self {
        StatsRegistry::default()
    }

    pub fn record_order_started(&self, strategy: RoutingStrategy) {
        let mut inner = self.inner.lock().unwrap();
        inner.total_orders += 1;
        *inner.per_strategy.entry(strategy).or_insert(0) += 1;
    }

    pub fn record_quote_success(&self, venue: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.quotes_success += 1;
        inner.per_venue.entry(venue.to_string()).or_default().success += 1;
    }

    pub fn record_quote_failure(&self, venue: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.quotes_failure += 1;
        inner.per_venue.entry(venue.to_string()).or_default().failure += 1;
    }

    pub fn record_collection_time(&self, elapsed: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.collection_time_total += elapsed;
        inner.collection_time_samples += 1;
    }

    pub fn record_execution_result(&self, success: bool) {
        let mut inner = self.inner.lock().unwrap();
        if success {
            inner.executions_success += 1;
        } else {
            inner.executions_failure += 1;
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock().unwrap().clone();
        let mean_collection_time_ms = if inner.collection_time_samples > 0 {
            inner.collection_time_total.as_secs_f64() * 1000.0 / inner.collection_time_samples as f64
        } else {
            0.0
        };

        StatsSnapshot {
            total_orders: inner.total_orders,
            quotes_success: inner.quotes_success,
            quotes_failure: inner.quotes_failure,
            per_venue: inner.per_venue,
            per_strategy: inner.per_strategy,
            executions_success: inner.executions_success,
            executions_failure: inner.executions_failure,
            mean_collection_time_ms,
        }
    }
}
