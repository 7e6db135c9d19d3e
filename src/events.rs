use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hub::{AlternativeRoutes, MarketMetrics, SelectedRoute};
use crate::model::{OrderId, RoutingStrategy};

/// One received-quote summary as carried on `quotes_collected`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub dex: String,
    pub price: f64,
    pub estimated_output: f64,
    pub slippage: f64,
    pub liquidity: f64,
}

/// A single event on an order's lifecycle stream. Variants map 1:1 onto the
/// `status` column of the client-facing streaming protocol; `#[serde(tag =
/// "status")]` gives exactly that wire shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OrderEvent {
    Pending {
        message: String,
    },
    QuoteReceived {
        dex: String,
        quote: QuoteSummary,
        quotes_received: usize,
        total_expected: usize,
    },
    QuoteFailed {
        dex: String,
        error: String,
        quotes_received: usize,
        total_expected: usize,
    },
    QuotesCollected {
        quotes: Vec<QuoteSummary>,
        valid_quotes: usize,
        total_received: usize,
    },
    DexSelected {
        selected_route: SelectedRoute,
        strategy: RoutingStrategy,
        market_metrics: MarketMetrics,
        alternative_routes: AlternativeRoutes,
    },
    Building {
        dex: String,
        stage: String,
    },
    Submitted {
        dex: String,
        stage: String,
        tx_hash: String,
    },
    Confirmed {
        dex: String,
        tx_hash: String,
        amount_out: f64,
        executed_price: f64,
    },
    Failed {
        message: String,
        error: String,
    },
    Error {
        message: String,
    },
}

/// The envelope every event goes out the door wrapped in: `{orderId,
/// status, timestamp, ...payload}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub order_id: OrderId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: OrderEvent,
}

impl Envelope {
    pub fn new(order_id: OrderId, event: OrderEvent) -> Self {
        Envelope {
            order_id,
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.event, OrderEvent::Confirmed { .. } | OrderEvent::Failed { .. })
    }
}
