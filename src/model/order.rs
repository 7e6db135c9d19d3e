use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OrderId = String;

/// One of the four routing objectives the hub can score quotes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingStrategy {
    BestPrice,
    LowestSlippage,
    HighestLiquidity,
    FastestExecution,
}

impl Default for RoutingStrategy {
    fn default() -> Self {
        RoutingStrategy::BestPrice
    }
}

impl RoutingStrategy {
    pub const ALL: [RoutingStrategy; 4] = [
        RoutingStrategy::BestPrice,
        RoutingStrategy::LowestSlippage,
        RoutingStrategy::HighestLiquidity,
        RoutingStrategy::FastestExecution,
    ];

    /// Parse the wire tag, degrading unknown values to `BEST_PRICE` with a
    /// warning rather than rejecting the order outright.
    pub fn parse_lenient(raw: &str) -> (RoutingStrategy, Option<String>) {
        match raw {
            "BEST_PRICE" => (RoutingStrategy::BestPrice, None),
            "LOWEST_SLIPPAGE" => (RoutingStrategy::LowestSlippage, None),
            "HIGHEST_LIQUIDITY" => (RoutingStrategy::HighestLiquidity, None),
            "FASTEST_EXECUTION" => (RoutingStrategy::FastestExecution, None),
            other => (
                RoutingStrategy::BestPrice,
                Some(format!("unknown routing strategy '{other}', defaulting to BEST_PRICE")),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::Market
    }
}

/// Position in the order's lifecycle; see [`Order::transition`] for the edges
/// allowed out of each state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Routing,
    Processing,
    Building,
    Submitted,
    Confirmed,
    Failed,
}

impl OrderStatus {
    /// Confirmed and failed are the only sinks; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: f64,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub routing_strategy: RoutingStrategy,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Outcome fields, populated as the order progresses.
    pub selected_venue: Option<String>,
    pub executed_price: Option<f64>,
    pub amount_out: Option<f64>,
    pub tx_hash: Option<String>,
    pub error_message: Option<String>,
}

impl Order {
    pub fn new(
        token_in: impl Into<String>,
        token_out: impl Into<String>,
        amount_in: f64,
        routing_strategy: RoutingStrategy,
    ) -> Self {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4().to_string(),
            token_in: token_in.into(),
            token_out: token_out.into(),
            amount_in,
            order_type: OrderType::Market,
            status: OrderStatus::Pending,
            routing_strategy,
            retry_count: 0,
            created_at: now,
            updated_at: now,
            selected_venue: None,
            executed_price: None,
            amount_out: None,
            tx_hash: None,
            error_message: None,
        }
    }

    /// Move to `next`. Once `status` is terminal this is a no-op rather than
    /// an error, so callers racing a late event against an already-terminal
    /// order don't need to special-case it; otherwise the caller is trusted
    /// to pass a forward edge (there is no separate edge table to check
    /// against).
    pub fn transition(&mut self, next: OrderStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = next;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.error_message = Some(message.into());
        self.status = OrderStatus::Failed;
        self.updated_at = Utc::now();
    }
}
