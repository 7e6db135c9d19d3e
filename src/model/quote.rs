use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A priced, sized offer to execute a swap on one venue. Produced by a venue
/// worker's quote job; consumed only by the routing hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub venue: String,
    /// token-out per token-in.
    pub price: f64,
    pub expected_output: f64,
    /// 0..1
    pub slippage: f64,
    pub liquidity: f64,
    pub fee: f64,
    pub latency: Option<Duration>,
}

/// The hub's normalized, immutable view of a quote: (P, O, S, L, D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteTuple {
    pub price: f64,
    pub output: f64,
    pub slippage: f64,
    pub liquidity: f64,
    pub venue: String,
    pub latency: Option<Duration>,
}

impl From<&Quote> for QuoteTuple {
    fn from(q: &Quote) -> Self {
        QuoteTuple {
            price: q.price,
            output: q.expected_output,
            slippage: q.slippage,
            liquidity: q.liquidity,
            venue: q.venue.clone(),
            latency: q.latency,
        }
    }
}

/// Optional narrowing applied before scoring. A preferred venue is promoted
/// to the front of the candidate set but is never force-selected over a
/// strategy's objective function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub exclude_venues: Vec<String>,
    pub min_liquidity: Option<f64>,
    pub max_slippage: Option<f64>,
    pub preferred_venue: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}
