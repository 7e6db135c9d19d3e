use serde::{Deserialize, Serialize};

use crate::model::{Preferences, RoutingStrategy};

/// The order-submission request, per the client-facing protocol's
/// "Order submission (request side)" contract.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: f64,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub slippage: Option<f64>,
    #[serde(default)]
    pub routing_strategy: Option<String>,
    #[serde(default)]
    pub auto_execute: Option<bool>,
    #[serde(default)]
    pub exclude_venues: Vec<String>,
    #[serde(default)]
    pub min_liquidity: Option<f64>,
    #[serde(default)]
    pub preferred_venue: Option<String>,
}

impl CreateOrderRequest {
    /// Field-level checks that must hard-fail the request. Routing-strategy
    /// parsing is handled separately since an unknown tag degrades with a
    /// warning rather than rejecting the order.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.token_in.trim().is_empty() {
            errors.push("tokenIn must not be empty".into());
        }
        if self.token_out.trim().is_empty() {
            errors.push("tokenOut must not be empty".into());
        }
        if !self.token_in.trim().is_empty() && self.token_in == self.token_out {
            errors.push("tokenOut must differ from tokenIn".into());
        }
        if !(self.amount_in > 0.0 && self.amount_in <= 1_000_000.0) {
            errors.push("amountIn must be positive and at most 1,000,000".into());
        }
        if let Some(order_type) = &self.order_type {
            if order_type != "market" {
                errors.push(format!("unsupported orderType '{order_type}'"));
            }
        }
        if let Some(slippage) = self.slippage {
            if !(0.0..=0.5).contains(&slippage) {
                errors.push("slippage must be between 0 and 0.5".into());
            }
        }

        errors
    }

    pub fn preferences(&self) -> Option<Preferences> {
        if self.exclude_venues.is_empty() && self.min_liquidity.is_none() && self.preferred_venue.is_none() && self.slippage.is_none() {
            return None;
        }
        Some(Preferences {
            exclude_venues: self.exclude_venues.clone(),
            min_liquidity: self.min_liquidity,
            max_slippage: self.slippage,
            preferred_venue: self.preferred_venue.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub status: &'static str,
    pub routing_strategy: RoutingStrategy,
    pub warnings: Vec<String>,
}
