pub mod strategy;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::model::{Preferences, Quote, QuoteTuple, RoutingStrategy, ValidationReport};

/// Converts raw quotes to tuples, validates them, scores them under a
/// strategy, and reports market-wide metrics. Holds no per-order state —
/// every call is a pure function of its arguments and the config, so one
/// `RoutingHub` is shared across all in-flight orders.
pub struct RoutingHub {
    config: EngineConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedRoute {
    pub dex: String,
    pub estimated_output: f64,
    pub slippage: f64,
    pub liquidity: f64,
    pub price: f64,
}

impl From<&QuoteTuple> for SelectedRoute {
    fn from(t: &QuoteTuple) -> Self {
        SelectedRoute {
            dex: t.venue.clone(),
            estimated_output: t.output,
            slippage: t.slippage,
            liquidity: t.liquidity,
            price: t.price,
        }
    }
}

pub type AlternativeRoutes = BTreeMap<RoutingStrategy, SelectedRoute>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketMetrics {
    pub price_spread: f64,
    pub price_spread_pct: f64,
    pub mean_price: f64,
    pub best_output: f64,
    pub worst_output: f64,
    pub mean_slippage: f64,
    pub total_liquidity: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub total_quotes: usize,
    pub market_metrics: MarketMetrics,
    pub strategy_analysis: AlternativeRoutes,
    pub recommendation: String,
    pub timestamp: DateTime<Utc>,
}

impl RoutingHub {
    pub fn new(config: EngineConfig) -> Self {
        RoutingHub { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Errors: missing venue identifier, output <= 0. Warnings: slippage >
    /// threshold, liquidity < threshold. Pure and idempotent — calling twice
    /// on the same input returns identical results.
    pub fn validate(&self, quotes: &[Quote]) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let thresholds = &self.config.validation_thresholds;

        for q in quotes {
            if q.venue.trim().is_empty() {
                errors.push("quote missing venue identifier".to_string());
            }
            if !(q.expected_output > 0.0) {
                errors.push(format!("venue '{}': output must be positive", q.venue));
            }
            if q.slippage > thresholds.slippage_warn {
                warnings.push(format!(
                    "venue '{}': slippage {:.2}% exceeds warn threshold",
                    q.venue,
                    q.slippage * 100.0
                ));
            }
            if q.liquidity < thresholds.liquidity_warn {
                warnings.push(format!(
                    "venue '{}': liquidity {:.0} below warn threshold",
                    q.venue, q.liquidity
                ));
            }
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Only quotes that pass `validate` and the optional `preferences` filter
    /// are eligible. Fails with `EngineError::NoQuotes` when nothing is left.
    pub fn select(
        &self,
        quotes: &[Quote],
        strategy: RoutingStrategy,
        preferences: Option<&Preferences>,
    ) -> Result<QuoteTuple, EngineError> {
        let candidates = self.eligible_tuples(quotes, preferences);
        if candidates.is_empty() {
            return Err(EngineError::NoQuotes);
        }
        // Promote the preferred venue to the back. It does not override the
        // objective function — `pick_winner` still runs the full comparison —
        // but `max_by` resolves a genuine tie in favor of the later element,
        // so this is what makes the preference the tie-break of last resort
        // when every other criterion is exactly equal.
        let ordered = match preferences.and_then(|p| p.preferred_venue.as_deref()) {
            Some(preferred) => {
                let mut v = candidates;
                if let Some(pos) = v.iter().position(|t| t.venue == preferred) {
                    let hit = v.remove(pos);
                    v.push(hit);
                }
                v
            }
            None => candidates,
        };

        strategy::pick_winner(strategy, &self.config, &ordered)
            .cloned()
            .ok_or(EngineError::NoQuotes)
    }

    /// Winner under every strategy, market-wide metrics, and a one-line
    /// recommendation. Computed once per order, after collection closes.
    pub fn analyze(&self, quotes: &[Quote]) -> Result<MarketAnalysis, EngineError> {
        let tuples = self.eligible_tuples(quotes, None);
        if tuples.is_empty() {
            return Err(EngineError::NoQuotes);
        }

        let mut strategy_analysis = AlternativeRoutes::new();
        for strategy in RoutingStrategy::ALL {
            if let Some(winner) = strategy::pick_winner(strategy, &self.config, &tuples) {
                strategy_analysis.insert(strategy, SelectedRoute::from(winner));
            }
        }

        let best_price = strategy_analysis
            .get(&RoutingStrategy::BestPrice)
            .expect("BEST_PRICE always has a winner when tuples is nonempty");
        let recommendation = format!(
            "{} offers the best expected output ({:.6} out)",
            best_price.dex, best_price.estimated_output
        );

        Ok(MarketAnalysis {
            total_quotes: quotes.len(),
            market_metrics: market_metrics(&tuples),
            strategy_analysis,
            recommendation,
            timestamp: Utc::now(),
        })
    }

    /// Tuples that pass validation and the optional preference filter. A
    /// venue sending a malformed quote is dropped rather than sinking the
    /// whole batch — other venues may still have answered correctly.
    fn eligible_tuples(&self, quotes: &[Quote], preferences: Option<&Preferences>) -> Vec<QuoteTuple> {
        quotes
            .iter()
            .filter(|q| !q.venue.trim().is_empty() && q.expected_output > 0.0)
            .map(QuoteTuple::from)
            .filter(|t| match preferences {
                Some(p) => {
                    !p.exclude_venues.contains(&t.venue)
                        && p.min_liquidity.is_none_or(|min| t.liquidity >= min)
                        && p.max_slippage.is_none_or(|max| t.slippage <= max)
                }
                None => true,
            })
            .collect()
    }
}

fn market_metrics(tuples: &[QuoteTuple]) -> MarketMetrics {
    let prices: Vec<f64> = tuples.iter().map(|t| t.price).collect();
    let outputs: Vec<f64> = tuples.iter().map(|t| t.output).collect();
    let min_price = prices.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean_price = prices.iter().sum::<f64>() / prices.len() as f64;
    let mean_slippage = tuples.iter().map(|t| t.slippage).sum::<f64>() / tuples.len() as f64;
    let total_liquidity = tuples.iter().map(|t| t.liquidity).sum();
    let price_spread = max_price - min_price;

    MarketMetrics {
        price_spread,
        price_spread_pct: if mean_price > 0.0 { price_spread / mean_price * 100.0 } else { 0.0 },
        mean_price,
        best_output: outputs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        worst_output: outputs.iter().cloned().fold(f64::INFINITY, f64::min),
        mean_slippage,
        total_liquidity,
    }
}
