use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::Quote;

use super::{SwapResult, VenueSimulator};

/// In-memory stand-in for the AMM pricing/execution collaborator. Not a
/// production venue integration — it exists so the core pipeline can be
/// exercised end to end in tests and via the demo adapter without a real
/// chain. Responses for a venue can be scripted (pushed to a FIFO queue,
/// useful for exercising retries and partial failures); once the script is
/// exhausted, quotes/swaps are generated deterministically from a hash of
/// the venue and pair so repeated runs are reproducible.
#[derive(Default)]
pub struct InMemorySimulator {
    scripted_quotes: Mutex<HashMap<String, VecDeque<Result<Quote, EngineError>>>>,
    scripted_swaps: Mutex<HashMap<String, VecDeque<Result<SwapResult, EngineError>>>>,
    /// Artificial latency added before responding, to mimic a blocking
    /// network call. Zero by default so unit tests stay fast.
    pub latency: Duration,
}

impl InMemorySimulator {
    pub fn new() -> Self {
        InMemorySimulator::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        InMemorySimulator {
            latency,
            ..Default::default()
        }
    }

    /// Queue a scripted response for the next `get_quote` call on `venue`.
    /// Responses are consumed FIFO, so pushing `Err(transient)`, `Err(transient)`,
    /// `Ok(quote)` exercises a worker retrying twice before success.
    pub fn script_quote(&self, venue: &str, result: Result<Quote, EngineError>) {
        self.scripted_quotes
            .lock()
            .unwrap()
            .entry(venue.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn script_swap(&self, venue: &str, result: Result<SwapResult, EngineError>) {
        self.scripted_swaps
            .lock()
            .unwrap()
            .entry(venue.to_string())
            .or_default()
            .push_back(result);
    }

    fn deterministic_rng(venue: &str, token_in: &str, token_out: &str) -> StdRng {
        let mut seed: u64 = 0xcbf29ce484222325;
        for byte in format!("{venue}:{token_in}:{token_out}").bytes() {
            seed ^= byte as u64;
            seed = seed.wrapping_mul(0x100000001b3);
        }
        StdRng::seed_from_u64(seed)
    }
}

#[async_trait]
impl VenueSimulator for InMemorySimulator {
    async fn get_quote(
        &self,
        venue: &str,
        token_in: &str,
        token_out: &str,
        amount: f64,
    ) -> Result<Quote, EngineError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = self
            .scripted_quotes
            .lock()
            .unwrap()
            .get_mut(venue)
            .and_then(VecDeque::pop_front);
        if let Some(result) = scripted {
            return result;
        }

        let mut rng = Self::deterministic_rng(venue, token_in, token_out);
        let price = rng.random_range(0.95..1.05);
        let slippage = rng.random_range(0.0005..0.02);
        let liquidity = rng.random_range(50_000.0..5_000_000.0);
        let fee = rng.random_range(0.0001..0.003);
        let output = amount * price * (1.0 - slippage);

        Ok(Quote {
            venue: venue.to_string(),
            price,
            expected_output: output,
            slippage,
            liquidity,
            fee,
            latency: Some(Duration::from_millis(rng.random_range(20..400))),
        })
    }

    async fn execute_swap(
        &self,
        venue: &str,
        token_in: &str,
        token_out: &str,
        amount: f64,
    ) -> Result<SwapResult, EngineError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = self
            .scripted_swaps
            .lock()
            .unwrap()
            .get_mut(venue)
            .and_then(VecDeque::pop_front);
        if let Some(result) = scripted {
            return result;
        }

        let quote = self.get_quote(venue, token_in, token_out, amount).await?;
        Ok(SwapResult {
            tx_hash: format!("0x{}", Uuid::new_v4().simple()),
            amount_out: quote.expected_output,
            executed_price: quote.price,
        })
    }
}
