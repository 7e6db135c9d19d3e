pub mod queue;
pub mod rate_limit;
pub mod retry;
pub mod simulator;
pub mod worker;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::model::Quote;

#[derive(Debug, Clone)]
pub struct SwapResult {
    pub tx_hash: String,
    pub amount_out: f64,
    pub executed_price: f64,
}

/// The external collaborator contract for AMM pricing and execution. Opaque
/// to the core: a venue worker never knows or cares whether the
/// implementation behind this trait is a real on-chain simulator or, as in
/// this repo, the in-memory stand-in in [`simulator::InMemorySimulator`].
#[async_trait]
pub trait VenueSimulator: Send + Sync {
    async fn get_quote(
        &self,
        venue: &str,
        token_in: &str,
        token_out: &str,
        amount: f64,
    ) -> Result<Quote, EngineError>;

    async fn execute_swap(
        &self,
        venue: &str,
        token_in: &str,
        token_out: &str,
        amount: f64,
    ) -> Result<SwapResult, EngineError>;
}
