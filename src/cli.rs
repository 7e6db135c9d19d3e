use clap::{Parser, Subcommand};

use dex_order_engine::model::RoutingStrategy;

/// DEX order execution engine — fans quote requests out across venues,
/// scores them, and executes the winning route.
#[derive(Parser)]
#[command(name = "dex-order-engine", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP/SSE adapter
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Run one order through the engine in-process and print its event
    /// stream to stdout. Useful for exercising the pipeline without a
    /// server.
    Demo {
        #[arg(long, default_value = "SOL")]
        token_in: String,

        #[arg(long, default_value = "USDC")]
        token_out: String,

        #[arg(long, default_value = "100.0")]
        amount: f64,

        #[arg(long, value_enum, default_value = "best-price")]
        strategy: DemoStrategy,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum DemoStrategy {
    BestPrice,
    LowestSlippage,
    HighestLiquidity,
    FastestExecution,
}

impl From<DemoStrategy> for RoutingStrategy {
    fn from(s: DemoStrategy) -> Self {
        match s {
            DemoStrategy::BestPrice => RoutingStrategy::BestPrice,
            DemoStrategy::LowestSlippage => RoutingStrategy::LowestSlippage,
            DemoStrategy::HighestLiquidity => RoutingStrategy::HighestLiquidity,
            DemoStrategy::FastestExecution => RoutingStrategy::FastestExecution,
        }
    }
}
