use clap::Parser;

use dex_order_engine::api;
use dex_order_engine::broadcaster::SessionStream;
use dex_order_engine::config::EngineConfig;
use dex_order_engine::model::{Order, RoutingStrategy};

mod cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        cli::Command::Serve { host, port } => {
            let config = EngineConfig::from_env()?;
            rt.block_on(api::serve(&host, port, config))
        }
        cli::Command::Demo { token_in, token_out, amount, strategy } => {
            rt.block_on(run_demo(token_in, token_out, amount, strategy.into()))
        }
    }
}

async fn run_demo(token_in: String, token_out: String, amount: f64, strategy: RoutingStrategy) -> anyhow::Result<()> {
    let config = EngineConfig::from_env()?;
    let state = api::build_state(config);

    let order = Order::new(token_in, token_out, amount, strategy);
    let order_id = state.scheduler.submit_order(order, None).await?;
    println!("[demo] submitted order={order_id} strategy={strategy:?}");

    match state.scheduler.broadcaster().attach(&order_id) {
        SessionStream::NotFound => println!("[demo] order vanished before it could be observed"),
        SessionStream::Terminal(envelope) => print_envelope(&envelope),
        SessionStream::Live { replay, mut rx } => {
            for envelope in replay {
                let terminal = envelope.is_terminal();
                print_envelope(&envelope);
                if terminal {
                    return Ok(());
                }
            }
            while let Ok(envelope) = rx.recv().await {
                let terminal = envelope.is_terminal();
                print_envelope(&envelope);
                if terminal {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn print_envelope(envelope: &dex_order_engine::events::Envelope) {
    match serde_json::to_string(envelope) {
        Ok(line) => println!("{line}"),
        Err(err) => eprintln!("[demo] failed to serialize event: {err}"),
    }
}
