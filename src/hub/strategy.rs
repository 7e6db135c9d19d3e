use std::cmp::Ordering;

use crate::config::EngineConfig;
use crate::model::QuoteTuple;

/// Total order over quote tuples for a given strategy: `Ordering::Less`
/// means `a` is the worse (or equal) candidate, so `max_by` picks the spec's
/// winner directly without a separate tie-break pass.
pub fn compare(strategy: crate::model::RoutingStrategy, cfg: &EngineConfig, a: &QuoteTuple, b: &QuoteTuple) -> Ordering {
    use crate::model::RoutingStrategy::*;
    match strategy {
        BestPrice => cmp_f64(a.output, b.output)
            .then_with(|| cmp_f64(b.slippage, a.slippage)) // lower slippage wins -> reverse
            .then_with(|| cmp_latency_lower_wins(a, b))
            .then_with(|| b.venue.cmp(&a.venue)), // lexicographically-lower venue wins -> reverse
        LowestSlippage => cmp_f64(b.slippage, a.slippage) // lower slippage wins -> reverse
            .then_with(|| cmp_f64(a.output, b.output)),
        HighestLiquidity => cmp_f64(a.liquidity, b.liquidity)
            .then_with(|| cmp_f64(a.output, b.output)),
        FastestExecution => cfg
            .speed_rank(&a.venue)
            .cmp(&cfg.speed_rank(&b.venue))
            .then_with(|| cmp_f64(b.slippage, a.slippage)),
    }
}

/// `f64` has no total order (NaN); quotes that produce NaN here are rejected
/// by `validate` before they ever reach scoring, so this only has to break
/// ties among finite values.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn cmp_latency_lower_wins(a: &QuoteTuple, b: &QuoteTuple) -> Ordering {
    match (a.latency, b.latency) {
        (Some(a), Some(b)) => b.cmp(&a), // lower latency wins -> reverse
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Pick the winner of `tuples` under `strategy`. Empty input is the caller's
/// responsibility to reject before calling this.
pub fn pick_winner<'a>(
    strategy: crate::model::RoutingStrategy,
    cfg: &EngineConfig,
    tuples: &'a [QuoteTuple],
) -> Option<&'a QuoteTuple> {
    tuples.iter().max_by(|a, b| compare(strategy, cfg, a, b))
}
