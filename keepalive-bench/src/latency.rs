use keepalive_bench_core::LatencySummary;
use pdatastructs::tdigest::{TDigest, K1};
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Summarize per-operation latencies. `None` when nothing was recorded.
pub(crate) fn summarize(samples: &[Duration]) -> Option<LatencySummary> {
    if samples.is_empty() {
        return None;
    }

    let secs: Vec<f64> = samples.iter().map(Duration::as_secs_f64).collect();

    let mut digest = default_tdigest();
    for value in &secs {
        digest.insert(*value);
    }

    let mean = statistical::mean(&secs);
    // NOTE: statistical panics on fewer than two samples
    let std_dev = if secs.len() > 1 {
        statistical::standard_deviation(&secs, Some(mean))
    } else {
        0.
    };

    Some(LatencySummary {
        p50: quantile(&digest, 0.5),
        p90: quantile(&digest, 0.9),
        p99: quantile(&digest, 0.99),
        mean: to_duration(mean),
        std_dev: to_duration(std_dev),
    })
}

fn quantile(digest: &TDigest<K1>, quantile: f64) -> Duration {
    let secs = digest.quantile(quantile);

    // TDigest can hand back NaN for sparse inputs
    if !secs.is_finite() {
        error!("NaN latency calculation for quantile {quantile}");
        return Duration::ZERO;
    }

    to_duration(secs)
}

fn to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0. {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}
