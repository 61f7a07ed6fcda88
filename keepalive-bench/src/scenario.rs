//! Scenario runners and their shared context
mod burst;
mod latency_probe;
mod steady_state;

pub use burst::run_burst;
pub use latency_probe::run_latency_probe;
pub use steady_state::run_steady_state;

use crate::client::PoolClient;
use crate::error::BenchError;
use crate::metrics::BenchmarkMetrics;
use crate::window::{ConcurrencyWindow, WindowStats};
use keepalive_bench_core::{RequestTarget, ScenarioKind};
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Everything a single scenario run owns: the client under test, where to send requests, and
/// the collector its outcomes are folded into.
pub struct ScenarioContext<C> {
    pub client: Arc<C>,
    pub target: Arc<RequestTarget>,
    pub metrics: Arc<BenchmarkMetrics>,
}

impl<C> ScenarioContext<C> {
    pub fn new(client: C, target: RequestTarget, metrics: BenchmarkMetrics) -> Self {
        Self {
            client: Arc::new(client),
            target: Arc::new(target),
            metrics: Arc::new(metrics),
        }
    }
}

/// Dispatch to the runner matching `kind`.
pub async fn run_scenario<C: PoolClient>(
    ctx: &ScenarioContext<C>,
    kind: ScenarioKind,
) -> Result<WindowStats, BenchError> {
    match kind {
        ScenarioKind::SteadyState { total, width } => run_steady_state(ctx, total, width).await,
        ScenarioKind::LatencyProbe { total } => run_latency_probe(ctx, total).await,
        ScenarioKind::Burst { size } => run_burst(ctx, size).await,
    }
}

/// Bracket a window run with the collector's start and end timestamps.
async fn measure<C: PoolClient>(
    ctx: &ScenarioContext<C>,
    window: ConcurrencyWindow,
) -> Result<WindowStats, BenchError> {
    ctx.metrics.start()?;
    let stats = window.drive(ctx).await;
    ctx.metrics.end()?;

    info!(
        "Scenario complete: {} operations, {} errors, peak in-flight {}",
        ctx.metrics.operations(),
        ctx.metrics.errors(),
        stats.peak_in_flight
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::MockClient;
    use crate::metrics::MetricsError;
    use std::num::NonZeroUsize;
    use std::time::Duration;

    fn context(name: &str) -> ScenarioContext<MockClient> {
        ScenarioContext::new(
            MockClient::new(Duration::from_millis(1), Duration::from_micros(200)),
            RequestTarget::get("127.0.0.1", 0, "/"),
            BenchmarkMetrics::new(name),
        )
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn dispatch_covers_every_kind() {
        let kinds = [
            ScenarioKind::SteadyState {
                total: 200,
                width: NonZeroUsize::new(20).unwrap(),
            },
            ScenarioKind::LatencyProbe { total: 20 },
            ScenarioKind::Burst { size: 50 },
        ];

        for kind in kinds {
            let ctx = context(kind.label());
            let stats = run_scenario(&ctx, kind).await.unwrap();

            assert_eq!(stats.completed, kind.total());
            assert_eq!(ctx.metrics.operations() + ctx.metrics.errors(), kind.total());
            assert!(ctx.metrics.duration().is_some());
        }
    }

    #[tokio::test]
    async fn metrics_cannot_be_reused_across_runs() {
        let ctx = context("reused");
        run_latency_probe(&ctx, 2).await.unwrap();

        let res = run_latency_probe(&ctx, 2).await;
        assert!(matches!(
            res,
            Err(BenchError::Metrics(MetricsError::AlreadyStarted(_)))
        ));
    }

    #[tokio::test]
    async fn empty_scenario_reports_defined_values() {
        let ctx = context("empty");
        let stats = run_steady_state(&ctx, 0, NonZeroUsize::new(50).unwrap())
            .await
            .unwrap();
        assert_eq!(stats, WindowStats::default());

        let report = ctx.metrics.report(None);
        assert_eq!(report.operations, 0);
        assert_eq!(report.errors, 0);
        assert_eq!(report.avg_latency_ms, None);
        assert_eq!(report.reuse_ratio, None);
        assert!(!report.to_string().contains("NaN"));
    }
}
