use super::{measure, ScenarioContext};
use crate::client::PoolClient;
use crate::error::BenchError;
use crate::window::{ConcurrencyWindow, WindowStats};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Issue `total` operations one after another, each only once the previous has finished.
#[instrument(name = "scenario", skip_all, fields(name = ctx.metrics.name()))]
pub async fn run_latency_probe<C: PoolClient>(
    ctx: &ScenarioContext<C>,
    total: u64,
) -> Result<WindowStats, BenchError> {
    info!("Running latency probe: total={total}");
    measure(ctx, ConcurrencyWindow::sequential(total)).await
}
