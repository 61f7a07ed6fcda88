use super::{measure, ScenarioContext};
use crate::client::PoolClient;
use crate::error::BenchError;
use crate::window::{ConcurrencyWindow, WindowStats};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Issue all `size` operations at once, then wait for every one of them.
#[instrument(name = "scenario", skip_all, fields(name = ctx.metrics.name()))]
pub async fn run_burst<C: PoolClient>(
    ctx: &ScenarioContext<C>,
    size: u64,
) -> Result<WindowStats, BenchError> {
    info!("Running burst: size={size}");
    measure(ctx, ConcurrencyWindow::unbounded(size)).await
}
