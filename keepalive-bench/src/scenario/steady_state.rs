use super::{measure, ScenarioContext};
use crate::client::PoolClient;
use crate::error::BenchError;
use crate::window::{ConcurrencyWindow, WindowStats};
use std::num::NonZeroUsize;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Keep `width` operations in flight until `total` have completed.
#[instrument(name = "scenario", skip_all, fields(name = ctx.metrics.name()))]
pub async fn run_steady_state<C: PoolClient>(
    ctx: &ScenarioContext<C>,
    total: u64,
    width: NonZeroUsize,
) -> Result<WindowStats, BenchError> {
    info!("Running steady state: total={total}, width={width}");
    measure(ctx, ConcurrencyWindow::bounded(width, total)).await
}
