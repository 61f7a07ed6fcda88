use keepalive_bench::prelude::*;
use std::sync::OnceLock;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_env_filter("keepalive_bench=debug,test_target=info")
            .with_test_writer()
            .init();
    });
}

/// Bind a target on an ephemeral port and build a context pointed at it.
#[allow(unused)]
pub async fn context_for<C: PoolClient>(
    client: C,
    target: TargetConfig,
    name: &str,
) -> anyhow::Result<(TestTarget, ScenarioContext<C>)> {
    let target = TestTarget::bind(target).await?;
    let ctx = ScenarioContext::new(
        client,
        RequestTarget::get("127.0.0.1", target.local_addr().port(), "/"),
        BenchmarkMetrics::new(name),
    );
    Ok((target, ctx))
}
