mod utils;
#[allow(unused)]
use utils::*;

use keepalive_bench::prelude::*;
use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

fn max_sockets(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn steady_state_against_healthy_target() -> anyhow::Result<()> {
    init();

    let client = KeepAliveClient::new(&ClientConfig::keep_alive(max_sockets(100)))?;
    let (target, ctx) = context_for(client, TargetConfig::localhost(0), "steady").await?;

    let stats = run_steady_state(&ctx, 1_000, max_sockets(50)).await?;
    ctx.client.release();

    assert_eq!(stats.completed, 1_000);
    assert!(stats.peak_in_flight <= 50);

    let report = ctx.metrics.report(ctx.client.status());
    assert_eq!(report.operations, 1_000);
    assert_eq!(report.errors, 0);
    assert_eq!(report.connections_created + report.connections_reused, 1_000);
    assert!(report.connections_reused > 0);
    assert!(report.throughput.is_some());
    assert!(report.latency.is_some());

    assert_eq!(target.requests_served(), 1_000);
    target.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn deterministic_failures_are_counted_not_fatal() -> anyhow::Result<()> {
    init();

    let client = KeepAliveClient::new(&ClientConfig::keep_alive(max_sockets(100)))?;
    let config = TargetConfig::localhost(0).fail_every(NonZeroU64::new(10).unwrap());
    let (target, ctx) = context_for(client, config, "failures").await?;

    run_steady_state(&ctx, 500, max_sockets(50)).await?;
    ctx.client.release();

    let errors = ctx.metrics.errors();
    let operations = ctx.metrics.operations();
    assert_eq!(operations + errors, 500);
    assert!((45..=55).contains(&errors), "errors: {errors}");
    assert!((445..=455).contains(&operations), "operations: {operations}");
    assert_eq!(
        ctx.metrics.connections_created() + ctx.metrics.connections_reused(),
        operations
    );

    target.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn burst_on_empty_pool_opens_fresh_connections() -> anyhow::Result<()> {
    init();

    // Fast responses give the pool every chance to hand a finished connection to a later
    // request of the same burst, so repeat a few times.
    for round in 0..10 {
        let client = KeepAliveClient::new(&ClientConfig::keep_alive(max_sockets(100)))?;
        let (target, ctx) =
            context_for(client, TargetConfig::localhost(0), &format!("burst {round}")).await?;

        let stats = run_burst(&ctx, 100).await?;
        ctx.client.release();

        assert_eq!(stats.issued, 100);
        assert_eq!(ctx.metrics.operations(), 100);
        assert!(ctx.metrics.connections_created() <= 100);
        assert_eq!(ctx.metrics.connections_reused(), 0, "round {round}");

        target.shutdown().await?;
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn burst_past_the_socket_cap_completes() -> anyhow::Result<()> {
    init();

    let client = KeepAliveClient::new(&ClientConfig::keep_alive(max_sockets(10)))?;
    let config = TargetConfig::localhost(0).response_delay(Duration::from_millis(5));
    let (target, ctx) = context_for(client, config, "capped burst").await?;

    let stats = run_burst(&ctx, 100).await?;
    ctx.client.release();

    assert_eq!(stats.completed, 100);
    assert_eq!(ctx.metrics.operations(), 100);
    assert!(target.connections_accepted() <= 10);
    assert!(ctx.metrics.connections_reused() >= 90);

    target.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn baseline_never_reuses() -> anyhow::Result<()> {
    init();

    let client = BaselineClient::new(&ClientConfig::baseline(max_sockets(100)))?;
    let (target, ctx) = context_for(client, TargetConfig::localhost(0), "baseline").await?;

    run_steady_state(&ctx, 200, max_sockets(20)).await?;
    ctx.client.release();

    assert_eq!(ctx.metrics.operations(), 200);
    assert_eq!(ctx.metrics.connections_created(), 200);
    assert_eq!(ctx.metrics.reuse_ratio(), Some(0.));
    assert!(ctx.client.status().is_none());
    assert_eq!(target.connections_accepted(), 200);

    target.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn latency_probe_is_sequential() -> anyhow::Result<()> {
    init();

    let client = KeepAliveClient::new(&ClientConfig::keep_alive(max_sockets(100)))?;
    let (target, ctx) = context_for(client, TargetConfig::localhost(0), "probe").await?;

    let stats = run_latency_probe(&ctx, 50).await?;
    ctx.client.release();

    assert_eq!(stats.peak_in_flight, 1);
    assert_eq!(ctx.metrics.operations(), 50);
    assert!(ctx.metrics.connections_created() < 50);
    assert!(ctx.metrics.avg_latency_ms().is_some());

    target.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn empty_run_has_defined_statistics() -> anyhow::Result<()> {
    init();

    let client = KeepAliveClient::new(&ClientConfig::keep_alive(max_sockets(100)))?;
    let (target, ctx) = context_for(client, TargetConfig::localhost(0), "empty").await?;

    run_steady_state(&ctx, 0, max_sockets(50)).await?;
    ctx.client.release();

    let report = ctx.metrics.report(None);
    assert_eq!(report.total(), 0);
    assert_eq!(report.avg_latency_ms, None);
    assert_eq!(report.reuse_ratio, None);
    assert!(report.latency.is_none());

    let rendered = report.to_string();
    assert!(!rendered.contains("NaN"));
    assert_eq!(target.requests_served(), 0);

    target.shutdown().await?;
    Ok(())
}
