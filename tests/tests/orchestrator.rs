mod utils;
#[allow(unused)]
use utils::*;

use keepalive_bench::prelude::*;
use std::num::NonZeroUsize;
use test_target::TargetError;

fn small_settings() -> PlanSettings {
    PlanSettings {
        steady_total: 100,
        width: NonZeroUsize::new(10).unwrap(),
        probe_total: 10,
        burst_size: 20,
        status_total: 300,
        ..PlanSettings::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(60_000)]
async fn standard_plan_end_to_end() -> anyhow::Result<()> {
    init();

    let settings = small_settings();
    let orchestrator = Orchestrator::new(
        BenchmarkPlan::standard(&settings),
        TargetConfig::localhost(0),
    );

    let mut printed = vec![];
    let reports = orchestrator
        .run_with(|report| printed.push(report.to_string()))
        .await?;

    assert_eq!(reports.len(), orchestrator.plan().len());
    assert_eq!(printed.len(), reports.len());

    for (entry, report) in orchestrator.plan().entries().iter().zip(&reports) {
        assert_eq!(report.name, entry.name());
        assert_eq!(report.total(), entry.scenario.total());
        assert_eq!(
            report.connections_created + report.connections_reused,
            report.operations
        );
        if entry.client.kind == PoolKind::Baseline {
            assert_eq!(report.connections_reused, 0);
        }
        if let ScenarioKind::Burst { size } = entry.scenario {
            // Every pool starts empty and the cap covers the whole burst.
            assert_eq!(report.connections_created, size, "{}", report.name);
            assert_eq!(report.connections_reused, 0, "{}", report.name);
        }
    }

    let status_reports: Vec<_> = reports.iter().filter(|r| r.pool_status.is_some()).collect();
    assert_eq!(status_reports.len(), 1);

    let status = status_reports[0].pool_status.unwrap();
    assert_eq!(status.requests_served, settings.status_total);
    assert_eq!(status.socket_errors, 0);
    assert_eq!(status.socket_timeouts, 0);
    assert!(printed.last().unwrap().contains("pool status"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn bind_failure_runs_nothing() -> anyhow::Result<()> {
    init();

    let occupied = TestTarget::bind(TargetConfig::localhost(0)).await?;
    let port = occupied.local_addr().port();

    let mut seen = 0;
    let res = Orchestrator::new(
        BenchmarkPlan::standard(&small_settings()),
        TargetConfig::localhost(port),
    )
    .run_with(|_| seen += 1)
    .await;

    assert!(matches!(
        res,
        Err(BenchError::Target(TargetError::Bind { .. }))
    ));
    assert_eq!(seen, 0);
    assert_eq!(occupied.requests_served(), 0);

    occupied.shutdown().await?;
    Ok(())
}
