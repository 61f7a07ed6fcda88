//! Runs an ordered plan of scenarios against a single test target.
use crate::client::{AnyClient, PoolClient};
use crate::error::BenchError;
use crate::metrics::BenchmarkMetrics;
use crate::scenario::{run_scenario, ScenarioContext};
use keepalive_bench_core::{
    ClientConfig, PlanSettings, PoolKind, RequestTarget, ScenarioKind, ScenarioReport,
};
use std::net::SocketAddr;
use test_target::{TargetConfig, TestTarget};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const TARGET_HOST: &str = "127.0.0.1";
const TARGET_PATH: &str = "/";

/// One scenario run: which client to build, what traffic to drive through it, and whether the
/// client's lifetime status belongs in the report.
#[derive(Clone, Debug)]
pub struct PlanEntry {
    pub client: ClientConfig,
    pub scenario: ScenarioKind,
    pub report_status: bool,
}

impl PlanEntry {
    pub fn new(client: ClientConfig, scenario: ScenarioKind) -> Self {
        Self {
            client,
            scenario,
            report_status: false,
        }
    }

    pub fn with_status(mut self) -> Self {
        self.report_status = true;
        self
    }

    pub fn name(&self) -> String {
        format!("{} / {}", self.client.kind, self.scenario)
    }
}

#[derive(Clone, Debug, Default)]
pub struct BenchmarkPlan {
    entries: Vec<PlanEntry>,
}

impl BenchmarkPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: PlanEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Candidate and baseline under each scenario shape, followed by a high-volume candidate
    /// run that reports the pool's lifetime status.
    pub fn standard(settings: &PlanSettings) -> Self {
        let scenarios = [
            ScenarioKind::SteadyState {
                total: settings.steady_total,
                width: settings.width,
            },
            ScenarioKind::LatencyProbe {
                total: settings.probe_total,
            },
            ScenarioKind::Burst {
                size: settings.burst_size,
            },
        ];

        let mut plan = Self::new();
        for kind in [PoolKind::KeepAlive, PoolKind::Baseline] {
            for scenario in scenarios {
                plan = plan.entry(PlanEntry::new(settings.client(kind), scenario));
            }
        }

        plan.entry(
            PlanEntry::new(
                settings.client(PoolKind::KeepAlive),
                ScenarioKind::SteadyState {
                    total: settings.status_total,
                    width: settings.width,
                },
            )
            .with_status(),
        )
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self) -> Result<(), BenchError> {
        match self
            .entries
            .iter()
            .find(|e| e.report_status && e.client.kind != PoolKind::KeepAlive)
        {
            Some(entry) => Err(BenchError::StatusUnavailable(entry.name())),
            None => Ok(()),
        }
    }
}

pub struct Orchestrator {
    plan: BenchmarkPlan,
    target: TargetConfig,
}

impl Orchestrator {
    pub fn new(plan: BenchmarkPlan, target: TargetConfig) -> Self {
        Self { plan, target }
    }

    pub fn plan(&self) -> &BenchmarkPlan {
        &self.plan
    }

    pub async fn run(&self) -> Result<Vec<ScenarioReport>, BenchError> {
        self.run_with(|_| {}).await
    }

    /// Bind the target, run every entry in order, then shut the target down.
    ///
    /// `on_report` sees each report as soon as its scenario finishes. The target is shut down
    /// exactly once whether or not an entry failed.
    pub async fn run_with<F>(&self, mut on_report: F) -> Result<Vec<ScenarioReport>, BenchError>
    where
        F: FnMut(&ScenarioReport),
    {
        self.plan.validate()?;

        let target = TestTarget::bind(self.target.clone()).await?;
        info!(
            "Running {} scenarios against {}",
            self.plan.len(),
            target.local_addr()
        );

        let res = self.run_entries(target.local_addr(), &mut on_report).await;
        let shutdown = target.shutdown().await;

        let reports = res?;
        shutdown?;
        Ok(reports)
    }

    async fn run_entries<F>(
        &self,
        addr: SocketAddr,
        on_report: &mut F,
    ) -> Result<Vec<ScenarioReport>, BenchError>
    where
        F: FnMut(&ScenarioReport),
    {
        let mut reports = Vec::with_capacity(self.plan.len());

        for entry in self.plan.entries() {
            let report = run_entry(entry, addr).await?;
            on_report(&report);
            reports.push(report);
        }

        Ok(reports)
    }
}

async fn run_entry(entry: &PlanEntry, addr: SocketAddr) -> Result<ScenarioReport, BenchError> {
    let name = entry.name();
    info!("Starting {name}");

    let ctx = ScenarioContext::new(
        AnyClient::build(&entry.client)?,
        RequestTarget::get(TARGET_HOST, addr.port(), TARGET_PATH),
        BenchmarkMetrics::new(&name),
    );

    let res = run_scenario(&ctx, entry.scenario).await;

    let status = if entry.report_status {
        ctx.client.status()
    } else {
        None
    };
    ctx.client.release();
    debug!("Released client for {name}");

    res?;

    if entry.report_status && status.is_none() {
        return Err(BenchError::StatusUnavailable(name));
    }

    Ok(ctx.metrics.report(status))
}
