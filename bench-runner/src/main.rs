use clap::Parser;
use keepalive_bench::prelude::*;
use keepalive_bench_core::{
    DEFAULT_BURST_SIZE, DEFAULT_MAX_FREE_SOCKETS, DEFAULT_MAX_SOCKETS, DEFAULT_PROBE_TOTAL,
    DEFAULT_STATUS_TOTAL, DEFAULT_STEADY_TOTAL, DEFAULT_TARGET_PORT, DEFAULT_WINDOW_WIDTH,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::num::{NonZeroU64, NonZeroUsize};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Compare a keep-alive connection pool against a fresh-connection baseline.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Operations per steady-state scenario.
    #[arg(short('n'), long, default_value_t = DEFAULT_STEADY_TOTAL)]
    total: u64,

    /// Concurrency window width for steady-state scenarios.
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_WIDTH)]
    width: NonZeroUsize,

    /// Operations per latency probe.
    #[arg(long, default_value_t = DEFAULT_PROBE_TOTAL)]
    probe_total: u64,

    #[arg(long, default_value_t = DEFAULT_BURST_SIZE)]
    burst_size: u64,

    /// Maximum sockets per client.
    #[arg(long, default_value_t = DEFAULT_MAX_SOCKETS)]
    pool_size: NonZeroUsize,

    /// Idle sockets the keep-alive pool may hold.
    #[arg(long, default_value_t = DEFAULT_MAX_FREE_SOCKETS)]
    max_free_sockets: usize,

    #[arg(long, default_value = "4s")]
    free_socket_timeout: humantime::Duration,

    #[arg(long, default_value = "30s")]
    request_timeout: humantime::Duration,

    /// Operations in the high-volume run that reports pool status.
    #[arg(long, default_value_t = DEFAULT_STATUS_TOTAL)]
    status_total: u64,

    /// Port for the local test target; 0 picks a free one.
    #[arg(short, long, default_value_t = DEFAULT_TARGET_PORT)]
    port: u16,

    /// Have the test target fail every N-th request.
    #[arg(long)]
    fail_every: Option<NonZeroU64>,

    /// Serve Prometheus metrics on this address while the benchmark runs.
    #[arg(long)]
    prometheus: Option<SocketAddr>,

    #[arg(long, default_value = "keepalive_bench=info,bench_runner=info,test_target=info")]
    log: String,
}

impl Args {
    fn settings(&self) -> PlanSettings {
        PlanSettings {
            steady_total: self.total,
            width: self.width,
            probe_total: self.probe_total,
            burst_size: self.burst_size,
            status_total: self.status_total,
            max_sockets: self.pool_size,
            max_free_sockets: self.max_free_sockets,
            free_socket_timeout: self.free_socket_timeout.into(),
            request_timeout: self.request_timeout.into(),
        }
    }

    fn target(&self) -> TargetConfig {
        let config = TargetConfig::localhost(self.port);
        match self.fail_every {
            Some(n) => config.fail_every(n),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&args.log))
        .init();

    if let Some(addr) = args.prometheus {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!("Serving Prometheus metrics on {addr}");
    }

    let plan = BenchmarkPlan::standard(&args.settings());
    let reports = Orchestrator::new(plan, args.target())
        .run_with(|report| println!("{report}\n"))
        .await?;

    info!("Finished {} scenarios", reports.len());
    Ok(())
}
