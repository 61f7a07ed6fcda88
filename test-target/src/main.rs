use clap::Parser;
use keepalive_bench_core::DEFAULT_TARGET_PORT;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU64;
use test_target::{TargetConfig, TestTarget};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Fixed responder for keep-alive benchmarks.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    #[arg(short, long, default_value_t = DEFAULT_TARGET_PORT)]
    port: u16,

    /// Answer every N-th request with a 500.
    #[arg(long)]
    fail_every: Option<NonZeroU64>,

    /// Delay before each response, e.g. `50ms`.
    #[arg(long, default_value = "0s")]
    delay: humantime::Duration,

    #[arg(long, default_value = "test_target=info,tower_http=info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&args.log))
        .init();

    let mut config = TargetConfig {
        addr: SocketAddr::new(args.host, args.port),
        ..TargetConfig::default()
    }
    .response_delay(args.delay.into());
    if let Some(n) = args.fail_every {
        config = config.fail_every(n);
    }

    let target = TestTarget::bind(config).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received ctrl-c, {} requests served", target.requests_served());

    target.shutdown().await?;
    Ok(())
}
