#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod client;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod scenario;
pub mod window;

pub(crate) mod latency;

pub use error::BenchError;
pub use orchestrator::{BenchmarkPlan, Orchestrator, PlanEntry};
pub use scenario::ScenarioContext;

pub mod prelude {
    pub use crate::client::{AnyClient, BaselineClient, KeepAliveClient, PoolClient};
    pub use crate::error::BenchError;
    pub use crate::metrics::BenchmarkMetrics;
    pub use crate::orchestrator::{BenchmarkPlan, Orchestrator, PlanEntry};
    pub use crate::scenario::{
        run_burst, run_latency_probe, run_scenario, run_steady_state, ScenarioContext,
    };
    pub use crate::window::{ConcurrencyWindow, WindowStats};

    pub use keepalive_bench_core::{
        ClientConfig, PlanSettings, PoolKind, PoolStatus, RequestTarget, ScenarioKind,
        ScenarioReport,
    };
    pub use test_target::{TargetConfig, TestTarget};
}
