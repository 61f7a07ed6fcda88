use crate::metrics::MetricsError;
use test_target::TargetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Test target error: {0}")]
    Target(#[from] TargetError),

    #[error("Failed to build client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("Pool status requested for `{0}`, which does not track it")]
    StatusUnavailable(String),
}
