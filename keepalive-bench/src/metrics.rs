use crate::latency;
use keepalive_bench_core::{PoolStatus, RequestOutcome, ScenarioReport};
use metrics_util::AtomicBucket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("Metrics for `{0}` were already started")]
    AlreadyStarted(String),

    #[error("Metrics for `{0}` were ended before being started")]
    NotStarted(String),

    #[error("Metrics for `{0}` were already ended")]
    AlreadyEnded(String),
}

/// Counters and timestamps for a single scenario run.
///
/// Every successful operation is classified as exactly one of created or reused, so
/// `connections_created + connections_reused == operations` always holds. Errors are counted
/// on their own and never show up in `operations`.
///
/// Counters are atomics since outcomes are recorded from whichever worker thread the
/// operation completed on.
pub struct BenchmarkMetrics {
    name: String,
    started: OnceLock<Instant>,
    ended: OnceLock<Instant>,
    operations: AtomicU64,
    errors: AtomicU64,
    connections_created: AtomicU64,
    connections_reused: AtomicU64,
    latency: AtomicBucket<Duration>,
}

impl BenchmarkMetrics {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            started: OnceLock::new(),
            ended: OnceLock::new(),
            operations: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            connections_created: AtomicU64::new(0),
            connections_reused: AtomicU64::new(0),
            latency: AtomicBucket::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> Result<(), MetricsError> {
        self.started
            .set(Instant::now())
            .map_err(|_| MetricsError::AlreadyStarted(self.name.clone()))
    }

    pub fn end(&self) -> Result<(), MetricsError> {
        if self.started.get().is_none() {
            return Err(MetricsError::NotStarted(self.name.clone()));
        }

        self.ended
            .set(Instant::now())
            .map_err(|_| MetricsError::AlreadyEnded(self.name.clone()))
    }

    pub fn record_success(&self, reused: bool) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        if reused {
            self.connections_reused.fetch_add(1, Ordering::Relaxed);
        } else {
            self.connections_created.fetch_add(1, Ordering::Relaxed);
        }

        #[cfg(feature = "metrics")]
        {
            metrics::counter!("keepalive_bench_operations", "scenario" => self.name.clone())
                .increment(1);
            let label = if reused { "reused" } else { "created" };
            metrics::counter!("keepalive_bench_connections", "scenario" => self.name.clone(), "kind" => label)
                .increment(1);
        }
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("keepalive_bench_errors", "scenario" => self.name.clone()).increment(1);
    }

    /// Fold a single operation's outcome in, along with how long it took.
    pub fn record(&self, outcome: &RequestOutcome, elapsed: Duration) {
        match outcome {
            Ok(connection) => self.record_success(connection.is_reused()),
            Err(err) => {
                trace!("Operation failed: {err}");
                self.record_error();
            }
        }

        self.latency.push(elapsed);

        #[cfg(feature = "metrics")]
        metrics::histogram!("keepalive_bench_latency", "scenario" => self.name.clone())
            .record(elapsed.as_secs_f64());
    }

    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn connections_created(&self) -> u64 {
        self.connections_created.load(Ordering::Relaxed)
    }

    pub fn connections_reused(&self) -> u64 {
        self.connections_reused.load(Ordering::Relaxed)
    }

    /// `None` until both `start()` and `end()` have been called.
    pub fn duration(&self) -> Option<Duration> {
        let started = self.started.get()?;
        let ended = self.ended.get()?;
        Some(ended.saturating_duration_since(*started))
    }

    /// Successful operations per second, rounded to an integer.
    pub fn throughput(&self) -> Option<u64> {
        let millis = duration_ms(self.duration()?);
        if millis <= 0. {
            return None;
        }

        Some((self.operations() as f64 / millis * 1000.).round() as u64)
    }

    /// Wall-clock milliseconds per successful operation.
    pub fn avg_latency_ms(&self) -> Option<f64> {
        let operations = self.operations();
        if operations == 0 {
            return None;
        }

        let millis = duration_ms(self.duration()?);
        Some(round2(millis / operations as f64))
    }

    /// Percentage of successful operations that reused a pooled connection.
    pub fn reuse_ratio(&self) -> Option<f64> {
        let operations = self.operations();
        if operations == 0 {
            return None;
        }

        Some(round2(
            self.connections_reused() as f64 / operations as f64 * 100.,
        ))
    }

    pub fn report(&self, pool_status: Option<PoolStatus>) -> ScenarioReport {
        ScenarioReport {
            name: self.name.clone(),
            operations: self.operations(),
            errors: self.errors(),
            duration: self.duration().unwrap_or_default(),
            throughput: self.throughput(),
            avg_latency_ms: self.avg_latency_ms(),
            connections_created: self.connections_created(),
            connections_reused: self.connections_reused(),
            reuse_ratio: self.reuse_ratio(),
            latency: latency::summarize(&self.latency.data()),
            pool_status,
        }
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.
}

fn round2(value: f64) -> f64 {
    (value * 100.).round() / 100.
}
