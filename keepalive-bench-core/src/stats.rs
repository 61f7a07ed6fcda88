use std::fmt;
use std::time::Duration;

/// Final statistics for one scenario run.
///
/// Derived values are `None` when they are undefined, e.g. a run with zero successful
/// operations has no average latency or reuse ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub name: String,
    pub operations: u64,
    pub errors: u64,
    pub duration: Duration,
    /// Successful operations per second.
    pub throughput: Option<u64>,
    /// Wall-clock duration divided by successful operations, in milliseconds.
    pub avg_latency_ms: Option<f64>,
    pub connections_created: u64,
    pub connections_reused: u64,
    /// Percentage of successful operations that reused a pooled connection.
    pub reuse_ratio: Option<f64>,
    pub latency: Option<LatencySummary>,
    pub pool_status: Option<PoolStatus>,
}

impl ScenarioReport {
    pub fn total(&self) -> u64 {
        self.operations + self.errors
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.name)?;
        writeln!(f, "  operations:          {}", self.operations)?;
        writeln!(f, "  duration:            {}ms", self.duration.as_millis())?;
        writeln!(f, "  throughput:          {}", display_opt(self.throughput, " ops/sec"))?;
        writeln!(f, "  avg latency:         {}", display_decimal(self.avg_latency_ms, "ms"))?;
        writeln!(f, "  errors:              {}", self.errors)?;
        writeln!(f, "  connections created: {}", self.connections_created)?;
        writeln!(f, "  connections reused:  {}", self.connections_reused)?;
        write!(f, "  reuse ratio:         {}", display_decimal(self.reuse_ratio, "%"))?;

        if let Some(latency) = &self.latency {
            write!(f, "\n  latency:             {latency}")?;
        }

        if let Some(status) = &self.pool_status {
            write!(f, "\n{status}")?;
        }

        Ok(())
    }
}

/// Distribution of per-operation latencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub mean: Duration,
    pub std_dev: Duration,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p50={:?}, p90={:?}, p99={:?}, mean={:?}, std={:?}",
            self.p50, self.p90, self.p99, self.mean, self.std_dev
        )
    }
}

/// Lifetime counters reported by the candidate pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatus {
    pub connections_created: u64,
    pub requests_served: u64,
    pub socket_errors: u64,
    pub socket_timeouts: u64,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  --- pool status ---")?;
        writeln!(f, "  connections created: {}", self.connections_created)?;
        writeln!(f, "  requests served:     {}", self.requests_served)?;
        writeln!(f, "  socket errors:       {}", self.socket_errors)?;
        write!(f, "  socket timeouts:     {}", self.socket_timeouts)
    }
}

fn display_opt(value: Option<u64>, unit: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v}{unit}"))
}

fn display_decimal(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}{unit}"))
}
