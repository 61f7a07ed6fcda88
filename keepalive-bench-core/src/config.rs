use crate::{
    DEFAULT_BURST_SIZE, DEFAULT_FREE_SOCKET_TIMEOUT, DEFAULT_MAX_FREE_SOCKETS,
    DEFAULT_MAX_SOCKETS, DEFAULT_PROBE_TOTAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_STATUS_TOTAL,
    DEFAULT_STEADY_TOTAL, DEFAULT_WINDOW_WIDTH,
};
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Which pooling strategy a client is built with.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PoolKind {
    /// Candidate pool: idle sockets are kept and reused, lifetime status is tracked.
    KeepAlive,
    /// Baseline: every request opens its own connection.
    Baseline,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::KeepAlive => write!(f, "keep-alive"),
            PoolKind::Baseline => write!(f, "baseline"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub kind: PoolKind,
    /// Ceiling on sockets in use at once. Requests past it queue inside the client.
    pub max_sockets: NonZeroUsize,
    /// Idle sockets kept per host. Ignored by the baseline.
    pub max_free_sockets: usize,
    /// How long an idle socket may sit in the pool. Ignored by the baseline.
    pub free_socket_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn keep_alive(max_sockets: NonZeroUsize) -> Self {
        Self {
            kind: PoolKind::KeepAlive,
            max_sockets,
            max_free_sockets: DEFAULT_MAX_FREE_SOCKETS,
            free_socket_timeout: DEFAULT_FREE_SOCKET_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn baseline(max_sockets: NonZeroUsize) -> Self {
        Self {
            kind: PoolKind::Baseline,
            ..Self::keep_alive(max_sockets)
        }
    }

    pub fn max_free_sockets(mut self, max_free_sockets: usize) -> Self {
        self.max_free_sockets = max_free_sockets;
        self
    }

    pub fn free_socket_timeout(mut self, timeout: Duration) -> Self {
        self.free_socket_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PoolKind::KeepAlive => write!(
                f,
                "{} (max_sockets={}, max_free_sockets={}, free_socket_timeout={})",
                self.kind,
                self.max_sockets,
                self.max_free_sockets,
                humantime::format_duration(self.free_socket_timeout)
            ),
            PoolKind::Baseline => write!(f, "{} (max_sockets={})", self.kind, self.max_sockets),
        }
    }
}

/// The three traffic shapes a scenario can take.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Bounded window, replenished as each operation completes.
    SteadyState { total: u64, width: NonZeroUsize },
    /// Window of one: strictly sequential.
    LatencyProbe { total: u64 },
    /// Everything issued at once with no ceiling.
    Burst { size: u64 },
}

impl ScenarioKind {
    pub fn steady_state(total: u64) -> Self {
        ScenarioKind::SteadyState {
            total,
            width: DEFAULT_WINDOW_WIDTH,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::SteadyState { .. } => "steady-state",
            ScenarioKind::LatencyProbe { .. } => "latency-probe",
            ScenarioKind::Burst { .. } => "burst",
        }
    }

    /// Number of operations the scenario drives to a terminal outcome.
    pub fn total(&self) -> u64 {
        match *self {
            ScenarioKind::SteadyState { total, .. } | ScenarioKind::LatencyProbe { total } => total,
            ScenarioKind::Burst { size } => size,
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioKind::SteadyState { total, width } => {
                write!(f, "{} (total={total}, width={width})", self.label())
            }
            ScenarioKind::LatencyProbe { total } => write!(f, "{} (total={total})", self.label()),
            ScenarioKind::Burst { size } => write!(f, "{} (size={size})", self.label()),
        }
    }
}

/// Sizing knobs for the standard benchmark plan.
#[derive(Clone, Debug)]
pub struct PlanSettings {
    pub steady_total: u64,
    pub width: NonZeroUsize,
    pub probe_total: u64,
    pub burst_size: u64,
    pub status_total: u64,
    pub max_sockets: NonZeroUsize,
    pub max_free_sockets: usize,
    pub free_socket_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            steady_total: DEFAULT_STEADY_TOTAL,
            width: DEFAULT_WINDOW_WIDTH,
            probe_total: DEFAULT_PROBE_TOTAL,
            burst_size: DEFAULT_BURST_SIZE,
            status_total: DEFAULT_STATUS_TOTAL,
            max_sockets: DEFAULT_MAX_SOCKETS,
            max_free_sockets: DEFAULT_MAX_FREE_SOCKETS,
            free_socket_timeout: DEFAULT_FREE_SOCKET_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl PlanSettings {
    pub fn client(&self, kind: PoolKind) -> ClientConfig {
        ClientConfig {
            kind,
            max_sockets: self.max_sockets,
            max_free_sockets: self.max_free_sockets,
            free_socket_timeout: self.free_socket_timeout,
            request_timeout: self.request_timeout,
        }
    }
}
