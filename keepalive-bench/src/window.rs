//! Bounded scheduler driving a fixed number of operations through a client.
mod hold;
mod latch;

pub use hold::HoldTicket;

use crate::client::PoolClient;
use crate::metrics::BenchmarkMetrics;
use crate::scenario::ScenarioContext;
pub(crate) use hold::ConnectionHold;
use keepalive_bench_core::{ClientError, RequestOutcome};
use latch::CompletionLatch;
use std::num::NonZeroUsize;
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
    /// At most this many operations outstanding at once.
    Bounded(NonZeroUsize),
    /// Everything issued immediately.
    Unbounded,
}

/// What the window observed while driving a scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    pub issued: u64,
    pub completed: u64,
    pub peak_in_flight: usize,
}

/// Drives exactly `total` operations, keeping at most `width` in flight.
///
/// A permit is taken before an operation is issued and only handed back after its outcome has
/// been recorded, so the ceiling is hard: `issued - completed <= width` at every instant.
/// Whenever an operation finishes, the issuer waiting on the freed permit issues the next one.
///
/// A width of one gives strictly sequential issuance. [`Width::Unbounded`] issues all
/// operations up front and only then waits for them; each of them keeps its connection checked
/// out until the whole burst has one, so a burst never reuses a connection from itself.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyWindow {
    width: Width,
    total: u64,
}

impl ConcurrencyWindow {
    pub fn bounded(width: NonZeroUsize, total: u64) -> Self {
        Self {
            width: Width::Bounded(width),
            total,
        }
    }

    pub fn sequential(total: u64) -> Self {
        Self::bounded(NonZeroUsize::MIN, total)
    }

    pub fn unbounded(total: u64) -> Self {
        Self {
            width: Width::Unbounded,
            total,
        }
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub async fn drive<C: PoolClient>(self, ctx: &ScenarioContext<C>) -> WindowStats {
        let state = Arc::new(WindowState::new(self.total));
        let (semaphore, hold) = match self.width {
            Width::Bounded(width) => (Some(Arc::new(Semaphore::new(width.get()))), None),
            Width::Unbounded => (None, Some(ConnectionHold::new(self.total))),
        };

        let mut tasks = JoinSet::new();
        for _ in 0..self.total {
            let permit = match &semaphore {
                Some(semaphore) => Some(
                    semaphore
                        .clone()
                        .acquire_owned()
                        .await
                        .expect("Window semaphore is never closed"),
                ),
                None => None,
            };
            let ticket = match &hold {
                Some(hold) => hold.ticket(),
                None => HoldTicket::none(),
            };

            let guard = OperationGuard::issue(state.clone(), ctx.metrics.clone(), permit);
            let client = ctx.client.clone();
            let target = ctx.target.clone();

            tasks.spawn(async move {
                let outcome = client.issue(&target, ticket).await;
                guard.settle(&outcome);
            });
        }
        trace!("All {} operations issued", state.issued());

        state.latch.wait().await;

        while let Some(res) = tasks.join_next().await {
            if let Err(err) = res {
                error!("Operation task failed: {err}");
            }
        }

        let stats = state.stats();
        debug!(
            "Window complete: issued={}, completed={}, peak_in_flight={}",
            stats.issued, stats.completed, stats.peak_in_flight
        );
        stats
    }
}

struct WindowState {
    issued: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    latch: CompletionLatch,
}

impl WindowState {
    fn new(total: u64) -> Self {
        Self {
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            latch: CompletionLatch::new(total),
        }
    }

    fn enter(&self) {
        self.issued.fetch_add(1, Ordering::AcqRel);
        let in_flight = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(in_flight, Ordering::AcqRel);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.latch.count_down();
    }

    fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }

    fn stats(&self) -> WindowStats {
        WindowStats {
            issued: self.issued(),
            completed: self.latch.completed(),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
        }
    }
}

/// Tracks one issued operation until it reaches a terminal outcome.
///
/// Dropping the guard without settling it (a panic in the client) records
/// [`ClientError::Aborted`], so the latch still reaches `total`. The window permit is a field
/// and is released only after `Drop::drop` has run.
struct OperationGuard {
    state: Arc<WindowState>,
    metrics: Arc<BenchmarkMetrics>,
    started: Instant,
    settled: bool,
    _permit: Option<OwnedSemaphorePermit>,
}

impl OperationGuard {
    fn issue(
        state: Arc<WindowState>,
        metrics: Arc<BenchmarkMetrics>,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Self {
        state.enter();
        Self {
            state,
            metrics,
            started: Instant::now(),
            settled: false,
            _permit: permit,
        }
    }

    fn settle(mut self, outcome: &RequestOutcome) {
        self.metrics.record(outcome, self.started.elapsed());
        self.settled = true;
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Operation dropped before reporting an outcome; counting it as an error");
            self.metrics
                .record(&Err(ClientError::Aborted), self.started.elapsed());
        }
        self.state.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{Event, MockClient};
    use keepalive_bench_core::RequestTarget;
    use std::time::Duration;

    fn context(client: MockClient, name: &str) -> ScenarioContext<MockClient> {
        ScenarioContext::new(
            client,
            RequestTarget::get("127.0.0.1", 0, "/"),
            BenchmarkMetrics::new(name),
        )
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn bounded_never_exceeds_width() {
        let ctx = context(
            MockClient::new(Duration::from_millis(2), Duration::from_millis(1)),
            "bounded",
        );

        let width = NonZeroUsize::new(8).unwrap();
        let stats = ConcurrencyWindow::bounded(width, 400)
            .drive(&ctx)
            .await;

        assert_eq!(stats.issued, 400);
        assert_eq!(stats.completed, 400);
        assert!(stats.peak_in_flight <= 8);
        assert!(ctx.client.peak_in_flight() <= 8);
        assert_eq!(ctx.metrics.operations() + ctx.metrics.errors(), 400);
        assert_eq!(
            ctx.metrics.connections_created() + ctx.metrics.connections_reused(),
            ctx.metrics.operations()
        );
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn sequential_completes_before_next_issue() {
        let ctx = context(
            MockClient::new(Duration::from_micros(200), Duration::from_micros(100)),
            "sequential",
        );

        let stats = ConcurrencyWindow::sequential(50).drive(&ctx).await;
        assert_eq!(stats.peak_in_flight, 1);

        let events = ctx.client.events();
        assert_eq!(events.len(), 100);
        for (i, pair) in events.chunks(2).enumerate() {
            let index = i as u64 + 1;
            assert_eq!(pair, [Event::Issued(index), Event::Completed(index)]);
        }

        // One connection, reused by every later operation.
        assert_eq!(ctx.metrics.connections_created(), 1);
        assert_eq!(ctx.metrics.connections_reused(), 49);
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn unbounded_issues_everything_up_front() {
        let ctx = context(
            MockClient::new(Duration::from_millis(50), Duration::from_millis(1)),
            "burst",
        );

        let stats = ConcurrencyWindow::unbounded(100).drive(&ctx).await;
        assert_eq!(stats.issued, 100);
        assert_eq!(stats.completed, 100);
        assert_eq!(stats.peak_in_flight, 100);

        let events = ctx.client.events();
        let first_completion = events
            .iter()
            .position(|e| matches!(e, Event::Completed(_)))
            .unwrap();
        assert_eq!(first_completion, 100);

        assert_eq!(ctx.metrics.connections_created(), 100);
        assert_eq!(ctx.metrics.connections_reused(), 0);
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn errors_are_terminal_outcomes() {
        let ctx = context(
            MockClient::new(Duration::from_micros(500), Duration::from_micros(100)).fail_every(10),
            "errors",
        );

        let stats = ConcurrencyWindow::bounded(NonZeroUsize::new(16).unwrap(), 500)
            .drive(&ctx)
            .await;

        assert_eq!(stats.completed, 500);
        assert_eq!(ctx.metrics.errors(), 50);
        assert_eq!(ctx.metrics.operations(), 450);
        assert_eq!(ctx.client.issued(), 500);
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn panicking_operation_is_counted_as_error() {
        let ctx = context(
            MockClient::new(Duration::from_micros(100), Duration::ZERO).panic_on(3),
            "panic",
        );

        let stats = ConcurrencyWindow::bounded(NonZeroUsize::new(2).unwrap(), 10)
            .drive(&ctx)
            .await;

        assert_eq!(stats.completed, 10);
        assert_eq!(ctx.metrics.errors(), 1);
        assert_eq!(ctx.metrics.operations(), 9);
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn aborted_operation_is_recorded_as_an_outcome() {
        let ctx = context(
            MockClient::new(Duration::from_micros(100), Duration::ZERO).panic_on(1),
            "aborted",
        );

        let stats = ConcurrencyWindow::unbounded(1).drive(&ctx).await;

        assert_eq!(stats.completed, 1);
        assert_eq!(ctx.metrics.errors(), 1);
        assert_eq!(ctx.metrics.operations(), 0);
        // Only `record` samples latency, so a summary means the aborted path went through it.
        assert!(ctx.metrics.report(None).latency.is_some());
    }

    #[tokio::test]
    async fn zero_total_completes_immediately() {
        let ctx = context(MockClient::new(Duration::ZERO, Duration::ZERO), "zero");

        for window in [
            ConcurrencyWindow::bounded(NonZeroUsize::new(4).unwrap(), 0),
            ConcurrencyWindow::sequential(0),
            ConcurrencyWindow::unbounded(0),
        ] {
            let stats = window.drive(&ctx).await;
            assert_eq!(stats, WindowStats::default());
        }
        assert_eq!(ctx.client.issued(), 0);
    }
}
