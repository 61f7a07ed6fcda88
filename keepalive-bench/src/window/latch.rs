use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// Countdown that fires exactly once when `target` outcomes have been observed.
///
/// Several operations may finish at the same moment; the compare-and-swap on `fired` makes
/// sure only one of them signals. Intended for a single waiter.
pub(crate) struct CompletionLatch {
    target: u64,
    completed: AtomicU64,
    fired: AtomicBool,
    notify: Notify,
}

impl CompletionLatch {
    pub fn new(target: u64) -> Self {
        Self {
            target,
            completed: AtomicU64::new(0),
            fired: AtomicBool::new(target == 0),
            notify: Notify::new(),
        }
    }

    /// Record one terminal outcome. Returns `true` for the call that fired the latch.
    pub fn count_down(&self) -> bool {
        let completed = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if completed >= self.target
            && self
                .fired
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            // NOTE: notify_one stores a permit if the waiter has not parked yet.
            self.notify.notify_one();
            true
        } else {
            false
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub async fn wait(&self) {
        if self.is_fired() {
            return;
        }
        self.notify.notified().await;
    }
}
