use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Gate shared by every operation of a burst.
///
/// Each operation arrives once, either while holding its connection (after the response head,
/// before the body) or by giving up its place. The gate opens when all of them have arrived,
/// so no connection goes back to the pool while another burst operation is still looking for
/// one.
pub(crate) struct ConnectionHold {
    pending: AtomicU64,
    open: watch::Sender<bool>,
}

impl ConnectionHold {
    pub fn new(size: u64) -> Arc<Self> {
        let (open, _) = watch::channel(size == 0);
        Arc::new(Self {
            pending: AtomicU64::new(size),
            open,
        })
    }

    pub fn ticket(self: &Arc<Self>) -> HoldTicket {
        HoldTicket {
            hold: Some(self.clone()),
        }
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    fn arrive(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.open.send_replace(true);
        }
    }
}

/// One operation's place at a [`ConnectionHold`].
///
/// Dropping the ticket counts as arriving, so a failed or panicking operation never leaves
/// the rest of the burst waiting.
#[derive(Default)]
pub struct HoldTicket {
    hold: Option<Arc<ConnectionHold>>,
}

impl HoldTicket {
    /// A ticket for an operation that is never held back.
    pub fn none() -> Self {
        Self::default()
    }

    /// Arrive without waiting.
    pub fn pass(&mut self) {
        if let Some(hold) = self.hold.take() {
            hold.arrive();
        }
    }

    /// Arrive and wait until every other operation of the burst has arrived too.
    pub async fn wait(mut self) {
        let Some(hold) = self.hold.take() else {
            return;
        };

        let mut open = hold.open.subscribe();
        hold.arrive();
        // The sender lives in `hold`, so the channel stays open while we wait.
        let _ = open.wait_for(|open| *open).await;
    }
}

impl Drop for HoldTicket {
    fn drop(&mut self) {
        self.pass();
    }
}
