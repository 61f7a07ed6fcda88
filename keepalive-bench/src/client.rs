//! Clients under test.
//!
//! The harness only sees a client through [`PoolClient`]: issue one request, release the pool,
//! and optionally report lifetime status. Socket lifecycle and pooling are left to `reqwest`.
mod baseline;
mod http;
mod keep_alive;

pub use baseline::BaselineClient;
pub use keep_alive::KeepAliveClient;

use crate::window::HoldTicket;
use keepalive_bench_core::{ClientConfig, PoolKind, PoolStatus, RequestOutcome, RequestTarget};
use std::future::Future;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

pub trait PoolClient: Send + Sync + 'static {
    /// Issue a single request and resolve to its terminal outcome.
    ///
    /// Errors are part of the outcome; this never panics on a failed request. The connection
    /// must not go back to the pool before `hold` has been waited on or dropped.
    fn issue(
        &self,
        target: &RequestTarget,
        hold: HoldTicket,
    ) -> impl Future<Output = RequestOutcome> + Send;

    /// Tear down any pooled connections. Requests issued afterwards fail.
    fn release(&self);

    /// Lifetime counters. Only the candidate pool tracks these.
    fn status(&self) -> Option<PoolStatus> {
        None
    }
}

/// Either client, picked at runtime from a [`ClientConfig`].
pub enum AnyClient {
    KeepAlive(KeepAliveClient),
    Baseline(BaselineClient),
}

impl AnyClient {
    pub fn build(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        debug!("Building client: {config}");
        let client = match config.kind {
            PoolKind::KeepAlive => AnyClient::KeepAlive(KeepAliveClient::new(config)?),
            PoolKind::Baseline => AnyClient::Baseline(BaselineClient::new(config)?),
        };
        Ok(client)
    }

    pub fn kind(&self) -> PoolKind {
        match self {
            AnyClient::KeepAlive(_) => PoolKind::KeepAlive,
            AnyClient::Baseline(_) => PoolKind::Baseline,
        }
    }
}

impl PoolClient for AnyClient {
    async fn issue(&self, target: &RequestTarget, hold: HoldTicket) -> RequestOutcome {
        match self {
            AnyClient::KeepAlive(client) => client.issue(target, hold).await,
            AnyClient::Baseline(client) => client.issue(target, hold).await,
        }
    }

    fn release(&self) {
        match self {
            AnyClient::KeepAlive(client) => client.release(),
            AnyClient::Baseline(client) => client.release(),
        }
    }

    fn status(&self) -> Option<PoolStatus> {
        match self {
            AnyClient::KeepAlive(client) => client.status(),
            AnyClient::Baseline(client) => client.status(),
        }
    }
}
