use super::http::{Exchange, HttpPool};
use super::PoolClient;
use crate::window::HoldTicket;
use keepalive_bench_core::{ClientConfig, RequestOutcome, RequestTarget};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Baseline: no idle sockets are kept, so every request pays for its own connection.
pub struct BaselineClient {
    pool: HttpPool,
}

impl BaselineClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(config.request_timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            pool: HttpPool::new(client, config.max_sockets),
        })
    }
}

impl PoolClient for BaselineClient {
    async fn issue(&self, target: &RequestTarget, hold: HoldTicket) -> RequestOutcome {
        self.pool
            .send(target, hold)
            .await
            .and_then(Exchange::into_outcome)
    }

    fn release(&self) {
        if self.pool.release() {
            debug!("Released baseline client");
        }
    }
}
