use super::http::HttpPool;
use super::PoolClient;
use crate::window::HoldTicket;
use keepalive_bench_core::{ClientConfig, ClientError, PoolStatus, RequestOutcome, RequestTarget};
use std::sync::atomic::{AtomicU64, Ordering};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Candidate pool: keeps idle sockets around for reuse and tracks lifetime counters.
pub struct KeepAliveClient {
    pool: HttpPool,
    connections_created: AtomicU64,
    requests_served: AtomicU64,
    socket_errors: AtomicU64,
    socket_timeouts: AtomicU64,
}

impl KeepAliveClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_free_sockets)
            .pool_idle_timeout(config.free_socket_timeout)
            .timeout(config.request_timeout)
            .tcp_nodelay(true)
            .no_proxy()
            .build()?;

        Ok(Self {
            pool: HttpPool::new(client, config.max_sockets),
            connections_created: AtomicU64::new(0),
            requests_served: AtomicU64::new(0),
            socket_errors: AtomicU64::new(0),
            socket_timeouts: AtomicU64::new(0),
        })
    }
}

impl PoolClient for KeepAliveClient {
    async fn issue(&self, target: &RequestTarget, hold: HoldTicket) -> RequestOutcome {
        match self.pool.send(target, hold).await {
            Ok(exchange) => {
                self.requests_served.fetch_add(1, Ordering::Relaxed);
                if !exchange.connection.is_reused() {
                    self.connections_created.fetch_add(1, Ordering::Relaxed);
                }
                exchange.into_outcome()
            }
            Err(err) => {
                match &err {
                    ClientError::Timeout => {
                        self.socket_timeouts.fetch_add(1, Ordering::Relaxed);
                    }
                    err if err.is_socket_error() => {
                        self.socket_errors.fetch_add(1, Ordering::Relaxed);
                    }
                    _ => {}
                }
                Err(err)
            }
        }
    }

    fn release(&self) {
        if self.pool.release() {
            debug!("Released keep-alive pool");
        }
    }

    fn status(&self) -> Option<PoolStatus> {
        Some(PoolStatus {
            connections_created: self.connections_created.load(Ordering::Relaxed),
            requests_served: self.requests_served.load(Ordering::Relaxed),
            socket_errors: self.socket_errors.load(Ordering::Relaxed),
            socket_timeouts: self.socket_timeouts.load(Ordering::Relaxed),
        })
    }
}
