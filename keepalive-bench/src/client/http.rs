use crate::window::HoldTicket;
use arc_swap::ArcSwapOption;
use keepalive_bench_core::{ClientError, ConnectionUse, RequestTarget, CONNECTION_SEQUENCE_HEADER};
use reqwest::StatusCode;
use std::num::NonZeroUsize;
use tokio::sync::{Semaphore, TryAcquireError};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// A releasable `reqwest` client with a cap on sockets in use.
///
/// The inner client lives behind an `ArcSwapOption` so `release()` can drop the pool while
/// outstanding requests keep their own handle until they finish.
pub(crate) struct HttpPool {
    inner: ArcSwapOption<reqwest::Client>,
    sockets: Semaphore,
}

/// What came back from one request/response exchange.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Exchange {
    pub status: StatusCode,
    pub connection: ConnectionUse,
}

impl HttpPool {
    pub fn new(client: reqwest::Client, max_sockets: NonZeroUsize) -> Self {
        Self {
            inner: ArcSwapOption::from_pointee(client),
            sockets: Semaphore::new(max_sockets.get()),
        }
    }

    /// Send one request and read its response.
    ///
    /// The connection stays checked out until `hold` lets go, between the response head and
    /// reading the body. A request that has to queue for a socket gives up its place at the
    /// hold first, since the sockets it waits on are the ones being held.
    pub async fn send(
        &self,
        target: &RequestTarget,
        mut hold: HoldTicket,
    ) -> Result<Exchange, ClientError> {
        let Some(client) = self.inner.load_full() else {
            return Err(ClientError::Released);
        };

        // NOTE: Closed only on release.
        let _socket = match self.sockets.try_acquire() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(ClientError::Released),
            Err(TryAcquireError::NoPermits) => {
                hold.pass();
                self.sockets
                    .acquire()
                    .await
                    .map_err(|_| ClientError::Released)?
            }
        };

        let response = client
            .get(target.url())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let sequence = response
            .headers()
            .get(CONNECTION_SEQUENCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let connection = match sequence {
            Some(sequence) => ConnectionUse::from_sequence(sequence),
            None => {
                trace!("Response without {CONNECTION_SEQUENCE_HEADER}; assuming a new connection");
                ConnectionUse::Created
            }
        };

        hold.wait().await;

        // The connection only goes back to the pool once the body has been read.
        response.bytes().await.map_err(classify)?;

        Ok(Exchange { status, connection })
    }

    /// Drop the pool. Returns whether it was still live.
    pub fn release(&self) -> bool {
        self.sockets.close();
        self.inner.swap(None).is_some()
    }
}

impl Exchange {
    pub fn into_outcome(self) -> Result<ConnectionUse, ClientError> {
        if self.status.is_success() {
            Ok(self.connection)
        } else {
            Err(ClientError::Status(self.status.as_u16()))
        }
    }
}

fn classify(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else if err.is_connect() {
        ClientError::Connect(err.to_string())
    } else {
        ClientError::Transport(err.to_string())
    }
}
