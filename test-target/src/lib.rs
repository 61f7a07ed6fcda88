//! A fixed HTTP responder the benchmark runs against.
//!
//! Every request on any path gets a `200 OK` with a plain-text body, stamped with the
//! 1-based index of the request on its TCP connection so clients can tell whether their
//! connection was reused.
use axum::{
    debug_handler,
    extract::{connect_info::Connected, ConnectInfo, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    serve::IncomingStream,
    Router,
};
use keepalive_bench_core::{
    CONNECTION_SEQUENCE_HEADER, DEFAULT_TARGET_PORT, TARGET_CONTENT_TYPE, TARGET_RESPONSE_BODY,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::num::NonZeroU64;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum TargetError {
    #[error("Failed to bind test target on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Test target stopped serving: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Test target task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Test target did not shut down within {0:?}")]
    ShutdownTimeout(Duration),
}

#[derive(Clone, Debug)]
pub struct TargetConfig {
    /// Port 0 picks an ephemeral port; see [`TestTarget::local_addr`].
    pub addr: SocketAddr,
    /// Answer every N-th request with a 500.
    pub fail_every: Option<NonZeroU64>,
    pub response_delay: Duration,
}

impl TargetConfig {
    pub fn localhost(port: u16) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            fail_every: None,
            response_delay: Duration::ZERO,
        }
    }

    pub fn fail_every(mut self, n: NonZeroU64) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub fn response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::localhost(DEFAULT_TARGET_PORT)
    }
}

/// Per-connection request counter, created once when a connection is accepted and cloned into
/// every request served on it.
#[derive(Clone, Debug)]
pub struct ConnectionTag {
    remote: SocketAddr,
    requests: Arc<AtomicU64>,
}

impl Connected<IncomingStream<'_>> for ConnectionTag {
    fn connect_info(target: IncomingStream<'_>) -> Self {
        Self {
            remote: target.remote_addr(),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }
}

struct TargetState {
    fail_every: Option<NonZeroU64>,
    response_delay: Duration,
    requests: AtomicU64,
    connections: AtomicU64,
}

pub struct TestTarget {
    local_addr: SocketAddr,
    state: Arc<TargetState>,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
}

impl TestTarget {
    pub async fn bind(config: TargetConfig) -> Result<Self, TargetError> {
        let listener = TcpListener::bind(config.addr)
            .await
            .map_err(|source| TargetError::Bind {
                addr: config.addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let state = Arc::new(TargetState {
            fail_every: config.fail_every,
            response_delay: config.response_delay,
            requests: AtomicU64::new(0),
            connections: AtomicU64::new(0),
        });

        let app = Router::new()
            .fallback(respond)
            .with_state(state.clone())
            .layer(TraceLayer::new_for_http());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<ConnectionTag>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
        });

        info!("Test target listening on {local_addr}");

        Ok(Self {
            local_addr,
            state,
            shutdown_tx,
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn requests_served(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }

    pub fn connections_accepted(&self) -> u64 {
        self.state.connections.load(Ordering::Relaxed)
    }

    /// Stop accepting, let open connections drain, and wait for the server task.
    pub async fn shutdown(self) -> Result<(), TargetError> {
        debug!(
            "Shutting down test target on {} after {} requests over {} connections",
            self.local_addr,
            self.requests_served(),
            self.connections_accepted()
        );

        // The receiver is only gone if the server already exited; the join below reports why.
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.server).await {
            Ok(res) => Ok(res??),
            Err(_) => Err(TargetError::ShutdownTimeout(SHUTDOWN_TIMEOUT)),
        }
    }
}

#[debug_handler]
async fn respond(
    ConnectInfo(conn): ConnectInfo<ConnectionTag>,
    State(state): State<Arc<TargetState>>,
) -> Response {
    let sequence = conn.requests.fetch_add(1, Ordering::Relaxed) + 1;
    if sequence == 1 {
        state.connections.fetch_add(1, Ordering::Relaxed);
    }
    let index = state.requests.fetch_add(1, Ordering::Relaxed) + 1;
    trace!("Request {index} from {} (#{sequence} on connection)", conn.remote);

    if !state.response_delay.is_zero() {
        tokio::time::sleep(state.response_delay).await;
    }

    let status = match state.fail_every {
        Some(n) if index % n.get() == 0 => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };

    (
        status,
        [
            (
                HeaderName::from_static(CONNECTION_SEQUENCE_HEADER),
                sequence.to_string(),
            ),
            (header::CONTENT_TYPE, TARGET_CONTENT_TYPE.to_string()),
        ],
        TARGET_RESPONSE_BODY,
    )
        .into_response()
}
