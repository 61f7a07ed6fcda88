use std::fmt;
use thiserror::Error;

/// Where each issued operation is sent. Every operation is a `GET`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl RequestTarget {
    pub fn get(host: &str, port: u16, path: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GET {}", self.url())
    }
}

/// Whether a successful operation rode on a fresh or a pooled connection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionUse {
    Created,
    Reused,
}

impl ConnectionUse {
    /// Classify from the per-connection request index stamped by the target.
    pub fn from_sequence(sequence: u64) -> Self {
        if sequence > 1 {
            ConnectionUse::Reused
        } else {
            ConnectionUse::Created
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, ConnectionUse::Reused)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Client has been released")]
    Released,

    #[error("Operation aborted before reporting an outcome")]
    Aborted,
}

impl ClientError {
    /// Failures that happened on the socket itself rather than at the HTTP layer.
    pub fn is_socket_error(&self) -> bool {
        matches!(self, ClientError::Connect(_) | ClientError::Transport(_))
    }
}

/// Terminal outcome of a single issued operation.
pub type RequestOutcome = Result<ConnectionUse, ClientError>;
