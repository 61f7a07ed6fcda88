use std::num::NonZeroUsize;
use std::time::Duration;

/// Default in-flight ceiling for steady-state scenarios.
pub const DEFAULT_WINDOW_WIDTH: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(50) };

pub const DEFAULT_STEADY_TOTAL: u64 = 1_000;
pub const DEFAULT_PROBE_TOTAL: u64 = 200;
pub const DEFAULT_BURST_SIZE: u64 = 100;

/// Size of the high-volume run whose client status gets reported.
pub const DEFAULT_STATUS_TOTAL: u64 = 10_000;

pub const DEFAULT_MAX_SOCKETS: NonZeroUsize = unsafe { NonZeroUsize::new_unchecked(100) };
pub const DEFAULT_MAX_FREE_SOCKETS: usize = 256;
pub const DEFAULT_FREE_SOCKET_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_TARGET_PORT: u16 = 3002;

/// Response header carrying the 1-based index of a request on its TCP connection.
pub const CONNECTION_SEQUENCE_HEADER: &str = "x-connection-sequence";

pub const TARGET_RESPONSE_BODY: &str = "OK";
pub const TARGET_CONTENT_TYPE: &str = "text/plain";
