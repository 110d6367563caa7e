use std::path::PathBuf;
use std::time::Duration;

/// Status code reported for a timed-out transfer (`-ETIMEDOUT`).
pub const STATUS_TIMEOUT: i32 = -110;
/// Status code reported for a stalled endpoint (`-EPIPE`).
pub const STATUS_STALL: i32 = -32;
/// Status code reported once the device is gone (`-ENODEV`).
pub const STATUS_DISCONNECTED: i32 = -19;
/// Status code for any other I/O failure (`-EIO`).
pub const STATUS_IO: i32 = -5;

/// Errors that can occur in device transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transfer did not complete within its timeout.
    #[error("transfer timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint stalled; the transfer may succeed if retried.
    #[error("endpoint stalled")]
    Stall,

    /// The device went away.
    #[error("device disconnected")]
    Disconnected,

    /// Failed to open the device link.
    #[error("failed to open {target}: {source}")]
    Open {
        target: String,
        source: std::io::Error,
    },

    /// Failed to bind a listening socket.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming link.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The device spec string could not be parsed.
    #[error("invalid device spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    /// The transport was closed locally.
    #[error("transport closed")]
    Closed,

    /// Serial port failure.
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Coarse negative status code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            TransportError::Timeout(_) => STATUS_TIMEOUT,
            TransportError::Stall => STATUS_STALL,
            TransportError::Disconnected | TransportError::Closed => STATUS_DISCONNECTED,
            _ => STATUS_IO,
        }
    }

    /// Whether a failed receive may be retried on the same link.
    ///
    /// Only a gone device (or a locally closed link) is final.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Disconnected | TransportError::Closed)
    }

    /// Classify an I/O error raised by a blocking stream call.
    pub fn from_io(err: std::io::Error, timeout: Duration) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout(timeout),
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof => TransportError::Disconnected,
            _ => TransportError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
