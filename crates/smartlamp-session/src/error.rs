use smartlamp_frame::{CommandName, FrameError};
use smartlamp_transport::TransportError;

/// Errors that can occur in device transactions.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The session was detached; nothing was sent.
    #[error("device detached")]
    DeviceDetached,

    /// Encoding the command or decoding its reply failed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Sending the command failed. Sends are never retried.
    #[error("failed to send {command} (status {code}): {source}")]
    TransportWrite {
        command: CommandName,
        code: i32,
        #[source]
        source: TransportError,
    },

    /// No reply arrived within the receive budget.
    #[error("no reply to {command} after {attempts} attempt(s) (last status {code}): {source}")]
    TransportReadExhausted {
        command: CommandName,
        attempts: u32,
        code: i32,
        #[source]
        source: TransportError,
    },

    /// The link could not be attached.
    #[error("attach failed: {0}")]
    Attach(String),

    /// The engine configuration is unusable.
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Transport status code, for transport failures.
    pub fn code(&self) -> Option<i32> {
        match self {
            EngineError::TransportWrite { code, .. }
            | EngineError::TransportReadExhausted { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the device answered, but with a frame that does not
    /// match the grammar.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            EngineError::Frame(FrameError::MalformedResponse { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
