use std::time::Duration;

use smartlamp_frame::MAX_LINE_LEN;

use crate::error::{EngineError, Result};

/// Timing and sizing of device transactions.
///
/// Defaults match what the lamp firmware needs: it takes about 100 ms to
/// act on a command before its reply is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Timeout for sending one command frame.
    pub send_timeout: Duration,
    /// Pause between sending a command and expecting its reply.
    pub settle_delay: Duration,
    /// Receive calls made before giving up on a reply.
    pub receive_attempts: u32,
    /// Timeout of each receive call.
    pub receive_timeout: Duration,
    /// Pause after a failed receive call.
    pub retry_backoff: Duration,
    /// Read the light sensor once when a session is attached.
    pub prime_on_attach: bool,
    /// Pause before the priming read so the device can settle.
    pub prime_delay: Duration,
    /// Cap on frame length, applied on top of the link MTU.
    pub max_frame_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(1000),
            settle_delay: Duration::from_millis(100),
            receive_attempts: 5,
            receive_timeout: Duration::from_millis(1000),
            retry_backoff: Duration::from_millis(50),
            prime_on_attach: true,
            prime_delay: Duration::from_millis(200),
            max_frame_len: MAX_LINE_LEN,
        }
    }
}

impl EngineConfig {
    /// Configuration without any sleeps, for scripted transports.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            prime_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Frame limit for a link with the given MTU.
    pub fn frame_limit(&self, mtu: usize) -> usize {
        mtu.min(self.max_frame_len)
    }

    pub fn validate(&self) -> Result<()> {
        if self.receive_attempts == 0 {
            return Err(EngineError::InvalidConfig(
                "receive_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_frame_len == 0 {
            return Err(EngineError::InvalidConfig(
                "max_frame_len must be at least 1".to_string(),
            ));
        }
        if self.send_timeout.is_zero() || self.receive_timeout.is_zero() {
            return Err(EngineError::InvalidConfig(
                "transfer timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
