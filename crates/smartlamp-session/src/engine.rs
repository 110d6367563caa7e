use std::time::Duration;

use smartlamp_frame::{decode_response, encode, Command, CommandName, Response};
use smartlamp_transport::{Transport, TransportError};
use tracing::{debug, error, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::session::DeviceSession;

/// Runs send-then-receive transactions against a session's transport.
///
/// A transaction holds the session's link lock from encoding until the
/// reply is decoded or the receive budget is spent, so concurrent callers
/// never see each other's replies. Input left over from an earlier
/// transaction is dropped before each command goes out.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    config: EngineConfig,
}

impl TransactionEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute one command and return the decoded reply (blocking).
    ///
    /// Fails fast with [`EngineError::DeviceDetached`] once the session is
    /// detached. Only receive failures are retried; a reply that arrives
    /// but does not parse is returned as an error right away.
    pub fn execute(&self, session: &DeviceSession, command: &Command) -> Result<Response> {
        session.ensure_live()?;

        let mut link = session.lock_link();
        // Detach may have started while we waited for the lock.
        session.ensure_live()?;
        let transport = link.as_mut().ok_or(EngineError::DeviceDetached)?;

        let limit = self.config.frame_limit(session.mtu());
        let frame = encode(command, limit)?;
        debug!(
            session = session.id(),
            command = %command,
            size = frame.len(),
            "sending command"
        );

        self.transact(&mut **transport, command.name(), &frame, limit)
    }

    fn transact(
        &self,
        transport: &mut dyn Transport,
        command: CommandName,
        frame: &[u8],
        limit: usize,
    ) -> Result<Response> {
        match transport.discard_input() {
            Ok(0) => {}
            Ok(dropped) => warn!(%command, dropped, "dropped stale input before sending"),
            // A dead link fails the send below with the real cause.
            Err(err) => debug!(%command, error = %err, "could not drop stale input"),
        }

        transport
            .send(frame, self.config.send_timeout)
            .map_err(|source| {
                error!(%command, code = source.code(), error = %source, "command send failed");
                EngineError::TransportWrite {
                    command,
                    code: source.code(),
                    source,
                }
            })?;

        pause(self.config.settle_delay);

        let attempts = self.config.receive_attempts;
        let mut made = 0u32;
        let mut last = TransportError::Timeout(self.config.receive_timeout);
        while made < attempts {
            made += 1;
            match transport.receive(limit, self.config.receive_timeout) {
                Ok(bytes) if bytes.is_empty() => {
                    debug!(%command, attempt = made, "empty transfer, retrying");
                    last = TransportError::Timeout(self.config.receive_timeout);
                }
                Ok(bytes) => {
                    let response = decode_response(&bytes, command, limit)?;
                    debug!(%command, attempt = made, payload = response.payload(), "reply decoded");
                    return Ok(response);
                }
                Err(err) if !err.is_retryable() => {
                    debug!(%command, attempt = made, error = %err, "link gone, not retrying");
                    last = err;
                    break;
                }
                Err(err) => {
                    debug!(%command, attempt = made, code = err.code(), error = %err, "receive failed");
                    last = err;
                }
            }
            if made < attempts {
                pause(self.config.retry_backoff);
            }
        }

        error!(%command, attempts = made, code = last.code(), "no reply from device");
        Err(EngineError::TransportReadExhausted {
            command,
            attempts: made,
            code: last.code(),
            source: last,
        })
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
