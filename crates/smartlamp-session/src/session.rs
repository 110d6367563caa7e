use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use smartlamp_frame::{Command, CommandName, Response};
use smartlamp_transport::{EndpointInfo, Transport};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::TransactionEngine;
use crate::error::{EngineError, Result};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a [`DeviceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Attached,
    Detached,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Attached => f.write_str("attached"),
            SessionState::Detached => f.write_str("detached"),
        }
    }
}

/// One attached lamp.
///
/// The session owns the transport. All transactions are serialized on an
/// internal lock; after [`DeviceSession::detach`] returns, no further
/// transport calls are made.
pub struct DeviceSession {
    id: String,
    transport_name: &'static str,
    endpoints: EndpointInfo,
    live: AtomicBool,
    link: Mutex<Option<Box<dyn Transport>>>,
    engine: TransactionEngine,
    priming_reading: Option<i32>,
}

impl DeviceSession {
    /// Take ownership of a transport and bring the session up.
    ///
    /// When `prime_on_attach` is set, one light-sensor read is issued after
    /// `prime_delay`. Its failure is logged and does not fail the attach.
    pub fn attach(transport: Box<dyn Transport>, config: EngineConfig) -> Result<Arc<Self>> {
        let engine = TransactionEngine::new(config)?;
        let endpoints = transport.endpoints();
        if endpoints.mtu == 0 {
            return Err(EngineError::Attach(format!(
                "{} link reports a zero transfer size",
                transport.transport_name()
            )));
        }

        let id = format!("lamp-{}", NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let transport_name = transport.transport_name();
        let mut session = Self {
            id,
            transport_name,
            endpoints,
            live: AtomicBool::new(true),
            link: Mutex::new(Some(transport)),
            engine,
            priming_reading: None,
        };

        info!(
            session = %session.id,
            transport = transport_name,
            in_address = format_args!("{:#04x}", endpoints.in_address),
            out_address = format_args!("{:#04x}", endpoints.out_address),
            mtu = endpoints.mtu,
            "device attached"
        );

        if session.engine.config().prime_on_attach {
            session.priming_reading = session.prime();
        }

        Ok(Arc::new(session))
    }

    fn prime(&self) -> Option<i32> {
        let delay = self.engine.config().prime_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let reading = self
            .execute(&Command::new(CommandName::GetLdr))
            .and_then(|response| response.integer().map_err(EngineError::from));
        match reading {
            Ok(value) => {
                debug!(session = %self.id, value, "priming read");
                Some(value)
            }
            Err(err) => {
                warn!(session = %self.id, error = %err, "priming read failed");
                None
            }
        }
    }

    /// Run one command through the transaction engine.
    pub fn execute(&self, command: &Command) -> Result<Response> {
        self.engine.execute(self, command)
    }

    /// Stop the session and release the transport.
    ///
    /// Waits for an in-flight transaction to finish. Calling it again is a
    /// no-op.
    pub fn detach(&self) {
        let was_live = self.live.swap(false, Ordering::SeqCst);
        let transport = self.lock_link().take();
        if let Some(mut transport) = transport {
            transport.close();
        }
        if was_live {
            info!(session = %self.id, "device detached");
        }
    }

    pub fn state(&self) -> SessionState {
        if self.is_live() {
            SessionState::Attached
        } else {
            SessionState::Detached
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport_name
    }

    pub fn endpoints(&self) -> EndpointInfo {
        self.endpoints
    }

    pub fn mtu(&self) -> usize {
        self.endpoints.mtu
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    /// Light level read while attaching, if priming ran and succeeded.
    pub fn priming_reading(&self) -> Option<i32> {
        self.priming_reading
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(EngineError::DeviceDetached)
        }
    }

    pub(crate) fn lock_link(&self) -> MutexGuard<'_, Option<Box<dyn Transport>>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("id", &self.id)
            .field("transport", &self.transport_name)
            .field("endpoints", &self.endpoints)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        let transport = self
            .link
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut transport) = transport {
            transport.close();
        }
    }
}
