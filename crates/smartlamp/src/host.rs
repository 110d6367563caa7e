use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use smartlamp_attr::{AttributeRegistry, AttributeSurface, RegistryConfig};
use smartlamp_session::{DeviceSession, EngineConfig, EngineError};
use smartlamp_transport::Transport;
use tracing::info;

/// Errors from the attach/detach lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A device is already attached to this host.
    #[error("device {0} is already attached")]
    AlreadyAttached(String),

    /// The session could not be brought up.
    #[error(transparent)]
    Session(#[from] EngineError),
}

/// Lifecycle state of a [`DeviceHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Unattached,
    Attached,
    Detached,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostState::Unattached => f.write_str("unattached"),
            HostState::Attached => f.write_str("attached"),
            HostState::Detached => f.write_str("detached"),
        }
    }
}

struct Attachment {
    session: Arc<DeviceSession>,
    surface: Arc<AttributeSurface>,
}

struct HostInner {
    state: HostState,
    attachment: Option<Attachment>,
}

/// Owns the attach/detach lifecycle of one lamp.
///
/// Attach events build a session, its attribute registry and a published
/// surface; detach events tear them down in reverse order.
pub struct DeviceHost {
    engine_config: EngineConfig,
    registry_config: RegistryConfig,
    inner: Mutex<HostInner>,
}

impl DeviceHost {
    pub fn new(engine_config: EngineConfig, registry_config: RegistryConfig) -> Self {
        Self {
            engine_config,
            registry_config,
            inner: Mutex::new(HostInner {
                state: HostState::Unattached,
                attachment: None,
            }),
        }
    }

    /// Handle a device arrival.
    ///
    /// The host lock is not held while the session and its priming read
    /// come up. A refused transport is closed.
    pub fn on_attach(
        &self,
        mut transport: Box<dyn Transport>,
    ) -> Result<Arc<AttributeSurface>, HostError> {
        if let Some(existing) = &self.lock().attachment {
            transport.close();
            return Err(HostError::AlreadyAttached(existing.session.id().to_string()));
        }

        let session = DeviceSession::attach(transport, self.engine_config.clone())?;

        let mut inner = self.lock();
        if let Some(existing) = &inner.attachment {
            // Lost a race with another attach.
            session.detach();
            return Err(HostError::AlreadyAttached(existing.session.id().to_string()));
        }

        let registry = AttributeRegistry::new(Arc::clone(&session), self.registry_config);
        let surface = Arc::new(AttributeSurface::new(registry));
        inner.attachment = Some(Attachment {
            session,
            surface: Arc::clone(&surface),
        });
        inner.state = HostState::Attached;
        Ok(surface)
    }

    /// Handle a device removal. Returns false when nothing was attached.
    ///
    /// The surface is withdrawn first, then the session waits for any
    /// in-flight transaction before the transport is released.
    pub fn on_detach(&self) -> bool {
        let mut inner = self.lock();
        let Some(attachment) = inner.attachment.take() else {
            return false;
        };

        attachment.surface.unpublish();
        attachment.session.detach();
        inner.state = HostState::Detached;
        info!(session = attachment.session.id(), "device released");
        true
    }

    pub fn state(&self) -> HostState {
        self.lock().state
    }

    pub fn surface(&self) -> Option<Arc<AttributeSurface>> {
        self.lock()
            .attachment
            .as_ref()
            .map(|a| Arc::clone(&a.surface))
    }

    pub fn session(&self) -> Option<Arc<DeviceSession>> {
        self.lock()
            .attachment
            .as_ref()
            .map(|a| Arc::clone(&a.session))
    }

    fn lock(&self) -> MutexGuard<'_, HostInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeviceHost {
    fn default() -> Self {
        Self::new(EngineConfig::default(), RegistryConfig::default())
    }
}

impl Drop for DeviceHost {
    fn drop(&mut self) {
        self.on_detach();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use smartlamp_attr::AttrError;
    use smartlamp_transport::{MockReply, MockTransport};

    use super::*;

    fn quiet_host() -> DeviceHost {
        let engine = EngineConfig {
            prime_on_attach: false,
            ..EngineConfig::immediate()
        };
        DeviceHost::new(engine, RegistryConfig::default())
    }

    fn ldr_transport() -> MockTransport {
        MockTransport::new().with_responder(|_| vec![MockReply::line("RES GET_LDR 640\n")])
    }

    #[test]
    fn attach_then_detach() {
        let host = quiet_host();
        assert_eq!(host.state(), HostState::Unattached);

        let transport = ldr_transport();
        let handle = transport.handle();
        let surface = host.on_attach(Box::new(transport)).unwrap();
        assert_eq!(host.state(), HostState::Attached);
        assert_eq!(surface.show("ldr").unwrap(), "640\n");

        assert!(host.on_detach());
        assert_eq!(host.state(), HostState::Detached);
        assert!(host.surface().is_none());
        assert!(handle.is_closed());

        let calls = handle.calls();
        assert!(matches!(surface.show("ldr"), Err(AttrError::DeviceDetached)));
        assert_eq!(handle.calls(), calls);
    }

    #[test]
    fn second_attach_is_refused() {
        let host = quiet_host();
        host.on_attach(Box::new(ldr_transport())).unwrap();

        let second = ldr_transport();
        let handle = second.handle();
        let err = host.on_attach(Box::new(second)).unwrap_err();
        assert!(matches!(err, HostError::AlreadyAttached(_)));
        assert!(handle.is_closed());
        assert_eq!(handle.calls(), 0);
    }

    #[test]
    fn state_is_readable_during_slow_attach() {
        let host = Arc::new(DeviceHost::new(
            EngineConfig::immediate(),
            RegistryConfig::default(),
        ));
        let transport = ldr_transport().with_latency(Duration::from_millis(300));

        let attaching = {
            let host = Arc::clone(&host);
            thread::spawn(move || host.on_attach(Box::new(transport)))
        };
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        assert_eq!(host.state(), HostState::Unattached);
        assert!(host.surface().is_none());
        assert!(started.elapsed() < Duration::from_millis(150));

        attaching.join().unwrap().unwrap();
        assert_eq!(host.state(), HostState::Attached);
        assert_eq!(host.session().unwrap().priming_reading(), Some(640));
    }

    #[test]
    fn reattach_after_detach() {
        let host = quiet_host();
        host.on_attach(Box::new(ldr_transport())).unwrap();
        host.on_detach();
        assert!(!host.on_detach());

        let surface = host.on_attach(Box::new(ldr_transport())).unwrap();
        assert_eq!(host.state(), HostState::Attached);
        assert!(surface.is_published());
    }

    #[test]
    fn drop_releases_transport() {
        let transport = ldr_transport();
        let handle = transport.handle();
        let host = quiet_host();
        host.on_attach(Box::new(transport)).unwrap();
        drop(host);
        assert!(handle.is_closed());
    }
}
