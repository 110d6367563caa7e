use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::descriptor::{Access, ValueType};
use crate::error::{AttrError, Result};
use crate::registry::AttributeRegistry;

/// One published attribute, as listed by [`AttributeSurface::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEntry {
    pub name: &'static str,
    pub mode: u32,
    pub access: Access,
    pub value_type: ValueType,
}

/// Textual, file-like view of a registry.
///
/// Reads never fail because of the device: a failed transaction is shown
/// as the sentinel value, and the underlying error is kept for
/// [`AttributeSurface::last_failure`]. Caller errors and detachment are
/// still reported as errors.
#[derive(Debug)]
pub struct AttributeSurface {
    registry: AttributeRegistry,
    published: AtomicBool,
    collapsed: AtomicU64,
    last_failure: Mutex<Option<String>>,
}

impl AttributeSurface {
    /// Publish a registry.
    pub fn new(registry: AttributeRegistry) -> Self {
        info!(
            session = registry.session().id(),
            attributes = registry.descriptors().len(),
            "attributes published"
        );
        Self {
            registry,
            published: AtomicBool::new(true),
            collapsed: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    pub fn is_published(&self) -> bool {
        self.published.load(Ordering::SeqCst)
    }

    /// Published attributes with their modes.
    pub fn entries(&self) -> Vec<SurfaceEntry> {
        self.registry
            .descriptors()
            .iter()
            .map(|d| SurfaceEntry {
                name: d.name(),
                mode: d.mode(),
                access: d.access(),
                value_type: d.value_type(),
            })
            .collect()
    }

    /// Text of one attribute, newline-terminated.
    pub fn show(&self, name: &str) -> Result<String> {
        self.ensure_published()?;
        match self.registry.read(name) {
            Ok(value) => Ok(value.render()),
            Err(err) if err.is_device_failure() => {
                let sentinel = self.registry.config().sentinel;
                warn!(
                    attribute = name,
                    sentinel,
                    errno = err.errno(),
                    error = %err,
                    "read failed, showing sentinel"
                );
                self.collapsed.fetch_add(1, Ordering::Relaxed);
                *self
                    .last_failure
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
                Ok(format!("{sentinel}\n"))
            }
            Err(err) => Err(err),
        }
    }

    /// Write text to one attribute and return the bytes consumed.
    pub fn store(&self, name: &str, text: &str) -> Result<usize> {
        self.ensure_published()?;
        self.registry.write(name, text)?;
        Ok(text.len())
    }

    /// Withdraw the surface. Later calls fail without touching the device.
    pub fn unpublish(&self) {
        if self.published.swap(false, Ordering::SeqCst) {
            info!(session = self.registry.session().id(), "attributes withdrawn");
        }
    }

    /// Reads shown as the sentinel so far.
    pub fn collapsed_reads(&self) -> u64 {
        self.collapsed.load(Ordering::Relaxed)
    }

    /// Error behind the most recent sentinel read.
    pub fn last_failure(&self) -> Option<String> {
        self.last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn ensure_published(&self) -> Result<()> {
        if self.is_published() {
            Ok(())
        } else {
            Err(AttrError::DeviceDetached)
        }
    }
}

#[cfg(test)]
mod tests {
    use smartlamp_transport::MockTransport;

    use super::*;
    use crate::config::{RegistryConfig, SensorFormat};
    use crate::registry::tests::{lamp_transport, registry_on};

    fn surface_on(transport: MockTransport, format: SensorFormat) -> AttributeSurface {
        let config = RegistryConfig::default().with_sensor_format(format);
        let (registry, _handle) = registry_on(transport, config);
        AttributeSurface::new(registry)
    }

    #[test]
    fn silent_device_shows_sentinel() {
        let transport = MockTransport::new();
        let handle = transport.handle();
        let surface = surface_on(transport, SensorFormat::Integer);

        assert_eq!(surface.show("ldr").unwrap(), "-1\n");
        assert_eq!(handle.receive_calls(), 5);
        assert_eq!(surface.collapsed_reads(), 1);
        assert!(surface.last_failure().unwrap().contains("GET_LDR"));
    }

    #[test]
    fn raw_text_sentinel_is_newline_terminated() {
        let surface = surface_on(MockTransport::new(), SensorFormat::RawText);
        assert_eq!(surface.show("hum").unwrap(), "-1\n");
    }

    #[test]
    fn store_reports_bytes_consumed() {
        let surface = surface_on(lamp_transport(), SensorFormat::Integer);
        assert_eq!(surface.store("led", "75\n").unwrap(), 3);
        assert_eq!(surface.show("led").unwrap(), "75\n");
        assert_eq!(surface.collapsed_reads(), 0);
        assert!(surface.last_failure().is_none());
    }

    #[test]
    fn caller_errors_are_not_collapsed() {
        let surface = surface_on(lamp_transport(), SensorFormat::Integer);
        assert!(matches!(
            surface.show("nope"),
            Err(AttrError::UnknownAttribute(_))
        ));
        assert!(matches!(
            surface.store("led", "bright"),
            Err(AttrError::InvalidInput { .. })
        ));
        assert_eq!(surface.collapsed_reads(), 0);
    }

    #[test]
    fn unpublished_surface_fails_fast() {
        let transport = lamp_transport();
        let handle = transport.handle();
        let surface = surface_on(transport, SensorFormat::Integer);

        surface.unpublish();
        assert!(!surface.is_published());
        assert!(matches!(surface.show("ldr"), Err(AttrError::DeviceDetached)));
        assert!(matches!(
            surface.store("led", "1"),
            Err(AttrError::DeviceDetached)
        ));
        assert_eq!(handle.calls(), 0);
    }

    #[test]
    fn entries_list_modes() {
        let surface = surface_on(lamp_transport(), SensorFormat::RawText);
        let entries = surface.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].name, "led");
        assert_eq!(entries[0].mode, 0o664);
        assert_eq!(entries[2].value_type, ValueType::RawText);
        assert_eq!(entries[3].access, Access::ReadOnly);
    }
}
