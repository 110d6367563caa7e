//! CP2102 bridge exposed by the host OS as a tty.

use std::time::Duration;

use bytes::Bytes;
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{write_frame, EndpointInfo, LineAccumulator, Transport};

/// Baud rate the lamp firmware configures its UART with.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial link settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    /// Timeout used while opening and flushing the port.
    pub open_timeout: Duration,
}

impl SerialSettings {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            open_timeout: Duration::from_secs(1),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Device link over a serial port.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    lines: LineAccumulator,
    settings: SerialSettings,
    endpoints: EndpointInfo,
}

impl SerialTransport {
    /// Open the port and drop any bytes buffered before we attached.
    pub fn open(settings: SerialSettings) -> Result<Self> {
        let port = serialport::new(settings.port_name.as_str(), settings.baud_rate)
            .timeout(settings.open_timeout)
            .open()
            .map_err(|e| TransportError::Open {
                target: settings.port_name.clone(),
                source: e.into(),
            })?;
        port.clear(ClearBuffer::All)?;

        info!(
            port = %settings.port_name,
            baud = settings.baud_rate,
            "serial link opened"
        );

        Ok(Self {
            port: Some(port),
            lines: LineAccumulator::new(),
            settings,
            endpoints: EndpointInfo::default(),
        })
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }
}

impl Transport for SerialTransport {
    fn endpoints(&self) -> EndpointInfo {
        self.endpoints
    }

    fn send(&mut self, frame: &[u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        port.set_timeout(timeout)?;
        write_frame(port.as_mut(), frame, timeout)
    }

    fn receive(&mut self, max_len: usize, timeout: Duration) -> Result<Bytes> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        self.lines
            .read_line(port.as_mut(), max_len, timeout, |p, remaining| {
                p.set_timeout(remaining).map_err(TransportError::from)
            })
    }

    fn discard_input(&mut self) -> Result<usize> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        let queued = port.bytes_to_read()? as usize;
        port.clear(ClearBuffer::Input)?;
        Ok(self.lines.clear() + queued)
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.settings.port_name, "serial link closed");
        }
    }

    fn transport_name(&self) -> &'static str {
        "serial"
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("settings", &self.settings)
            .field("open", &self.port.is_some())
            .finish()
    }
}
