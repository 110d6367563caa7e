use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Where the device link lives.
///
/// Textual form: `serial:<path>[@<baud>]` or `unix:<socket-path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSpec {
    Serial { port: String, baud_rate: Option<u32> },
    Socket(PathBuf),
}

impl FromStr for DeviceSpec {
    type Err = TransportError;

    fn from_str(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| TransportError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = spec
            .split_once(':')
            .ok_or_else(|| invalid("expected <scheme>:<target>"))?;
        if rest.is_empty() {
            return Err(invalid("missing target"));
        }

        match scheme {
            "serial" => {
                let (port, baud_rate) = match rest.rsplit_once('@') {
                    Some((port, baud)) => {
                        let baud = baud
                            .parse::<u32>()
                            .ok()
                            .filter(|b| *b > 0)
                            .ok_or_else(|| invalid("baud rate must be a positive integer"))?;
                        (port, Some(baud))
                    }
                    None => (rest, None),
                };
                if port.is_empty() {
                    return Err(invalid("missing serial port path"));
                }
                Ok(DeviceSpec::Serial {
                    port: port.to_string(),
                    baud_rate,
                })
            }
            "unix" => Ok(DeviceSpec::Socket(PathBuf::from(rest))),
            other => Err(invalid(&format!("unknown scheme '{other}'"))),
        }
    }
}

impl std::fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceSpec::Serial {
                port,
                baud_rate: Some(baud),
            } => write!(f, "serial:{port}@{baud}"),
            DeviceSpec::Serial { port, .. } => write!(f, "serial:{port}"),
            DeviceSpec::Socket(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Open the link described by `spec`.
pub fn open_device(spec: &DeviceSpec) -> Result<Box<dyn Transport>> {
    match spec {
        #[cfg(feature = "serial")]
        DeviceSpec::Serial { port, baud_rate } => {
            let mut settings = crate::serial::SerialSettings::new(port.as_str());
            if let Some(baud) = baud_rate {
                settings = settings.with_baud_rate(*baud);
            }
            Ok(Box::new(crate::serial::SerialTransport::open(settings)?))
        }
        #[cfg(not(feature = "serial"))]
        DeviceSpec::Serial { port, .. } => Err(TransportError::Open {
            target: port.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "serial support not compiled in (enable the `serial` feature)",
            ),
        }),
        #[cfg(unix)]
        DeviceSpec::Socket(path) => Ok(Box::new(crate::uds::SocketTransport::connect(path)?)),
        #[cfg(not(unix))]
        DeviceSpec::Socket(path) => Err(TransportError::Open {
            target: path.display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            ),
        }),
    }
}
