//! Byte-oriented bulk transport for the SmartLamp device link.
//!
//! The lamp is an ESP32 behind a CP2102 USB-UART bridge. Whatever carries
//! the bytes (the bridge's tty, a Unix socket to a simulator or bridge
//! daemon, an in-memory script in tests) is hidden behind [`Transport`]:
//! blocking send/receive calls with an explicit timeout and a bounded
//! transfer size. The in-memory script needs the `mock` feature.
//!
//! This is the lowest layer of smartlamp. It never retries; retry policy
//! lives in the session layer.

pub mod device;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;
#[cfg(unix)]
pub mod uds;

pub use device::{open_device, DeviceSpec};
pub use error::{
    Result, TransportError, STATUS_DISCONNECTED, STATUS_IO, STATUS_STALL, STATUS_TIMEOUT,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockFailure, MockHandle, MockReply, MockTransport};
pub use traits::{EndpointInfo, Transport, DEFAULT_MTU};

#[cfg(feature = "serial")]
pub use serial::{SerialSettings, SerialTransport};
#[cfg(unix)]
pub use uds::{DeviceSocket, SocketTransport};
