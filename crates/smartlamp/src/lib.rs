//! Host-side driver for the SmartLamp device.
//!
//! SmartLamp is a microcontroller with an LED, a light sensor and a
//! temperature/humidity sensor, talking a line-based text protocol over a
//! USB-UART bridge. This crate ties the layers together.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte-oriented bulk transport (serial bridge, Unix socket)
//! - [`frame`]: Command encoding and response decoding
//! - [`session`]: Device sessions and serialized transactions with retry
//! - [`attr`]: Named attributes and their textual exposure surface
//! - [`host`]: Attach/detach lifecycle
//! - [`sim`]: Simulated lamp firmware (unix)

pub mod host;
#[cfg(unix)]
pub mod sim;

pub use host::{DeviceHost, HostError, HostState};

/// USB vendor id of the CP2102 USB-UART bridge on the lamp board.
pub const CP2102_VENDOR_ID: u16 = 0x10c4;
/// USB product id of the CP2102 USB-UART bridge on the lamp board.
pub const CP2102_PRODUCT_ID: u16 = 0xea60;

/// Re-export transport types.
pub mod transport {
    pub use smartlamp_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use smartlamp_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use smartlamp_session::*;
}

/// Re-export attribute types.
pub mod attr {
    pub use smartlamp_attr::*;
}
