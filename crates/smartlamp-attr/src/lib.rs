//! Attribute registry for SmartLamp devices.
//!
//! Maps attribute names (`led`, `ldr`, `temp`, `hum`) to device commands.
//! [`AttributeRegistry`] returns typed results; [`AttributeSurface`] is the
//! textual view a host exposure mechanism calls into, where a failed read
//! is shown as a sentinel value.
//!
//! Temperature and humidity are decoded as integers by default. The
//! `raw-sensor-text` feature makes verbatim device text the default.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod surface;

pub use config::{RegistryConfig, SensorFormat};
pub use descriptor::{
    lamp_descriptors, Access, AttributeDescriptor, ValueType, MODE_READ_ONLY, MODE_READ_WRITE,
    MODE_WRITE_ONLY,
};
pub use error::{AttrError, Result};
pub use registry::{AttributeRegistry, AttributeValue};
pub use surface::{AttributeSurface, SurfaceEntry};
