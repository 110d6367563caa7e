use std::fmt;
use std::sync::Arc;

use smartlamp_frame::parse_integer;
use smartlamp_session::DeviceSession;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::descriptor::{lamp_descriptors, AttributeDescriptor, ValueType};
use crate::error::{AttrError, Result};

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Integer(i32),
    /// Device text, verbatim.
    Text(String),
}

impl AttributeValue {
    /// Text handed to the exposure layer: integers as `<n>\n`, raw text
    /// byte for byte.
    pub fn render(&self) -> String {
        match self {
            AttributeValue::Integer(value) => format!("{value}\n"),
            AttributeValue::Text(text) => text.clone(),
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            AttributeValue::Integer(value) => Some(*value),
            AttributeValue::Text(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(value) => write!(f, "{value}"),
            AttributeValue::Text(text) => f.write_str(text.trim_end_matches('\n')),
        }
    }
}

/// Name-keyed attribute table bound to one device session.
pub struct AttributeRegistry {
    session: Arc<DeviceSession>,
    descriptors: Vec<AttributeDescriptor>,
    config: RegistryConfig,
}

impl AttributeRegistry {
    /// Registry with the lamp's attribute table.
    pub fn new(session: Arc<DeviceSession>, config: RegistryConfig) -> Self {
        let descriptors = lamp_descriptors(config.sensor_format);
        Self::with_descriptors(session, descriptors, config)
    }

    /// Registry with an explicit attribute table.
    pub fn with_descriptors(
        session: Arc<DeviceSession>,
        descriptors: Vec<AttributeDescriptor>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            session,
            descriptors,
            config,
        }
    }

    pub fn descriptor(&self, name: &str) -> Result<&AttributeDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| AttrError::UnknownAttribute(name.to_string()))
    }

    pub fn descriptors(&self) -> &[AttributeDescriptor] {
        &self.descriptors
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<DeviceSession> {
        &self.session
    }

    /// Read one attribute from the device.
    pub fn read(&self, name: &str) -> Result<AttributeValue> {
        let descriptor = self.descriptor(name)?;
        let command = descriptor
            .read_command()
            .ok_or_else(|| AttrError::NotReadable(name.to_string()))?;

        let response = self
            .session
            .execute(&command)
            .map_err(|err| AttrError::from_engine(name, err))?;

        let value = match descriptor.value_type() {
            ValueType::Integer => {
                let value = response.integer().map_err(|source| AttrError::Decode {
                    attribute: name.to_string(),
                    source,
                })?;
                AttributeValue::Integer(value)
            }
            ValueType::RawText => AttributeValue::Text(response.raw_text()),
        };
        debug!(attribute = name, value = %value, "attribute read");
        Ok(value)
    }

    /// Write one attribute. The device's confirmation payload is
    /// consumed and discarded.
    pub fn write(&self, name: &str, raw: &str) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        if !descriptor.is_writable() {
            return Err(AttrError::NotWritable(name.to_string()));
        }

        let value = match descriptor.value_type() {
            ValueType::Integer => {
                parse_integer(raw).map_err(|_| AttrError::InvalidInput {
                    attribute: name.to_string(),
                    input: raw.to_string(),
                })?
            }
            ValueType::RawText => {
                return Err(AttrError::InvalidInput {
                    attribute: name.to_string(),
                    input: raw.to_string(),
                })
            }
        };

        let command = descriptor
            .write_command(value)
            .ok_or_else(|| AttrError::NotWritable(name.to_string()))?;
        let response = self
            .session
            .execute(&command)
            .map_err(|err| AttrError::from_engine(name, err))?;
        debug!(
            attribute = name,
            value,
            confirmation = response.payload(),
            "attribute written"
        );
        Ok(())
    }
}

impl fmt::Debug for AttributeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeRegistry")
            .field("session", &self.session.id())
            .field("descriptors", &self.descriptors.len())
            .field("config", &self.config)
            .finish()
    }
}
