/// How temperature and humidity replies are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFormat {
    /// Payload parsed as a base-10 integer, rendered as `<n>\n`.
    Integer,
    /// Payload forwarded as sent by the device, trailing newline included.
    RawText,
}

impl Default for SensorFormat {
    fn default() -> Self {
        if cfg!(feature = "raw-sensor-text") {
            SensorFormat::RawText
        } else {
            SensorFormat::Integer
        }
    }
}

/// Controls attribute decoding and failure rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Decode policy for the temperature and humidity attributes.
    pub sensor_format: SensorFormat,
    /// Value shown in place of a reading that could not be obtained.
    pub sentinel: i32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            sensor_format: SensorFormat::default(),
            sentinel: -1,
        }
    }
}

impl RegistryConfig {
    pub fn with_sensor_format(mut self, sensor_format: SensorFormat) -> Self {
        self.sensor_format = sensor_format;
        self
    }
}
