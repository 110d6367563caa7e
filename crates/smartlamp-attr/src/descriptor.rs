use std::fmt;

use smartlamp_frame::{Command, CommandName};

use crate::config::SensorFormat;

/// Mode of a read-write attribute file.
pub const MODE_READ_WRITE: u32 = 0o664;
/// Mode of a read-only attribute file.
pub const MODE_READ_ONLY: u32 = 0o444;
/// Mode of a write-only attribute file.
pub const MODE_WRITE_ONLY: u32 = 0o220;

/// How an attribute's payload is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    RawText,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::RawText => "text",
        }
    }
}

impl From<SensorFormat> for ValueType {
    fn from(format: SensorFormat) -> Self {
        match format {
            SensorFormat::Integer => ValueType::Integer,
            SensorFormat::RawText => ValueType::RawText,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::ReadOnly => f.write_str("ro"),
            Access::WriteOnly => f.write_str("wo"),
            Access::ReadWrite => f.write_str("rw"),
        }
    }
}

/// Static description of one device attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    name: &'static str,
    read: Option<CommandName>,
    write: Option<CommandName>,
    value_type: ValueType,
}

impl AttributeDescriptor {
    pub fn read_only(name: &'static str, read: CommandName, value_type: ValueType) -> Self {
        Self {
            name,
            read: Some(read),
            write: None,
            value_type,
        }
    }

    pub fn read_write(
        name: &'static str,
        read: CommandName,
        write: CommandName,
        value_type: ValueType,
    ) -> Self {
        Self {
            name,
            read: Some(read),
            write: Some(write),
            value_type,
        }
    }

    pub fn write_only(name: &'static str, write: CommandName, value_type: ValueType) -> Self {
        Self {
            name,
            read: None,
            write: Some(write),
            value_type,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn read_command_name(&self) -> Option<CommandName> {
        self.read
    }

    pub fn write_command_name(&self) -> Option<CommandName> {
        self.write
    }

    pub fn access(&self) -> Access {
        match (self.read.is_some(), self.write.is_some()) {
            (true, true) => Access::ReadWrite,
            (false, true) => Access::WriteOnly,
            _ => Access::ReadOnly,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    /// File mode the attribute is published with.
    pub fn mode(&self) -> u32 {
        match self.access() {
            Access::ReadWrite => MODE_READ_WRITE,
            Access::ReadOnly => MODE_READ_ONLY,
            Access::WriteOnly => MODE_WRITE_ONLY,
        }
    }

    pub(crate) fn read_command(&self) -> Option<Command> {
        self.read.map(Command::new)
    }

    pub(crate) fn write_command(&self, value: i32) -> Option<Command> {
        self.write.map(|name| Command::with_argument(name, value))
    }
}

/// The lamp's attribute table: the LED level and three sensors.
pub fn lamp_descriptors(sensor_format: SensorFormat) -> Vec<AttributeDescriptor> {
    let sensor = ValueType::from(sensor_format);
    vec![
        AttributeDescriptor::read_write(
            "led",
            CommandName::GetLed,
            CommandName::SetLed,
            ValueType::Integer,
        ),
        AttributeDescriptor::read_only("ldr", CommandName::GetLdr, ValueType::Integer),
        AttributeDescriptor::read_only("temp", CommandName::GetTemp, sensor),
        AttributeDescriptor::read_only("hum", CommandName::GetHum, sensor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lamp_table_modes() {
        let table = lamp_descriptors(SensorFormat::Integer);
        let modes: Vec<_> = table.iter().map(|d| (d.name(), d.mode())).collect();
        assert_eq!(
            modes,
            vec![
                ("led", 0o664),
                ("ldr", 0o444),
                ("temp", 0o444),
                ("hum", 0o444)
            ]
        );
    }

    #[test]
    fn sensor_format_applies_to_temp_and_hum_only() {
        let table = lamp_descriptors(SensorFormat::RawText);
        let types: Vec<_> = table.iter().map(|d| d.value_type()).collect();
        assert_eq!(
            types,
            vec![
                ValueType::Integer,
                ValueType::Integer,
                ValueType::RawText,
                ValueType::RawText
            ]
        );
    }

    #[test]
    fn write_command_carries_value() {
        let led = &lamp_descriptors(SensorFormat::Integer)[0];
        let command = led.write_command(75).unwrap();
        assert_eq!(command.to_string(), "SET_LED 75");
        assert_eq!(led.access(), Access::ReadWrite);
    }

    #[test]
    fn read_only_has_no_write_command() {
        let ldr = AttributeDescriptor::read_only("ldr", CommandName::GetLdr, ValueType::Integer);
        assert!(ldr.write_command(1).is_none());
        assert!(!ldr.is_writable());
        assert_eq!(ldr.access().to_string(), "ro");
    }
}
