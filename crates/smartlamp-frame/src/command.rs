//! Command names understood by the lamp firmware.

use std::fmt;
use std::str::FromStr;

use crate::error::FrameError;

/// Command token of the device protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandName {
    /// Read the light sensor.
    GetLdr,
    /// Read the LED level.
    GetLed,
    /// Set the LED level.
    SetLed,
    /// Read the temperature sensor.
    GetTemp,
    /// Read the humidity sensor.
    GetHum,
}

impl CommandName {
    pub const ALL: [CommandName; 5] = [
        CommandName::GetLdr,
        CommandName::GetLed,
        CommandName::SetLed,
        CommandName::GetTemp,
        CommandName::GetHum,
    ];

    /// Wire token, e.g. `GET_LDR`.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandName::GetLdr => "GET_LDR",
            CommandName::GetLed => "GET_LED",
            CommandName::SetLed => "SET_LED",
            CommandName::GetTemp => "GET_TEMP",
            CommandName::GetHum => "GET_HUM",
        }
    }

    /// Returns true if the command carries an integer argument.
    pub fn takes_argument(self) -> bool {
        matches!(self, CommandName::SetLed)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| FrameError::UnknownCommand(s.to_string()))
    }
}

/// One outbound command: a name token and an optional integer argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    name: CommandName,
    argument: Option<i32>,
}

impl Command {
    /// A command without argument.
    pub fn new(name: CommandName) -> Self {
        Self {
            name,
            argument: None,
        }
    }

    /// A command carrying `argument`.
    pub fn with_argument(name: CommandName, argument: i32) -> Self {
        Self {
            name,
            argument: Some(argument),
        }
    }

    pub fn name(&self) -> CommandName {
        self.name
    }

    pub fn argument(&self) -> Option<i32> {
        self.argument
    }
}

/// Renders `<NAME>[ <ARG>]` without the line terminator.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument {
            Some(arg) => write!(f, "{} {arg}", self.name),
            None => f.write_str(self.name.as_str()),
        }
    }
}
