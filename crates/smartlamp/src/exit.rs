use std::fmt;
use std::io;

use smartlamp::HostError;
use smartlamp_attr::AttrError;
use smartlamp_frame::FrameError;
use smartlamp_session::EngineError;
use smartlamp_transport::{TransportError, STATUS_TIMEOUT};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. }
        | TransportError::Bind { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::InvalidSpec { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::FrameTooLarge { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn engine_error(context: &str, err: EngineError) -> CliError {
    match err {
        EngineError::Frame(err) => frame_error(context, err),
        EngineError::TransportReadExhausted { code, .. } if code == STATUS_TIMEOUT => {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        EngineError::TransportWrite { .. }
        | EngineError::TransportReadExhausted { .. }
        | EngineError::DeviceDetached
        | EngineError::Attach(_) => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        EngineError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn attr_error(context: &str, err: AttrError) -> CliError {
    match err {
        AttrError::Io { source, .. } => engine_error(context, source),
        AttrError::Decode { source, .. } => frame_error(context, source),
        AttrError::UnknownAttribute(_) => CliError::new(USAGE, format!("{context}: {err}")),
        AttrError::NotReadable(_) | AttrError::NotWritable(_) => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        AttrError::InvalidInput { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        AttrError::DeviceDetached => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

pub fn host_error(context: &str, err: HostError) -> CliError {
    match err {
        HostError::Session(err) => engine_error(context, err),
        HostError::AlreadyAttached(_) => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use smartlamp_frame::CommandName;

    use super::*;

    #[test]
    fn exhausted_timeouts_map_to_timeout_code() {
        let err = EngineError::TransportReadExhausted {
            command: CommandName::GetLdr,
            attempts: 5,
            code: STATUS_TIMEOUT,
            source: TransportError::Timeout(Duration::from_secs(1)),
        };
        assert_eq!(engine_error("read failed", err).code, TIMEOUT);
    }

    #[test]
    fn attribute_errors_map_to_exit_codes() {
        assert_eq!(
            attr_error("x", AttrError::UnknownAttribute("color".into())).code,
            USAGE
        );
        assert_eq!(
            attr_error("x", AttrError::NotWritable("ldr".into())).code,
            PERMISSION_DENIED
        );
        let invalid = AttrError::InvalidInput {
            attribute: "led".into(),
            input: "abc".into(),
        };
        assert_eq!(attr_error("x", invalid).code, DATA_INVALID);
    }

    #[test]
    fn missing_socket_is_transport_error() {
        let err = TransportError::Open {
            target: "/tmp/none.sock".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(transport_error("open failed", err).code, TRANSPORT_ERROR);
    }
}
