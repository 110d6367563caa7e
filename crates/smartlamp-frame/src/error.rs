use crate::command::CommandName;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame exceeds the transfer size of the link.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The response does not start with `RES <COMMAND> `.
    #[error("malformed response to {expected}: {preview:?}")]
    MalformedResponse {
        expected: CommandName,
        preview: String,
    },

    /// The payload is not a base-10 integer.
    #[error("payload {payload:?} is not a base-10 integer")]
    ValueParse { payload: String },

    /// The token is not a known command name.
    #[error("unknown command name '{0}'")]
    UnknownCommand(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
