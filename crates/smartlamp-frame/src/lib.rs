//! Line-based command/response framing for the SmartLamp device protocol.
//!
//! Commands go out as `<NAME>[ <ARG>]\n`; responses come back as
//! `RES <NAME> <PAYLOAD>`, optionally newline-terminated. A response is
//! only accepted when it echoes the name of the command it answers.
//!
//! Every encode and decode is bounded by the link's transfer size.

pub mod codec;
pub mod command;
pub mod error;

pub use codec::{
    decode_response, encode, encode_command, parse_integer, Response, MAX_LINE_LEN, RESPONSE_TAG,
};
pub use command::{Command, CommandName};
pub use error::{FrameError, Result};
