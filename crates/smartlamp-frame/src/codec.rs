use bytes::{BufMut, Bytes, BytesMut};

use crate::command::{Command, CommandName};
use crate::error::{FrameError, Result};

/// Tag that opens every device response.
pub const RESPONSE_TAG: &str = "RES";

/// Longest line the lamp firmware reads or writes.
pub const MAX_LINE_LEN: usize = 100;

/// Bytes of a rejected frame kept for error messages.
const PREVIEW_LEN: usize = 32;

/// A decoded device response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    command: CommandName,
    payload: String,
    terminated: bool,
}

impl Response {
    /// The command this response answers.
    pub fn command(&self) -> CommandName {
        self.command
    }

    /// Text after `RES <COMMAND> `, without the line terminator.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Whether the device ended the line with `\n`.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The payload exactly as the device sent it, newline included.
    pub fn raw_text(&self) -> String {
        if self.terminated {
            format!("{}\n", self.payload)
        } else {
            self.payload.clone()
        }
    }

    /// The payload as a base-10 integer.
    pub fn integer(&self) -> Result<i32> {
        parse_integer(&self.payload)
    }
}

/// Encode a command into the wire format.
///
/// Wire format: `<NAME>[ <ARG>]\n`. Nothing is written to `dst` when the
/// line would exceed `max_len`.
pub fn encode_command(command: &Command, max_len: usize, dst: &mut BytesMut) -> Result<()> {
    let line = command.to_string();
    let size = line.len() + 1;
    if size > max_len {
        return Err(FrameError::FrameTooLarge {
            size,
            max: max_len,
        });
    }

    dst.reserve(size);
    dst.put_slice(line.as_bytes());
    dst.put_u8(b'\n');
    Ok(())
}

/// Encode a command into a fresh buffer.
pub fn encode(command: &Command, max_len: usize) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(max_len.min(MAX_LINE_LEN));
    encode_command(command, max_len, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode the response to `expected` from one received transfer.
///
/// The frame must start with the literal `RES <expected> `. The payload
/// runs up to the first `\n` or NUL, whichever comes first. A frame that
/// fills `max_len` without either was cut by the link and is rejected.
pub fn decode_response(frame: &[u8], expected: CommandName, max_len: usize) -> Result<Response> {
    if frame.len() > max_len {
        return Err(FrameError::FrameTooLarge {
            size: frame.len(),
            max: max_len,
        });
    }

    let end = match frame.iter().position(|b| *b == b'\n' || *b == 0) {
        Some(end) => end,
        None if frame.len() == max_len => return Err(malformed(expected, frame)),
        None => frame.len(),
    };
    let terminated = frame.get(end) == Some(&b'\n');
    let line = &frame[..end];

    let prefix = format!("{RESPONSE_TAG} {} ", expected.as_str());
    let payload = line
        .strip_prefix(prefix.as_bytes())
        .ok_or_else(|| malformed(expected, line))?;
    let payload = std::str::from_utf8(payload).map_err(|_| malformed(expected, line))?;

    Ok(Response {
        command: expected,
        payload: payload.to_string(),
        terminated,
    })
}

/// Parse a base-10 integer payload, ignoring surrounding whitespace.
pub fn parse_integer(payload: &str) -> Result<i32> {
    payload
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .parse::<i32>()
        .map_err(|_| FrameError::ValueParse {
            payload: payload.to_string(),
        })
}

fn malformed(expected: CommandName, line: &[u8]) -> FrameError {
    let cut = line.len().min(PREVIEW_LEN);
    FrameError::MalformedResponse {
        expected,
        preview: String::from_utf8_lossy(&line[..cut]).into_owned(),
    }
}
