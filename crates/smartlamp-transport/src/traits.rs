use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};

use crate::error::{Result, TransportError};

/// Bulk IN endpoint address of the CP2102 bridge.
pub const DEFAULT_IN_ADDRESS: u8 = 0x81;
/// Bulk OUT endpoint address of the CP2102 bridge.
pub const DEFAULT_OUT_ADDRESS: u8 = 0x01;
/// Max packet size of the CP2102 bulk endpoints.
pub const DEFAULT_MTU: usize = 64;

const READ_CHUNK_SIZE: usize = 256;
/// Most bytes dropped by one discard call.
const DISCARD_LIMIT: usize = 4096;

/// Endpoint addresses and transfer size discovered when a link is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub in_address: u8,
    pub out_address: u8,
    /// Largest single transfer, in bytes.
    pub mtu: usize,
}

impl Default for EndpointInfo {
    fn default() -> Self {
        Self {
            in_address: DEFAULT_IN_ADDRESS,
            out_address: DEFAULT_OUT_ADDRESS,
            mtu: DEFAULT_MTU,
        }
    }
}

/// A byte-oriented, bidirectional link to one device.
///
/// Every call blocks for at most the supplied timeout. Implementations do
/// not retry; retry policy belongs to the caller.
pub trait Transport: Send {
    /// Endpoint addresses and MTU of this link.
    fn endpoints(&self) -> EndpointInfo;

    /// Send one frame, returning the number of bytes written.
    fn send(&mut self, frame: &[u8], timeout: Duration) -> Result<usize>;

    /// Receive one transfer of at most `max_len` bytes.
    fn receive(&mut self, max_len: usize, timeout: Duration) -> Result<Bytes>;

    /// Drop input that arrived outside a transaction (late replies, the
    /// tail of a cut reply). Never blocks. Returns the bytes dropped.
    fn discard_input(&mut self) -> Result<usize>;

    /// Release the link. Later calls fail with [`TransportError::Closed`].
    fn close(&mut self);

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn endpoints(&self) -> EndpointInfo {
        (**self).endpoints()
    }

    fn send(&mut self, frame: &[u8], timeout: Duration) -> Result<usize> {
        (**self).send(frame, timeout)
    }

    fn receive(&mut self, max_len: usize, timeout: Duration) -> Result<Bytes> {
        (**self).receive(max_len, timeout)
    }

    fn discard_input(&mut self) -> Result<usize> {
        (**self).discard_input()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

/// Turns a byte stream into bulk-transfer-like line reads.
///
/// Each read yields one newline-terminated line, at most `max_len` bytes,
/// or whatever arrived before the timeout. Bytes past the newline stay
/// buffered for the next read.
#[derive(Debug, Default)]
pub(crate) struct LineAccumulator {
    pending: BytesMut,
}

impl LineAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    pub(crate) fn read_line<R, F>(
        &mut self,
        source: &mut R,
        max_len: usize,
        timeout: Duration,
        mut set_timeout: F,
    ) -> Result<Bytes>
    where
        R: Read + ?Sized,
        F: FnMut(&mut R, Duration) -> Result<()>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(line) = self.take_line(max_len) {
                return Ok(line);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.take_partial(timeout);
            }
            set_timeout(source, remaining)?;

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match source.read(&mut chunk) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return self.take_partial(timeout);
                }
                Err(err) => return Err(TransportError::from_io(err, timeout)),
            }
        }
    }

    /// Drop buffered bytes. Returns how many there were.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Drop buffered bytes and whatever `source` yields without blocking.
    ///
    /// `source` must already be in non-blocking mode. End of stream is not
    /// an error here; the next send or receive reports it.
    pub(crate) fn discard<R: Read + ?Sized>(&mut self, source: &mut R) -> Result<usize> {
        let mut dropped = self.clear();
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        while dropped < DISCARD_LIMIT {
            match source.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => dropped += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    break;
                }
                Err(err) => return Err(TransportError::from_io(err, Duration::ZERO)),
            }
        }
        Ok(dropped)
    }

    fn take_line(&mut self, max_len: usize) -> Option<Bytes> {
        let window = self.pending.len().min(max_len);
        if let Some(pos) = self.pending[..window].iter().position(|b| *b == b'\n') {
            return Some(self.pending.split_to(pos + 1).freeze());
        }
        if self.pending.len() >= max_len {
            return Some(self.pending.split_to(max_len).freeze());
        }
        None
    }

    fn take_partial(&mut self, timeout: Duration) -> Result<Bytes> {
        if self.pending.is_empty() {
            return Err(TransportError::Timeout(timeout));
        }
        let len = self.pending.len();
        Ok(self.pending.split_to(len).freeze())
    }
}

/// Write a whole frame to a blocking stream.
pub(crate) fn write_frame<W: Write + ?Sized>(
    sink: &mut W,
    frame: &[u8],
    timeout: Duration,
) -> Result<usize> {
    let mut offset = 0usize;
    while offset < frame.len() {
        match sink.write(&frame[offset..]) {
            Ok(0) => return Err(TransportError::Disconnected),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::from_io(err, timeout)),
        }
    }

    loop {
        match sink.flush() {
            Ok(()) => return Ok(offset),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::from_io(err, timeout)),
        }
    }
}
