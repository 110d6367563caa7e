//! Scripted in-memory transport.
//!
//! Replies are queued up front or produced by a responder closure that
//! sees every sent frame. Queued replies reach the input side only when a
//! frame is sent, one transaction's worth at a time: every failure up to
//! and including the next data reply. [`MockHandle::deliver`] puts a reply
//! on the input side right away, the way a late answer would arrive.
//!
//! A [`MockHandle`] keeps access to the recorded traffic after the
//! transport itself has been moved into a session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::{EndpointInfo, Transport};

/// Failure injected into a send or receive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Timeout,
    Stall,
    Disconnected,
}

impl MockFailure {
    fn into_error(self, timeout: Duration) -> TransportError {
        match self {
            MockFailure::Timeout => TransportError::Timeout(timeout),
            MockFailure::Stall => TransportError::Stall,
            MockFailure::Disconnected => TransportError::Disconnected,
        }
    }
}

/// Outcome of one receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Data(Bytes),
    /// A successful transfer carrying zero bytes.
    Empty,
    Fail(MockFailure),
}

impl MockReply {
    pub fn line(text: &str) -> Self {
        MockReply::Data(Bytes::copy_from_slice(text.as_bytes()))
    }
}

type Responder = Box<dyn FnMut(&[u8]) -> Vec<MockReply> + Send>;

#[derive(Default)]
struct MockState {
    sent: Vec<Bytes>,
    scripted: VecDeque<MockReply>,
    inbox: VecDeque<MockReply>,
    send_failures: VecDeque<MockFailure>,
    responder: Option<Responder>,
    send_calls: usize,
    receive_calls: usize,
    discarded: usize,
    awaiting_reply: bool,
    interleaved: bool,
    closed: bool,
    latency: Duration,
}

/// In-memory [`Transport`] driven by a script.
///
/// Empty input behaves like a silent device: every receive times out
/// immediately.
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    endpoints: EndpointInfo,
}

/// Inspection and scripting handle for a [`MockTransport`].
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            endpoints: EndpointInfo::default(),
        }
    }

    /// Answer every sent frame with the replies returned by `responder`.
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<MockReply> + Send + 'static,
    {
        lock(&self.state).responder = Some(Box::new(responder));
        self
    }

    pub fn with_endpoints(mut self, endpoints: EndpointInfo) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sleep this long inside every receive call.
    pub fn with_latency(self, latency: Duration) -> Self {
        lock(&self.state).latency = latency;
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHandle {
    /// Queue a reply to a later send.
    pub fn push_reply(&self, reply: MockReply) {
        lock(&self.state).scripted.push_back(reply);
    }

    /// Make a reply available to the next receive call right away.
    pub fn deliver(&self, reply: MockReply) {
        lock(&self.state).inbox.push_back(reply);
    }

    /// Make the next send call fail.
    pub fn fail_next_send(&self, failure: MockFailure) {
        lock(&self.state).send_failures.push_back(failure);
    }

    /// Frames passed to successful send calls, in order.
    pub fn sent(&self) -> Vec<Bytes> {
        lock(&self.state).sent.clone()
    }

    pub fn send_calls(&self) -> usize {
        lock(&self.state).send_calls
    }

    pub fn receive_calls(&self) -> usize {
        lock(&self.state).receive_calls
    }

    /// Data bytes dropped by [`Transport::discard_input`].
    pub fn discarded_bytes(&self) -> usize {
        lock(&self.state).discarded
    }

    /// Total send and receive calls.
    pub fn calls(&self) -> usize {
        let state = lock(&self.state);
        state.send_calls + state.receive_calls
    }

    /// True once a frame was sent while an earlier one still awaited its reply.
    pub fn saw_interleaving(&self) -> bool {
        lock(&self.state).interleaved
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}

impl Transport for MockTransport {
    fn endpoints(&self) -> EndpointInfo {
        self.endpoints
    }

    fn send(&mut self, frame: &[u8], timeout: Duration) -> Result<usize> {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.send_calls += 1;
        if let Some(failure) = state.send_failures.pop_front() {
            return Err(failure.into_error(timeout));
        }

        if state.awaiting_reply {
            state.interleaved = true;
        }
        state.awaiting_reply = true;
        state.sent.push(Bytes::copy_from_slice(frame));

        while let Some(reply) = state.scripted.pop_front() {
            let answered = matches!(reply, MockReply::Data(_));
            state.inbox.push_back(reply);
            if answered {
                break;
            }
        }
        if let Some(responder) = state.responder.as_mut() {
            let replies = responder(frame);
            state.inbox.extend(replies);
        }
        Ok(frame.len())
    }

    fn receive(&mut self, max_len: usize, timeout: Duration) -> Result<Bytes> {
        let latency = {
            let mut state = lock(&self.state);
            if state.closed {
                return Err(TransportError::Closed);
            }
            state.receive_calls += 1;
            state.latency
        };
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let mut state = lock(&self.state);
        match state.inbox.pop_front() {
            Some(MockReply::Data(mut data)) => {
                if data.len() > max_len {
                    let rest = data.split_off(max_len);
                    state.inbox.push_front(MockReply::Data(rest));
                }
                state.awaiting_reply = false;
                Ok(data)
            }
            Some(MockReply::Empty) => Ok(Bytes::new()),
            Some(MockReply::Fail(failure)) => Err(failure.into_error(timeout)),
            None => Err(TransportError::Timeout(timeout)),
        }
    }

    fn discard_input(&mut self) -> Result<usize> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(TransportError::Closed);
        }
        let dropped = state
            .inbox
            .drain(..)
            .map(|reply| match reply {
                MockReply::Data(data) => data.len(),
                _ => 0,
            })
            .sum::<usize>();
        state.discarded += dropped;
        Ok(dropped)
    }

    fn close(&mut self) {
        lock(&self.state).closed = true;
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}
