// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The transport/session state machine (§3.7, §4.5, §5): `INIT ->
//! CONNECTED -> CLOSED`, request id correlation, and the send/receive
//! contract over a [`RawChannel`].

use std::time::Duration;

use log::{debug, warn};

use crate::error::ControlError;
use crate::transport::{RawChannel, TcpChannel};
use crate::wire::{Header, Request, Response, HEADER_LEN};

const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// The session lifecycle (§3.7 / §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Connected,
    Closed,
}

/// The named endpoint a [`Session`] connects to: transport kind, host,
/// port, and the authentication scheme/options to pass at connect time.
#[derive(Debug, Clone)]
pub struct Transport {
    pub transport_kind: String,
    pub host: String,
    pub port: u16,
    pub auth_scheme: Option<String>,
    pub auth_opts: Option<String>,
}

impl Transport {
    pub fn new(transport_kind: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Transport {
            transport_kind: transport_kind.into(),
            host: host.into(),
            port,
            auth_scheme: None,
            auth_opts: None,
        }
    }

    pub fn with_auth(mut self, scheme: impl Into<String>, opts: Option<String>) -> Self {
        self.auth_scheme = Some(scheme.into());
        self.auth_opts = opts;
        self
    }
}

/// Owns a [`Transport`] and a monotonically increasing request id;
/// drives the framed request/response exchange with a collector daemon.
///
/// A session is not safe to share between threads (§5): the control
/// client is single-threaded per session, matching the teacher's
/// `hdds-c` FFI session handles.
pub struct Session {
    transport: Transport,
    channel: Option<Box<dyn RawChannel>>,
    state: SessionState,
    next_request_id: u64,
}

impl Session {
    pub fn new(transport: Transport) -> Self {
        Session {
            transport,
            channel: None,
            state: SessionState::Init,
            next_request_id: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn host(&self) -> &str {
        &self.transport.host
    }

    pub fn port(&self) -> u16 {
        self.transport.port
    }

    /// `INIT -> CONNECTED`. Opens a real TCP channel against
    /// `transport.host:transport.port`.
    pub fn connect(&mut self) -> Result<(), ControlError> {
        let channel = TcpChannel::connect(&self.transport.host, self.transport.port)?;
        self.channel = Some(Box::new(channel));
        self.state = SessionState::Connected;
        debug!(
            "session connected to {}:{} via {}",
            self.transport.host, self.transport.port, self.transport.transport_kind
        );
        Ok(())
    }

    /// Inject an already-open channel (for tests, or non-TCP transports).
    pub fn connect_with(&mut self, channel: Box<dyn RawChannel>) {
        self.channel = Some(channel);
        self.state = SessionState::Connected;
    }

    /// `close()` then re-allocate then `connect()`.
    pub fn reconnect(&mut self) -> Result<(), ControlError> {
        self.close();
        self.connect()
    }

    /// Release the transport. Idempotent: closing an already-closed
    /// session is a no-op.
    pub fn close(&mut self) {
        self.channel = None;
        self.state = SessionState::Closed;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }

    /// Build a request with the next request id and send it. Requires
    /// `CONNECTED`; any transport error closes the session and is
    /// reported as [`ControlError::NotConnected`].
    pub fn send(&mut self, command_id: u16, attrs: Vec<crate::attr::Attribute>) -> Result<u64, ControlError> {
        if self.state != SessionState::Connected {
            return Err(ControlError::NotConnected);
        }
        let request_id = self.next_id();
        let request = Request {
            command_id,
            request_id,
            attrs,
        };
        let bytes = request.encode();
        let result = self
            .channel
            .as_mut()
            .expect("connected session always has a channel")
            .write_all(&bytes);
        match result {
            Ok(()) => Ok(request_id),
            Err(e) => {
                warn!("send failed, closing session: {}", e);
                self.close();
                Err(ControlError::NotConnected)
            }
        }
    }

    /// Wait for a reply, up to `timeout` (default 5s). On timeout or
    /// transport error, closes the session and fails with
    /// [`ControlError::NotConnected`].
    pub fn receive(&mut self, timeout: Option<Duration>) -> Result<Response, ControlError> {
        if self.state != SessionState::Connected {
            return Err(ControlError::NotConnected);
        }
        let timeout = timeout.unwrap_or(DEFAULT_RECEIVE_TIMEOUT);
        let result = self.receive_inner(timeout);
        if result.is_err() {
            self.close();
        }
        result
    }

    fn receive_inner(&mut self, timeout: Duration) -> Result<Response, ControlError> {
        let channel = self
            .channel
            .as_mut()
            .expect("connected session always has a channel");
        channel.set_read_timeout(Some(timeout))?;

        let mut header_buf = [0u8; HEADER_LEN];
        channel.read_exact(&mut header_buf)?;
        let header = Header::from_bytes(&header_buf)?;

        let body_len = (header.msg_len as usize).saturating_sub(HEADER_LEN);
        let mut payload = vec![0u8; body_len];
        if body_len > 0 {
            channel.read_exact(&mut payload)?;
        }

        Ok(Response {
            request_id: header.request_id,
            errcode: header.errcode,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{AttrId, Attribute};
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// An in-memory [`RawChannel`] for exercising the session state
    /// machine without a real socket: writes are captured, reads are
    /// served from a queued byte sequence (or fail on an empty queue).
    #[derive(Default)]
    struct FakeChannel {
        written: Arc<Mutex<Vec<u8>>>,
        to_read: VecDeque<u8>,
        fail_on_read: bool,
    }

    impl RawChannel for FakeChannel {
        fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(())
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
            if self.fail_on_read || self.to_read.len() < buf.len() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "no more data"));
            }
            for slot in buf.iter_mut() {
                *slot = self.to_read.pop_front().unwrap();
            }
            Ok(())
        }

        fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
            Ok(())
        }
    }

    fn response_bytes(request_id: u64, errcode: u32, payload: &[u8]) -> Vec<u8> {
        let header = Header {
            command_id: 0,
            flags: 0,
            msg_len: (HEADER_LEN + payload.len()) as u32,
            request_id,
            errcode,
        };
        let mut out = header.to_bytes().to_vec();
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn starts_in_init_state() {
        let session = Session::new(Transport::new("sock", "localhost", 411));
        assert_eq!(session.state(), SessionState::Init);
    }

    #[test]
    fn send_before_connect_fails_not_connected() {
        let mut session = Session::new(Transport::new("sock", "localhost", 411));
        let err = session
            .send(1, vec![Attribute::new(AttrId::Name, "x")])
            .unwrap_err();
        assert_eq!(err, ControlError::NotConnected);
    }

    #[test]
    fn send_then_receive_roundtrips_through_fake_channel() {
        let mut session = Session::new(Transport::new("sock", "localhost", 411));
        let mut chan = FakeChannel::default();
        chan.to_read
            .extend(response_bytes(1, 0, b"{\"ok\":true}"));
        session.connect_with(Box::new(chan));

        let request_id = session
            .send(10, vec![Attribute::new(AttrId::Name, "meminfo")])
            .unwrap();
        assert_eq!(request_id, 1);

        let resp = session.receive(None).unwrap();
        assert_eq!(resp.request_id, 1);
        assert_eq!(resp.errcode, 0);
        assert_eq!(resp.payload, b"{\"ok\":true}");
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn receive_failure_closes_session() {
        let mut session = Session::new(Transport::new("sock", "localhost", 411));
        let chan = FakeChannel {
            fail_on_read: true,
            ..Default::default()
        };
        session.connect_with(Box::new(chan));
        let err = session.receive(None).unwrap_err();
        assert_eq!(err, ControlError::NotConnected);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn close_then_send_is_not_connected() {
        let mut session = Session::new(Transport::new("sock", "localhost", 411));
        session.connect_with(Box::new(FakeChannel::default()));
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        let err = session.send(1, vec![]).unwrap_err();
        assert_eq!(err, ControlError::NotConnected);
    }

    #[test]
    fn request_ids_increase_monotonically() {
        let mut session = Session::new(Transport::new("sock", "localhost", 411));
        session.connect_with(Box::new(FakeChannel::default()));
        let id1 = session.send(1, vec![]).unwrap();
        let id2 = session.send(1, vec![]).unwrap();
        assert!(id2 > id1);
    }
}
