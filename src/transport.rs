//! Blocking TCP transport
//!
//! Owns the socket and an explicit connection state machine. The primitives
//! here require an established connection and fail with
//! [`ModbusError::NotConnected`] otherwise; reconnection is a client-level
//! decision, never something this layer does silently mid-call. Every I/O
//! failure faults the connection, so a later exchange starts from a fresh
//! connect instead of a broken stream.
//!
//! There is no timeout, retry or cancellation at this layer. A deployment
//! that needs them wraps the client calls in its own policy.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};

use tracing::{debug, trace, warn};

use crate::constants::MBAP_HEADER_LEN;
use crate::error::{ModbusError, ModbusResult};
use crate::frame::MbapHeader;
use crate::pdu::ModbusPdu;

/// Observable connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No usable connection; a connect attempt is required.
    NotConnected,
    /// Stream established and believed healthy.
    Connected,
    /// An exchange failed mid-stream; the socket is not trusted anymore.
    Faulted,
}

/// Blocking TCP stream with explicit state tracking.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    state: ConnectionState,
}

impl TcpTransport {
    /// A transport with no connection yet.
    pub fn new() -> Self {
        Self {
            stream: None,
            state: ConnectionState::NotConnected,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True only in [`ConnectionState::Connected`].
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Establish a fresh connection, replacing any previous stream.
    pub fn connect(&mut self, addr: SocketAddr) -> ModbusResult<()> {
        debug!(%addr, "connecting");
        match TcpStream::connect(addr) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                debug!(%addr, "connected");
                Ok(())
            },
            Err(err) => {
                self.stream = None;
                self.state = ConnectionState::NotConnected;
                Err(ModbusError::Connection(format!(
                    "connect to {addr} failed: {err}"
                )))
            },
        }
    }

    /// Mark the connection stale without closing the socket. The stream is
    /// replaced on the next connect.
    pub fn invalidate(&mut self) {
        self.state = ConnectionState::NotConnected;
    }

    /// Drop the stream.
    pub fn close(&mut self) {
        self.stream = None;
        self.state = ConnectionState::NotConnected;
    }

    /// Write one request frame in full.
    pub fn send(&mut self, frame: &[u8]) -> ModbusResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(ModbusError::NotConnected);
        }
        let stream = self.stream.as_mut().ok_or(ModbusError::NotConnected)?;

        trace!(frame = %hex::encode(frame), "sending frame");
        match write_frame(stream, frame) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "send failed, faulting connection");
                self.state = ConnectionState::Faulted;
                Err(err)
            },
        }
    }

    /// Read one response frame: MBAP header, then the body it advertises.
    pub fn recv(&mut self) -> ModbusResult<(MbapHeader, ModbusPdu)> {
        if self.state != ConnectionState::Connected {
            return Err(ModbusError::NotConnected);
        }
        let stream = self.stream.as_mut().ok_or(ModbusError::NotConnected)?;

        match read_frame(stream) {
            Ok(parts) => Ok(parts),
            Err(err) => {
                // an I/O error or a malformed header both mean the stream can
                // no longer be assumed to sit on a frame boundary
                warn!(error = %err, "receive failed, faulting connection");
                self.state = ConnectionState::Faulted;
                Err(err)
            },
        }
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> ModbusResult<()> {
    let written = writer.write(frame)?;
    if written != frame.len() {
        return Err(ModbusError::ShortWrite {
            expected: frame.len(),
            actual: written,
        });
    }
    writer.flush()?;
    Ok(())
}

fn read_frame<R: Read>(reader: &mut R) -> ModbusResult<(MbapHeader, ModbusPdu)> {
    let mut header_bytes = [0u8; MBAP_HEADER_LEN];
    reader.read_exact(&mut header_bytes)?;

    let header = MbapHeader::from_bytes(header_bytes);
    header.validate()?;

    let mut body = vec![0u8; header.body_len()];
    reader.read_exact(&mut body)?;
    trace!(
        transaction_id = header.transaction_id,
        body = %hex::encode(&body),
        "received frame"
    );

    let pdu = ModbusPdu::from_slice(&body)?;
    Ok((header, pdu))
}
