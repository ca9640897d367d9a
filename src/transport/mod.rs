//! Transport adapter
//!
//! The protocol engine never touches sockets directly. It sees the network
//! through three narrow traits: [`Transport`] opens things, [`Connection`]
//! moves bytes without blocking, and [`DataListener`] waits for the server's
//! active-mode connect.

pub mod tcp;

#[cfg(test)]
pub mod mock;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use crate::error::TransportError;

pub use tcp::TcpTransport;

/// Outcome of a non-blocking line read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// A line of this many bytes was appended; the delimiter was consumed
    /// but not stored. At end of stream the last partial line is returned
    /// this way too.
    Complete(usize),
    /// No delimiter buffered yet
    Pending,
}

/// One open TCP connection polled without blocking
pub trait Connection {
    /// Sends as much of `bytes` as the socket takes right now.
    /// `Err(BufferFull)` when the send window is closed.
    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Bytes that can be read without waiting. `Err(Eof)` once the peer has
    /// closed and everything has been read.
    fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// Copies buffered bytes into `buf`; `Ok(0)` means nothing yet.
    fn read_block(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Appends the next `delim`-terminated line to `out`. A line longer than
    /// `max_len` yields `Err(BufferFull)` and stays buffered.
    fn read_line(
        &mut self,
        out: &mut Vec<u8>,
        max_len: usize,
        delim: u8,
    ) -> Result<LineStatus, TransportError>;

    /// Half-closes and waits up to `timeout` for the peer to finish.
    fn close(&mut self, timeout: Duration) -> Result<(), TransportError>;

    fn local_addr(&self) -> SocketAddrV4;
    fn peer_addr(&self) -> SocketAddrV4;
}

/// Listening endpoint announced with `PORT`
pub trait DataListener {
    fn poll_accept(&mut self) -> Result<Option<Box<dyn Connection>>, TransportError>;
    fn local_addr(&self) -> SocketAddrV4;
}

pub trait Transport {
    fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, TransportError>;

    fn open(
        &mut self,
        addr: SocketAddrV4,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, TransportError>;

    fn listen(&mut self, addr: SocketAddrV4) -> Result<Box<dyn DataListener>, TransportError>;
}

/// Finds the first line in `pending` and moves it into `out`. Shared by the
/// real and the scripted connection so both frame lines the same way.
pub(crate) fn take_line(
    pending: &mut Vec<u8>,
    eof: bool,
    out: &mut Vec<u8>,
    max_len: usize,
    delim: u8,
) -> Result<LineStatus, TransportError> {
    match pending.iter().position(|b| *b == delim) {
        Some(pos) if pos > max_len => Err(TransportError::BufferFull),
        Some(pos) => {
            out.extend_from_slice(&pending[..pos]);
            pending.drain(..=pos);
            Ok(LineStatus::Complete(pos))
        }
        None if pending.len() > max_len => Err(TransportError::BufferFull),
        None if eof && pending.is_empty() => Err(TransportError::Eof),
        None if eof => {
            let n = pending.len();
            out.append(pending);
            Ok(LineStatus::Complete(n))
        }
        None => Ok(LineStatus::Pending),
    }
}
