//! Error types
//!
//! Defines the transport error consumed from the socket adapter and the single
//! client error every session operation returns.

use std::fmt;
use std::io;
use std::net::SocketAddrV4;
use std::path::PathBuf;

use crate::protocol::Reply;

/// Errors reported by the transport adapter
#[derive(Debug)]
pub enum TransportError {
    Resolve(String),
    ConnectFailed(SocketAddrV4, io::Error),
    AddrInUse(SocketAddrV4),
    /// The peer closed its side and every buffered byte has been consumed
    Eof,
    /// The caller's buffer (or the send window) cannot take the data yet
    BufferFull,
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Resolve(host) => write!(f, "Cannot resolve host: {}", host),
            TransportError::ConnectFailed(addr, e) => {
                write!(f, "Cannot connect to {}: {}", addr, e)
            }
            TransportError::AddrInUse(addr) => write!(f, "Address already in use: {}", addr),
            TransportError::Eof => write!(f, "Connection closed by peer"),
            TransportError::BufferFull => write!(f, "Buffer full"),
            TransportError::Io(e) => write!(f, "Network error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io(error)
    }
}

/// Errors returned by client operations.
///
/// `code()` gives the negative number each kind reports in the
/// single-result-code convention.
#[derive(Debug)]
pub enum ClientError {
    // transport
    Transport(TransportError),

    // protocol
    UnexpectedReply { expected: &'static [u16], reply: Reply },
    MalformedPasv(String),
    /// The control channel is out of step after this one
    ReplyFraming(String),

    // local resources
    OutOfMemory,
    FileRead(PathBuf, io::Error),
    FileWrite(PathBuf, io::Error),
    FileNotFound(PathBuf),
    InvalidPath(PathBuf),
    Console(io::Error),

    // user
    NotConnected,
    AlreadyConnected,
    UnknownCommand(String),
    ArgCount(String),
    UnknownType(String),
    CommandTooLong(usize),
    Parse(String),

    // cancellation / waits
    Interrupted,
    Timeout(&'static str),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "{}", e),
            ClientError::UnexpectedReply { reply, .. } => {
                write!(f, "Unexpected reply: {}", reply.text().trim_end())
            }
            ClientError::MalformedPasv(text) => {
                write!(f, "Malformed passive reply: {}", text.trim_end())
            }
            ClientError::ReplyFraming(detail) => {
                write!(f, "Internal error, please notify author ({})", detail)
            }
            ClientError::OutOfMemory => write!(f, "Out of memory"),
            ClientError::FileRead(p, e) => {
                write!(f, "Error reading file {}: {}", p.display(), e)
            }
            ClientError::FileWrite(p, e) => {
                write!(f, "Error writing file {}: {}", p.display(), e)
            }
            ClientError::FileNotFound(p) => write!(f, "File not found: {}", p.display()),
            ClientError::InvalidPath(p) => write!(f, "Invalid path: {}", p.display()),
            ClientError::Console(e) => write!(f, "Console error: {}", e),
            ClientError::NotConnected => write!(f, "Not connected"),
            ClientError::AlreadyConnected => write!(f, "Already connected, use close first"),
            ClientError::UnknownCommand(c) => write!(f, "Unknown command: {}", c),
            ClientError::ArgCount(c) => write!(f, "Wrong number of arguments for {}", c),
            ClientError::UnknownType(t) => write!(f, "Unknown type: {}", t),
            ClientError::CommandTooLong(len) => {
                write!(f, "Command too long ({} bytes)", len)
            }
            ClientError::Parse(msg) => write!(f, "{}", msg),
            ClientError::Interrupted => write!(f, "Interrupted by user"),
            ClientError::Timeout(what) => write!(f, "Timed out waiting for {}", what),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(e) => Some(e),
            ClientError::FileRead(_, e)
            | ClientError::FileWrite(_, e)
            | ClientError::Console(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(error: TransportError) -> Self {
        ClientError::Transport(error)
    }
}

impl From<io::Error> for ClientError {
    fn from(error: io::Error) -> Self {
        ClientError::Transport(TransportError::Io(error))
    }
}

impl ClientError {
    /// Legacy numeric code of this error, always negative
    pub fn code(&self) -> i32 {
        match self {
            ClientError::UnknownCommand(_) => -100,
            ClientError::ArgCount(_) => -101,
            ClientError::ReplyFraming(_)
            | ClientError::MalformedPasv(_)
            | ClientError::UnexpectedReply { .. } => -102,
            ClientError::NotConnected => -103,
            ClientError::UnknownType(_) => -104,
            ClientError::FileRead(..) => -105,
            ClientError::FileWrite(..) => -106,
            ClientError::FileNotFound(_) => -107,
            ClientError::InvalidPath(_) => -108,
            ClientError::OutOfMemory => -109,
            ClientError::Interrupted => -110,
            ClientError::Timeout(_) => -112,
            ClientError::AlreadyConnected | ClientError::CommandTooLong(_) => -113,
            ClientError::Parse(_) => -114,
            ClientError::Console(_) => -115,
            ClientError::Transport(_) => -1,
        }
    }

    /// True when the control connection can no longer be trusted to be
    /// aligned on a reply boundary.
    pub fn leaves_control_suspect(&self) -> bool {
        matches!(
            self,
            ClientError::ReplyFraming(_) | ClientError::Timeout(_) | ClientError::OutOfMemory
        )
    }
}
