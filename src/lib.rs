//! RAX FTP client
//!
//! An interactive FTP client (RFC 959) built on non-blocking polling loops:
//! every wait on the control or data connection stays interruptible from
//! the keyboard.

pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transfer;
pub mod transport;
pub mod utils;

pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use session::{OpOutcome, Session};
