//! FTP control-channel protocol
//!
//! Command framing, multi-line reply parsing, reply codes and the
//! PASV/PORT address codecs.

pub mod address;
pub mod commands;
pub mod control;
pub mod reply;
pub mod responses;

pub use address::{format_port_argument, generate_port, parse_pasv_reply};
pub use commands::FtpCommand;
pub use control::{ControlChannel, redact_for_echo};
pub use reply::Reply;
