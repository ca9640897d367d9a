//! Command sender
//!
//! Owns the control connection and its reply buffer. Every exchange is
//! strictly one command, one logical reply.

use std::net::SocketAddrV4;
use std::time::Duration;

use log::{debug, warn};

use crate::config::TransportConfig;
use crate::console::{Console, Poller};
use crate::error::{ClientError, TransportError};
use crate::protocol::commands::FtpCommand;
use crate::protocol::reply::{Reply, read_reply};
use crate::transport::Connection;
use crate::utils::GrowableBuffer;

/// Hides the argument of a `PASS` command (any case) for display.
pub fn redact_for_echo(line: &str) -> String {
    match line.get(..4) {
        Some(verb) if verb.eq_ignore_ascii_case("pass") => format!("{} XXXX", verb),
        _ => line.to_string(),
    }
}

pub struct ControlChannel {
    conn: Box<dyn Connection>,
    buffer: GrowableBuffer,
    reply_timeout: Option<Duration>,
    poll_interval: Duration,
    close_timeout: Duration,
    max_command_length: usize,
    /// A command went out and its reply has not been read in full
    reply_owed: bool,
}

impl ControlChannel {
    pub fn new(conn: Box<dyn Connection>, config: &TransportConfig) -> Self {
        Self {
            conn,
            buffer: GrowableBuffer::with_limit(config.reply_buffer_initial),
            reply_timeout: config.reply_timeout(),
            poll_interval: config.poll_interval(),
            close_timeout: config.close_timeout(),
            max_command_length: config.max_command_length,
            reply_owed: false,
        }
    }

    pub fn local_addr(&self) -> SocketAddrV4 {
        self.conn.local_addr()
    }

    pub fn peer_addr(&self) -> SocketAddrV4 {
        self.conn.peer_addr()
    }

    /// True when the channel is not on a reply boundary: a reply wait was
    /// cut short, or a sent command was never answered.
    pub fn reply_owed(&self) -> bool {
        self.reply_owed
    }

    /// Reads the next reply without sending anything first.
    pub fn read_reply(&mut self, console: &mut dyn Console) -> Result<Reply, ClientError> {
        let mut poller = Poller::new(console, self.reply_timeout, self.poll_interval, "reply");
        let result = read_reply(self.conn.as_mut(), &mut self.buffer, &mut poller);
        self.reply_owed = result.is_err();
        result
    }

    /// Sends `command` and returns the reply it produced. With `debug` set
    /// the command is echoed first, password redacted.
    pub fn send_command(
        &mut self,
        console: &mut dyn Console,
        command: &FtpCommand,
        debug: u8,
    ) -> Result<Reply, ClientError> {
        self.send_line(console, &command.to_string(), debug)?;
        self.read_reply(console)
    }

    fn send_line(
        &mut self,
        console: &mut dyn Console,
        line: &str,
        debug_level: u8,
    ) -> Result<(), ClientError> {
        if line.len() > self.max_command_length {
            return Err(ClientError::CommandTooLong(line.len()));
        }
        self.reply_owed = true;

        let shown = redact_for_echo(line);
        if debug_level > 0 {
            console.write_str(&format!("---> {}\r\n", shown));
        }
        debug!("---> {}", shown);

        let mut wire = Vec::with_capacity(line.len() + 2);
        wire.extend_from_slice(line.as_bytes());
        wire.extend_from_slice(b"\r\n");

        let mut poller = Poller::new(console, self.reply_timeout, self.poll_interval, "send");
        let mut sent = 0;
        while sent < wire.len() {
            match self.conn.send(&wire[sent..]) {
                Ok(0) => poller.idle()?,
                Ok(n) => {
                    sent += n;
                    poller.progressed();
                }
                Err(TransportError::BufferFull) => {
                    poller.check_break()?;
                    poller.idle()?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), ClientError> {
        let peer = self.conn.peer_addr();
        self.conn.close(self.close_timeout).map_err(|e| {
            warn!("Closing control connection to {} failed: {}", peer, e);
            ClientError::from(e)
        })
    }
}
