//! Transfer engine
//!
//! Every data transfer (RETR, STOR, LIST, NLST) runs through the same
//! sequence:
//!
//! 1. send `TYPE` if the server's current type differs from the one needed,
//!    and require 200
//! 2. negotiate the data channel
//! 3. send the transfer command and require 125 or 150
//! 4. stream until the server (or our file) signals the end
//! 5. on Ctrl-C send `ABOR` and drain both replies it produces, after the
//!    reply to the transfer command itself if that had not arrived yet
//! 6. close the data channel
//! 7. read the final reply
//!
//! A failure after step 3 still goes through 6 and 7 so the control
//! channel stays on a reply boundary.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use std::path::Path;

use crate::config::{SessionOptions, TransportConfig};
use crate::console::{Console, Poller};
use crate::error::ClientError;
use crate::protocol::responses::{OK, TRANSFER_STARTING};
use crate::protocol::{ControlChannel, FtpCommand, Reply};
use crate::transfer::data_channel::{DataChannel, negotiate};
use crate::transfer::file_ops::{receive_file, send_file};
use crate::transfer::listing::{ListingTarget, receive_listing};
use crate::transfer::modes::TransferType;
use crate::transfer::stats::TransferStats;
use crate::transport::{Connection, Transport};

/// What a transfer moves, and where
pub enum TransferBody<'a> {
    Download(&'a Path),
    Upload(&'a Path),
    Listing(ListingTarget<'a>),
}

/// Final reply and statistics of a completed transfer
#[derive(Debug)]
pub struct TransferOutcome {
    pub reply: Reply,
    pub stats: TransferStats,
}

/// The pieces of session state one operation works with, borrowed for the
/// duration of that operation.
pub struct TransferContext<'a> {
    pub control: &'a mut ControlChannel,
    pub transport: &'a mut dyn Transport,
    pub console: &'a mut dyn Console,
    pub rng: &'a mut StdRng,
    pub config: &'a TransportConfig,
    pub options: &'a SessionOptions,
    pub last_type_sent: &'a mut Option<TransferType>,
}

impl TransferContext<'_> {
    pub fn send(&mut self, command: &FtpCommand) -> Result<Reply, ClientError> {
        self.control
            .send_command(&mut *self.console, command, self.options.debug)
    }

    pub fn read_reply(&mut self) -> Result<Reply, ClientError> {
        self.control.read_reply(&mut *self.console)
    }

    /// Prints a server reply when verbose.
    pub fn show(&mut self, reply: &Reply) {
        if self.options.verbose {
            self.console.write_str(reply.text());
        }
    }

    /// Sends `TYPE` and records it as the server's type on a 200 reply.
    pub fn set_type(&mut self, transfer_type: TransferType) -> Result<Reply, ClientError> {
        let reply = self.send(&FtpCommand::Type(transfer_type))?;
        if reply.is(OK) {
            *self.last_type_sent = Some(transfer_type);
        }
        Ok(reply)
    }

    /// Makes sure the server uses `required`, without a redundant `TYPE`.
    pub fn ensure_type(&mut self, required: TransferType) -> Result<(), ClientError> {
        if *self.last_type_sent == Some(required) {
            return Ok(());
        }
        let reply = self.set_type(required)?;
        if !reply.is(OK) {
            return Err(ClientError::UnexpectedReply {
                expected: &[OK],
                reply,
            });
        }
        self.show(&reply);
        Ok(())
    }

    /// Sends `ABOR` and drains its two replies: either "aborted" then
    /// "abort done", or "complete" then "abort done".
    pub fn abort(&mut self) -> ClientError {
        info!("Aborting transfer");
        let first = match self.send(&FtpCommand::Abor) {
            Ok(reply) => reply,
            Err(e) => return e,
        };
        self.show(&first);
        match self.read_reply() {
            Ok(second) => {
                debug!("ABOR answered {} then {}", first.code(), second.code());
                self.show(&second);
                ClientError::Interrupted
            }
            Err(e) => e,
        }
    }

    /// `ABOR` for a transfer command whose reply never arrived. That reply
    /// comes first; after 125/150 the transfer started and ABOR gets two
    /// replies, otherwise one.
    pub fn abort_unanswered(&mut self) -> ClientError {
        info!("Aborting transfer before it started");
        let pending = match self.send(&FtpCommand::Abor) {
            Ok(reply) => reply,
            Err(e) => return e,
        };
        self.show(&pending);
        let owed = if pending.is_one_of(TRANSFER_STARTING) { 2 } else { 1 };
        for _ in 0..owed {
            match self.read_reply() {
                Ok(reply) => self.show(&reply),
                Err(e) => return e,
            }
        }
        debug!("ABOR drained after a {} reply", pending.code());
        ClientError::Interrupted
    }

    /// Runs one transfer from `TYPE` to the final reply.
    pub fn transfer(
        &mut self,
        command: FtpCommand,
        required: TransferType,
        body: TransferBody<'_>,
    ) -> Result<TransferOutcome, ClientError> {
        self.ensure_type(required)?;

        let channel = negotiate(self)?;
        let close_timeout = self.config.close_timeout();

        let reply = match self.send(&command) {
            Ok(reply) => reply,
            Err(ClientError::Interrupted) if self.control.reply_owed() => {
                let err = self.abort_unanswered();
                if let Err(e) = channel.close(close_timeout) {
                    debug!("Closing data channel after abort: {e}");
                }
                return Err(err);
            }
            Err(e) => {
                let _ = channel.close(close_timeout);
                return Err(e);
            }
        };
        if !reply.is_one_of(TRANSFER_STARTING) {
            if let Err(e) = channel.close(close_timeout) {
                debug!("Closing unused data channel: {e}");
            }
            return Err(ClientError::UnexpectedReply {
                expected: TRANSFER_STARTING,
                reply,
            });
        }
        self.show(&reply);

        let mut stats = TransferStats::start(self.options.tick);
        let (streamed, conn) = self.stream(channel, body, &mut stats);
        stats.finish(&mut *self.console);

        if let Err(ClientError::Interrupted) = streamed {
            let err = self.abort();
            if let Some(mut conn) = conn {
                let _ = conn.close(close_timeout);
            }
            return Err(err);
        }

        let closed = match conn {
            Some(mut conn) => conn.close(close_timeout).map_err(ClientError::from),
            None => Ok(()),
        };

        // a local error is reported in preference to the close result
        match streamed.and(closed) {
            Ok(()) => {
                let reply = self.read_reply()?;
                Ok(TransferOutcome { reply, stats })
            }
            Err(e) => {
                warn!("Transfer failed: {e}");
                // the server still owes the final reply for this transfer
                match self.read_reply() {
                    Ok(reply) => self.show(&reply),
                    Err(drain) => warn!("No final reply after failed transfer: {drain}"),
                }
                Err(e)
            }
        }
    }

    fn stream(
        &mut self,
        channel: DataChannel,
        body: TransferBody<'_>,
        stats: &mut TransferStats,
    ) -> (Result<(), ClientError>, Option<Box<dyn Connection>>) {
        let io_chunk = self.config.io_buffer_size;
        let channel_chunk = self.config.channel_buffer_size;
        let mut poller = Poller::new(
            &mut *self.console,
            self.config.data_timeout(),
            self.config.poll_interval(),
            "data",
        );

        let mut conn = match channel.into_connection(&mut poller) {
            Ok(conn) => conn,
            Err(e) => return (Err(e), None),
        };

        let result = match body {
            TransferBody::Download(path) => receive_file(
                conn.as_mut(),
                &mut poller,
                path,
                stats,
                io_chunk.min(channel_chunk),
            ),
            TransferBody::Upload(path) => send_file(
                conn.as_mut(),
                &mut poller,
                path,
                stats,
                io_chunk,
                channel_chunk,
            ),
            TransferBody::Listing(target) => {
                receive_listing(conn.as_mut(), &mut poller, target, io_chunk).map(|_| ())
            }
        };
        (result, Some(conn))
    }
}
