//! Module `state`
//!
//! Defines `SessionState`, the per-connection part of a session: the control
//! channel, the server it talks to and what the client knows about the
//! server's transfer type.

use std::net::SocketAddrV4;

use crate::error::ClientError;
use crate::protocol::ControlChannel;
use crate::transfer::TransferType;

/// State of the current connection, if any.
///
/// `transfer_type` is what the user asked for; `last_type_sent` is what the
/// server was last told with an accepted `TYPE`, so listings (always ASCII)
/// and transfers only send `TYPE` when the two differ.
#[derive(Default)]
pub struct SessionState {
    control: Option<ControlChannel>,
    server_addr: Option<SocketAddrV4>,
    transfer_type: TransferType,
    last_type_sent: Option<TransferType>,
    control_suspect: bool,
}

impl SessionState {
    /// Installs a freshly opened control channel.
    pub fn attach(&mut self, control: ControlChannel, server_addr: SocketAddrV4) {
        self.control = Some(control);
        self.server_addr = Some(server_addr);
        self.last_type_sent = None;
        self.control_suspect = false;
    }

    /// Drops the connection and everything tied to it.
    ///
    /// The desired transfer type survives, as it is a user setting; the
    /// server's type does not.
    pub fn detach(&mut self) -> Option<ControlChannel> {
        self.server_addr = None;
        self.last_type_sent = None;
        self.control_suspect = false;
        self.control.take()
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn is_connected(&self) -> bool {
        self.control.is_some()
    }

    pub fn server_addr(&self) -> Option<SocketAddrV4> {
        self.server_addr
    }

    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    pub fn last_type_sent(&self) -> Option<TransferType> {
        self.last_type_sent
    }

    /// True after an error that may have left the control channel between
    /// two replies.
    pub fn is_control_suspect(&self) -> bool {
        self.control_suspect
    }

    /// The control channel together with the type tracking a transfer
    /// updates, or `None` when not connected.
    pub fn control_parts(&mut self) -> Option<(&mut ControlChannel, &mut Option<TransferType>)> {
        let control = self.control.as_mut()?;
        Some((control, &mut self.last_type_sent))
    }

    // --------------------
    // Setter methods
    // --------------------

    pub fn set_transfer_type(&mut self, transfer_type: TransferType) {
        self.transfer_type = transfer_type;
    }

    pub fn set_control_suspect(&mut self, suspect: bool) {
        self.control_suspect = suspect;
    }

    /// Marks the control channel suspect when `err` may have left it
    /// between two replies, or a reply is still owed. Returns the new flag.
    pub fn note_failure(&mut self, err: &ClientError) -> bool {
        let Some(control) = self.control.as_ref() else {
            return false;
        };
        if err.leaves_control_suspect() || control.reply_owed() {
            self.control_suspect = true;
        }
        self.control_suspect
    }
}
