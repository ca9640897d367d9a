//! Module `data_channel`
//!
//! Negotiates the second TCP connection a transfer runs over.
//!
//! * Passive: `PASV` must answer 227; the `(h0,h1,h2,h3,p0,p1)` sextet in
//!   the reply says where to connect.
//! * Active: a listener is bound on the control connection's local address
//!   at a random port from the dynamic range, then announced with `PORT`,
//!   which must answer 200. The server connects after the transfer command
//!   is accepted.

use log::{debug, info, warn};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use crate::console::Poller;
use crate::error::{ClientError, TransportError};
use crate::protocol::responses::{ENTERING_PASSIVE, OK};
use crate::protocol::{FtpCommand, generate_port, parse_pasv_reply};
use crate::transfer::engine::TransferContext;
use crate::transfer::modes::DataMode;
use crate::transport::{Connection, DataListener};

/// A data channel that is either connected already or waiting for the
/// server to connect
pub enum DataChannel {
    Connected(Box<dyn Connection>),
    Listening(Box<dyn DataListener>),
}

impl DataChannel {
    /// Waits for the connection if the server has not made it yet.
    pub fn into_connection(
        self,
        poller: &mut Poller<'_>,
    ) -> Result<Box<dyn Connection>, ClientError> {
        match self {
            DataChannel::Connected(conn) => Ok(conn),
            DataChannel::Listening(mut listener) => loop {
                if let Some(conn) = listener.poll_accept()? {
                    debug!("Server connected to {}", listener.local_addr());
                    return Ok(conn);
                }
                poller.check_break()?;
                poller.idle()?;
            },
        }
    }

    pub fn close(self, timeout: Duration) -> Result<(), ClientError> {
        match self {
            DataChannel::Connected(mut conn) => Ok(conn.close(timeout)?),
            // dropping the listener releases the port
            DataChannel::Listening(_) => Ok(()),
        }
    }
}

/// Sets up the data channel in the session's current mode.
pub fn negotiate(ctx: &mut TransferContext<'_>) -> Result<DataChannel, ClientError> {
    match DataMode::from_passive_flag(ctx.options.passive) {
        DataMode::Passive => negotiate_passive(ctx),
        DataMode::Active => negotiate_active(ctx),
    }
}

fn negotiate_passive(ctx: &mut TransferContext<'_>) -> Result<DataChannel, ClientError> {
    let reply = ctx.send(&FtpCommand::Pasv)?;
    if !reply.is(ENTERING_PASSIVE) {
        return Err(ClientError::UnexpectedReply {
            expected: &[ENTERING_PASSIVE],
            reply,
        });
    }
    ctx.show(&reply);

    let addr = parse_pasv_reply(reply.text())?;
    info!("Opening passive data connection to {addr}");
    let conn = ctx.transport.open(addr, ctx.config.connect_timeout())?;
    Ok(DataChannel::Connected(conn))
}

fn negotiate_active(ctx: &mut TransferContext<'_>) -> Result<DataChannel, ClientError> {
    let local_ip = *ctx.control.local_addr().ip();
    let listener = bind_listener(ctx, local_ip)?;
    let announced = listener.local_addr();

    let reply = ctx.send(&FtpCommand::Port(announced))?;
    if !reply.is(OK) {
        return Err(ClientError::UnexpectedReply {
            expected: &[OK],
            reply,
        });
    }
    ctx.show(&reply);

    info!("Waiting for active data connection on {announced}");
    Ok(DataChannel::Listening(listener))
}

/// Binds a random dynamic port, trying a fresh one when the port is taken.
fn bind_listener(
    ctx: &mut TransferContext<'_>,
    ip: Ipv4Addr,
) -> Result<Box<dyn DataListener>, ClientError> {
    let attempts = ctx.config.active_port_attempts.max(1);
    let mut last = SocketAddrV4::new(ip, 0);

    for attempt in 1..=attempts {
        let addr = SocketAddrV4::new(ip, generate_port(&mut *ctx.rng));
        match ctx.transport.listen(addr) {
            Ok(listener) => return Ok(listener),
            Err(TransportError::AddrInUse(_)) => {
                warn!("Port {} in use (attempt {attempt}/{attempts})", addr.port());
                last = addr;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(TransportError::AddrInUse(last).into())
}
