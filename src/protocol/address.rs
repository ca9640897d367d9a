//! PASV reply parsing and PORT argument formatting

use std::net::{Ipv4Addr, SocketAddrV4};

use rand::Rng;

use crate::error::ClientError;

/// IANA dynamic port range used for active-mode listeners. 65535 is left out.
pub const FIRST_DYNAMIC_PORT: u16 = 49152;
pub const LAST_DYNAMIC_PORT: u16 = 65534;

/// Extracts `h0,h1,h2,h3,p0,p1` from the text of a 227 reply.
pub fn parse_pasv_reply(text: &str) -> Result<SocketAddrV4, ClientError> {
    let malformed = || ClientError::MalformedPasv(text.to_string());

    let start = text.find('(').ok_or_else(malformed)?;
    let end = text[start..].find(')').ok_or_else(malformed)? + start;

    let values = text[start + 1..end]
        .split(',')
        .map(|v| v.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| malformed())?;

    match values.as_slice() {
        &[h0, h1, h2, h3, p0, p1] => Ok(SocketAddrV4::new(
            Ipv4Addr::new(h0, h1, h2, h3),
            (u16::from(p0) << 8) | u16::from(p1),
        )),
        _ => Err(malformed()),
    }
}

/// `h0,h1,h2,h3,p_hi,p_lo` for a PORT command
pub fn format_port_argument(addr: SocketAddrV4) -> String {
    let [h0, h1, h2, h3] = addr.ip().octets();
    let port = addr.port();
    format!("{},{},{},{},{},{}", h0, h1, h2, h3, port >> 8, port & 0xff)
}

pub fn generate_port<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.gen_range(FIRST_DYNAMIC_PORT..=LAST_DYNAMIC_PORT)
}
