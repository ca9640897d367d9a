//! Reply reader
//!
//! A logical reply is one or more lines. Every line opens with a four byte
//! header: three digits and either `-` (more lines follow) or a space (last
//! line). Inside a multi-line reply, RFC 959 lets intermediate lines carry
//! arbitrary text, so only lines that start with the reply's own code are
//! checked as headers there. A final line (digits and a space) with a
//! different code still ends the reply, and its code is the reply's code.

use log::{debug, warn};

use crate::console::Poller;
use crate::error::{ClientError, TransportError};
use crate::transport::{Connection, LineStatus};
use crate::utils::GrowableBuffer;

pub const HEADER_LEN: usize = 4;

/// A complete server reply: its code and every line of text, each line
/// ending in `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is(&self, code: u16) -> bool {
        self.code == code
    }

    pub fn is_one_of(&self, codes: &[u16]) -> bool {
        codes.contains(&self.code)
    }
}

enum Marker {
    Final,
    Continued,
}

/// Checks the header of the first line and returns its code.
fn parse_header(header: &[u8; HEADER_LEN]) -> Result<(u16, Marker), ClientError> {
    let digits = &header[..3];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(ClientError::ReplyFraming(format!(
            "reply header {:?} has no code",
            String::from_utf8_lossy(header)
        )));
    }
    let code = digits
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
    let marker = match header[3] {
        b' ' => Marker::Final,
        b'-' => Marker::Continued,
        other => {
            return Err(ClientError::ReplyFraming(format!(
                "reply header {:?} ends in {:?}",
                String::from_utf8_lossy(header),
                other as char
            )));
        }
    };
    Ok((code, marker))
}

/// Reads up to `HEADER_LEN` bytes, stopping early at a newline.
/// Returns the number of header bytes read.
fn read_header(
    conn: &mut dyn Connection,
    header: &mut [u8; HEADER_LEN],
    poller: &mut Poller<'_>,
) -> Result<usize, ClientError> {
    let mut got = 0;
    while got < HEADER_LEN {
        match conn.read_block(&mut header[got..got + 1])? {
            0 => {
                poller.check_break()?;
                poller.idle()?;
            }
            n => {
                poller.progressed();
                got += n;
                if header[got - 1] == b'\n' {
                    break;
                }
            }
        }
    }
    Ok(got)
}

/// Reads the rest of the current line into `buffer`, doubling it whenever
/// the line does not fit, then terminates the stored line with `\n`.
fn read_rest_of_line(
    conn: &mut dyn Connection,
    buffer: &mut GrowableBuffer,
    poller: &mut Poller<'_>,
) -> Result<(), ClientError> {
    loop {
        // one byte stays free for the newline added below
        while buffer.remaining() < 2 {
            buffer.grow()?;
        }
        let max_len = buffer.remaining() - 1;
        match conn.read_line(buffer.data_mut(), max_len, b'\n') {
            Ok(LineStatus::Complete(_)) => {
                poller.progressed();
                buffer.push(b'\n')?;
                return Ok(());
            }
            Ok(LineStatus::Pending) => {
                poller.check_break()?;
                poller.idle()?;
            }
            Err(TransportError::BufferFull) => {
                buffer.grow()?;
                debug!("Reply buffer grown to {} bytes", buffer.limit());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Reads one logical reply. `buffer` is cleared first and holds the reply
/// text afterwards.
pub fn read_reply(
    conn: &mut dyn Connection,
    buffer: &mut GrowableBuffer,
    poller: &mut Poller<'_>,
) -> Result<Reply, ClientError> {
    buffer.clear();
    let mut header = [0u8; HEADER_LEN];

    let got = read_header(conn, &mut header, poller)?;
    if got < HEADER_LEN {
        return Err(ClientError::ReplyFraming(format!(
            "short reply line {:?}",
            String::from_utf8_lossy(&header[..got])
        )));
    }
    let (mut code, mut marker) = parse_header(&header)?;
    buffer.extend_from_slice(&header)?;
    read_rest_of_line(conn, buffer, poller)?;

    while let Marker::Continued = marker {
        let got = read_header(conn, &mut header, poller)?;
        buffer.extend_from_slice(&header[..got])?;
        if header[got - 1] == b'\n' {
            // short text line inside a multi-line reply
            continue;
        }
        if got == HEADER_LEN && header[..3] == header_digits(code) {
            let (_, next) = parse_header(&header)?;
            marker = next;
        } else if got == HEADER_LEN && header[..3].iter().all(u8::is_ascii_digit) {
            warn!(
                "Reply line {:?} inside a {} reply",
                String::from_utf8_lossy(&header),
                code
            );
            if header[3] == b' ' {
                // the final line decides the code
                (code, marker) = parse_header(&header)?;
            }
        }
        read_rest_of_line(conn, buffer, poller)?;
    }

    let reply = Reply::new(code, String::from_utf8_lossy(buffer.as_slice()));
    debug!("<--- {}", reply.text().trim_end());
    Ok(reply)
}

fn header_digits(code: u16) -> [u8; 3] {
    [
        b'0' + (code / 100 % 10) as u8,
        b'0' + (code / 10 % 10) as u8,
        b'0' + (code % 10) as u8,
    ]
}
