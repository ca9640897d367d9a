//! Directory listing transfers
//!
//! Listing lines go to a local file, to a [`MatchBuffer`], or to the
//! console. Console output honours Ctrl-S / Ctrl-Q; the other two
//! destinations only listen for Ctrl-C.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::console::Poller;
use crate::error::{ClientError, TransportError};
use crate::transport::{Connection, LineStatus};
use crate::utils::MatchBuffer;

/// Where the caller wants a listing to go
pub enum ListingTarget<'a> {
    File(&'a Path),
    Collector(&'a mut MatchBuffer),
    Console,
}

enum Sink<'a> {
    File(BufWriter<File>, PathBuf),
    Collector(&'a mut MatchBuffer),
    Console,
}

impl<'a> Sink<'a> {
    /// A local file that cannot be created falls back to the console.
    fn open(target: ListingTarget<'a>) -> Self {
        match target {
            ListingTarget::File(path) => match File::create(path) {
                Ok(file) => Sink::File(BufWriter::new(file), path.to_path_buf()),
                Err(e) => {
                    warn!("Cannot create {}: {}, listing to console", path.display(), e);
                    Sink::Console
                }
            },
            ListingTarget::Collector(names) => Sink::Collector(names),
            ListingTarget::Console => Sink::Console,
        }
    }

    fn deliver(&mut self, line: &[u8], poller: &mut Poller<'_>) -> Result<(), ClientError> {
        let text = line.strip_suffix(b"\r").unwrap_or(line);
        match self {
            Sink::File(writer, path) => writer
                .write_all(text)
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| ClientError::FileWrite(path.clone(), e)),
            Sink::Collector(names) => names.push(text),
            Sink::Console => {
                let console = poller.console();
                console.write_str(&String::from_utf8_lossy(text));
                console.write_str("\r\n");
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<(), ClientError> {
        match self {
            Sink::File(mut writer, path) => writer
                .flush()
                .map_err(|e| ClientError::FileWrite(path, e)),
            _ => Ok(()),
        }
    }
}

/// Copies listing lines until the server closes the data connection.
/// Returns the number of lines delivered.
pub fn receive_listing(
    conn: &mut dyn Connection,
    poller: &mut Poller<'_>,
    target: ListingTarget<'_>,
    max_line: usize,
) -> Result<usize, ClientError> {
    let mut sink = Sink::open(target);
    let to_console = matches!(sink, Sink::Console);
    let mut line = Vec::new();
    let mut lines = 0;

    loop {
        if to_console {
            poller.check_input()?;
        } else {
            poller.check_break()?;
        }

        line.clear();
        match conn.read_line(&mut line, max_line, b'\n') {
            Ok(LineStatus::Complete(_)) => {
                poller.progressed();
                sink.deliver(&line, poller)?;
                lines += 1;
            }
            Ok(LineStatus::Pending) => poller.idle()?,
            Err(TransportError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    sink.finish()?;
    Ok(lines)
}
