//! Module `file_ops`
//!
//! Copies file data between a local file and the data connection. Both
//! directions are polling loops: an empty poll is not the end of the
//! transfer, only `TransportError::Eof` is.

use log::{debug, error, info};
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::console::Poller;
use crate::error::{ClientError, TransportError};
use crate::transfer::stats::TransferStats;
use crate::transport::Connection;

/// Downloads the rest of the data stream into `path`.
pub fn receive_file(
    conn: &mut dyn Connection,
    poller: &mut Poller<'_>,
    path: &Path,
    stats: &mut TransferStats,
    chunk_size: usize,
) -> Result<(), ClientError> {
    let file = File::create(path).map_err(|e| {
        error!("Cannot create local file {}: {e}", path.display());
        ClientError::FileWrite(path.to_path_buf(), e)
    })?;
    let mut writer = BufWriter::new(file);
    receive_into(conn, poller, &mut writer, path, stats, chunk_size)?;
    writer
        .flush()
        .map_err(|e| ClientError::FileWrite(path.to_path_buf(), e))?;
    info!("Received {} bytes into {}", stats.bytes(), path.display());
    Ok(())
}

pub fn receive_into<W: Write>(
    conn: &mut dyn Connection,
    poller: &mut Poller<'_>,
    writer: &mut W,
    path: &Path,
    stats: &mut TransferStats,
    chunk_size: usize,
) -> Result<(), ClientError> {
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        poller.check_break()?;

        let available = match conn.bytes_available() {
            Ok(n) => n,
            Err(TransportError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if available == 0 {
            poller.idle()?;
            continue;
        }

        let want = available.min(buffer.len());
        let n = match conn.read_block(&mut buffer[..want]) {
            Ok(n) => n,
            Err(TransportError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            poller.idle()?;
            continue;
        }

        writer
            .write_all(&buffer[..n])
            .map_err(|e| ClientError::FileWrite(path.to_path_buf(), e))?;
        poller.progressed();
        stats.add(n, poller.console());
    }
}

/// Uploads `path` over the data connection.
pub fn send_file(
    conn: &mut dyn Connection,
    poller: &mut Poller<'_>,
    path: &Path,
    stats: &mut TransferStats,
    io_chunk: usize,
    channel_chunk: usize,
) -> Result<(), ClientError> {
    let mut file = File::open(path).map_err(|e| {
        error!("Cannot open local file {}: {e}", path.display());
        ClientError::FileRead(path.to_path_buf(), e)
    })?;
    send_from(conn, poller, &mut file, path, stats, io_chunk, channel_chunk)?;
    info!("Sent {} bytes from {}", stats.bytes(), path.display());
    Ok(())
}

/// Reads `io_chunk` bytes at a time from `reader` and hands them to the
/// connection in blocks of at most `channel_chunk`.
pub fn send_from<R: Read>(
    conn: &mut dyn Connection,
    poller: &mut Poller<'_>,
    reader: &mut R,
    path: &Path,
    stats: &mut TransferStats,
    io_chunk: usize,
    channel_chunk: usize,
) -> Result<(), ClientError> {
    let mut buffer = vec![0u8; io_chunk.max(1)];

    loop {
        poller.check_break()?;

        let n = match reader.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ClientError::FileRead(path.to_path_buf(), e)),
        };

        for block in buffer[..n].chunks(channel_chunk.max(1)) {
            let mut offset = 0;
            while offset < block.len() {
                match conn.send(&block[offset..]) {
                    Ok(0) => poller.idle()?,
                    Ok(sent) => {
                        offset += sent;
                        poller.progressed();
                        stats.add(sent, poller.console());
                    }
                    Err(TransportError::BufferFull) => {
                        debug!("Send window full, waiting");
                        poller.check_break()?;
                        poller.idle()?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}
