//! Non-blocking TCP transport over `std::net`

use std::io::{self, ErrorKind, Read, Write};
use std::net::{
    IpAddr, Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream, ToSocketAddrs,
};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::TransportError;
use crate::transport::{Connection, DataListener, LineStatus, Transport, take_line};

/// Upper bound of bytes pulled from the kernel per poll
const READ_CHUNK: usize = 32000;

#[derive(Debug, Default)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

fn v4(addr: SocketAddr) -> io::Result<SocketAddrV4> {
    match addr {
        SocketAddr::V4(a) => Ok(a),
        SocketAddr::V6(a) => Err(io::Error::new(
            ErrorKind::Unsupported,
            format!("IPv6 address {} not supported", a),
        )),
    }
}

impl Transport for TcpTransport {
    fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, TransportError> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(ip);
        }
        let addrs = (host, 0)
            .to_socket_addrs()
            .map_err(|_| TransportError::Resolve(host.to_string()))?;
        addrs
            .filter_map(|a| match a.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .next()
            .ok_or_else(|| TransportError::Resolve(host.to_string()))
    }

    fn open(
        &mut self,
        addr: SocketAddrV4,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, TransportError> {
        debug!("Connecting to {}", addr);
        let stream = TcpStream::connect_timeout(&SocketAddr::V4(addr), timeout)
            .map_err(|e| TransportError::ConnectFailed(addr, e))?;
        let conn = TcpConnection::new(stream)?;
        info!("Connected to {} from {}", conn.peer, conn.local);
        Ok(Box::new(conn))
    }

    fn listen(&mut self, addr: SocketAddrV4) -> Result<Box<dyn DataListener>, TransportError> {
        let listener = TcpListener::bind(addr).map_err(|e| match e.kind() {
            ErrorKind::AddrInUse => TransportError::AddrInUse(addr),
            _ => TransportError::Io(e),
        })?;
        listener.set_nonblocking(true)?;
        let local = v4(listener.local_addr()?)?;
        debug!("Listening for data connection on {}", local);
        Ok(Box::new(TcpDataListener { listener, local }))
    }
}

pub struct TcpConnection {
    stream: TcpStream,
    pending: Vec<u8>,
    eof: bool,
    local: SocketAddrV4,
    peer: SocketAddrV4,
}

impl TcpConnection {
    fn new(stream: TcpStream) -> Result<Self, TransportError> {
        stream.set_nonblocking(true)?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }
        let local = v4(stream.local_addr()?)?;
        let peer = v4(stream.peer_addr()?)?;
        Ok(Self {
            stream,
            pending: Vec::new(),
            eof: false,
            local,
            peer,
        })
    }

    /// One non-blocking read into the pending buffer, unless it already
    /// holds `cap` bytes.
    fn fill(&mut self, cap: usize) -> Result<(), TransportError> {
        if self.eof || self.pending.len() >= cap {
            return Ok(());
        }
        let mut chunk = [0u8; 4096];
        match self.stream.read(&mut chunk) {
            Ok(0) => {
                debug!("Peer {} closed its side", self.peer);
                self.eof = true;
                Ok(())
            }
            Ok(n) => {
                self.pending.extend_from_slice(&chunk[..n]);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                Ok(())
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}

impl Connection for TcpConnection {
    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        match self.stream.write(bytes) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(TransportError::BufferFull),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        self.fill(READ_CHUNK)?;
        if self.pending.is_empty() && self.eof {
            return Err(TransportError::Eof);
        }
        Ok(self.pending.len())
    }

    fn read_block(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.fill(READ_CHUNK)?;
        if self.pending.is_empty() {
            return if self.eof { Err(TransportError::Eof) } else { Ok(0) };
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn read_line(
        &mut self,
        out: &mut Vec<u8>,
        max_len: usize,
        delim: u8,
    ) -> Result<LineStatus, TransportError> {
        // keep reading until the line ends or outgrows `max_len`
        self.fill(READ_CHUNK.max(max_len.saturating_add(1)))?;
        take_line(&mut self.pending, self.eof, out, max_len, delim)
    }

    fn close(&mut self, timeout: Duration) -> Result<(), TransportError> {
        match self.stream.shutdown(Shutdown::Write) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotConnected => return Ok(()),
            Err(e) => return Err(TransportError::Io(e)),
        }
        let deadline = Instant::now() + timeout;
        while !self.eof && Instant::now() < deadline {
            self.pending.clear();
            self.fill(READ_CHUNK)?;
            if !self.eof && self.pending.is_empty() {
                thread::sleep(Duration::from_millis(5));
            }
        }
        if !self.eof {
            debug!("Peer {} did not close within {:?}", self.peer, timeout);
        }
        let _ = self.stream.shutdown(Shutdown::Both);
        Ok(())
    }

    fn local_addr(&self) -> SocketAddrV4 {
        self.local
    }

    fn peer_addr(&self) -> SocketAddrV4 {
        self.peer
    }
}

pub struct TcpDataListener {
    listener: TcpListener,
    local: SocketAddrV4,
}

impl DataListener for TcpDataListener {
    fn poll_accept(&mut self) -> Result<Option<Box<dyn Connection>>, TransportError> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                info!("Accepted data connection from {}", peer);
                Ok(Some(Box::new(TcpConnection::new(stream)?)))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn local_addr(&self) -> SocketAddrV4 {
        self.local
    }
}
