//! Scripted connections for unit tests
//!
//! Every poll of a [`ScriptedConnection`] releases at most one scripted step,
//! so tests decide exactly where chunk boundaries and empty polls fall.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::{Connection, DataListener, LineStatus, Transport, take_line};

#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    /// One poll that finds nothing
    Stall,
}

/// Everything written to a scripted connection, shared with the test
#[derive(Debug, Clone, Default)]
pub struct SentLog(Rc<RefCell<Vec<u8>>>);

impl SentLog {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Sent command lines with CRLF removed
    pub fn lines(&self) -> Vec<String> {
        self.text()
            .split("\r\n")
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

pub struct ScriptedConnection {
    steps: VecDeque<Step>,
    pending: Vec<u8>,
    sent: SentLog,
    closed: Rc<RefCell<bool>>,
    send_stalls: usize,
    local: SocketAddrV4,
    peer: SocketAddrV4,
}

impl ScriptedConnection {
    pub fn new(peer: SocketAddrV4) -> Self {
        Self {
            steps: VecDeque::new(),
            pending: Vec::new(),
            sent: SentLog::default(),
            closed: Rc::new(RefCell::new(false)),
            send_stalls: 0,
            local: SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 40000),
            peer,
        }
    }

    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.steps.push_back(Step::Data(bytes.to_vec()));
        self
    }

    pub fn stall(mut self) -> Self {
        self.steps.push_back(Step::Stall);
        self
    }

    /// The next `n` sends report a full send window.
    pub fn send_stalls(mut self, n: usize) -> Self {
        self.send_stalls = n;
        self
    }

    pub fn sent_log(&self) -> SentLog {
        self.sent.clone()
    }

    pub fn closed_flag(&self) -> Rc<RefCell<bool>> {
        self.closed.clone()
    }

    fn advance(&mut self) {
        if let Some(Step::Data(bytes)) = self.steps.pop_front() {
            self.pending.extend_from_slice(&bytes);
        }
    }

    fn at_eof(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Connection for ScriptedConnection {
    fn send(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        if self.send_stalls > 0 {
            self.send_stalls -= 1;
            return Err(TransportError::BufferFull);
        }
        self.sent.0.borrow_mut().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        self.advance();
        if self.pending.is_empty() && self.at_eof() {
            return Err(TransportError::Eof);
        }
        Ok(self.pending.len())
    }

    fn read_block(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.advance();
        if self.pending.is_empty() {
            return if self.at_eof() {
                Err(TransportError::Eof)
            } else {
                Ok(0)
            };
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
        self.advance();
        let eof = self.at_eof();
        take_line(&mut self.pending, eof, out, max_len, delim)
    }

    fn close(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        *self.closed.borrow_mut() = true;
        Ok(())
    }

    fn local_addr(&self) -> SocketAddrV4 {
        self.local
    }

    fn peer_addr(&self) -> SocketAddrV4 {
        self.peer
    }
}

pub struct ScriptedListener {
    addr: SocketAddrV4,
    empty_polls: usize,
    conn: Option<ScriptedConnection>,
}

impl DataListener for ScriptedListener {
    fn poll_accept(&mut self) -> Result<Option<Box<dyn Connection>>, TransportError> {
        if self.empty_polls > 0 {
            self.empty_polls -= 1;
            return Ok(None);
        }
        match self.conn.take() {
            Some(conn) => Ok(Some(Box::new(conn))),
            None => Ok(None),
        }
    }

    fn local_addr(&self) -> SocketAddrV4 {
        self.addr
    }
}

/// Hands out queued connections in order and records what was opened.
#[derive(Default)]
pub struct MockTransport {
    connections: VecDeque<ScriptedConnection>,
    accepts: VecDeque<ScriptedConnection>,
    busy_ports: HashSet<u16>,
    pub opened: Rc<RefCell<Vec<SocketAddrV4>>>,
    pub listened: Rc<RefCell<Vec<SocketAddrV4>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_connection(&mut self, conn: ScriptedConnection) {
        self.connections.push_back(conn);
    }

    /// Connection delivered by the next active-mode listener
    pub fn push_accept(&mut self, conn: ScriptedConnection) {
        self.accepts.push_back(conn);
    }

    pub fn mark_busy(&mut self, port: u16) {
        self.busy_ports.insert(port);
    }
}

impl Transport for MockTransport {
    fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, TransportError> {
        host.parse()
            .map_err(|_| TransportError::Resolve(host.to_string()))
    }

    fn open(
        &mut self,
        addr: SocketAddrV4,
        _timeout: Duration,
    ) -> Result<Box<dyn Connection>, TransportError> {
        self.opened.borrow_mut().push(addr);
        match self.connections.pop_front() {
            Some(conn) => Ok(Box::new(conn)),
            None => Err(TransportError::ConnectFailed(
                addr,
                io::Error::new(io::ErrorKind::ConnectionRefused, "no scripted connection"),
            )),
        }
    }

    fn listen(&mut self, addr: SocketAddrV4) -> Result<Box<dyn DataListener>, TransportError> {
        self.listened.borrow_mut().push(addr);
        if self.busy_ports.contains(&addr.port()) {
            return Err(TransportError::AddrInUse(addr));
        }
        Ok(Box::new(ScriptedListener {
            addr,
            empty_polls: 1,
            conn: self.accepts.pop_front(),
        }))
    }
}
