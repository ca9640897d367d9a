//! Scripted sessions for unit tests

use std::cell::RefCell;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::ClientConfig;
use crate::console::Key;
use crate::console::mock::{ScriptedConsole, Transcript};
use crate::session::Session;
use crate::transport::mock::{MockTransport, ScriptedConnection, SentLog};

pub const PASV_REPLY: &[u8] = b"227 Entering Passive Mode (127,0,0,1,4,1)\r\n";

pub struct Fixture {
    pub session: Session,
    pub sent: SentLog,
    pub output: Transcript,
    pub bells: Rc<RefCell<usize>>,
}

pub fn server_addr() -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::LOCALHOST, 21)
}

pub fn data_conn() -> ScriptedConnection {
    ScriptedConnection::new(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 1025))
}

/// A session whose server plays `script` (greeting included). Nothing is
/// connected yet.
pub fn offline(script: &[u8], data: Vec<ScriptedConnection>, keys: &[Key]) -> Fixture {
    let control = ScriptedConnection::new(server_addr()).data(script);
    let sent = control.sent_log();
    let mut transport = MockTransport::new();
    transport.push_connection(control);
    for conn in data {
        transport.push_connection(conn);
    }

    let mut console = ScriptedConsole::new();
    console.push_keys(keys);
    let output = console.transcript();
    let bells = console.bell_counter();

    let mut config = ClientConfig::default();
    config.transport.poll_interval_ms = 0;
    let session = Session::new(config, Box::new(transport), Box::new(console))
        .with_rng(StdRng::seed_from_u64(7));

    Fixture {
        session,
        sent,
        output,
        bells,
    }
}

/// A session connected without login; `replies` follow the greeting.
pub fn connected(replies: &[u8], data: Vec<ScriptedConnection>, keys: &[Key]) -> Fixture {
    let mut script = b"220 Service ready\r\n".to_vec();
    script.extend_from_slice(replies);
    let mut fixture = offline(&script, data, keys);
    fixture.session.options.auto_login = false;
    fixture
        .session
        .connect("127.0.0.1", 21)
        .expect("scripted greeting");
    fixture
}
