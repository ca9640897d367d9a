//! End-to-end sessions against a scripted FTP server on 127.0.0.1.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rax_ftp_client::console::{Console, Key};
use rax_ftp_client::transport::tcp::TcpTransport;
use rax_ftp_client::{ClientConfig, ClientError, OpOutcome, Session};

/// Console whose typed keys are only handed to prompts. Ctrl-C is pressed
/// by raising the shared flag.
struct TestConsole {
    typed: VecDeque<Key>,
    interrupt: Arc<AtomicBool>,
    output: Rc<RefCell<String>>,
}

impl TestConsole {
    fn new(typed: &str) -> Self {
        let mut keys = VecDeque::new();
        for line in typed.lines() {
            keys.extend(line.chars().map(Key::Char));
            keys.push_back(Key::Enter);
        }
        Self {
            typed: keys,
            interrupt: Arc::new(AtomicBool::new(false)),
            output: Rc::new(RefCell::new(String::new())),
        }
    }
}

impl Console for TestConsole {
    fn write_str(&mut self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn key_waiting(&mut self) -> io::Result<bool> {
        Ok(self.interrupt.load(Ordering::SeqCst))
    }

    fn read_key(&mut self) -> io::Result<Key> {
        if self.interrupt.swap(false, Ordering::SeqCst) {
            return Ok(Key::Interrupt);
        }
        self.typed
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no typed key left"))
    }
}

struct Client {
    session: Session,
    output: Rc<RefCell<String>>,
    interrupt: Arc<AtomicBool>,
}

fn client(typed: &str, auto_login: bool) -> Client {
    let console = TestConsole::new(typed);
    let output = console.output.clone();
    let interrupt = console.interrupt.clone();

    let mut config = ClientConfig::default();
    config.session.auto_login = auto_login;
    config.transport.close_timeout_secs = 2;
    // a broken exchange fails the test instead of hanging it
    config.transport.reply_timeout_secs = 10;
    config.transport.data_timeout_secs = 10;

    let session = Session::new(config, Box::new(TcpTransport::new()), Box::new(console));
    Client {
        session,
        output,
        interrupt,
    }
}

struct ScriptedServer {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    log: Vec<String>,
}

impl ScriptedServer {
    fn reply(&mut self, text: &str) {
        self.writer
            .write_all(format!("{text}\r\n").as_bytes())
            .unwrap();
    }

    /// Reads the next command and checks how it starts.
    fn expect(&mut self, prefix: &str) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        let line = line.trim_end().to_string();
        assert!(
            line.starts_with(prefix),
            "expected {prefix:?}, got {line:?}"
        );
        self.log.push(line.clone());
        line
    }

    /// Answers PASV with a fresh listener.
    fn passive(&mut self) -> TcpListener {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        self.expect("PASV");
        self.reply(&format!(
            "227 Entering Passive Mode (127,0,0,1,{},{})",
            port >> 8,
            port & 0xff
        ));
        listener
    }
}

fn serve<F>(script: F) -> (u16, JoinHandle<Vec<String>>)
where
    F: FnOnce(&mut ScriptedServer) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut server = ScriptedServer {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
            log: Vec::new(),
        };
        server.reply("220 Scripted server ready");
        script(&mut server);
        server.log
    });
    (port, handle)
}

fn reply_code(result: Result<OpOutcome, ClientError>) -> u16 {
    match result {
        Ok(OpOutcome::Reply(reply)) => reply.code(),
        other => panic!("expected a server reply, got {other:?}"),
    }
}

#[test]
fn test_login_pwd_and_quit() {
    let (port, server) = serve(|s| {
        s.expect("USER anna");
        s.reply("331 Please specify the password.");
        s.expect("PASS secret");
        s.reply("230 Login successful.");
        s.expect("SYST");
        s.reply("215 UNIX Type: L8");
        s.expect("PWD");
        s.reply("257 \"/home/anna\" is the current directory");
        s.expect("QUIT");
        s.reply("221 Goodbye.");
    });
    let mut c = client("anna\nsecret\n", true);

    assert_eq!(reply_code(c.session.connect("127.0.0.1", port)), 215);
    assert_eq!(reply_code(c.session.pwd()), 257);
    assert!(matches!(c.session.bye(), Ok(OpOutcome::Exit)));

    let log = server.join().unwrap();
    assert_eq!(log.len(), 5);
    let output = c.output.borrow();
    assert!(output.contains("220 Scripted server ready\r\nName (127.0.0.1): anna\r\n"));
    assert!(output.contains("Password: \r\n"));
    assert!(!output.contains("secret"));
}

#[test]
fn test_passive_get() {
    let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 253) as u8).collect();
    let sent = payload.clone();
    let (port, server) = serve(move |s| {
        s.expect("TYPE I");
        s.reply("200 Switching to Binary mode.");
        let data = s.passive();
        s.expect("RETR data.bin");
        s.reply("150 Opening BINARY mode data connection for data.bin");
        let (mut conn, _) = data.accept().unwrap();
        conn.write_all(&sent).unwrap();
        drop(conn);
        s.reply("226 Transfer complete.");
    });
    let mut c = client("", false);
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("data.bin");

    c.session.connect("127.0.0.1", port).unwrap();
    let result = c.session.get("data.bin", local.to_str().unwrap(), false);
    assert!(matches!(result, Ok(OpOutcome::Silent)));
    server.join().unwrap();

    assert_eq!(fs::read(&local).unwrap(), payload);
    let output = c.output.borrow();
    assert!(output.contains("226 Transfer complete.\r\n50000 bytes in "));
}

#[test]
fn test_rename_refused_sends_no_rnto() {
    let (port, server) = serve(|s| {
        s.expect("RNFR old.txt");
        s.reply("450 Requested file action not taken.");
        // RNTO here would fail the expectation
        s.expect("RNFR old.txt");
        s.reply("350 Ready for RNTO.");
        s.expect("RNTO new.txt");
        s.reply("250 Rename successful.");
    });
    let mut c = client("", false);
    c.session.connect("127.0.0.1", port).unwrap();

    assert_eq!(reply_code(c.session.rename("old.txt", "new.txt")), 450);
    assert_eq!(reply_code(c.session.rename("old.txt", "new.txt")), 250);
    assert_eq!(server.join().unwrap().len(), 3);
}

#[test]
fn test_commands_need_a_connection() {
    let mut c = client("", false);
    assert!(matches!(c.session.pwd(), Err(ClientError::NotConnected)));
    assert!(matches!(c.session.dir(None, None), Err(ClientError::NotConnected)));
}

#[test]
fn test_listings_do_not_repeat_type() {
    let (port, server) = serve(|s| {
        s.expect("TYPE A");
        s.reply("200 Switching to ASCII mode.");
        for _ in 0..2 {
            let data = s.passive();
            s.expect("NLST");
            s.reply("150 Here comes the directory listing.");
            let (mut conn, _) = data.accept().unwrap();
            conn.write_all(b"a.txt\r\nb.txt\r\n").unwrap();
            drop(conn);
            s.reply("226 Directory send OK.");
        }
    });
    let mut c = client("", false);
    c.session.connect("127.0.0.1", port).unwrap();

    assert_eq!(reply_code(c.session.nlist(None, None)), 226);
    assert_eq!(reply_code(c.session.nlist(None, None)), 226);

    let log = server.join().unwrap();
    assert_eq!(log.iter().filter(|l| l.starts_with("TYPE")).count(), 1);
    assert_eq!(c.output.borrow().matches("a.txt\r\nb.txt\r\n").count(), 2);
}

#[test]
fn test_active_mode_listing() {
    let (port, server) = serve(|s| {
        s.expect("TYPE A");
        s.reply("200 Switching to ASCII mode.");
        let line = s.expect("PORT ");
        let fields: Vec<u16> = line[5..].split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(&fields[..4], &[127, 0, 0, 1]);
        let data_port = (fields[4] << 8) | fields[5];
        assert!((49152..=65534).contains(&data_port));
        s.reply("200 PORT command successful.");
        s.expect("LIST");
        s.reply("150 Here comes the directory listing.");
        let mut conn = TcpStream::connect(("127.0.0.1", data_port)).unwrap();
        conn.write_all(b"-rw-r--r-- 1 ftp ftp 5 Jan 01 00:00 a.txt\r\n")
            .unwrap();
        drop(conn);
        s.reply("226 Directory send OK.");
    });
    let mut c = client("", false);
    c.session.options.passive = false;
    c.session.connect("127.0.0.1", port).unwrap();

    assert_eq!(reply_code(c.session.dir(None, None)), 226);
    server.join().unwrap();
    assert!(c.output.borrow().contains(" a.txt\r\n"));
}

#[test]
fn test_interrupted_get_sends_abor_and_stays_in_sync() {
    let dir = tempfile::tempdir().unwrap();
    let local: PathBuf = dir.path().join("big.bin");
    let watch = local.clone();

    let mut c = client("", false);
    let interrupt = c.interrupt.clone();
    let (port, server) = serve(move |s| {
        s.expect("TYPE I");
        s.reply("200 Switching to Binary mode.");
        let data = s.passive();
        s.expect("RETR big.bin");
        s.reply("150 Opening BINARY mode data connection for big.bin");
        let (mut conn, _) = data.accept().unwrap();
        conn.write_all(&[7u8; 4096]).unwrap();

        // the local file exists once the client is streaming
        let deadline = Instant::now() + Duration::from_secs(10);
        while !watch.exists() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        interrupt.store(true, Ordering::SeqCst);

        s.expect("ABOR");
        s.reply("426 Connection closed; transfer aborted.");
        s.reply("226 ABOR command successful.");
        drop(conn);
        s.expect("PWD");
        s.reply("257 \"/\" is the current directory");
    });

    c.session.connect("127.0.0.1", port).unwrap();
    let result = c.session.get("big.bin", local.to_str().unwrap(), false);
    assert!(matches!(result, Err(ClientError::Interrupted)));
    assert_eq!(reply_code(c.session.pwd()), 257);

    let log = server.join().unwrap();
    assert_eq!(log.last().map(String::as_str), Some("PWD"));
    assert!(c.output.borrow().contains("226 ABOR command successful."));
}
