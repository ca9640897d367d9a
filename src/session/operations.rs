//! Module `operations`
//!
//! High-level FTP operations on a [`Session`]. Each one needs a live control
//! connection (except `connect`) and returns the server's final reply, a
//! silent success, or a [`ClientError`].

use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::Path;

use log::{debug, info, warn};

use crate::error::ClientError;
use crate::protocol::responses::{
    ACCOUNT_REQUIRED, OK, PASSWORD_REQUIRED, PENDING_FURTHER_INFO, READY, RESTART_DELAY,
    TRANSFER_SUCCESS,
};
use crate::protocol::{ControlChannel, FtpCommand, Reply};
use crate::session::multi::PromptAnswer;
use crate::session::{OpOutcome, Session};
use crate::transfer::{ListingTarget, TransferBody, TransferOutcome, TransferType};
use crate::utils::MatchBuffer;

/// Starting size of the buffer that collects `NLST` names
pub const INITIAL_MATCH_BUFFER: usize = 1024;

/// Which listing command to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// `LIST`, long format
    Full,
    /// `NLST`, names only
    Names,
}

/// Last component of a local path, the default remote name for `put`.
pub fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

impl Session {
    /// Opens the control connection, reads the greeting and, unless
    /// auto-login is off, logs in.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<OpOutcome, ClientError> {
        if self.state.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }

        let ip = self.transport.resolve(host)?;
        let addr = SocketAddrV4::new(ip, port);
        info!("Connecting to {addr}");
        let conn = self.transport.open(addr, self.config.connect_timeout())?;
        let control = ControlChannel::new(conn, &self.config);
        self.state.attach(control, addr);

        let greeting = match self.read_greeting() {
            Ok(reply) => reply,
            Err(e) => {
                self.drop_connection();
                return Err(e);
            }
        };
        if !greeting.is(READY) {
            warn!("Server at {addr} refused the session: {}", greeting.code());
            self.drop_connection();
            return Ok(OpOutcome::Reply(greeting));
        }
        self.write(greeting.text());

        if !self.options.auto_login {
            return Ok(OpOutcome::Silent);
        }
        self.login(ip)
    }

    fn read_greeting(&mut self) -> Result<Reply, ClientError> {
        let reply = self.context()?.read_reply()?;
        if !reply.is(RESTART_DELAY) {
            return Ok(reply);
        }
        self.write(reply.text());
        self.context()?.read_reply()
    }

    /// USER, then PASS and ACCT when asked for, then SYST. The reply to
    /// SYST is the outcome.
    pub fn login(&mut self, ip: Ipv4Addr) -> Result<OpOutcome, ClientError> {
        let name = self.prompt(&format!("Name ({ip}): "), true)?;
        let mut reply = self.context()?.send(&FtpCommand::User(name))?;

        if reply.is(PASSWORD_REQUIRED) {
            self.write(reply.text());
            let password = self.prompt("Password: ", false)?;
            reply = self.context()?.send(&FtpCommand::Pass(password))?;
        }

        if reply.is(ACCOUNT_REQUIRED) {
            self.write(reply.text());
            let account = self.prompt("Account: ", true)?;
            reply = self.context()?.send(&FtpCommand::Acct(account))?;
        }

        debug!("Login finished with {}", reply.code());
        self.context()?.show(&reply);
        self.simple(FtpCommand::Syst)
    }

    fn prompt(&mut self, label: &str, echo: bool) -> Result<String, ClientError> {
        self.write(label);
        self.console
            .read_line(echo)
            .map_err(ClientError::Console)?
            .ok_or(ClientError::Interrupted)
    }

    /// Closes the control connection without sending anything.
    pub fn disconnect(&mut self) -> Result<OpOutcome, ClientError> {
        let mut control = self.state.detach().ok_or(ClientError::NotConnected)?;
        info!("Closing control connection to {}", control.peer_addr());
        control.close()?;
        Ok(OpOutcome::Silent)
    }

    fn drop_connection(&mut self) {
        if let Some(mut control) = self.state.detach()
            && let Err(e) = control.close()
        {
            debug!("Closing control connection: {e}");
        }
    }

    /// Sends QUIT if connected, closes the connection and ends the session.
    pub fn bye(&mut self) -> Result<OpOutcome, ClientError> {
        if self.state.is_connected() {
            let quit = self.context()?.send(&FtpCommand::Quit);
            match quit {
                Ok(reply) => self.context()?.show(&reply),
                Err(e) => debug!("QUIT failed: {e}"),
            }
            self.drop_connection();
        }
        Ok(OpOutcome::Exit)
    }

    fn simple(&mut self, command: FtpCommand) -> Result<OpOutcome, ClientError> {
        let reply = self.context()?.send(&command)?;
        Ok(OpOutcome::Reply(reply))
    }

    pub fn cwd(&mut self, path: &str) -> Result<OpOutcome, ClientError> {
        self.simple(FtpCommand::Cwd(path.to_string()))
    }

    pub fn cdup(&mut self) -> Result<OpOutcome, ClientError> {
        self.simple(FtpCommand::Cdup)
    }

    pub fn pwd(&mut self) -> Result<OpOutcome, ClientError> {
        self.simple(FtpCommand::Pwd)
    }

    pub fn mkdir(&mut self, path: &str) -> Result<OpOutcome, ClientError> {
        self.simple(FtpCommand::Mkd(path.to_string()))
    }

    pub fn rmdir(&mut self, path: &str) -> Result<OpOutcome, ClientError> {
        self.simple(FtpCommand::Rmd(path.to_string()))
    }

    pub fn system(&mut self) -> Result<OpOutcome, ClientError> {
        self.simple(FtpCommand::Syst)
    }

    /// `DELE`; `multiple` asks for confirmation first (mdelete).
    pub fn delete(&mut self, name: &str, multiple: bool) -> Result<OpOutcome, ClientError> {
        self.ensure_connected()?;
        if multiple && !self.confirm("mdelete", name)? {
            return Ok(OpOutcome::Silent);
        }
        self.simple(FtpCommand::Dele(name.to_string()))
    }

    /// `RNFR` must be answered with 350 before `RNTO` goes out.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<OpOutcome, ClientError> {
        let mut ctx = self.context()?;
        let reply = ctx.send(&FtpCommand::Rnfr(from.to_string()))?;
        if !reply.is(PENDING_FURTHER_INFO) {
            return Ok(OpOutcome::Reply(reply));
        }
        ctx.show(&reply);
        let reply = ctx.send(&FtpCommand::Rnto(to.to_string()))?;
        Ok(OpOutcome::Reply(reply))
    }

    /// Sends `TYPE` and makes it the type for later transfers on a 200
    /// reply.
    pub fn set_type(&mut self, transfer_type: TransferType) -> Result<OpOutcome, ClientError> {
        let reply = self.context()?.set_type(transfer_type)?;
        if reply.is(OK) {
            self.state.set_transfer_type(transfer_type);
        }
        Ok(OpOutcome::Reply(reply))
    }

    pub fn show_type(&mut self) -> Result<OpOutcome, ClientError> {
        let text = format!(
            "Using {} mode to transfer files\r\n",
            self.state.transfer_type()
        );
        self.write(&text);
        Ok(OpOutcome::Silent)
    }

    /// Downloads `remote` into `local`; `multiple` asks for confirmation
    /// first (mget) instead of announcing the file names.
    pub fn get(
        &mut self,
        remote: &str,
        local: &str,
        multiple: bool,
    ) -> Result<OpOutcome, ClientError> {
        self.ensure_connected()?;
        if multiple {
            if !self.confirm("mget", remote)? {
                return Ok(OpOutcome::Silent);
            }
        } else {
            self.write(&format!("local: {local} remote: {remote}\r\n"));
        }

        let transfer_type = self.state.transfer_type();
        let outcome = self.context()?.transfer(
            FtpCommand::Retr(remote.to_string()),
            transfer_type,
            TransferBody::Download(Path::new(local)),
        )?;
        Ok(self.finish_transfer(outcome))
    }

    /// Uploads `local` as `remote`. A missing local file is reported and
    /// nothing is sent.
    pub fn put(
        &mut self,
        local: &str,
        remote: &str,
        multiple: bool,
    ) -> Result<OpOutcome, ClientError> {
        self.ensure_connected()?;
        if !Path::new(local).is_file() {
            self.write(&format!("local: {local}: no such file\r\n"));
            return Ok(OpOutcome::Silent);
        }
        if multiple {
            if !self.confirm("mput", local)? {
                return Ok(OpOutcome::Silent);
            }
        } else {
            self.write(&format!("local: {local} remote: {remote}\r\n"));
        }

        let transfer_type = self.state.transfer_type();
        let outcome = self.context()?.transfer(
            FtpCommand::Stor(remote.to_string()),
            transfer_type,
            TransferBody::Upload(Path::new(local)),
        )?;
        Ok(self.finish_transfer(outcome))
    }

    /// Rings the bell and shows the final reply with throughput. A final
    /// reply other than success is handed back for the caller to report.
    fn finish_transfer(&mut self, outcome: TransferOutcome) -> OpOutcome {
        if self.options.bell {
            self.console.ring_bell();
        }
        if !outcome.reply.is_one_of(TRANSFER_SUCCESS) {
            return OpOutcome::Reply(outcome.reply);
        }
        if self.options.verbose {
            self.write(outcome.reply.text());
            let summary = format!("{}\r\n", outcome.stats.summary());
            self.write(&summary);
        }
        OpOutcome::Silent
    }

    /// `LIST` or `NLST`, to `local` when given and creatable, otherwise to
    /// the console. Listings always use ASCII.
    pub fn listing(
        &mut self,
        kind: ListingKind,
        remote: Option<&str>,
        local: Option<&str>,
    ) -> Result<OpOutcome, ClientError> {
        let argument = remote.map(str::to_string);
        let command = match kind {
            ListingKind::Full => FtpCommand::List(argument),
            ListingKind::Names => FtpCommand::Nlst(argument),
        };
        let target = match local {
            Some(path) => ListingTarget::File(Path::new(path)),
            None => ListingTarget::Console,
        };
        let outcome = self.context()?.transfer(
            command,
            TransferType::Ascii,
            TransferBody::Listing(target),
        )?;
        Ok(OpOutcome::Reply(outcome.reply))
    }

    pub fn dir(
        &mut self,
        remote: Option<&str>,
        local: Option<&str>,
    ) -> Result<OpOutcome, ClientError> {
        self.listing(ListingKind::Full, remote, local)
    }

    pub fn nlist(
        &mut self,
        remote: Option<&str>,
        local: Option<&str>,
    ) -> Result<OpOutcome, ClientError> {
        self.listing(ListingKind::Names, remote, local)
    }

    /// Names the server lists for `pattern`
    pub fn matching(&mut self, pattern: &str) -> Result<MatchBuffer, ClientError> {
        let mut names = MatchBuffer::with_limit(INITIAL_MATCH_BUFFER);
        let outcome = self.context()?.transfer(
            FtpCommand::Nlst(Some(pattern.to_string())),
            TransferType::Ascii,
            TransferBody::Listing(ListingTarget::Collector(&mut names)),
        )?;
        debug!(
            "{} names match {pattern:?} (final reply {})",
            names.len(),
            outcome.reply.code()
        );
        Ok(names)
    }

    pub(crate) fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.state.is_connected() {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    /// Per-file confirmation: `Ok(true)` to go ahead, `Ok(false)` to skip,
    /// `Interrupted` to stop the whole multi-file command.
    fn confirm(&mut self, command: &str, file: &str) -> Result<bool, ClientError> {
        if !self.options.prompting {
            return Ok(true);
        }
        match PromptAnswer::ask(self.console.as_mut(), command, file)? {
            PromptAnswer::Proceed => Ok(true),
            PromptAnswer::Skip => Ok(false),
            PromptAnswer::AbortAll => Err(ClientError::Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Key;
    use crate::session::fixtures::{PASV_REPLY, connected, data_conn, offline};

    fn push_line(keys: &mut Vec<Key>, text: &str) {
        keys.extend(text.chars().map(Key::Char));
        keys.push(Key::Enter);
    }

    fn reply_code(result: Result<OpOutcome, ClientError>) -> u16 {
        match result {
            Ok(OpOutcome::Reply(reply)) => reply.code(),
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[test]
    fn test_operations_require_connection() {
        let mut f = offline(b"", Vec::new(), &[]);
        assert!(matches!(f.session.pwd(), Err(ClientError::NotConnected)));
        assert!(matches!(f.session.rename("a", "b"), Err(ClientError::NotConnected)));
        assert!(matches!(f.session.disconnect(), Err(ClientError::NotConnected)));
        assert!(matches!(
            f.session.get("a", "a", false),
            Err(ClientError::NotConnected)
        ));
        assert!(f.sent.bytes().is_empty());
    }

    #[test]
    fn test_connect_and_login() {
        let mut keys = Vec::new();
        push_line(&mut keys, "anna");
        push_line(&mut keys, "secret");
        let mut f = offline(
            b"220 Service ready\r\n331 Password required\r\n230 Logged in\r\n215 UNIX Type: L8\r\n",
            Vec::new(),
            &keys,
        );

        assert_eq!(reply_code(f.session.connect("127.0.0.1", 21)), 215);
        assert_eq!(f.sent.lines(), vec!["USER anna", "PASS secret", "SYST"]);

        let output = f.output.text();
        assert!(output.starts_with("220 Service ready\r\nName (127.0.0.1): anna\r\n"));
        assert!(output.contains("331 Password required\r\nPassword: \r\n"));
        assert!(output.contains("230 Logged in"));
        assert!(!output.contains("secret"));
        assert!(f.session.state().is_connected());
    }

    #[test]
    fn test_greeting_other_than_ready_closes() {
        let mut f = offline(b"421 Too many users\r\n", Vec::new(), &[]);
        assert_eq!(reply_code(f.session.connect("127.0.0.1", 21)), 421);
        assert!(!f.session.state().is_connected());
    }

    #[test]
    fn test_delayed_greeting_is_shown() {
        let mut f = offline(
            b"120 Ready in 1 minute\r\n220 Service ready\r\n",
            Vec::new(),
            &[],
        );
        f.session.options.auto_login = false;
        assert!(matches!(
            f.session.connect("127.0.0.1", 21),
            Ok(OpOutcome::Silent)
        ));
        assert_eq!(
            f.output.text(),
            "120 Ready in 1 minute\r\n220 Service ready\r\n"
        );
    }

    #[test]
    fn test_connect_twice_refused() {
        let mut f = connected(b"", Vec::new(), &[]);
        assert!(matches!(
            f.session.connect("127.0.0.1", 21),
            Err(ClientError::AlreadyConnected)
        ));
    }

    #[test]
    fn test_rename_stops_without_350() {
        let mut f = connected(b"450 File busy\r\n", Vec::new(), &[]);
        assert_eq!(reply_code(f.session.rename("old", "new")), 450);
        assert_eq!(f.sent.lines(), vec!["RNFR old"]);
    }

    #[test]
    fn test_rename_sends_rnto_after_350() {
        let mut f = connected(
            b"350 Ready for RNTO\r\n250 Rename successful\r\n",
            Vec::new(),
            &[],
        );
        assert_eq!(reply_code(f.session.rename("old", "new")), 250);
        assert_eq!(f.sent.lines(), vec!["RNFR old", "RNTO new"]);
        assert!(f.output.text().contains("350 Ready for RNTO"));
    }

    #[test]
    fn test_type_changes_only_on_200() {
        let mut f = connected(
            b"504 Not implemented\r\n200 Type set to A\r\n",
            Vec::new(),
            &[],
        );
        assert_eq!(reply_code(f.session.set_type(TransferType::Ascii)), 504);
        assert_eq!(f.session.state().transfer_type(), TransferType::Binary);
        assert_eq!(f.session.state().last_type_sent(), None);

        assert_eq!(reply_code(f.session.set_type(TransferType::Ascii)), 200);
        assert_eq!(f.session.state().transfer_type(), TransferType::Ascii);
        assert_eq!(
            f.session.state().last_type_sent(),
            Some(TransferType::Ascii)
        );
    }

    #[test]
    fn test_get_reports_throughput_and_rings() {
        let replies = [
            b"200 Type set to I\r\n".as_slice(),
            PASV_REPLY,
            b"150 Opening BINARY mode data connection\r\n",
            b"226 Transfer complete\r\n",
        ]
        .concat();
        let mut f = connected(&replies, vec![data_conn().data(b"hello")], &[]);
        f.session.options.bell = true;
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("r.txt");
        let local = local.to_str().unwrap();

        assert!(matches!(
            f.session.get("r.txt", local, false),
            Ok(OpOutcome::Silent)
        ));
        assert_eq!(std::fs::read(local).unwrap(), b"hello");
        let output = f.output.text();
        assert!(output.contains(&format!("local: {local} remote: r.txt\r\n")));
        assert!(output.contains("226 Transfer complete\r\n5 bytes in "));
        assert_eq!(*f.bells.borrow(), 1);
    }

    #[test]
    fn test_get_hands_back_failed_final_reply() {
        let replies = [
            b"200 Type set to I\r\n".as_slice(),
            PASV_REPLY,
            b"150 Opening BINARY mode data connection\r\n",
            b"451 Local error in processing\r\n",
        ]
        .concat();
        let mut f = connected(&replies, vec![data_conn().data(b"hel")], &[]);
        f.session.options.verbose = false;
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("r.txt");
        let local = local.to_str().unwrap();

        let result = f.session.get("r.txt", local, false);
        assert!(matches!(result, Ok(OpOutcome::Reply(ref reply)) if reply.code() == 451));
        assert!(!f.output.text().contains(" bytes in "));

        f.session.report(&result);
        assert!(f.output.text().ends_with("451 Local error in processing\r\n"));
    }

    #[test]
    fn test_listing_to_console_returns_final_reply() {
        let replies = [
            b"200 Type set to A\r\n".as_slice(),
            PASV_REPLY,
            b"150 Here comes the directory listing\r\n",
            b"226 Directory send OK\r\n",
        ]
        .concat();
        let mut f = connected(&replies, vec![data_conn().data(b"a.txt\r\nb.txt\r\n")], &[]);

        assert_eq!(reply_code(f.session.dir(None, None)), 226);
        assert_eq!(f.sent.lines(), vec!["TYPE A", "PASV", "LIST"]);
        assert!(f.output.text().contains("a.txt\r\nb.txt\r\n"));
        assert_eq!(
            f.session.state().last_type_sent(),
            Some(TransferType::Ascii)
        );
    }

    #[test]
    fn test_put_missing_local_file() {
        let mut f = connected(b"", Vec::new(), &[]);
        let result = f.session.put("/no/such/dir/file.bin", "file.bin", false);
        assert!(matches!(result, Ok(OpOutcome::Silent)));
        assert!(
            f.output
                .text()
                .contains("local: /no/such/dir/file.bin: no such file\r\n")
        );
        assert!(f.sent.bytes().is_empty());
    }

    #[test]
    fn test_bye_quits_and_exits() {
        let mut f = connected(b"221 Goodbye\r\n", Vec::new(), &[]);
        assert!(matches!(f.session.bye(), Ok(OpOutcome::Exit)));
        assert_eq!(f.sent.lines(), vec!["QUIT"]);
        assert!(!f.session.state().is_connected());
    }

    #[test]
    fn test_bye_when_not_connected() {
        let mut f = offline(b"", Vec::new(), &[]);
        assert!(matches!(f.session.bye(), Ok(OpOutcome::Exit)));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("dir/sub/file.txt"), "file.txt");
        assert_eq!(base_name("file.txt"), "file.txt");
    }
}
