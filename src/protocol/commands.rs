//! Commands the client sends on the control channel

use std::fmt;
use std::net::SocketAddrV4;

use crate::protocol::address::format_port_argument;
use crate::transfer::TransferType;

/// One FTP command. `Display` produces the wire form without CRLF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpCommand {
    User(String),
    Pass(String),
    Acct(String),
    Syst,
    Quit,
    Cwd(String),
    Cdup,
    Pwd,
    Mkd(String),
    Rmd(String),
    Dele(String),
    Rnfr(String),
    Rnto(String),
    Type(TransferType),
    Pasv,
    Port(SocketAddrV4),
    Retr(String),
    Stor(String),
    List(Option<String>),
    Nlst(Option<String>),
    Abor,
}

impl FtpCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            FtpCommand::User(_) => "USER",
            FtpCommand::Pass(_) => "PASS",
            FtpCommand::Acct(_) => "ACCT",
            FtpCommand::Syst => "SYST",
            FtpCommand::Quit => "QUIT",
            FtpCommand::Cwd(_) => "CWD",
            FtpCommand::Cdup => "CDUP",
            FtpCommand::Pwd => "PWD",
            FtpCommand::Mkd(_) => "MKD",
            FtpCommand::Rmd(_) => "RMD",
            FtpCommand::Dele(_) => "DELE",
            FtpCommand::Rnfr(_) => "RNFR",
            FtpCommand::Rnto(_) => "RNTO",
            FtpCommand::Type(_) => "TYPE",
            FtpCommand::Pasv => "PASV",
            FtpCommand::Port(_) => "PORT",
            FtpCommand::Retr(_) => "RETR",
            FtpCommand::Stor(_) => "STOR",
            FtpCommand::List(_) => "LIST",
            FtpCommand::Nlst(_) => "NLST",
            FtpCommand::Abor => "ABOR",
        }
    }
}

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = self.verb();
        match self {
            FtpCommand::User(arg)
            | FtpCommand::Pass(arg)
            | FtpCommand::Acct(arg)
            | FtpCommand::Cwd(arg)
            | FtpCommand::Mkd(arg)
            | FtpCommand::Rmd(arg)
            | FtpCommand::Dele(arg)
            | FtpCommand::Rnfr(arg)
            | FtpCommand::Rnto(arg)
            | FtpCommand::Retr(arg)
            | FtpCommand::Stor(arg)
            | FtpCommand::List(Some(arg))
            | FtpCommand::Nlst(Some(arg)) => write!(f, "{} {}", verb, arg),
            FtpCommand::Type(t) => write!(f, "{} {}", verb, t.code()),
            FtpCommand::Port(addr) => write!(f, "{} {}", verb, format_port_argument(*addr)),
            _ => f.write_str(verb),
        }
    }
}
