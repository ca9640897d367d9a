//! Command-line arguments of the `rax-ftp` binary

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use rax_ftp_client::config::SessionOptions;

#[derive(Parser, Debug)]
#[command(name = "rax-ftp", version, about = "Interactive FTP client", long_about = None)]
pub struct Cli {
    #[arg(short = 'p', help = "Use active mode (PORT) instead of passive mode")]
    pub active: bool,

    #[arg(short = 'i', help = "Turn off prompting during mdelete/mget/mput")]
    pub no_prompt: bool,

    #[arg(short = 'n', help = "Do not log in automatically after connecting")]
    pub no_auto_login: bool,

    #[arg(short = 'g', help = "Turn off filename globbing")]
    pub no_glob: bool,

    #[arg(short = 'v', help = "Show server replies and transfer statistics")]
    pub verbose: bool,

    #[arg(
        short = 'd',
        action = ArgAction::Count,
        help = "Echo commands sent to the server; repeat for more logging"
    )]
    pub debug: u8,

    #[arg(short = 'c', long = "config", help = "Configuration file to use instead of ftp-client.toml")]
    pub config: Option<PathBuf>,

    #[arg(help = "Server to connect to at startup")]
    pub server: Option<String>,

    #[arg(help = "Control port of the server")]
    pub port: Option<u16>,
}

impl Cli {
    /// Default log filter: `warn`, one level more per `-d`.
    pub fn log_filter(&self) -> &'static str {
        match self.debug {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Flags override whatever the configuration file says.
    pub fn apply(&self, options: &mut SessionOptions) {
        if self.active {
            options.passive = false;
        }
        if self.no_prompt {
            options.prompting = false;
        }
        if self.no_auto_login {
            options.auto_login = false;
        }
        if self.no_glob {
            options.globbing = false;
        }
        if self.verbose {
            options.verbose = true;
        }
        if self.debug > 0 {
            options.debug = self.debug;
        }
    }

    /// `open` command line for the server given on the command line
    pub fn open_command(&self) -> Option<Vec<String>> {
        let server = self.server.as_ref()?;
        let mut args = vec!["open".to_string(), server.clone()];
        if let Some(port) = self.port {
            args.push(port.to_string());
        }
        Some(args)
    }
}
