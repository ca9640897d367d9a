//! RAX FTP Client - Entry Point
//!
//! Interactive FTP client implementing the client side of RFC 959.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use rax_ftp_client::commands;
use rax_ftp_client::console::TerminalConsole;
use rax_ftp_client::transport::tcp::TcpTransport;
use rax_ftp_client::{ClientConfig, Session};

mod cli;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the -d derived default
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_filter())).init();

    let mut config = match ClientConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            eprintln!("rax-ftp: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config.session);

    let mut session = Session::new(
        config,
        Box::new(TcpTransport::new()),
        Box::new(TerminalConsole::new()),
    );
    session.write(&format!(
        "rax-ftp v{}: type HELP for builtin commands\r\n",
        env!("CARGO_PKG_VERSION")
    ));

    let mut running = true;
    if let Some(open) = cli.open_command() {
        running = commands::run_command(&mut session, &open);
    }

    if running && let Err(e) = commands::run_shell(&mut session, |line| io::stdin().read_line(line))
    {
        error!("Reading commands failed: {e}");
    }

    if session.state().is_connected() {
        let _ = session.disconnect();
    }
    info!("Session ended");
    ExitCode::SUCCESS
}
