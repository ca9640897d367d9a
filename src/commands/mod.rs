//! Command shell
//!
//! Reads command lines, tokenizes them, looks the name up in the registry,
//! checks the argument count and runs the builtin. The result of every
//! command is reported before the next prompt.

pub mod handlers;
pub mod parser;
pub mod registry;

use std::io;

use log::debug;

use crate::error::ClientError;
use crate::session::{OpOutcome, Session};

pub use handlers::run_builtin;
pub use parser::tokenize;
pub use registry::{Builtin, CommandEntry, CommandInfo, lookup};

pub const PROMPT: &str = "ftp> ";

/// Runs one tokenized command line. `<cmd> -h` is shorthand for
/// `help <cmd>`.
pub fn execute(session: &mut Session, args: &[String]) -> Result<OpOutcome, ClientError> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(OpOutcome::Silent);
    };

    let help_args;
    let (name, rest) = if rest.len() == 1 && rest[0].eq_ignore_ascii_case("-h") {
        help_args = [name.clone()];
        ("help", &help_args[..])
    } else {
        (name.as_str(), rest)
    };

    let entry = lookup(name).ok_or_else(|| ClientError::UnknownCommand(name.to_string()))?;
    let info = entry.builtin.info();
    if rest.len() < info.min_args || rest.len() > info.max_args {
        return Err(ClientError::ArgCount(entry.name.to_string()));
    }

    debug!("Running {:?} with {} argument(s)", entry.builtin, rest.len());
    run_builtin(session, entry.builtin, rest)
}

/// Runs and reports one tokenized command with key capture on. Returns
/// `false` when the session should end.
pub fn run_command(session: &mut Session, args: &[String]) -> bool {
    session.console().capture_keys(true);
    let result = execute(session, args);
    session.console().capture_keys(false);

    session.report(&result);
    !matches!(result, Ok(OpOutcome::Exit))
}

/// Parses, runs and reports one input line.
pub fn run_line(session: &mut Session, line: &str) -> bool {
    match tokenize(line) {
        Ok(args) if args.is_empty() => true,
        Ok(args) => run_command(session, &args),
        Err(e) => {
            session.report(&Err(e));
            true
        }
    }
}

/// The interactive loop: prompt, read a line, run it, until `bye` or end
/// of input. `read_line` appends the next input line and returns the
/// number of bytes read, 0 at end of input.
pub fn run_shell<F>(session: &mut Session, mut read_line: F) -> io::Result<()>
where
    F: FnMut(&mut String) -> io::Result<usize>,
{
    let mut line = String::new();
    loop {
        session.write(PROMPT);
        line.clear();
        if read_line(&mut line)? == 0 {
            session.write("\r\n");
            return Ok(());
        }
        if !run_line(session, &line) {
            return Ok(());
        }
    }
}
