//! Builtin command handlers
//!
//! Dispatches a looked-up [`Builtin`] to the session operation behind it.
//! Local commands (toggles, `status`, `help`, `lcd`, `ldir`) are handled
//! here completely.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use log::{info, warn};

use crate::commands::registry::{self, Builtin, COMMANDS, CommandEntry, HELP_EDIT};
use crate::config::SessionOptions;
use crate::error::ClientError;
use crate::session::operations::base_name;
use crate::session::{OpOutcome, Session};
use crate::transfer::TransferType;

/// Runs `builtin` with its arguments (command name excluded). Arity has
/// been checked already.
pub fn run_builtin(
    session: &mut Session,
    builtin: Builtin,
    args: &[String],
) -> Result<OpOutcome, ClientError> {
    let arg = |i: usize| args.get(i).map(String::as_str);

    match builtin {
        Builtin::Ascii => session.set_type(TransferType::Ascii),
        Builtin::Binary => session.set_type(TransferType::Binary),
        Builtin::Type => run_type(session, arg(0)),
        Builtin::Bell => toggle(session, "Bell", |o| &mut o.bell),
        Builtin::Glob => toggle(session, "Globbing", |o| &mut o.globbing),
        Builtin::Passive => toggle(session, "Passive mode", |o| &mut o.passive),
        Builtin::Prompt => toggle(session, "Prompting", |o| &mut o.prompting),
        Builtin::Tick => toggle(session, "Tick counter", |o| &mut o.tick),
        Builtin::Verbose => toggle(session, "Verbose mode", |o| &mut o.verbose),
        Builtin::Debug => run_debug(session, arg(0)),
        Builtin::Status => run_status(session),
        Builtin::Help => run_help(session, arg(0)),
        Builtin::Lcd => run_lcd(session, arg(0)),
        Builtin::Ldir => run_ldir(session, arg(0)),
        Builtin::Open => run_open(session, &args[0], arg(1)),
        Builtin::Close => session.disconnect(),
        Builtin::Bye => session.bye(),
        Builtin::Cd => session.cwd(&args[0]),
        Builtin::Cdup => session.cdup(),
        Builtin::Pwd => session.pwd(),
        Builtin::Mkdir => session.mkdir(&args[0]),
        Builtin::Rmdir => session.rmdir(&args[0]),
        Builtin::Delete => session.delete(&args[0], false),
        Builtin::Rename => session.rename(&args[0], &args[1]),
        Builtin::System => session.system(),
        Builtin::Dir => session.dir(arg(0), arg(1)),
        Builtin::Nlist => session.nlist(arg(0), arg(1)),
        Builtin::Get => {
            let remote = &args[0];
            session.get(remote, arg(1).unwrap_or(remote), false)
        }
        Builtin::Put => {
            let local = &args[0];
            let remote = arg(1).map_or_else(|| base_name(local), str::to_string);
            session.put(local, &remote, false)
        }
        Builtin::Mdelete => session.mdelete(&args[0]),
        Builtin::Mget => session.mget(&args[0]),
        Builtin::Mput => session.mput(&args[0]),
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn toggle(
    session: &mut Session,
    label: &str,
    flag: fn(&mut SessionOptions) -> &mut bool,
) -> Result<OpOutcome, ClientError> {
    let value = flag(&mut session.options);
    *value = !*value;
    let text = format!("{label} is {}\r\n", on_off(*value));
    session.write(&text);
    Ok(OpOutcome::Silent)
}

fn run_debug(session: &mut Session, level: Option<&str>) -> Result<OpOutcome, ClientError> {
    let debug = match level {
        None => u8::from(session.options.debug == 0),
        Some(text) => text
            .parse()
            .map_err(|_| ClientError::Parse(format!("invalid debug level: {text}")))?,
    };
    session.options.debug = debug;
    let text = format!("Debugging is {} (debug={debug})\r\n", on_off(debug > 0));
    session.write(&text);
    Ok(OpOutcome::Silent)
}

fn run_type(session: &mut Session, name: Option<&str>) -> Result<OpOutcome, ClientError> {
    match name {
        None => session.show_type(),
        Some(name) => match TransferType::from_name(name) {
            Some(transfer_type) => session.set_type(transfer_type),
            None => Err(ClientError::UnknownType(name.to_string())),
        },
    }
}

fn run_open(session: &mut Session, host: &str, port: Option<&str>) -> Result<OpOutcome, ClientError> {
    let port = match port {
        None => session.config().control_port,
        Some(text) => text
            .parse()
            .map_err(|_| ClientError::Parse(format!("invalid port: {text}")))?,
    };
    session.connect(host, port)
}

fn run_status(session: &mut Session) -> Result<OpOutcome, ClientError> {
    let state = session.state();
    let options = &session.options;

    let mut text = match state.server_addr() {
        Some(addr) => format!("Connected to {}\r\n", addr.ip()),
        None => "Not connected\r\n".to_string(),
    };
    if state.is_control_suspect() {
        text.push_str("Control connection may be out of step\r\n");
    }
    text.push_str(&format!("Type: {}\r\n", state.transfer_type()));
    text.push_str(&format!(
        "Verbose: {}; Bell: {}; Prompting: {}; Globbing: {}\r\n",
        on_off(options.verbose),
        on_off(options.bell),
        on_off(options.prompting),
        on_off(options.globbing)
    ));
    text.push_str(&format!(
        "Passive mode: {}; Debugging: {}\r\n",
        on_off(options.passive),
        options.debug
    ));
    text.push_str(&format!("Tick counter printing: {}\r\n", on_off(options.tick)));

    session.write(&text);
    Ok(OpOutcome::Silent)
}

fn run_help(session: &mut Session, topic: Option<&str>) -> Result<OpOutcome, ClientError> {
    let mut text = String::new();
    match topic {
        None => {
            text.push_str("Builtin commands:");
            for (i, entry) in COMMANDS.iter().enumerate() {
                if i % 5 == 0 {
                    text.push_str("\r\n  ");
                }
                text.push_str(&format!("{:<12.12}", entry.name));
            }
            text.push_str("\r\n");
        }
        Some(topic) if topic.eq_ignore_ascii_case("edit") => {
            for line in HELP_EDIT {
                text.push_str(&format!("  {line}\r\n"));
            }
        }
        Some(topic) if topic.eq_ignore_ascii_case("all") => {
            for entry in COMMANDS.iter().filter(|e| registry::is_primary(e)) {
                text.push_str(&help_text(entry));
                text.push_str("\r\n");
            }
        }
        Some(name) => {
            let entry = registry::lookup(name)
                .ok_or_else(|| ClientError::UnknownCommand(name.to_string()))?;
            text.push_str(&help_text(entry));
        }
    }
    session.write(&text);
    Ok(OpOutcome::Silent)
}

/// Usage line, description lines and synonyms of one command
pub fn help_text(entry: &CommandEntry) -> String {
    let info = entry.builtin.info();
    let mut text = format!("  {} {}\r\n", entry.name, info.usage);
    for line in info.help {
        text.push_str(&format!("    {line}\r\n"));
    }
    text.push_str("  Synonyms:");
    let mut any = false;
    for name in registry::synonyms(entry) {
        text.push_str(&format!("  {name}"));
        any = true;
    }
    if !any {
        text.push_str("  (none)");
    }
    text.push_str("\r\n");
    text
}

fn run_lcd(session: &mut Session, path: Option<&str>) -> Result<OpOutcome, ClientError> {
    let target = match path {
        Some(path) => PathBuf::from(path),
        None => session
            .start_dir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ClientError::InvalidPath(PathBuf::from(".")))?,
    };

    if let Err(e) = env::set_current_dir(&target) {
        warn!("Cannot change local directory to {}: {e}", target.display());
        return Err(ClientError::InvalidPath(target));
    }
    let now = env::current_dir().map_err(|_| ClientError::InvalidPath(target))?;
    info!("Local directory is now {}", now.display());
    session.write(&format!("Local directory now {}\r\n", now.display()));
    Ok(OpOutcome::Silent)
}

/// One entry of a local directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub name: String,
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Entries of `dir` without dot entries, directories first, each group
/// sorted by name.
pub fn read_local_dir(dir: &Path) -> io::Result<Vec<LocalEntry>> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = item?;
        let name = item.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let meta = item.metadata()?;
        entries.push(LocalEntry {
            name,
            is_dir: meta.is_dir(),
            len: meta.len(),
            modified: meta.modified().ok(),
        });
    }
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

pub fn format_local_entry(entry: &LocalEntry) -> String {
    let size = if entry.is_dir {
        "     <dir>".to_string()
    } else {
        format!("{:>10}", entry.len)
    };
    let date = entry
        .modified
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d  %H:%M:%S").to_string())
        .unwrap_or_default();
    format!("{:<20} {size}  {date}\r\n", entry.name)
}

fn run_ldir(session: &mut Session, dir: Option<&str>) -> Result<OpOutcome, ClientError> {
    let dir = Path::new(dir.unwrap_or("."));
    let entries = read_local_dir(dir).map_err(|e| {
        warn!("Cannot list {}: {e}", dir.display());
        ClientError::InvalidPath(dir.to_path_buf())
    })?;
    let text: String = entries.iter().map(format_local_entry).collect();
    session.write(&text);
    Ok(OpOutcome::Silent)
}
