//! Command registry
//!
//! Maps every builtin name to a [`Builtin`]. Synonyms are simply several
//! names mapped to the same builtin; arity bounds and help text belong to
//! the builtin, so synonyms share them.

/// Every command the shell knows, one variant per behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Ascii,
    Bell,
    Binary,
    Bye,
    Cd,
    Cdup,
    Close,
    Debug,
    Delete,
    Dir,
    Get,
    Glob,
    Help,
    Lcd,
    Ldir,
    Mdelete,
    Mget,
    Mkdir,
    Mput,
    Nlist,
    Open,
    Passive,
    Prompt,
    Put,
    Pwd,
    Rename,
    Rmdir,
    Status,
    System,
    Tick,
    Type,
    Verbose,
}

/// Arity bounds (arguments after the name) and help text of a builtin
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub min_args: usize,
    pub max_args: usize,
    pub usage: &'static str,
    pub help: &'static [&'static str],
}

const fn info(
    min_args: usize,
    max_args: usize,
    usage: &'static str,
    help: &'static [&'static str],
) -> CommandInfo {
    CommandInfo {
        min_args,
        max_args,
        usage,
        help,
    }
}

impl Builtin {
    pub fn info(self) -> CommandInfo {
        match self {
            Builtin::Ascii => info(0, 0, "", &["Set transfer type to ASCII"]),
            Builtin::Bell => info(0, 0, "", &["Toggle bell sound at end of file transfer"]),
            Builtin::Binary => info(0, 0, "", &["Set transfer type to binary"]),
            Builtin::Bye => info(0, 0, "", &["Exit rax-ftp"]),
            Builtin::Cd => info(1, 1, "<rmtdir>", &["Change remote directory to <rmtdir>"]),
            Builtin::Cdup => info(0, 0, "", &["Change to parent of remote directory"]),
            Builtin::Close => info(0, 0, "", &["Disconnect from remote server"]),
            Builtin::Debug => info(
                0,
                1,
                "[<level>]",
                &[
                    "Set debugging level to <level>, or toggle",
                    "debugging option if <level> not specified",
                ],
            ),
            Builtin::Delete => info(1, 1, "<rmtfile>", &["Delete remote file <rmtfile>"]),
            Builtin::Dir => info(
                0,
                2,
                "[<rmtdir> [<localfile>]]",
                &[
                    "Get full listing of <rmtdir> (or current remote",
                    "directory if <rmtdir> not specified) into <localfile>",
                    "(or to screen if <localfile> not specified)",
                ],
            ),
            Builtin::Get => info(
                1,
                2,
                "<rmtfile> [<localfile>]",
                &[
                    "Get remote file <rmtfile> and store locally with",
                    "the same name, or as <localfile> if specified",
                ],
            ),
            Builtin::Glob => info(
                0,
                0,
                "",
                &[
                    "Toggle filename globbing, which controls",
                    "wildcard expansion for mdelete/mget/mput",
                ],
            ),
            Builtin::Help => info(
                0,
                1,
                "[<cmd>]",
                &[
                    "Get help about <cmd> or list available commands",
                    "Use HELP ALL for help on all commands",
                    "Use HELP EDIT for help on line editing",
                ],
            ),
            Builtin::Lcd => info(
                0,
                1,
                "[<path>]",
                &[
                    "Change local directory to <path>, or back to",
                    "the starting directory if <path> not specified",
                ],
            ),
            Builtin::Ldir => info(
                0,
                1,
                "[<localdir>]",
                &[
                    "Get full listing of <localdir> (or current",
                    "local directory if <localdir> not specified)",
                ],
            ),
            Builtin::Mdelete => info(
                1,
                1,
                "<rmtfiles>",
                &["Delete multiple remote files specified by <rmtfiles>"],
            ),
            Builtin::Mget => info(
                1,
                1,
                "<rmtfiles>",
                &["Get multiple remote files specified by <rmtfiles>"],
            ),
            Builtin::Mkdir => info(1, 1, "<rmtdir>", &["Create remote directory <rmtdir>"]),
            Builtin::Mput => info(
                1,
                1,
                "<localfiles>",
                &["Put multiple local files specified by <localfiles>"],
            ),
            Builtin::Nlist => info(
                0,
                2,
                "[<rmtdir> [<localfile>]]",
                &[
                    "Get listing of <rmtdir> names into <localfile>",
                    "or to screen if <localfile> not specified",
                ],
            ),
            Builtin::Open => info(1, 2, "<server> [<port>]", &["Connect to server"]),
            Builtin::Passive => info(0, 0, "", &["Toggle passive mode"]),
            Builtin::Prompt => info(
                0,
                0,
                "",
                &["Toggle interactive prompting for", "mdelete/mget/mput"],
            ),
            Builtin::Put => info(
                1,
                2,
                "<localfile> [<rmtfile>]",
                &[
                    "Put local file <localfile> and store remotely with",
                    "the same name, or as <rmtfile> if specified",
                ],
            ),
            Builtin::Pwd => info(
                0,
                0,
                "",
                &["Display name of current directory on", "remote machine"],
            ),
            Builtin::Rename => info(
                2,
                2,
                "<oldname> <newname>",
                &["Rename remote file <oldname> to <newname>"],
            ),
            Builtin::Rmdir => info(1, 1, "<rmtdir>", &["Remove remote directory <rmtdir>"]),
            Builtin::Status => info(0, 0, "", &["Display current ftp status"]),
            Builtin::System => info(0, 0, "", &["Display info about remote system"]),
            Builtin::Tick => info(
                0,
                0,
                "",
                &["Toggle tick counter display during file transfer"],
            ),
            Builtin::Type => info(
                0,
                1,
                "[<type>]",
                &[
                    "Set transfer type to <type>; <type> is",
                    "ASCII or BINARY or IMAGE",
                ],
            ),
            Builtin::Verbose => info(
                0,
                0,
                "",
                &[
                    "Toggle verbose mode, which controls display",
                    "of server messages and file transfer speeds",
                ],
            ),
        }
    }
}

/// One name in the command table
#[derive(Debug, Clone, Copy)]
pub struct CommandEntry {
    pub name: &'static str,
    pub builtin: Builtin,
}

const fn entry(name: &'static str, builtin: Builtin) -> CommandEntry {
    CommandEntry { name, builtin }
}

/// All command names, sorted as `help` lists them
pub const COMMANDS: &[CommandEntry] = &[
    entry("?", Builtin::Help),
    entry("ascii", Builtin::Ascii),
    entry("bell", Builtin::Bell),
    entry("binary", Builtin::Binary),
    entry("bye", Builtin::Bye),
    entry("cd", Builtin::Cd),
    entry("cdup", Builtin::Cdup),
    entry("close", Builtin::Close),
    entry("debug", Builtin::Debug),
    entry("delete", Builtin::Delete),
    entry("dir", Builtin::Dir),
    entry("disconnect", Builtin::Close),
    entry("exit", Builtin::Bye),
    entry("get", Builtin::Get),
    entry("glob", Builtin::Glob),
    entry("help", Builtin::Help),
    entry("image", Builtin::Binary),
    entry("lcd", Builtin::Lcd),
    entry("ldir", Builtin::Ldir),
    entry("lls", Builtin::Ldir),
    entry("ls", Builtin::Dir),
    entry("mdelete", Builtin::Mdelete),
    entry("mget", Builtin::Mget),
    entry("mkdir", Builtin::Mkdir),
    entry("mput", Builtin::Mput),
    entry("nlist", Builtin::Nlist),
    entry("open", Builtin::Open),
    entry("passive", Builtin::Passive),
    entry("prompt", Builtin::Prompt),
    entry("put", Builtin::Put),
    entry("pwd", Builtin::Pwd),
    entry("quit", Builtin::Bye),
    entry("recv", Builtin::Get),
    entry("rename", Builtin::Rename),
    entry("rmdir", Builtin::Rmdir),
    entry("send", Builtin::Put),
    entry("status", Builtin::Status),
    entry("system", Builtin::System),
    entry("tick", Builtin::Tick),
    entry("type", Builtin::Type),
    entry("verbose", Builtin::Verbose),
];

/// Keys understood while typing a command line
pub const HELP_EDIT: &[&str] = &[
    "backspace = delete previous character",
    "ctrl-u = erase the whole line",
    "ctrl-c = abort the running command or transfer",
    "ctrl-s/ctrl-q = pause/resume a listing on screen",
];

/// Case-insensitive lookup of a command name
pub fn lookup(name: &str) -> Option<&'static CommandEntry> {
    COMMANDS.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}

/// Other names of the same builtin, in table order
pub fn synonyms(entry: &CommandEntry) -> impl Iterator<Item = &'static str> + '_ {
    COMMANDS
        .iter()
        .filter(move |e| e.builtin == entry.builtin && e.name != entry.name)
        .map(|e| e.name)
}

/// True for the first name of a builtin in the table
pub fn is_primary(entry: &CommandEntry) -> bool {
    COMMANDS
        .iter()
        .find(|e| e.builtin == entry.builtin)
        .is_some_and(|first| first.name == entry.name)
}
