//! Multi-file commands
//!
//! `mdelete`, `mget` and `mput` run the single-file operation once per
//! matching name. Every file is confirmed first when prompting is on, and
//! each result is reported as it happens. The first error ends the loop.

use std::path::PathBuf;

use log::{debug, info};

use crate::console::{Console, Key};
use crate::error::ClientError;
use crate::session::operations::base_name;
use crate::session::{OpOutcome, Session};
use crate::utils::expand_local;

/// The user's answer to `<cmd> <file> (Y/n)?`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Proceed,
    Skip,
    /// Stop the whole multi-file command
    AbortAll,
}

impl PromptAnswer {
    /// `n` skips the file, any other key proceeds. Ctrl-C asks whether to
    /// continue with the command at all: `n` or a second Ctrl-C aborts, any
    /// other key skips just this file.
    pub fn ask(console: &mut dyn Console, command: &str, file: &str) -> Result<Self, ClientError> {
        console.write_str(&format!("{command} {file} (Y/n)? "));
        let key = console.read_key().map_err(ClientError::Console)?;
        console.write_str("\r\n");

        let answer = match key {
            Key::Interrupt => {
                console.write_str(&format!("Continue with {command} (Y/n)? "));
                let key = console.read_key().map_err(ClientError::Console)?;
                console.write_str("\r\n");
                match key {
                    Key::Interrupt | Key::Char('n') | Key::Char('N') => PromptAnswer::AbortAll,
                    _ => PromptAnswer::Skip,
                }
            }
            Key::Char('n') | Key::Char('N') => PromptAnswer::Skip,
            _ => PromptAnswer::Proceed,
        };
        debug!("{command} {file}: {answer:?}");
        Ok(answer)
    }
}

impl Session {
    /// Deletes every remote file matching `pattern`.
    pub fn mdelete(&mut self, pattern: &str) -> Result<OpOutcome, ClientError> {
        if !self.options.globbing {
            return self.delete(pattern, true);
        }
        let names = self.matching(pattern)?.names();
        info!("mdelete {pattern}: {} candidates", names.len());
        self.for_each_name(&names, |session, name| session.delete(name, true));
        Ok(OpOutcome::Silent)
    }

    /// Downloads every remote file matching `pattern` under its own name.
    pub fn mget(&mut self, pattern: &str) -> Result<OpOutcome, ClientError> {
        if !self.options.globbing {
            return self.get(pattern, pattern, true);
        }
        let names = self.matching(pattern)?.names();
        info!("mget {pattern}: {} candidates", names.len());
        self.for_each_name(&names, |session, name| session.get(name, name, true));
        Ok(OpOutcome::Silent)
    }

    /// Uploads every local file matching `pattern`. Remote names are the
    /// local base names.
    pub fn mput(&mut self, pattern: &str) -> Result<OpOutcome, ClientError> {
        if !self.options.globbing {
            return self.put(pattern, pattern, true);
        }
        self.ensure_connected()?;
        let names =
            expand_local(pattern).map_err(|e| ClientError::FileRead(PathBuf::from(pattern), e))?;
        info!("mput {pattern}: {} candidates", names.len());
        self.for_each_name(&names, |session, name| {
            session.put(name, &base_name(name), true)
        });
        Ok(OpOutcome::Silent)
    }

    fn for_each_name<F>(&mut self, names: &[String], mut op: F)
    where
        F: FnMut(&mut Session, &str) -> Result<OpOutcome, ClientError>,
    {
        for name in names {
            let result = op(self, name);
            let failed = result.is_err();
            self.report(&result);
            if failed {
                break;
            }
        }
    }
}
