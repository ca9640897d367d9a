//! Session module
//!
//! A [`Session`] owns everything one interactive client needs: the
//! transport, the console, the runtime options and the state of the current
//! connection. Operations are methods on it; there is no process-wide state.

pub mod multi;
pub mod operations;
pub mod results;
pub mod state;

#[cfg(test)]
pub(crate) mod fixtures;

use std::env;
use std::path::{Path, PathBuf};

use log::warn;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{ClientConfig, SessionOptions, TransportConfig};
use crate::console::Console;
use crate::error::{ClientError, report_outcome};
use crate::transfer::TransferContext;
use crate::transport::Transport;

pub use multi::PromptAnswer;
pub use results::OpOutcome;
pub use state::SessionState;

pub struct Session {
    config: TransportConfig,
    pub options: SessionOptions,
    transport: Box<dyn Transport>,
    console: Box<dyn Console>,
    state: SessionState,
    rng: StdRng,
    start_dir: Option<PathBuf>,
}

impl Session {
    pub fn new(
        config: ClientConfig,
        transport: Box<dyn Transport>,
        console: Box<dyn Console>,
    ) -> Self {
        Self {
            config: config.transport,
            options: config.session,
            transport,
            console,
            state: SessionState::default(),
            rng: StdRng::from_entropy(),
            start_dir: env::current_dir().ok(),
        }
    }

    /// Replaces the port generator, so active-mode ports are reproducible.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn console(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }

    /// Working directory at startup, restored by `lcd` without argument
    pub fn start_dir(&self) -> Option<&Path> {
        self.start_dir.as_deref()
    }

    pub fn write(&mut self, text: &str) {
        self.console.write_str(text);
    }

    /// Borrows what a control-channel exchange needs. Fails when there is no
    /// connection.
    pub fn context(&mut self) -> Result<TransferContext<'_>, ClientError> {
        let (control, last_type_sent) = self
            .state
            .control_parts()
            .ok_or(ClientError::NotConnected)?;
        Ok(TransferContext {
            control,
            transport: self.transport.as_mut(),
            console: self.console.as_mut(),
            rng: &mut self.rng,
            config: &self.config,
            options: &self.options,
            last_type_sent,
        })
    }

    /// Shows an operation's result and remembers whether it left the
    /// control channel out of step.
    pub fn report(&mut self, result: &Result<OpOutcome, ClientError>) {
        if let Err(e) = result
            && !self.state.is_control_suspect()
            && self.state.note_failure(e)
        {
            warn!("Control connection may be out of step after: {e}");
        }
        report_outcome(self.console.as_mut(), self.options.verbose, result);
    }
}
