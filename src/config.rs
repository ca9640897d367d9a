//! Configuration management for the RAX FTP client
//!
//! Separates transport configuration (fixed for the life of the process) from
//! session options (toggled at runtime by builtin commands such as `passive`
//! or `verbose`).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ftp-client";

/// Complete client configuration with transport/session separation
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub session: SessionOptions,
}

/// Configuration that is read once at startup
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TransportConfig {
    /// Port used by `open` when none is given
    pub control_port: u16,

    /// Local I/O buffer for get/put/listings
    pub io_buffer_size: usize,

    /// Largest block handed to the channel in one send
    pub channel_buffer_size: usize,

    /// Starting capacity of the reply buffer; doubled on every buffer-full read
    pub reply_buffer_initial: usize,

    /// Longest command line sent to the server, CRLF excluded
    pub max_command_length: usize,

    pub connect_timeout_secs: u64,
    pub close_timeout_secs: u64,

    /// Control reply wait without progress; 0 waits forever
    pub reply_timeout_secs: u64,

    /// Data channel wait without progress; 0 waits forever
    pub data_timeout_secs: u64,

    /// Sleep between two polls of an idle channel
    pub poll_interval_ms: u64,

    /// Random ports tried before active mode gives up
    pub active_port_attempts: usize,
}

/// Options that builtin commands can toggle while the client is running
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionOptions {
    pub passive: bool,
    pub prompting: bool,
    pub globbing: bool,
    pub verbose: bool,
    pub debug: u8,
    pub bell: bool,
    pub tick: bool,
    pub auto_login: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            control_port: 21,
            io_buffer_size: 32000,
            channel_buffer_size: 32000,
            reply_buffer_initial: 1000,
            max_command_length: 256,
            connect_timeout_secs: 10,
            close_timeout_secs: 5,
            reply_timeout_secs: 0,
            data_timeout_secs: 0,
            poll_interval_ms: 2,
            active_port_attempts: 8,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            passive: true,
            prompting: true,
            globbing: true,
            verbose: true,
            debug: 0,
            bell: false,
            tick: false,
            auto_login: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `ftp-client.toml` (or `path`) with environment
    /// overrides. A missing default file is not an error; a missing explicit
    /// file is.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("RAX_FTP_CLIENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let t = &self.transport;

        if t.control_port == 0 {
            return Err(config::ConfigError::Message(
                "control_port cannot be 0".into(),
            ));
        }

        if t.io_buffer_size == 0 || t.channel_buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer sizes must be greater than 0".into(),
            ));
        }

        if t.channel_buffer_size > i16::MAX as usize {
            return Err(config::ConfigError::Message(format!(
                "channel_buffer_size must not exceed {}",
                i16::MAX
            )));
        }

        if t.reply_buffer_initial < 8 {
            return Err(config::ConfigError::Message(
                "reply_buffer_initial must be at least 8 bytes".into(),
            ));
        }

        if t.max_command_length < 8 {
            return Err(config::ConfigError::Message(
                "max_command_length must be at least 8".into(),
            ));
        }

        if t.active_port_attempts == 0 {
            return Err(config::ConfigError::Message(
                "active_port_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }

    /// `None` means the wait is unbounded
    pub fn reply_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.reply_timeout_secs)
    }

    pub fn data_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.data_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
