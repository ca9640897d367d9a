//! Cooperative wait points
//!
//! Every wait loop in the client (reply header, reply line, data bytes,
//! send window, data accept) calls into a [`Poller`] between two polls of
//! the channel. That is the only place where the user can interrupt a wait
//! and where the optional no-progress timeout is enforced.

use std::thread;
use std::time::{Duration, Instant};

use crate::console::{Console, Key};
use crate::error::ClientError;

pub struct Poller<'a> {
    console: &'a mut dyn Console,
    timeout: Option<Duration>,
    interval: Duration,
    last_progress: Instant,
    waiting_for: &'static str,
}

impl<'a> Poller<'a> {
    pub fn new(
        console: &'a mut dyn Console,
        timeout: Option<Duration>,
        interval: Duration,
        waiting_for: &'static str,
    ) -> Self {
        Self {
            console,
            timeout,
            interval,
            last_progress: Instant::now(),
            waiting_for,
        }
    }

    /// Consumes a pending key press; Ctrl-C turns into `Interrupted`, any
    /// other key is dropped.
    pub fn check_break(&mut self) -> Result<(), ClientError> {
        if !self.console.key_waiting().map_err(ClientError::Console)? {
            return Ok(());
        }
        match self.console.read_key().map_err(ClientError::Console)? {
            Key::Interrupt => Err(ClientError::Interrupted),
            _ => Ok(()),
        }
    }

    /// Like [`check_break`](Self::check_break) but also honours Ctrl-S /
    /// Ctrl-Q flow control while output is going to the console.
    pub fn check_input(&mut self) -> Result<(), ClientError> {
        if !self.console.key_waiting().map_err(ClientError::Console)? {
            return Ok(());
        }
        match self.console.read_key().map_err(ClientError::Console)? {
            Key::Interrupt => Err(ClientError::Interrupted),
            Key::Pause => {
                loop {
                    match self.console.read_key().map_err(ClientError::Console)? {
                        Key::Interrupt => return Err(ClientError::Interrupted),
                        Key::Resume => break,
                        _ => {}
                    }
                }
                // time spent paused is not a stalled peer
                self.progressed();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Records that the channel moved data.
    pub fn progressed(&mut self) {
        self.last_progress = Instant::now();
    }

    /// Called when a poll found nothing to do.
    pub fn idle(&mut self) -> Result<(), ClientError> {
        if let Some(timeout) = self.timeout
            && self.last_progress.elapsed() >= timeout
        {
            return Err(ClientError::Timeout(self.waiting_for));
        }
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        Ok(())
    }

    pub fn console(&mut self) -> &mut dyn Console {
        &mut *self.console
    }
}
