//! Transfer statistics and progress display

use std::time::{Duration, Instant};

use crate::console::Console;

/// Bytes between two tick counter updates
pub const TICK_QUANTUM: u64 = 10 * 1024;

const TICK_BLANKOUT: &str = "                              \r";

/// Byte count and elapsed time of one transfer
#[derive(Debug, Clone)]
pub struct TransferStats {
    bytes: u64,
    started: Instant,
    elapsed: Option<Duration>,
    tick: bool,
    last_tick: u64,
}

impl TransferStats {
    /// Starts the clock.
    pub fn start(tick: bool) -> Self {
        Self {
            bytes: 0,
            started: Instant::now(),
            elapsed: None,
            tick,
            last_tick: 0,
        }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Counts `n` more bytes and updates the tick counter if it is on.
    pub fn add(&mut self, n: usize, console: &mut dyn Console) {
        self.bytes += n as u64;
        if self.tick && self.bytes - self.last_tick > TICK_QUANTUM {
            console.write_str(&format!("Bytes transferred = {}\r", self.bytes));
            self.last_tick = self.bytes;
        }
    }

    /// Stops the clock and clears the tick counter line.
    pub fn finish(&mut self, console: &mut dyn Console) {
        if self.elapsed.is_none() {
            self.elapsed = Some(self.started.elapsed());
            if self.tick {
                console.write_str(TICK_BLANKOUT);
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    /// `N bytes in S.mmm secs (B bps)`
    pub fn summary(&self) -> String {
        format_throughput(self.bytes, self.elapsed())
    }
}

pub fn format_throughput(bytes: u64, elapsed: Duration) -> String {
    // a transfer always counts as having taken some time
    let micros = elapsed.as_micros().max(1);
    let bps = u128::from(bytes) * 1_000_000 / micros;
    let millis = elapsed.as_millis();
    format!(
        "{} bytes in {}.{:03} secs ({} bps)",
        bytes,
        millis / 1000,
        millis % 1000,
        bps
    )
}
