//! Terminal console on top of crossterm
//!
//! Key capture (raw mode) is only switched on while a command runs, so the
//! shell keeps reading whole lines from stdin between commands. When stdin is
//! not a terminal the console degrades to line input and never reports a
//! waiting key.

use std::io::{self, Read, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::debug;

use crate::console::{Console, Key};

#[derive(Default)]
pub struct TerminalConsole {
    raw: bool,
    pending: Option<Key>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_event_key(&mut self, wait: bool) -> io::Result<Option<Key>> {
        loop {
            if !wait && !event::poll(Duration::ZERO)? {
                return Ok(None);
            }
            if let Event::Key(key) = event::read()?
                && key.kind != KeyEventKind::Release
            {
                return Ok(Some(map_key(key)));
            }
        }
    }

    fn read_stdin_key(&mut self) -> io::Result<Key> {
        let mut byte = [0u8; 1];
        let n = io::stdin().read(&mut byte)?;
        if n == 0 {
            return Ok(Key::Interrupt);
        }
        Ok(match byte[0] {
            b'\n' | b'\r' => Key::Enter,
            0x03 => Key::Interrupt,
            0x08 | 0x7f => Key::Backspace,
            b => Key::Char(b as char),
        })
    }
}

fn map_key(key: KeyEvent) -> Key {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if ctrl => Key::Interrupt,
        KeyCode::Char('s') | KeyCode::Char('S') if ctrl => Key::Pause,
        KeyCode::Char('q') | KeyCode::Char('Q') if ctrl => Key::Resume,
        KeyCode::Char(c) if !ctrl => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        _ => Key::Other,
    }
}

impl Console for TerminalConsole {
    fn write_str(&mut self, text: &str) {
        let mut out = io::stdout();
        // console output errors are not worth failing a transfer over
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn key_waiting(&mut self) -> io::Result<bool> {
        if !self.raw {
            return Ok(false);
        }
        if self.pending.is_none() {
            self.pending = self.next_event_key(false)?;
        }
        Ok(self.pending.is_some())
    }

    fn read_key(&mut self) -> io::Result<Key> {
        if let Some(key) = self.pending.take() {
            return Ok(key);
        }
        if !self.raw {
            return self.read_stdin_key();
        }
        match self.next_event_key(true)? {
            Some(key) => Ok(key),
            None => Ok(Key::Other),
        }
    }

    fn capture_keys(&mut self, on: bool) {
        if on == self.raw {
            return;
        }
        let result = if on {
            terminal::enable_raw_mode()
        } else {
            terminal::disable_raw_mode()
        };
        match result {
            Ok(()) => self.raw = on,
            Err(e) => {
                debug!("Key capture unavailable: {}", e);
                self.raw = false;
            }
        }
        self.pending = None;
    }
}

impl Drop for TerminalConsole {
    fn drop(&mut self) {
        if self.raw {
            let _ = terminal::disable_raw_mode();
        }
    }
}
