//! Console adapter
//!
//! The session talks to the user only through the [`Console`] trait: string
//! output, single-key input and a "is a key waiting" poll. The poll is what
//! keeps long waits interruptible.

pub mod poll;
pub mod terminal;

#[cfg(test)]
pub mod mock;

use std::io;

pub use poll::Poller;
pub use terminal::TerminalConsole;

/// A key press as seen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    /// Ctrl-C
    Interrupt,
    /// Ctrl-S
    Pause,
    /// Ctrl-Q
    Resume,
    Other,
}

pub trait Console {
    fn write_str(&mut self, text: &str);

    /// Non-blocking: is a key press waiting to be read?
    fn key_waiting(&mut self) -> io::Result<bool>;

    /// Blocking read of the next key press
    fn read_key(&mut self) -> io::Result<Key>;

    /// Switch single-key capture on for the duration of a command.
    fn capture_keys(&mut self, _on: bool) {}

    /// Reads a line terminated by Enter. Returns `None` if the user pressed
    /// Ctrl-C instead.
    fn read_line(&mut self, echo: bool) -> io::Result<Option<String>> {
        let mut line = String::new();
        loop {
            match self.read_key()? {
                Key::Enter => break,
                Key::Interrupt => {
                    self.write_str("\r\n");
                    return Ok(None);
                }
                Key::Backspace => {
                    if line.pop().is_some() && echo {
                        self.write_str("\u{8} \u{8}");
                    }
                }
                Key::Char(c) => {
                    line.push(c);
                    if echo {
                        self.write_str(c.encode_utf8(&mut [0; 4]));
                    }
                }
                _ => {}
            }
        }
        self.write_str("\r\n");
        Ok(Some(line))
    }

    fn ring_bell(&mut self) {
        self.write_str("\u{7}");
    }
}
