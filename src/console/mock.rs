//! Scripted console used by unit tests

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::console::{Console, Key};

/// Output written to a scripted console, readable after the console has been
/// handed to a session
#[derive(Debug, Clone, Default)]
pub struct Transcript(Rc<RefCell<String>>);

impl Transcript {
    pub fn text(&self) -> String {
        self.0.borrow().clone()
    }
}

#[derive(Default)]
pub struct ScriptedConsole {
    keys: VecDeque<Key>,
    output: Transcript,
    bells: Rc<RefCell<usize>>,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_keys(&mut self, keys: &[Key]) {
        self.keys.extend(keys.iter().copied());
    }

    /// Queues `text` followed by Enter.
    pub fn push_line(&mut self, text: &str) {
        self.keys.extend(text.chars().map(Key::Char));
        self.keys.push_back(Key::Enter);
    }

    pub fn remaining_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn output(&self) -> String {
        self.output.text()
    }

    pub fn transcript(&self) -> Transcript {
        self.output.clone()
    }

    pub fn bells(&self) -> usize {
        *self.bells.borrow()
    }

    pub fn bell_counter(&self) -> Rc<RefCell<usize>> {
        self.bells.clone()
    }
}

impl Console for ScriptedConsole {
    fn write_str(&mut self, text: &str) {
        self.output.0.borrow_mut().push_str(text);
    }

    fn key_waiting(&mut self) -> io::Result<bool> {
        Ok(!self.keys.is_empty())
    }

    fn read_key(&mut self) -> io::Result<Key> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted key left"))
    }

    fn ring_bell(&mut self) {
        *self.bells.borrow_mut() += 1;
    }
}
