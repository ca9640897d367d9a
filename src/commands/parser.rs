//! Command line tokenizer
//!
//! Arguments are separated by spaces. An argument that starts with `"` runs
//! to the matching `"` and may contain spaces; the quotes are removed. A quote
//! anywhere else, or one left open, is an error.

use crate::error::ClientError;

const QUOTING_ERROR: &str = "error in quoted field";

/// Splits `line` into arguments, the command name first.
pub fn tokenize(line: &str) -> Result<Vec<String>, ClientError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut args = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek() == Some(&' ') {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            return Ok(args);
        };

        let mut arg = String::new();
        if first == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(c) => arg.push(c),
                    None => return Err(ClientError::Parse(QUOTING_ERROR.into())),
                }
            }
        }
        while let Some(&c) = chars.peek() {
            match c {
                ' ' => break,
                '"' => return Err(ClientError::Parse(QUOTING_ERROR.into())),
                _ => {
                    arg.push(c);
                    chars.next();
                }
            }
        }
        args.push(arg);
    }
}
