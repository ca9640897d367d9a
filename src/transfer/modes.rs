//! Transfer type and data-connection mode

use std::fmt;

/// Representation type sent with `TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferType {
    Ascii,
    #[default]
    Binary,
}

impl TransferType {
    /// Wire letter
    pub fn code(self) -> char {
        match self {
            TransferType::Ascii => 'A',
            TransferType::Binary => 'I',
        }
    }

    /// Accepts `ascii`, `binary` and `image` in any case.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("ascii") {
            Some(TransferType::Ascii)
        } else if name.eq_ignore_ascii_case("binary") || name.eq_ignore_ascii_case("image") {
            Some(TransferType::Binary)
        } else {
            None
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Ascii => f.write_str("ascii"),
            TransferType::Binary => f.write_str("binary"),
        }
    }
}

/// Who opens the data connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    /// We listen and announce the port with `PORT`
    Active,
    /// The server listens and tells us where with its `PASV` reply
    Passive,
}

impl DataMode {
    pub fn from_passive_flag(passive: bool) -> Self {
        if passive {
            DataMode::Passive
        } else {
            DataMode::Active
        }
    }
}
