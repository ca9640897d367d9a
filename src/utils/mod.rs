//! Utility helpers shared by the protocol and transfer layers

pub mod buffer;
pub mod wildcard;

pub use buffer::{GrowableBuffer, MatchBuffer};
pub use wildcard::{expand_local, has_wildcard, wildcard_match};
