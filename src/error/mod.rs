//! Error handling module
//!
//! Error types for the transport and client layers, and the handlers that
//! report them on the console.

pub mod handlers;
pub mod types;

pub use handlers::{describe, report_error, report_outcome};
pub use types::*;
