//! Error handlers
//!
//! Turns operation results into console output, the one place where the
//! verbose flag decides whether server replies are shown. Failure replies
//! (4xx and 5xx) are shown either way.

use log::debug;

use crate::console::Console;
use crate::error::types::ClientError;
use crate::protocol::Reply;
use crate::session::OpOutcome;

fn shows_reply(verbose: bool, reply: &Reply) -> bool {
    verbose || reply.code() >= 400
}

/// Console message for an error. `None` when the server's reply already
/// explains the failure.
pub fn describe(err: &ClientError) -> Option<String> {
    match err {
        ClientError::UnexpectedReply { .. } => None,
        other => Some(other.to_string()),
    }
}

pub fn report_error(console: &mut dyn Console, verbose: bool, err: &ClientError) {
    debug!("Operation failed with code {}: {}", err.code(), err);
    match describe(err) {
        Some(message) => console.write_str(&format!("{}\r\n", message)),
        None => {
            if let ClientError::UnexpectedReply { reply, .. } = err
                && shows_reply(verbose, reply)
            {
                console.write_str(reply.text());
            }
        }
    }
}

/// Displays what an operation returned: server replies when verbose or
/// failing, errors always.
pub fn report_outcome(
    console: &mut dyn Console,
    verbose: bool,
    result: &Result<OpOutcome, ClientError>,
) {
    match result {
        Ok(OpOutcome::Reply(reply)) => {
            if shows_reply(verbose, reply) {
                console.write_str(reply.text());
            }
        }
        Ok(OpOutcome::Silent) | Ok(OpOutcome::Exit) => {}
        Err(err) => report_error(console, verbose, err),
    }
}
