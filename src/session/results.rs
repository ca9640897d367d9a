//! Operation results

use crate::protocol::Reply;

/// Legacy code of the "leave the command loop" outcome
pub const EXIT_CODE: i32 = 999;

/// What a successful operation produced
#[derive(Debug)]
pub enum OpOutcome {
    /// Done, nothing further to show
    Silent,
    /// The server's final reply, shown when verbose
    Reply(Reply),
    /// The command loop should end
    Exit,
}

impl OpOutcome {
    /// Legacy numeric form: 0, the reply code, or 999.
    pub fn code(&self) -> i32 {
        match self {
            OpOutcome::Silent => 0,
            OpOutcome::Reply(reply) => i32::from(reply.code()),
            OpOutcome::Exit => EXIT_CODE,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, OpOutcome::Exit)
    }
}
