//! Connection-level messages.

use std::sync::{Mutex, PoisonError};

use manalink_protocol::opcodes::smsg;
use manalink_protocol::{MessageHandler, MessageIn};

use crate::{ConnectionProblem, HandlerContext};

/// Records connection problems reported by the server.
///
/// The handler cannot stop the client loop itself; the loop checks
/// [`take_problem`](Self::take_problem) after every dispatch.
#[derive(Debug)]
pub struct GeneralHandler {
    ctx: HandlerContext,
    problem: Mutex<Option<ConnectionProblem>>,
}

impl GeneralHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            ctx,
            problem: Mutex::new(None),
        }
    }

    /// The problem reported since the last call, if any.
    pub fn take_problem(&self) -> Option<ConnectionProblem> {
        self.problem
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn process_connection_problem(&self, msg: &mut MessageIn<'_>) {
        let code = msg.read_u8("code");
        let problem = ConnectionProblem::from_code(code, self.ctx.session.is_online());
        tracing::warn!(code, %problem, "server reported connection problem");
        *self.problem.lock().unwrap_or_else(PoisonError::into_inner) = Some(problem);
    }
}

impl MessageHandler for GeneralHandler {
    fn handled_messages(&self) -> &[u16] {
        &[smsg::CONNECTION_PROBLEM]
    }

    fn handle_message(&self, msg: &mut MessageIn<'_>) {
        match msg.id() {
            smsg::CONNECTION_PROBLEM => self.process_connection_problem(msg),
            opcode => tracing::debug!(opcode, "general handler got a foreign opcode"),
        }
    }

    fn name(&self) -> &'static str {
        "general"
    }
}
