//! Execution control handlers.
//! - handle_continue/next/step_in/step_out: resume the suspended program

use serde::Serialize;
use serde_json::Value;

use linetrace_runtime::debug::ResumeCommand;

use crate::protocol::{ContinueResponseBody, Request, ThreadArguments};

use super::super::{DebugAdapter, DispatchOutcome, THREAD_ID};
use super::parse_args;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_continue(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let body = ContinueResponseBody {
            all_threads_continued: Some(true),
        };
        self.resume_with(request, ResumeCommand::Continue, Some(body))
    }

    pub(in crate::adapter) fn handle_next(&mut self, request: &Request<Value>) -> DispatchOutcome {
        self.resume_with::<Value>(request, ResumeCommand::StepOver(None), None)
    }

    pub(in crate::adapter) fn handle_step_in(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        self.resume_with::<Value>(request, ResumeCommand::StepInto, None)
    }

    pub(in crate::adapter) fn handle_step_out(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        self.resume_with::<Value>(request, ResumeCommand::StepOut(None), None)
    }

    /// The command is handed to the tracer after the response is written.
    fn resume_with<T: Serialize>(
        &self,
        request: &Request<Value>,
        command: ResumeCommand,
        body: Option<T>,
    ) -> DispatchOutcome {
        let Some(args) = parse_args::<ThreadArguments>(request) else {
            return self.fail(request, &format!("invalid {} args", request.command));
        };
        if args.thread_id != THREAD_ID {
            return self.fail(request, "unknown thread");
        }
        if !self.tracer.is_suspended() {
            return self.fail(request, "program is not suspended");
        }
        DispatchOutcome {
            responses: vec![self.outbox.ok_response(request, body)],
            resume: Some(command),
            ..DispatchOutcome::default()
        }
    }
}
