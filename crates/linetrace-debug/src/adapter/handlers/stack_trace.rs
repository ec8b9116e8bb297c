//! Thread and stack handlers.
//! - handle_threads: the single traced thread
//! - handle_stack_trace: frames of the last stop

use serde_json::Value;

use crate::protocol::{
    Request, StackFrame, StackTraceArguments, StackTraceResponseBody, Thread, ThreadsResponseBody,
};

use super::super::outbox::source_for;
use super::super::{DebugAdapter, DispatchOutcome, THREAD_ID};
use super::parse_args;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_threads(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let body = ThreadsResponseBody {
            threads: vec![Thread {
                id: THREAD_ID,
                name: "main".to_string(),
            }],
        };
        DispatchOutcome {
            responses: vec![self.outbox.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_stack_trace(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let Some(args) = parse_args::<StackTraceArguments>(request) else {
            return self.fail(request, "invalid stackTrace args");
        };
        if args.thread_id != THREAD_ID {
            return self.fail(request, "unknown thread");
        }
        let (stack_frames, total) = {
            let last_stop = self.last_stop.lock();
            let Some(stop) = last_stop.as_ref() else {
                return self.fail(request, "program is not suspended");
            };
            let start = args.start_frame.unwrap_or(0) as usize;
            let levels = match args.levels {
                Some(0) | None => usize::MAX,
                Some(levels) => levels as usize,
            };
            let frames = stop
                .stack
                .iter()
                .enumerate()
                .skip(start)
                .take(levels)
                .map(|(index, frame)| StackFrame {
                    id: frame_id(index),
                    name: frame.name.to_string(),
                    source: Some(source_for(&frame.file)),
                    line: frame.line,
                    column: 1,
                })
                .collect::<Vec<_>>();
            (frames, stop.stack.len())
        };
        let body = StackTraceResponseBody {
            stack_frames,
            total_frames: Some(u32::try_from(total).unwrap_or(u32::MAX)),
        };
        DispatchOutcome {
            responses: vec![self.outbox.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }
}

/// Frame ids are 1-based stack indices into the last stop.
pub(super) fn frame_id(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

pub(super) fn frame_index(id: u32) -> Option<usize> {
    (id as usize).checked_sub(1)
}
