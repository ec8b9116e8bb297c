//! Session lifecycle handlers.
//! - handle_disconnect: stop (or detach from) the program and end the loop
//! - handle_terminate: stop the program, keep the session
//! - handle_set_show_dynamic_code: toggle dynamic code visibility

use serde_json::Value;
use tracing::info;

use crate::protocol::{DisconnectArguments, Request, SetShowDynamicCodeArguments};

use super::super::{DebugAdapter, DispatchOutcome};
use super::parse_args;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_disconnect(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let args = parse_args::<DisconnectArguments>(request).unwrap_or_default();
        if args.terminate_debuggee == Some(false) {
            info!("client detached, program runs to completion");
            self.detach_runner();
        } else {
            info!("client disconnected");
            self.stop_runner();
        }
        DispatchOutcome {
            responses: vec![self.outbox.ok_response::<Value>(request, None)],
            should_exit: true,
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_terminate(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        self.tracer.terminate();
        DispatchOutcome {
            responses: vec![self.outbox.ok_response::<Value>(request, None)],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_set_show_dynamic_code(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let Some(args) = parse_args::<SetShowDynamicCodeArguments>(request) else {
            return self.fail(request, "invalid setShowDynamicCode args");
        };
        self.tracer.set_show_dynamic_code(args.enabled);
        DispatchOutcome {
            responses: vec![self.outbox.ok_response::<Value>(request, None)],
            ..DispatchOutcome::default()
        }
    }
}
