//! Initialize/launch handlers.
//! - handle_initialize: capabilities + initialized event
//! - handle_launch: load the program, start once configured
//! - handle_configuration_done: start a pending launch

use serde_json::Value;
use tracing::warn;

use crate::protocol::{Capabilities, LaunchArguments, Request};

use super::super::launch::{
    launch_flag, launch_inline_source, launch_program_path, source_key,
};
use super::super::{DebugAdapter, DispatchOutcome, LaunchState, PendingLaunch};
use super::parse_args;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_initialize(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let capabilities = Capabilities {
            supports_configuration_done_request: Some(true),
            supports_conditional_breakpoints: Some(true),
            supports_hit_conditional_breakpoints: Some(true),
            supports_terminate_request: Some(true),
        };
        DispatchOutcome {
            responses: vec![self.outbox.ok_response(request, Some(capabilities))],
            events: vec![self.outbox.event::<Value>("initialized", None)],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_launch(&mut self, request: &Request<Value>) -> DispatchOutcome {
        let Some(args) = parse_args::<LaunchArguments>(request) else {
            return self.fail(request, "invalid launch args");
        };
        let Some(program) = launch_program_path(&args) else {
            return self.fail(request, "launch requires a program");
        };
        let source = match launch_inline_source(&args) {
            Some(source) => source,
            None => match std::fs::read_to_string(&program) {
                Ok(source) => source,
                Err(err) => {
                    warn!(%program, %err, "failed to read program");
                    return self.fail(request, &format!("cannot read {program}: {err}"));
                }
            },
        };
        if let Some(show) = launch_flag(&args, "showDynamicCode") {
            self.tracer.set_show_dynamic_code(show);
        }
        if let Some(stop) = launch_flag(&args, "stopOnException") {
            self.tracer.set_suspend_on_exception(stop);
        }

        let launch = PendingLaunch {
            source,
            display_name: source_key(&program),
        };
        let start = match &mut self.launch_state {
            LaunchState::Configured => Some(launch),
            LaunchState::AwaitingConfig { pending } => {
                *pending = Some(launch);
                None
            }
        };
        DispatchOutcome {
            responses: vec![self.outbox.ok_response::<Value>(request, None)],
            start,
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_configuration_done(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let previous = std::mem::replace(&mut self.launch_state, LaunchState::Configured);
        let start = match previous {
            LaunchState::AwaitingConfig { pending } => pending,
            LaunchState::Configured => None,
        };
        DispatchOutcome {
            responses: vec![self.outbox.ok_response::<Value>(request, None)],
            start,
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn fail(
        &self,
        request: &Request<Value>,
        message: &str,
    ) -> DispatchOutcome {
        DispatchOutcome {
            responses: vec![self.outbox.error_response(request, message)],
            ..DispatchOutcome::default()
        }
    }
}
