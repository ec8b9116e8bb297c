//! Variable inspection handlers.
//! - handle_scopes: one scope per frame
//! - handle_variables: locals captured at the last stop

use serde_json::Value;

use crate::protocol::{
    Request, Scope, ScopesArguments, ScopesResponseBody, Variable, VariablesArguments,
    VariablesResponseBody,
};

use super::super::{DebugAdapter, DispatchOutcome};
use super::parse_args;
use super::stack_trace::frame_index;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_scopes(&mut self, request: &Request<Value>) -> DispatchOutcome {
        let Some(args) = parse_args::<ScopesArguments>(request) else {
            return self.fail(request, "invalid scopes args");
        };
        let name = {
            let last_stop = self.last_stop.lock();
            last_stop
                .as_ref()
                .and_then(|stop| stop.stack.frames().get(frame_index(args.frame_id)?))
                .map(|frame| {
                    if frame.name.as_str() == "<module>" {
                        "Globals"
                    } else {
                        "Locals"
                    }
                })
        };
        let Some(name) = name else {
            return self.fail(request, "unknown frame");
        };
        let body = ScopesResponseBody {
            scopes: vec![Scope {
                name: name.to_string(),
                variables_reference: args.frame_id,
                expensive: false,
            }],
        };
        DispatchOutcome {
            responses: vec![self.outbox.ok_response(request, Some(body))],
            ..DispatchOutcome::default()
        }
    }

    pub(in crate::adapter) fn handle_variables(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let Some(args) = parse_args::<VariablesArguments>(request) else {
            return self.fail(request, "invalid variables args");
        };
        let variables = {
            let last_stop = self.last_stop.lock();
            last_stop
                .as_ref()
                .and_then(|stop| {
                    stop.stack
                        .frames()
                        .get(frame_index(args.variables_reference)?)
                })
                .map(|frame| {
                    frame
                        .locals
                        .iter()
                        .map(|(name, value)| Variable {
                            name: name.to_string(),
                            value: value.repr(),
                            type_name: Some(value.type_name().to_string()),
                            variables_reference: 0,
                        })
                        .collect::<Vec<_>>()
                })
        };
        let Some(variables) = variables else {
            return self.fail(request, "unknown variables reference");
        };
        DispatchOutcome {
            responses: vec![self
                .outbox
                .ok_response(request, Some(VariablesResponseBody { variables }))],
            ..DispatchOutcome::default()
        }
    }
}
