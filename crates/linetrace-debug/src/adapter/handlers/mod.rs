//! Request handlers grouped by DAP area.
//! - initialize: initialize/launch/configuration timing
//! - breakpoints: setBreakpoints
//! - lifecycle: disconnect/terminate/setShowDynamicCode
//! - run_control: continue/next/stepIn/stepOut
//! - stack_trace: threads + stackTrace
//! - scopes: scopes + variables for the last stop

mod breakpoints;
mod initialize;
mod lifecycle;
mod run_control;
mod scopes;
mod stack_trace;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::protocol::Request;

/// Decode request arguments; a missing object decodes from `{}`.
fn parse_args<T: DeserializeOwned>(request: &Request<Value>) -> Option<T> {
    let value = request
        .arguments
        .clone()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).ok()
}
