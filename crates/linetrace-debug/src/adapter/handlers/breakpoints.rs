//! Breakpoint handlers.
//! - handle_set_breakpoints: replace all breakpoints of one source

use serde_json::Value;

use linetrace_runtime::debug::{normalize_source_path, Breakpoint as TraceBreakpoint};

use crate::protocol::{
    Breakpoint, Request, SetBreakpointsArguments, SetBreakpointsResponseBody, SourceBreakpoint,
};

use super::super::launch::source_key;
use super::super::{DebugAdapter, DispatchOutcome};
use super::parse_args;

impl DebugAdapter {
    pub(in crate::adapter) fn handle_set_breakpoints(
        &mut self,
        request: &Request<Value>,
    ) -> DispatchOutcome {
        let Some(args) = parse_args::<SetBreakpointsArguments>(request) else {
            return self.fail(request, "invalid setBreakpoints args");
        };
        let Some(path) = args.source.path.clone().or_else(|| args.source.name.clone()) else {
            return self.fail(request, "setBreakpoints requires a source path");
        };
        let file = normalize_source_path(&source_key(&path));
        self.tracer.clear_breakpoints_for_file(&file);

        let breakpoints = args
            .breakpoints
            .unwrap_or_default()
            .into_iter()
            .map(|requested| {
                let line = requested.line;
                let source = Some(args.source.clone());
                match to_trace_breakpoint(&file, &requested) {
                    Ok(breakpoint) => {
                        self.tracer.set_breakpoint(breakpoint);
                        if line == 0 {
                            Breakpoint::unverified(line, source, "line numbers start at 1")
                        } else {
                            Breakpoint::verified(line, source)
                        }
                    }
                    Err(message) => Breakpoint::unverified(line, source, message),
                }
            })
            .collect();

        DispatchOutcome {
            responses: vec![self
                .outbox
                .ok_response(request, Some(SetBreakpointsResponseBody { breakpoints }))],
            ..DispatchOutcome::default()
        }
    }
}

fn to_trace_breakpoint(file: &str, requested: &SourceBreakpoint) -> Result<TraceBreakpoint, String> {
    let mut breakpoint = TraceBreakpoint::new(file, requested.line);
    if let Some(condition) = requested
        .condition
        .as_deref()
        .map(str::trim)
        .filter(|condition| !condition.is_empty())
    {
        breakpoint = breakpoint.with_condition(condition);
    }
    if let Some(hit_condition) = requested.hit_condition.as_deref() {
        breakpoint = breakpoint.with_hit_count(parse_hit_count(hit_condition)?);
    }
    if requested.temporary == Some(true) {
        breakpoint = breakpoint.temporary();
    }
    Ok(breakpoint)
}

/// Accepts `N`, `==N` and `>=N`; each stops on the Nth passing hit.
fn parse_hit_count(text: &str) -> Result<u64, String> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("==")
        .or_else(|| trimmed.strip_prefix(">="))
        .unwrap_or(trimmed)
        .trim();
    match digits.parse::<u64>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(format!("invalid hit condition '{text}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_hit_count;

    #[test]
    fn hit_conditions() {
        assert_eq!(parse_hit_count("3"), Ok(3));
        assert_eq!(parse_hit_count(">= 2"), Ok(2));
        assert_eq!(parse_hit_count("==4"), Ok(4));
        assert!(parse_hit_count("0").is_err());
        assert!(parse_hit_count("% 2").is_err());
    }
}
