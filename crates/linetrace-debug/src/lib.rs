//! Debug Adapter Protocol (DAP) front end for linetrace scripts.

mod adapter;
mod protocol;

pub use adapter::DebugAdapter;
pub use protocol::{
    Breakpoint, Capabilities, ContinueResponseBody, ContinuedEventBody, DisconnectArguments,
    Event, ExitedEventBody, LaunchArguments, MessageType, OutputEventBody, Request, Response,
    Scope, ScopesArguments, ScopesResponseBody, SetBreakpointsArguments,
    SetBreakpointsResponseBody, SetShowDynamicCodeArguments, Source, SourceBreakpoint,
    StackFrame, StackTraceArguments, StackTraceResponseBody, StoppedEventBody, Thread,
    ThreadArguments, ThreadsResponseBody, Variable, VariablesArguments, VariablesResponseBody,
};
