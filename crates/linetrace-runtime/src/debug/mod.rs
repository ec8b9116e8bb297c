//! Line tracing, breakpoints, and the suspend/resume rendezvous.

#![allow(missing_docs)]

mod breakpoints;
mod bridge;
mod control;
mod hook;
mod resolve;
mod snapshot;
mod types;

pub use breakpoints::BreakpointTable;
pub use bridge::{BridgeError, ChannelBridge, ControllerBridge, NullBridge, TraceEvent};
pub use control::Tracer;
pub use hook::{ExecutionObserver, NoopObserver, TraceAction, TraceFrame};
pub use resolve::{is_dynamic_source, normalize_source_path, SourceRegistry, SourceResolver};
pub use snapshot::StackSnapshotter;
pub use types::{
    Breakpoint, ControlOutcome, DebugLog, FrameDescriptor, ResumeCommand, StackDescriptor,
    SuspendEvent, SuspendReason, TracerPhase,
};
