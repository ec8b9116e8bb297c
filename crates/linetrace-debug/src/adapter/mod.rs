//! Debug adapter module map.
//! - core: main loop, dispatch, runner thread
//! - handlers: DAP request handlers by area
//! - bridge: tracer notifications turned into DAP events
//! - outbox: shared writer, sequence numbers, message builders
//! - protocol_io: message framing
//! - launch: launch argument helpers
//! - tests: adapter unit tests

mod bridge;
mod core;
mod handlers;
mod launch;
mod outbox;
mod protocol_io;


use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use serde_json::Value;

use linetrace_runtime::debug::{ResumeCommand, SuspendEvent};
use linetrace_runtime::{RuntimeConfig, Tracer};

use self::outbox::Outbox;

/// The single traced thread reported to clients.
const THREAD_ID: u32 = 1;

/// Program ready to run once configuration is done.
#[derive(Debug, Clone)]
struct PendingLaunch {
    source: String,
    display_name: String,
}

#[derive(Debug)]
enum LaunchState {
    AwaitingConfig { pending: Option<PendingLaunch> },
    Configured,
}

impl Default for LaunchState {
    fn default() -> Self {
        Self::AwaitingConfig { pending: None }
    }
}

#[derive(Debug, Default)]
struct DispatchOutcome {
    responses: Vec<Value>,
    events: Vec<Value>,
    should_exit: bool,
    /// Applied after the responses are written, so a fast stop cannot
    /// overtake the response to the request that caused it.
    resume: Option<ResumeCommand>,
    start: Option<PendingLaunch>,
}

/// Stdio debug adapter driving one traced script.
pub struct DebugAdapter {
    config: RuntimeConfig,
    tracer: Tracer,
    outbox: Outbox,
    last_stop: Arc<Mutex<Option<SuspendEvent>>>,
    /// Signalled by the bridge once the traced run has reset the tracer.
    started: Arc<Mutex<Option<Sender<()>>>>,
    launch_state: LaunchState,
    runner: Option<JoinHandle<()>>,
}
