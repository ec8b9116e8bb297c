//! Tracer-to-client bridge.
//! - AdapterBridge: ControllerBridge writing stopped/continued/output events
//! - ProgramOutput: script `print` output as output events

use std::io::{self, Write};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use linetrace_runtime::debug::{
    BridgeError, ControllerBridge, DebugLog, ResumeCommand, SuspendEvent, SuspendReason,
};

use crate::protocol::{ContinuedEventBody, StoppedEventBody};

use super::outbox::{source_for, Outbox};
use super::THREAD_ID;

pub(super) struct AdapterBridge {
    outbox: Outbox,
    last_stop: Arc<Mutex<Option<SuspendEvent>>>,
    started: Arc<Mutex<Option<Sender<()>>>>,
}

impl AdapterBridge {
    pub(super) fn new(
        outbox: Outbox,
        last_stop: Arc<Mutex<Option<SuspendEvent>>>,
        started: Arc<Mutex<Option<Sender<()>>>>,
    ) -> Self {
        Self {
            outbox,
            last_stop,
            started,
        }
    }
}

fn stop_reason(reason: SuspendReason) -> &'static str {
    match reason {
        SuspendReason::Breakpoint => "breakpoint",
        SuspendReason::Step => "step",
        SuspendReason::Exception => "exception",
    }
}

impl ControllerBridge for AdapterBridge {
    fn notify_suspended(&self, event: SuspendEvent) -> Result<(), BridgeError> {
        let body = StoppedEventBody {
            reason: stop_reason(event.reason).to_string(),
            description: Some(format!("{}:{}", event.file, event.line)),
            thread_id: Some(THREAD_ID),
            all_threads_stopped: Some(true),
            text: event.exception.as_ref().map(ToString::to_string),
        };
        *self.last_stop.lock() = Some(event);
        self.outbox.emit("stopped", Some(body)).map_err(|err| {
            warn!(%err, "failed to send stopped event");
            BridgeError::Disconnected
        })
    }

    fn notify_log(&self, log: DebugLog) {
        let output = if log.message.ends_with('\n') {
            log.message
        } else {
            format!("{}\n", log.message)
        };
        let _ = self
            .outbox
            .output("console", output, Some(source_for(&log.file)), Some(log.line));
    }

    fn notify_started(&self) {
        if let Some(started) = self.started.lock().take() {
            let _ = started.send(());
        }
    }

    fn notify_resumed(&self, _command: ResumeCommand) {
        *self.last_stop.lock() = None;
        let body = ContinuedEventBody {
            thread_id: THREAD_ID,
            all_threads_continued: Some(true),
        };
        let _ = self.outbox.emit("continued", Some(body));
    }
}

/// Line-buffered sink that forwards program output to the client.
pub(super) struct ProgramOutput {
    outbox: Outbox,
    pending: Vec<u8>,
}

impl ProgramOutput {
    pub(super) fn new(outbox: Outbox) -> Self {
        Self {
            outbox,
            pending: Vec::new(),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        self.outbox.output("stdout", text, None, None)
    }
}

impl Write for ProgramOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        if let Some(end) = self.pending.iter().rposition(|byte| *byte == b'\n') {
            let lines: Vec<u8> = self.pending.drain(..=end).collect();
            self.send(&lines)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let rest = std::mem::take(&mut self.pending);
        self.send(&rest)
    }
}
