//! Controller bridge: how the tracer reports to the session controller.

#![allow(missing_docs)]

use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

use super::{DebugLog, ResumeCommand, SuspendEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("controller disconnected")]
    Disconnected,
}

/// Receives tracer notifications on the traced thread.
///
/// No tracer lock is held during these calls, so implementations may call
/// back into the [`Tracer`](super::Tracer), including `resume`.
pub trait ControllerBridge: Send + Sync {
    /// The program suspended and waits for a resume command.
    fn notify_suspended(&self, event: SuspendEvent) -> Result<(), BridgeError>;

    /// Best-effort diagnostic. Must not block.
    fn notify_log(&self, log: DebugLog);

    fn notify_started(&self) {}

    fn notify_resumed(&self, _command: ResumeCommand) {}

    fn notify_terminated(&self) {}
}

/// Notification forwarded by [`ChannelBridge`].
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Started,
    Suspended(SuspendEvent),
    Log(DebugLog),
    Resumed(ResumeCommand),
    Terminated,
}

/// Bridge that forwards every notification over a channel.
#[derive(Debug)]
pub struct ChannelBridge {
    tx: Sender<TraceEvent>,
}

impl ChannelBridge {
    #[must_use]
    pub fn new() -> (Self, Receiver<TraceEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: TraceEvent) -> Result<(), BridgeError> {
        self.tx
            .send(event)
            .map_err(|_| BridgeError::Disconnected)
    }
}

impl ControllerBridge for ChannelBridge {
    fn notify_suspended(&self, event: SuspendEvent) -> Result<(), BridgeError> {
        self.send(TraceEvent::Suspended(event))
    }

    fn notify_log(&self, log: DebugLog) {
        let _ = self.send(TraceEvent::Log(log));
    }

    fn notify_started(&self) {
        let _ = self.send(TraceEvent::Started);
    }

    fn notify_resumed(&self, command: ResumeCommand) {
        let _ = self.send(TraceEvent::Resumed(command));
    }

    fn notify_terminated(&self) {
        let _ = self.send(TraceEvent::Terminated);
    }
}

/// Bridge with no controller attached. Suspensions report
/// [`BridgeError::Disconnected`], so the tracer never blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

impl ControllerBridge for NullBridge {
    fn notify_suspended(&self, _event: SuspendEvent) -> Result<(), BridgeError> {
        Err(BridgeError::Disconnected)
    }

    fn notify_log(&self, _log: DebugLog) {}
}
