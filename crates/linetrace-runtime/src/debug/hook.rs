//! Execution observer trait.

#![allow(missing_docs)]

use crate::error::RuntimeError;
use crate::memory::Locals;

/// Read-only view of one active call, valid for the duration of a
/// notification.
pub trait TraceFrame {
    /// Source file or dynamic identifier the frame executes.
    fn file(&self) -> &str;

    /// Function name.
    fn name(&self) -> &str;

    /// Current 1-based line, 0 before the first statement.
    fn line(&self) -> u32;

    /// Copy of the frame's local variables.
    fn locals(&self) -> Result<Locals, RuntimeError>;

    /// The frame that called this one.
    fn caller(&self) -> Option<&dyn TraceFrame>;

    /// Names visible to code running in this frame: the module globals,
    /// shadowed by the frame's own locals.
    fn scope(&self) -> Result<Locals, RuntimeError> {
        let Some(mut root) = self.caller() else {
            return self.locals();
        };
        while let Some(next) = root.caller() {
            root = next;
        }
        let mut scope = root.locals()?;
        scope.extend(self.locals()?);
        Ok(scope)
    }
}

/// What the engine should do after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum TraceAction {
    Continue,
    /// Unwind the program with [`RuntimeError::Aborted`].
    Abort,
}

/// Notifications emitted by the engine while it executes a program.
///
/// All calls arrive on the thread that runs the program.
pub trait ExecutionObserver {
    /// A module or function frame was entered.
    fn on_call(&mut self, frame: &dyn TraceFrame) -> TraceAction;

    /// A statement is about to execute.
    fn on_line(&mut self, frame: &dyn TraceFrame) -> TraceAction;

    /// A module or function frame is being left.
    fn on_return(&mut self, frame: &dyn TraceFrame) -> TraceAction;

    /// Whether an error surfacing in `frame` should be reported there. When
    /// false the engine offers it again in the calling frame.
    fn reports_exception_in(&self, _frame: &dyn TraceFrame) -> bool {
        true
    }

    /// An error surfaced in `frame`, before it unwinds.
    fn on_exception(&mut self, _frame: &dyn TraceFrame, _error: &RuntimeError) -> TraceAction {
        TraceAction::Continue
    }

    /// The run finished, successfully or not.
    fn on_terminate(&mut self) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {
    fn on_call(&mut self, _frame: &dyn TraceFrame) -> TraceAction {
        TraceAction::Continue
    }

    fn on_line(&mut self, _frame: &dyn TraceFrame) -> TraceAction {
        TraceAction::Continue
    }

    fn on_return(&mut self, _frame: &dyn TraceFrame) -> TraceAction {
        TraceAction::Continue
    }
}
