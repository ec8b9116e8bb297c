//! Tracer state machine and the suspend/resume rendezvous.

#![allow(missing_docs)]

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use smol_str::SmolStr;

use crate::config::TracerConfig;
use crate::error::RuntimeError;
use crate::memory::Locals;
use crate::script::{RunOutcome, ScriptEngine};

use super::breakpoints::BreakpointTable;
use super::bridge::ControllerBridge;
use super::hook::{ExecutionObserver, TraceAction, TraceFrame};
use super::resolve::{is_dynamic_source, SourceRegistry, SourceResolver};
use super::snapshot::StackSnapshotter;
use super::{
    Breakpoint, ControlOutcome, DebugLog, ResumeCommand, SuspendEvent, SuspendReason,
    TracerPhase,
};

/// Step behavior while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    /// Stop at the next line regardless of call depth.
    Into,
    /// Stop at the next line at or above the target depth.
    Over,
    /// Stop at the next line above the target depth.
    Out,
}

#[derive(Debug, Clone, Copy)]
struct StepState {
    kind: StepKind,
    target_depth: u32,
}

impl StepState {
    fn reached(self, depth: u32) -> bool {
        match self.kind {
            StepKind::Into => true,
            StepKind::Over => depth <= self.target_depth,
            StepKind::Out => depth < self.target_depth,
        }
    }
}

/// Single pending resume command. A new offer replaces an unconsumed one.
#[derive(Debug, Default)]
struct CommandSlot {
    command: Option<ResumeCommand>,
}

impl CommandSlot {
    fn offer(&mut self, command: ResumeCommand) -> Option<ResumeCommand> {
        self.command.replace(command)
    }

    fn take(&mut self) -> Option<ResumeCommand> {
        self.command.take()
    }

    fn is_pending(&self) -> bool {
        self.command.is_some()
    }

    fn clear(&mut self) {
        self.command = None;
    }
}

#[derive(Debug)]
struct TracerState {
    phase: TracerPhase,
    breakpoints: BreakpointTable,
    command: CommandSlot,
    step: Option<StepState>,
    call_depth: u32,
    show_dynamic_code: bool,
    suspend_on_exception: bool,
    suspensions: u64,
}

/// Line-level tracer shared between the traced thread and a controller.
///
/// The traced thread drives it through [`ExecutionObserver`]; any other
/// thread may set breakpoints and resume a suspended program.
#[derive(Clone)]
pub struct Tracer {
    state: Arc<(Mutex<TracerState>, Condvar)>,
    bridge: Arc<dyn ControllerBridge>,
    resolver: Arc<dyn SourceResolver>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.0.lock();
        f.debug_struct("Tracer")
            .field("phase", &state.phase)
            .field("call_depth", &state.call_depth)
            .field("breakpoints", &state.breakpoints.len())
            .finish_non_exhaustive()
    }
}

impl Tracer {
    #[must_use]
    pub fn new(bridge: Arc<dyn ControllerBridge>) -> Self {
        Self::with_config(bridge, TracerConfig::default())
    }

    #[must_use]
    pub fn with_config(bridge: Arc<dyn ControllerBridge>, config: TracerConfig) -> Self {
        Self {
            state: Arc::new((
                Mutex::new(TracerState {
                    phase: TracerPhase::Running,
                    breakpoints: BreakpointTable::new(),
                    command: CommandSlot::default(),
                    step: None,
                    call_depth: 0,
                    show_dynamic_code: config.show_dynamic_code,
                    suspend_on_exception: config.suspend_on_exception,
                    suspensions: 0,
                }),
                Condvar::new(),
            )),
            bridge,
            resolver: Arc::new(SourceRegistry::new()),
        }
    }

    /// Replace the resolver that decides which frames appear in snapshots.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Add or replace the breakpoint at its (file, line).
    pub fn set_breakpoint(&self, breakpoint: Breakpoint) -> Option<Breakpoint> {
        tracing::debug!(file = %breakpoint.file, line = breakpoint.line, "set breakpoint");
        self.state.0.lock().breakpoints.set(breakpoint)
    }

    pub fn clear_breakpoint(&self, file: &str, line: u32) -> Option<Breakpoint> {
        self.state.0.lock().breakpoints.clear(file, line)
    }

    pub fn clear_breakpoints_for_file(&self, file: &str) -> usize {
        self.state.0.lock().breakpoints.clear_file(file)
    }

    pub fn clear_all_breakpoints(&self) {
        self.state.0.lock().breakpoints.clear_all();
    }

    #[must_use]
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        self.state.0.lock().breakpoints.iter().cloned().collect()
    }

    /// Hand `command` to the suspended program.
    ///
    /// Ignored when nothing is suspended. A command that has not been picked
    /// up yet is overwritten.
    pub fn resume(&self, command: ResumeCommand) -> ControlOutcome {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        if state.phase != TracerPhase::Suspended {
            tracing::warn!(?command, phase = ?state.phase, "resume ignored, program is not suspended");
            return ControlOutcome::Ignored;
        }
        if let Some(previous) = state.command.offer(command) {
            tracing::debug!(?previous, ?command, "replaced pending resume command");
        }
        cvar.notify_all();
        ControlOutcome::Applied
    }

    pub fn continue_run(&self) -> ControlOutcome {
        self.resume(ResumeCommand::Continue)
    }

    pub fn step_into(&self) -> ControlOutcome {
        self.resume(ResumeCommand::StepInto)
    }

    pub fn step_over(&self) -> ControlOutcome {
        self.resume(ResumeCommand::StepOver(None))
    }

    pub fn step_out(&self) -> ControlOutcome {
        self.resume(ResumeCommand::StepOut(None))
    }

    pub fn quit(&self) -> ControlOutcome {
        self.resume(ResumeCommand::Quit)
    }

    pub fn set_show_dynamic_code(&self, show: bool) {
        self.state.0.lock().show_dynamic_code = show;
    }

    pub fn set_suspend_on_exception(&self, suspend: bool) {
        self.state.0.lock().suspend_on_exception = suspend;
    }

    /// End the session. A suspended program is released with `Quit`; a
    /// running one aborts at its next notification.
    pub fn terminate(&self) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock();
        if state.phase == TracerPhase::Suspended {
            state.command.offer(ResumeCommand::Quit);
        }
        state.phase = TracerPhase::Terminated;
        state.step = None;
        cvar.notify_all();
    }

    #[must_use]
    pub fn phase(&self) -> TracerPhase {
        self.state.0.lock().phase
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.phase() == TracerPhase::Suspended
    }

    #[must_use]
    pub fn call_depth(&self) -> u32 {
        self.state.0.lock().call_depth
    }

    /// Number of times the program has suspended.
    #[must_use]
    pub fn suspension_count(&self) -> u64 {
        self.state.0.lock().suspensions
    }

    /// Compile and run `source` under this tracer on the current thread.
    ///
    /// Returns [`RunOutcome::Aborted`] when the controller quits the session.
    pub fn run(&self, source: &str, display_name: &str) -> Result<RunOutcome, RuntimeError> {
        self.run_with(&mut ScriptEngine::new(), source, display_name)
    }

    /// Like [`Tracer::run`], with a caller-configured engine.
    pub fn run_with(
        &self,
        engine: &mut ScriptEngine,
        source: &str,
        display_name: &str,
    ) -> Result<RunOutcome, RuntimeError> {
        self.resolver.register(display_name);
        {
            let mut state = self.state.0.lock();
            state.phase = TracerPhase::Running;
            state.step = None;
            state.call_depth = 0;
            state.command.clear();
        }
        tracing::debug!(display_name, "starting traced run");
        self.bridge.notify_started();
        let mut observer = self.clone();
        match engine.run_traced(source, display_name, &mut observer) {
            Ok(globals) => Ok(RunOutcome::Completed(globals)),
            Err(RuntimeError::Aborted) => {
                tracing::debug!(display_name, "traced run aborted by controller");
                Ok(RunOutcome::Aborted)
            }
            Err(err) => Err(err),
        }
    }

    fn flush_logs(&self, logs: Vec<DebugLog>) {
        for log in logs {
            self.bridge.notify_log(log);
        }
    }

    /// Capture the stack, report the stop and block until a command arrives.
    fn suspend(
        &self,
        frame: &dyn TraceFrame,
        reason: SuspendReason,
        exception: Option<SmolStr>,
    ) -> TraceAction {
        let (lock, cvar) = &*self.state;
        let (depth, show_dynamic_code) = {
            let mut state = lock.lock();
            state.phase = TracerPhase::EvaluatingStop;
            state.step = None;
            (state.call_depth, state.show_dynamic_code)
        };

        let stack = StackSnapshotter::new(self.resolver.as_ref())
            .show_dynamic_code(show_dynamic_code)
            .snapshot(frame);
        let event = SuspendEvent {
            reason,
            file: SmolStr::new(frame.file()),
            line: frame.line(),
            depth,
            stack,
            exception,
        };

        {
            let mut state = lock.lock();
            if state.phase == TracerPhase::Terminated {
                return TraceAction::Abort;
            }
            state.phase = TracerPhase::Suspended;
            state.command.clear();
            state.suspensions += 1;
        }
        tracing::debug!(?reason, file = frame.file(), line = frame.line(), depth, "suspended");

        if let Err(err) = self.bridge.notify_suspended(event) {
            tracing::warn!(%err, "could not report suspension, continuing");
            let mut state = lock.lock();
            if state.phase == TracerPhase::Suspended && !state.command.is_pending() {
                state.command.offer(ResumeCommand::Continue);
            }
        }

        let command = {
            let mut state = lock.lock();
            let command = loop {
                if let Some(command) = state.command.take() {
                    break command;
                }
                if state.phase == TracerPhase::Terminated {
                    break ResumeCommand::Quit;
                }
                cvar.wait(&mut state);
            };
            let step = |kind, target: Option<u32>| StepState {
                kind,
                target_depth: target.unwrap_or(depth),
            };
            state.step = match command {
                ResumeCommand::Continue | ResumeCommand::Quit => None,
                ResumeCommand::StepInto => Some(step(StepKind::Into, None)),
                ResumeCommand::StepOver(target) => Some(step(StepKind::Over, target)),
                ResumeCommand::StepOut(target) => Some(step(StepKind::Out, target)),
            };
            state.phase = if command == ResumeCommand::Quit {
                TracerPhase::Terminated
            } else {
                TracerPhase::Running
            };
            command
        };
        tracing::debug!(?command, "resumed");
        self.bridge.notify_resumed(command);
        if command == ResumeCommand::Quit {
            TraceAction::Abort
        } else {
            TraceAction::Continue
        }
    }
}

impl ExecutionObserver for Tracer {
    fn on_call(&mut self, _frame: &dyn TraceFrame) -> TraceAction {
        let mut state = self.state.0.lock();
        if state.phase == TracerPhase::Terminated {
            return TraceAction::Abort;
        }
        state.call_depth += 1;
        TraceAction::Continue
    }

    fn on_line(&mut self, frame: &dyn TraceFrame) -> TraceAction {
        let file = frame.file();
        let line = frame.line();
        let mut logs = Vec::new();
        let reason = {
            let mut guard = self.state.0.lock();
            let state = &mut *guard;
            if state.phase == TracerPhase::Terminated {
                return TraceAction::Abort;
            }
            if line < 1 || (is_dynamic_source(file) && !state.show_dynamic_code) {
                return TraceAction::Continue;
            }
            if state.step.is_some_and(|step| step.reached(state.call_depth)) {
                Some(SuspendReason::Step)
            } else {
                let scope = if state.breakpoints.needs_locals(file, line) {
                    frame.scope().unwrap_or_else(|err| {
                        tracing::debug!(file, line, %err, "locals unavailable for condition");
                        Locals::new()
                    })
                } else {
                    Locals::new()
                };
                state
                    .breakpoints
                    .should_stop(file, line, &scope, &mut logs)
                    .then_some(SuspendReason::Breakpoint)
            }
        };
        self.flush_logs(logs);
        match reason {
            Some(reason) => self.suspend(frame, reason, None),
            None => TraceAction::Continue,
        }
    }

    fn on_return(&mut self, _frame: &dyn TraceFrame) -> TraceAction {
        let mut state = self.state.0.lock();
        state.call_depth = state.call_depth.saturating_sub(1);
        if state.phase == TracerPhase::Terminated {
            return TraceAction::Abort;
        }
        TraceAction::Continue
    }

    fn reports_exception_in(&self, frame: &dyn TraceFrame) -> bool {
        !is_dynamic_source(frame.file()) || self.state.0.lock().show_dynamic_code
    }

    fn on_exception(&mut self, frame: &dyn TraceFrame, error: &RuntimeError) -> TraceAction {
        {
            let state = self.state.0.lock();
            if state.phase == TracerPhase::Terminated {
                return TraceAction::Abort;
            }
            if !state.suspend_on_exception
                || (is_dynamic_source(frame.file()) && !state.show_dynamic_code)
            {
                return TraceAction::Continue;
            }
        }
        tracing::debug!(%error, file = frame.file(), line = frame.line(), "exception raised");
        self.suspend(
            frame,
            SuspendReason::Exception,
            Some(SmolStr::new(error.to_string())),
        )
    }

    fn on_terminate(&mut self) {
        self.terminate();
        self.state.0.lock().call_depth = 0;
        self.bridge.notify_terminated();
    }
}
