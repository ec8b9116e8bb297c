//! Adapter core loop + request dispatch.
//! - DebugAdapter::new/stdio constructors
//! - run/run_stdio: protocol loop
//! - dispatch_request: route DAP requests
//! - start_runner/stop_runner/detach_runner: traced thread lifecycle

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use linetrace_runtime::{RunOutcome, RuntimeConfig, ScriptEngine, Tracer};

use crate::protocol::{ExitedEventBody, MessageType, Request};

use super::bridge::{AdapterBridge, ProgramOutput};
use super::outbox::Outbox;
use super::protocol_io::read_message;
use super::{DebugAdapter, DispatchOutcome, LaunchState, PendingLaunch};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const DETACH_POLL: Duration = Duration::from_millis(10);

impl DebugAdapter {
    /// Adapter writing protocol messages to `writer`.
    #[must_use]
    pub fn new(config: RuntimeConfig, writer: Box<dyn Write + Send>) -> Self {
        let outbox = Outbox::new(writer);
        let last_stop = Arc::new(Mutex::new(None));
        let started = Arc::new(Mutex::new(None));
        let bridge = AdapterBridge::new(
            outbox.clone(),
            Arc::clone(&last_stop),
            Arc::clone(&started),
        );
        let tracer = Tracer::with_config(Arc::new(bridge), config.tracer);
        Self {
            config,
            tracer,
            outbox,
            last_stop,
            started,
            launch_state: LaunchState::default(),
            runner: None,
        }
    }

    /// Adapter writing to stdout.
    #[must_use]
    pub fn stdio(config: RuntimeConfig) -> Self {
        Self::new(config, Box::new(BufWriter::new(io::stdout())))
    }

    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Run a blocking stdio loop that processes DAP requests.
    pub fn run_stdio(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin.lock());
        self.run(&mut reader)
    }

    /// Process framed requests from `reader` until it closes or the client
    /// disconnects.
    pub fn run<R: BufRead>(&mut self, reader: &mut R) -> io::Result<()> {
        while let Some(payload) = read_message(reader)? {
            if self.handle_payload(&payload)? {
                break;
            }
        }
        debug!("request loop finished");
        self.stop_runner();
        Ok(())
    }

    /// Handle one request payload. Returns whether the loop should exit.
    pub fn handle_payload(&mut self, payload: &str) -> io::Result<bool> {
        let request: Request<Value> = match serde_json::from_str(payload) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "ignoring invalid DAP payload");
                return Ok(false);
            }
        };
        debug!(seq = request.seq, command = %request.command, "request");
        let outcome = self.dispatch_request(request);
        for message in outcome.responses.iter().chain(&outcome.events) {
            self.outbox.send(message)?;
        }
        if let Some(command) = outcome.resume {
            self.tracer.resume(command);
        }
        if let Some(launch) = outcome.start {
            self.start_runner(launch);
        }
        Ok(outcome.should_exit)
    }

    pub(super) fn dispatch_request(&mut self, request: Request<Value>) -> DispatchOutcome {
        if request.message_type != MessageType::Request {
            return DispatchOutcome::default();
        }

        match request.command.as_str() {
            "initialize" => self.handle_initialize(&request),
            "launch" => self.handle_launch(&request),
            "configurationDone" => self.handle_configuration_done(&request),
            "disconnect" => self.handle_disconnect(&request),
            "terminate" => self.handle_terminate(&request),
            "setBreakpoints" => self.handle_set_breakpoints(&request),
            "setShowDynamicCode" => self.handle_set_show_dynamic_code(&request),
            "threads" => self.handle_threads(&request),
            "stackTrace" => self.handle_stack_trace(&request),
            "scopes" => self.handle_scopes(&request),
            "variables" => self.handle_variables(&request),
            "continue" => self.handle_continue(&request),
            "next" => self.handle_next(&request),
            "stepIn" => self.handle_step_in(&request),
            "stepOut" => self.handle_step_out(&request),
            _ => DispatchOutcome {
                responses: vec![self
                    .outbox
                    .error_response(&request, "unsupported request")],
                ..DispatchOutcome::default()
            },
        }
    }

    pub(super) fn start_runner(&mut self, launch: PendingLaunch) {
        if self.runner.is_some() {
            warn!("program already running, ignoring launch");
            return;
        }
        let tracer = self.tracer.clone();
        let outbox = self.outbox.clone();
        let mut engine = ScriptEngine::with_config(self.config.engine)
            .with_output(Box::new(ProgramOutput::new(outbox.clone())));
        info!(program = %launch.display_name, "starting traced program");
        let (started_tx, started_rx) = mpsc::channel();
        *self.started.lock() = Some(started_tx);
        self.runner = Some(thread::spawn(move || {
            let exit_code = match tracer.run_with(&mut engine, &launch.source, &launch.display_name)
            {
                Ok(RunOutcome::Completed(_)) => 0,
                Ok(RunOutcome::Aborted) => {
                    info!("program aborted by client");
                    0
                }
                Err(err) => {
                    let _ = outbox.output("stderr", format!("{err}\n"), None, None);
                    1
                }
            };
            let _ = outbox.emit("exited", Some(ExitedEventBody { exit_code }));
            let _ = outbox.emit::<Value>("terminated", None);
        }));
        // A terminate issued before the run resets the tracer would be lost.
        if started_rx.recv_timeout(STARTUP_TIMEOUT).is_err() {
            warn!("traced program did not report startup");
        }
    }

    pub(super) fn stop_runner(&mut self) {
        self.tracer.terminate();
        self.join_runner();
    }

    /// Let the program finish on its own: no breakpoint, step or exception
    /// may suspend it again.
    pub(super) fn detach_runner(&mut self) {
        self.tracer.clear_all_breakpoints();
        self.tracer.set_suspend_on_exception(false);
        if let Some(runner) = &self.runner {
            // A stop or step already in flight still suspends once.
            while !runner.is_finished() {
                if self.tracer.is_suspended() {
                    let _ = self.tracer.continue_run();
                }
                thread::sleep(DETACH_POLL);
            }
        }
        self.join_runner();
    }

    fn join_runner(&mut self) {
        if let Some(runner) = self.runner.take() {
            if runner.join().is_err() {
                warn!("traced program thread panicked");
            }
        }
    }
}

impl Drop for DebugAdapter {
    fn drop(&mut self) {
        self.stop_runner();
    }
}
