#![allow(dead_code)]

use std::io;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use linetrace_runtime::debug::{ChannelBridge, SuspendEvent, TraceEvent};
use linetrace_runtime::{RunOutcome, RuntimeError, ScriptEngine, Tracer, TracerConfig};

pub const TIMEOUT: Duration = Duration::from_millis(1000);

pub fn channel_tracer(config: TracerConfig) -> (Tracer, Receiver<TraceEvent>) {
    let (bridge, rx) = ChannelBridge::new();
    (Tracer::with_config(Arc::new(bridge), config), rx)
}

pub fn spawn_run(
    tracer: &Tracer,
    source: &'static str,
    name: &'static str,
) -> JoinHandle<Result<RunOutcome, RuntimeError>> {
    let tracer = tracer.clone();
    thread::spawn(move || {
        let mut engine = ScriptEngine::new().with_output(Box::new(io::sink()));
        tracer.run_with(&mut engine, source, name)
    })
}

pub fn next_suspension(rx: &Receiver<TraceEvent>) -> SuspendEvent {
    loop {
        match rx.recv_timeout(TIMEOUT) {
            Ok(TraceEvent::Suspended(event)) => return event,
            Ok(TraceEvent::Terminated) => panic!("program terminated before suspending"),
            Ok(_) => {}
            Err(err) => panic!("no suspension: {err}"),
        }
    }
}

/// Events left after the run finished, without logs.
pub fn remaining_events(rx: &Receiver<TraceEvent>) -> Vec<TraceEvent> {
    rx.try_iter()
        .filter(|event| !matches!(event, TraceEvent::Log(_)))
        .collect()
}

/// `x1 = 1` through `x20 = 20`, one statement per line.
pub const TWENTY_LINES: &str = "x1 = 1\nx2 = 2\nx3 = 3\nx4 = 4\nx5 = 5\nx6 = 6\nx7 = 7\nx8 = 8\nx9 = 9\nx10 = 10\nx11 = 11\nx12 = 12\nx13 = 13\nx14 = 14\nx15 = 15\nx16 = 16\nx17 = 17\nx18 = 18\nx19 = 19\nx20 = 20\n";

/// Two nested functions called from module line 9.
pub const NESTED_CALLS: &str = "\
def inner(n)
  x = n + 1
  return x
end
def outer(n)
  y = inner(n)
  return y * 2
end
a = outer(1)
b = a + 1
";
