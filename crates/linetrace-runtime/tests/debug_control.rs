mod common;

use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use common::{
    channel_tracer, next_suspension, remaining_events, spawn_run, NESTED_CALLS, TIMEOUT,
    TWENTY_LINES,
};
use linetrace_runtime::debug::{
    Breakpoint, BridgeError, ControlOutcome, ControllerBridge, DebugLog, NullBridge,
    ResumeCommand, SuspendEvent, SuspendReason, TraceEvent, TracerPhase,
};
use linetrace_runtime::value::Value;
use linetrace_runtime::{RunOutcome, RuntimeError, ScriptEngine, Tracer, TracerConfig};

#[test]
fn breakpoint_suspends_exactly_once() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("a.py", 10));
    let handle = spawn_run(&tracer, TWENTY_LINES, "a.py");

    let stop = next_suspension(&rx);
    assert_eq!(stop.reason, SuspendReason::Breakpoint);
    assert_eq!((stop.file.as_str(), stop.line, stop.depth), ("a.py", 10, 1));
    let globals = &stop.stack.innermost().expect("module frame").locals;
    assert_eq!(globals.len(), 9);
    assert_eq!(globals.get("x9"), Some(&Value::Int(9)));

    assert_eq!(tracer.continue_run(), ControlOutcome::Applied);
    let outcome = handle.join().unwrap().unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(ref globals) if globals.len() == 20));
    assert_eq!(tracer.suspension_count(), 1);
    assert_eq!(
        remaining_events(&rx),
        vec![
            TraceEvent::Resumed(ResumeCommand::Continue),
            TraceEvent::Terminated
        ]
    );
}

#[test]
fn cleared_breakpoint_never_suspends() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("a.py", 4));
    assert!(tracer.clear_breakpoint("a.py", 4).is_some());
    assert!(tracer.breakpoints().is_empty());

    let outcome = spawn_run(&tracer, TWENTY_LINES, "a.py").join().unwrap();
    assert!(matches!(outcome, Ok(RunOutcome::Completed(_))));
    assert_eq!(
        remaining_events(&rx),
        vec![TraceEvent::Started, TraceEvent::Terminated]
    );
}

#[test]
fn resume_while_running_is_dropped() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    assert_eq!(tracer.resume(ResumeCommand::Continue), ControlOutcome::Ignored);
    assert_eq!(tracer.phase(), TracerPhase::Running);

    tracer.set_breakpoint(Breakpoint::new("a.py", 3));
    let handle = spawn_run(&tracer, TWENTY_LINES, "a.py");
    let stop = next_suspension(&rx);
    assert_eq!(stop.line, 3);

    // The dropped command must not release the suspension.
    thread::sleep(Duration::from_millis(50));
    assert!(tracer.is_suspended());

    tracer.continue_run();
    handle.join().unwrap().unwrap();
    assert_eq!(tracer.step_into(), ControlOutcome::Ignored);
}

#[test]
fn hit_count_suspends_on_nth_pass() {
    let source = "i = 0\nwhile i < 5\n  i = i + 1\nend\n";
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("loop.lt", 3).with_hit_count(3));
    let handle = spawn_run(&tracer, source, "loop.lt");

    let stop = next_suspension(&rx);
    assert_eq!(stop.line, 3);
    let locals = &stop.stack.frames()[0].locals;
    assert_eq!(locals.get("i"), Some(&Value::Int(2)));

    tracer.continue_run();
    handle.join().unwrap().unwrap();
    assert_eq!(tracer.suspension_count(), 1);
}

#[test]
fn temporary_breakpoint_suspends_once_in_loop() {
    let source = "i = 0\nwhile i < 3\n  i = i + 1\nend\n";
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("loop.lt", 3).temporary());
    let handle = spawn_run(&tracer, source, "loop.lt");

    next_suspension(&rx);
    assert!(tracer.breakpoints().is_empty());
    tracer.continue_run();
    handle.join().unwrap().unwrap();
    assert_eq!(tracer.suspension_count(), 1);
}

#[test]
fn condition_selects_iteration_and_errors_fail_open() {
    let source = "i = 0\nwhile i < 5\n  i = i + 1\nend\n";
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("loop.lt", 3).with_condition("i == 3"));
    tracer.set_breakpoint(Breakpoint::new("loop.lt", 1).with_condition("undefined_name > 0"));
    let handle = spawn_run(&tracer, source, "loop.lt");

    let first = next_suspension(&rx);
    assert_eq!(first.line, 1);
    tracer.continue_run();

    let second = next_suspension(&rx);
    assert_eq!(second.line, 3);
    assert_eq!(
        second.stack.frames()[0].locals.get("i"),
        Some(&Value::Int(3))
    );
    tracer.continue_run();
    handle.join().unwrap().unwrap();

    let logs: Vec<DebugLog> = rx
        .try_iter()
        .filter_map(|event| match event {
            TraceEvent::Log(log) => Some(log),
            _ => None,
        })
        .collect();
    assert!(logs.is_empty(), "logs are delivered before the suspension");
}

#[test]
fn condition_error_is_logged_before_suspension() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("a.py", 2).with_condition("1 +"));
    let handle = spawn_run(&tracer, TWENTY_LINES, "a.py");

    let mut log = None;
    loop {
        match rx.recv_timeout(TIMEOUT).unwrap() {
            TraceEvent::Log(entry) => log = Some(entry),
            TraceEvent::Suspended(stop) => {
                assert_eq!(stop.line, 2);
                break;
            }
            _ => {}
        }
    }
    let log = log.expect("condition warning");
    assert_eq!((log.file.as_str(), log.line), ("a.py", 2));
    assert!(log.message.contains("1 +"), "{}", log.message);

    tracer.continue_run();
    handle.join().unwrap().unwrap();
}

#[test]
fn quit_aborts_the_program() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("a.py", 5));
    let handle = spawn_run(&tracer, TWENTY_LINES, "a.py");

    next_suspension(&rx);
    assert_eq!(tracer.quit(), ControlOutcome::Applied);
    assert_eq!(handle.join().unwrap(), Ok(RunOutcome::Aborted));
    assert_eq!(tracer.phase(), TracerPhase::Terminated);
    assert_eq!(
        remaining_events(&rx),
        vec![
            TraceEvent::Resumed(ResumeCommand::Quit),
            TraceEvent::Terminated
        ]
    );
}

#[test]
fn terminate_releases_a_suspended_program() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("a.py", 5));
    let handle = spawn_run(&tracer, TWENTY_LINES, "a.py");

    next_suspension(&rx);
    tracer.terminate();
    assert_eq!(handle.join().unwrap(), Ok(RunOutcome::Aborted));
}

#[test]
fn exception_suspends_in_raising_frame() {
    let source = "def fail(n)\n  raise \"bad \" + str(n)\nend\nfail(7)\n";
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    let handle = spawn_run(&tracer, source, "err.lt");

    let stop = next_suspension(&rx);
    assert_eq!(stop.reason, SuspendReason::Exception);
    assert_eq!(stop.exception.as_deref(), Some("bad 7"));
    assert_eq!((stop.line, stop.depth), (2, 2));
    let names: Vec<&str> = stop.stack.iter().map(|frame| frame.name.as_str()).collect();
    assert_eq!(names, vec!["fail", "<module>"]);

    tracer.continue_run();
    assert_eq!(
        handle.join().unwrap(),
        Err(RuntimeError::Raised("bad 7".into()))
    );
    assert_eq!(tracer.suspension_count(), 1);
}

#[test]
fn exception_suspension_can_be_disabled() {
    let config = TracerConfig {
        suspend_on_exception: false,
        ..TracerConfig::default()
    };
    let (tracer, _rx) = channel_tracer(config);
    let result = spawn_run(&tracer, "raise \"stop\"\n", "err.lt").join().unwrap();
    assert_eq!(result, Err(RuntimeError::Raised("stop".into())));
    assert_eq!(tracer.suspension_count(), 0);
}

#[test]
fn stack_lists_innermost_frame_first() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("nested.lt", 2));
    let handle = spawn_run(&tracer, NESTED_CALLS, "nested.lt");

    let stop = next_suspension(&rx);
    assert_eq!(stop.depth, 3);
    expect_test::expect![[r#"
        nested.lt:2 in inner [n=1]
        nested.lt:6 in outer [n=1]
        nested.lt:9 in <module>
    "#]]
    .assert_eq(&stop.stack.to_string());

    tracer.continue_run();
    handle.join().unwrap().unwrap();
}

/// Bridge that resumes twice from inside the suspension callback.
#[derive(Default)]
struct EagerBridge {
    tracer: OnceLock<Tracer>,
    resumed: Mutex<Vec<ResumeCommand>>,
    suspensions: Mutex<Vec<u32>>,
}

impl ControllerBridge for EagerBridge {
    fn notify_suspended(&self, event: SuspendEvent) -> Result<(), BridgeError> {
        self.suspensions.lock().unwrap().push(event.line);
        let tracer = self.tracer.get().ok_or(BridgeError::Disconnected)?;
        assert_eq!(tracer.step_into(), ControlOutcome::Applied);
        assert_eq!(tracer.continue_run(), ControlOutcome::Applied);
        Ok(())
    }

    fn notify_log(&self, _log: DebugLog) {}

    fn notify_resumed(&self, command: ResumeCommand) {
        self.resumed.lock().unwrap().push(command);
    }
}

#[test]
fn last_command_before_wake_wins() {
    let bridge = Arc::new(EagerBridge::default());
    let tracer = Tracer::new(bridge.clone());
    assert!(bridge.tracer.set(tracer.clone()).is_ok());
    tracer.set_breakpoint(Breakpoint::new("a.py", 2));

    let mut engine = ScriptEngine::new().with_output(Box::new(std::io::sink()));
    let outcome = tracer.run_with(&mut engine, TWENTY_LINES, "a.py").unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));

    assert_eq!(*bridge.suspensions.lock().unwrap(), vec![2]);
    assert_eq!(
        *bridge.resumed.lock().unwrap(),
        vec![ResumeCommand::Continue]
    );
}

/// Function reading a module global, called twice.
const GLOBAL_LIMIT: &str = "\
limit = 5
def f(n)
  x = n + limit
  return x
end
a = f(1)
b = f(10)
";

#[test]
fn condition_sees_module_globals_inside_functions() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("limit.lt", 3).with_condition("n + limit > 10"));
    let handle = spawn_run(&tracer, GLOBAL_LIMIT, "limit.lt");

    let stop = loop {
        match rx.recv_timeout(TIMEOUT).expect("suspension") {
            TraceEvent::Suspended(stop) => break stop,
            TraceEvent::Log(log) => panic!("unexpected log: {}", log.message),
            _ => {}
        }
    };
    assert_eq!((stop.line, stop.depth), (3, 2));
    let locals = &stop.stack.innermost().expect("function frame").locals;
    assert_eq!(locals.get("n"), Some(&Value::Int(10)));

    tracer.continue_run();
    handle.join().unwrap().unwrap();
    assert_eq!(tracer.suspension_count(), 1);
}

#[test]
fn false_condition_over_global_never_stops() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("limit.lt", 3).with_condition("limit < 0"));

    let outcome = spawn_run(&tracer, GLOBAL_LIMIT, "limit.lt").join().unwrap();
    assert!(matches!(outcome, Ok(RunOutcome::Completed(_))));
    assert_eq!(tracer.suspension_count(), 0);
    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![TraceEvent::Started, TraceEvent::Terminated]
    );
}

#[test]
fn unreachable_controller_lets_program_finish() {
    let tracer = Tracer::new(Arc::new(NullBridge));
    tracer.set_breakpoint(Breakpoint::new("a.py", 5));

    let (tx, rx) = std::sync::mpsc::channel();
    let run = tracer.clone();
    thread::spawn(move || {
        let mut engine = ScriptEngine::new().with_output(Box::new(std::io::sink()));
        let _ = tx.send(run.run_with(&mut engine, TWENTY_LINES, "a.py"));
    });

    let outcome = rx.recv_timeout(TIMEOUT).expect("run finished");
    assert!(matches!(outcome, Ok(RunOutcome::Completed(ref globals)) if globals.len() == 20));
    assert_eq!(tracer.suspension_count(), 1);
    assert_eq!(tracer.phase(), TracerPhase::Terminated);
}
