mod common;

use common::{channel_tracer, next_suspension, remaining_events, spawn_run, NESTED_CALLS};
use linetrace_runtime::debug::{Breakpoint, ResumeCommand, SuspendReason, TraceEvent};
use linetrace_runtime::{RuntimeError, TracerConfig};

#[test]
fn step_into_enters_callee() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("nested.lt", 9));
    let handle = spawn_run(&tracer, NESTED_CALLS, "nested.lt");

    let stop = next_suspension(&rx);
    assert_eq!((stop.line, stop.depth), (9, 1));

    tracer.step_into();
    let step = next_suspension(&rx);
    assert_eq!(step.reason, SuspendReason::Step);
    assert_eq!((step.line, step.depth), (6, 2));
    assert_eq!(step.stack.innermost().map(|frame| frame.name.as_str()), Some("outer"));

    tracer.step_into();
    let step = next_suspension(&rx);
    assert_eq!((step.line, step.depth), (2, 3));

    tracer.continue_run();
    handle.join().unwrap().unwrap();
}

#[test]
fn step_over_never_stops_deeper() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("nested.lt", 6));
    let handle = spawn_run(&tracer, NESTED_CALLS, "nested.lt");

    let stop = next_suspension(&rx);
    assert_eq!((stop.line, stop.depth), (6, 2));

    let mut visited = Vec::new();
    for _ in 0..2 {
        tracer.step_over();
        let step = next_suspension(&rx);
        assert!(step.depth <= 2, "stopped deeper at line {}", step.line);
        visited.push((step.line, step.depth));
    }
    assert_eq!(visited, vec![(7, 2), (10, 1)]);

    tracer.step_over();
    handle.join().unwrap().unwrap();
    assert_eq!(tracer.suspension_count(), 3);
}

#[test]
fn step_out_stops_in_caller() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("nested.lt", 2));
    let handle = spawn_run(&tracer, NESTED_CALLS, "nested.lt");

    let stop = next_suspension(&rx);
    assert_eq!(stop.depth, 3);

    tracer.step_out();
    let step = next_suspension(&rx);
    assert_eq!((step.line, step.depth), (7, 2));
    assert_eq!(
        step.stack.frames()[0].locals.get("y"),
        Some(&linetrace_runtime::value::Value::Int(2))
    );

    tracer.step_out();
    let step = next_suspension(&rx);
    assert_eq!((step.line, step.depth), (10, 1));

    tracer.continue_run();
    handle.join().unwrap().unwrap();
}

#[test]
fn explicit_target_depth_overrides_suspension_depth() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("nested.lt", 2));
    let handle = spawn_run(&tracer, NESTED_CALLS, "nested.lt");

    next_suspension(&rx);
    tracer.resume(ResumeCommand::StepOut(Some(2)));
    let step = next_suspension(&rx);
    assert_eq!((step.line, step.depth), (10, 1));

    tracer.continue_run();
    handle.join().unwrap().unwrap();
}

#[test]
fn step_into_skips_hidden_dynamic_code() {
    let source = "exec \"y = 1\\nz = 2\"\nw = 3\n";
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("dyn.lt", 1));
    let handle = spawn_run(&tracer, source, "dyn.lt");

    next_suspension(&rx);
    tracer.step_into();
    let step = next_suspension(&rx);
    assert_eq!((step.file.as_str(), step.line), ("dyn.lt", 2));

    tracer.continue_run();
    handle.join().unwrap().unwrap();
}

#[test]
fn step_into_shows_dynamic_code_when_enabled() {
    let source = "exec \"y = 1\\nz = 2\"\nw = 3\n";
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_show_dynamic_code(true);
    tracer.set_breakpoint(Breakpoint::new("dyn.lt", 1));
    let handle = spawn_run(&tracer, source, "dyn.lt");

    next_suspension(&rx);
    tracer.step_into();
    let step = next_suspension(&rx);
    assert_eq!((step.file.as_str(), step.line, step.depth), ("<exec:1>", 1, 2));
    let names: Vec<&str> = step.stack.iter().map(|frame| frame.name.as_str()).collect();
    assert_eq!(names, vec!["<exec>", "<module>"]);

    tracer.continue_run();
    handle.join().unwrap().unwrap();
}

#[test]
fn continue_clears_pending_step() {
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_breakpoint(Breakpoint::new("nested.lt", 9));
    let handle = spawn_run(&tracer, NESTED_CALLS, "nested.lt");

    next_suspension(&rx);
    tracer.step_into();
    next_suspension(&rx);
    tracer.continue_run();
    handle.join().unwrap().unwrap();

    let events = remaining_events(&rx);
    assert_eq!(events.last(), Some(&TraceEvent::Terminated));
    assert!(!events
        .iter()
        .any(|event| matches!(event, TraceEvent::Suspended(_))));
}

#[test]
fn error_in_hidden_dynamic_code_stops_at_exec_line() {
    let source = "x = 1\nexec \"y = missing\"\nz = 3\n";
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    let handle = spawn_run(&tracer, source, "dyn.lt");

    let stop = next_suspension(&rx);
    assert_eq!(stop.reason, SuspendReason::Exception);
    assert_eq!((stop.file.as_str(), stop.line, stop.depth), ("dyn.lt", 2, 1));
    assert_eq!(stop.exception.as_deref(), Some("undefined variable 'missing'"));
    let names: Vec<&str> = stop.stack.iter().map(|frame| frame.name.as_str()).collect();
    assert_eq!(names, vec!["<module>"]);

    tracer.continue_run();
    assert_eq!(
        handle.join().unwrap(),
        Err(RuntimeError::UndefinedVariable("missing".into()))
    );
    assert_eq!(tracer.suspension_count(), 1);
}

#[test]
fn error_in_shown_dynamic_code_stops_inside_it() {
    let source = "x = 1\nexec \"y = missing\"\nz = 3\n";
    let (tracer, rx) = channel_tracer(TracerConfig::default());
    tracer.set_show_dynamic_code(true);
    let handle = spawn_run(&tracer, source, "dyn.lt");

    let stop = next_suspension(&rx);
    assert_eq!((stop.file.as_str(), stop.line, stop.depth), ("<exec:1>", 1, 2));

    tracer.continue_run();
    assert!(handle.join().unwrap().is_err());
    assert_eq!(tracer.suspension_count(), 1);
}
