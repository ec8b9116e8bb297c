//! Evaluator entry point.

#![allow(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::debug::{ExecutionObserver, TraceAction};
use crate::error::RuntimeError;
use crate::memory::{Frame, Locals};
use crate::script::{parse_expression, Program};
use crate::value::Value;

pub mod expr;
pub mod ops;
pub mod stmt;

use self::expr::{eval_expr, Expr, LocalsScope, Scope};
use self::stmt::{FunctionDef, StmtResult};

/// Name of the frame that runs code passed to `exec`.
pub const EXEC_FRAME_NAME: &str = "<exec>";

/// Tree-walking interpreter that reports execution events to an observer.
pub struct Interpreter<'o> {
    pub(crate) functions: IndexMap<SmolStr, Arc<FunctionDef>>,
    pub(crate) observer: &'o mut dyn ExecutionObserver,
    pub(crate) output: &'o mut dyn Write,
    pub(crate) exec_count: u32,
    max_call_depth: u32,
    call_depth: u32,
    exception_reported: bool,
}

impl<'o> Interpreter<'o> {
    pub fn new(
        observer: &'o mut dyn ExecutionObserver,
        output: &'o mut dyn Write,
        max_call_depth: u32,
    ) -> Self {
        Self {
            functions: IndexMap::new(),
            observer,
            output,
            exec_count: 0,
            max_call_depth,
            call_depth: 0,
            exception_reported: false,
        }
    }

    /// Run a compiled module and return its globals.
    pub fn run_module(&mut self, program: &Program) -> Result<Locals, RuntimeError> {
        let mut frame = Frame::module(program.name.clone());
        self.enter(&frame)?;
        let result = self.exec_block(&mut frame, &program.body);
        let left = self.leave(&frame);
        result?;
        left?;
        Ok(frame.locals)
    }

    /// Run code compiled from a string in a frame called from `caller`.
    pub(crate) fn run_dynamic(
        &mut self,
        caller: &Frame<'_>,
        program: &Program,
    ) -> Result<(), RuntimeError> {
        let mut frame = Frame::call(program.name.clone(), EXEC_FRAME_NAME, 0, caller);
        self.nested(&mut frame, |interp, frame| {
            interp.exec_block(frame, &program.body)
        })
        .map(|_| ())
    }

    /// Call a builtin or user-defined function.
    pub fn call_function(
        &mut self,
        caller: &Frame<'_>,
        name: &SmolStr,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if let Some(result) = call_builtin(name, &args) {
            return result;
        }
        let def = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedFunction(name.clone()))?;
        if def.params.len() != args.len() {
            return Err(RuntimeError::InvalidArgumentCount {
                name: name.clone(),
                expected: def.params.len(),
                got: args.len(),
            });
        }
        let mut frame = Frame::call(def.source.clone(), def.name.clone(), def.line, caller);
        for (param, value) in def.params.iter().zip(args) {
            frame.set_local(param.clone(), value);
        }
        match self.nested(&mut frame, |interp, frame| {
            interp.exec_block(frame, &def.body)
        })? {
            StmtResult::Return(value) => Ok(value),
            StmtResult::Continue => Ok(Value::None),
        }
    }

    pub fn eval(&mut self, frame: &Frame<'_>, expr: &Expr) -> Result<Value, RuntimeError> {
        let mut scope = FrameScope {
            interp: self,
            frame,
        };
        eval_expr(&mut scope, expr)
    }

    fn nested(
        &mut self,
        frame: &mut Frame<'_>,
        body: impl FnOnce(&mut Self, &mut Frame<'_>) -> Result<StmtResult, RuntimeError>,
    ) -> Result<StmtResult, RuntimeError> {
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded(self.max_call_depth));
        }
        self.enter(frame)?;
        self.call_depth += 1;
        let result = body(self, frame);
        self.call_depth -= 1;
        let left = self.leave(frame);
        let result = result?;
        left?;
        Ok(result)
    }

    fn enter(&mut self, frame: &Frame<'_>) -> Result<(), RuntimeError> {
        check(self.observer.on_call(frame))
    }

    fn leave(&mut self, frame: &Frame<'_>) -> Result<(), RuntimeError> {
        check(self.observer.on_return(frame))
    }

    pub(crate) fn line_event(&mut self, frame: &Frame<'_>) -> Result<(), RuntimeError> {
        check(self.observer.on_line(frame))
    }

    /// Report an error once, at the innermost frame the observer accepts.
    pub(crate) fn exception_event(
        &mut self,
        frame: &Frame<'_>,
        err: &RuntimeError,
    ) -> Result<(), RuntimeError> {
        if self.exception_reported
            || matches!(err, RuntimeError::Aborted)
            || !self.observer.reports_exception_in(frame)
        {
            return Ok(());
        }
        self.exception_reported = true;
        check(self.observer.on_exception(frame, err))
    }
}

struct FrameScope<'i, 'o, 'f> {
    interp: &'i mut Interpreter<'o>,
    frame: &'f Frame<'f>,
}

impl Scope for FrameScope<'_, '_, '_> {
    fn read(&self, name: &str) -> Result<Value, RuntimeError> {
        self.frame
            .lookup(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(SmolStr::new(name)))
    }

    fn call(&mut self, name: &SmolStr, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.interp.call_function(self.frame, name, args)
    }
}

fn check(action: TraceAction) -> Result<(), RuntimeError> {
    match action {
        TraceAction::Continue => Ok(()),
        TraceAction::Abort => Err(RuntimeError::Aborted),
    }
}

fn call_builtin(name: &str, args: &[Value]) -> Option<Result<Value, RuntimeError>> {
    let expect_one = |args: &[Value]| -> Result<Value, RuntimeError> {
        match args {
            [value] => Ok(value.clone()),
            _ => Err(RuntimeError::InvalidArgumentCount {
                name: SmolStr::new(name),
                expected: 1,
                got: args.len(),
            }),
        }
    };
    let result = match name {
        "len" => expect_one(args).and_then(|value| match value {
            Value::Str(text) => i64::try_from(text.chars().count())
                .map(Value::Int)
                .map_err(|_| RuntimeError::Overflow),
            other => Err(RuntimeError::UnaryTypeMismatch {
                op: "len",
                operand: other.type_name(),
            }),
        }),
        "str" => expect_one(args).map(|value| Value::Str(SmolStr::new(value.to_string()))),
        "int" => expect_one(args).and_then(|value| match value {
            Value::Int(value) => Ok(Value::Int(value)),
            Value::Bool(value) => Ok(Value::Int(i64::from(value))),
            Value::Str(text) => text
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| RuntimeError::Raised(format!("invalid int literal {text:?}").into())),
            Value::None => Err(RuntimeError::UnaryTypeMismatch {
                op: "int",
                operand: "none",
            }),
        }),
        _ => return None,
    };
    Some(result)
}

/// Evaluate a breakpoint condition against the names visible in a frame.
///
/// Calls are rejected, so evaluation never re-enters the traced program.
pub fn evaluate_condition(condition: &str, locals: &Locals) -> Result<bool, RuntimeError> {
    let expr = parse_expression(condition)?;
    let value = eval_expr(&mut LocalsScope::new(locals), &expr)?;
    Ok(value.is_truthy())
}
