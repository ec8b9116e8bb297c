//! Runtime errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

/// Syntax error reported while compiling a script or condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name}:{line}: {message}")]
pub struct ParseError {
    /// Display name of the source being compiled.
    pub source_name: SmolStr,
    /// 1-based line of the offending token.
    pub line: u32,
    pub message: SmolStr,
}

impl ParseError {
    pub(crate) fn new(source_name: &str, line: u32, message: impl Into<SmolStr>) -> Self {
        Self {
            source_name: SmolStr::new(source_name),
            line,
            message: message.into(),
        }
    }
}

/// Runtime errors for evaluation and execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Undefined variable or name.
    #[error("undefined variable '{0}'")]
    UndefinedVariable(SmolStr),

    /// Undefined function by name.
    #[error("undefined function '{0}'")]
    UndefinedFunction(SmolStr),

    /// Operand types not supported by an operator.
    #[error("unsupported operand types for {op}: {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// Operand type not supported by a unary operator.
    #[error("bad operand type for {op}: {operand}")]
    UnaryTypeMismatch {
        op: &'static str,
        operand: &'static str,
    },

    /// Invalid argument count for a function call.
    #[error("'{name}' expects {expected} argument(s), got {got}")]
    InvalidArgumentCount {
        name: SmolStr,
        expected: usize,
        got: usize,
    },

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Modulo by zero.
    #[error("modulo by zero")]
    ModuloByZero,

    /// Arithmetic overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Exception raised by the script.
    #[error("{0}")]
    Raised(SmolStr),

    /// Calls are not allowed in the current evaluation scope.
    #[error("call to '{0}' not permitted here")]
    CallNotPermitted(SmolStr),

    /// Call nesting exceeded the configured limit.
    #[error("maximum call depth {0} exceeded")]
    CallDepthExceeded(u32),

    /// Local variables could not be read from a frame.
    #[error("locals unavailable for frame '{0}'")]
    LocalsUnavailable(SmolStr),

    /// Script failed to compile.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The controller ended the debug session.
    #[error("debug session aborted by user")]
    Aborted,

    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(SmolStr),

    /// I/O failure while loading configuration or writing output.
    #[error("i/o error: {0}")]
    Io(SmolStr),
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(SmolStr::new(err.to_string()))
    }
}
