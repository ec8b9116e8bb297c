//! Script lexer, parser, and engine.

use std::io::Write;

use smol_str::SmolStr;

use crate::config::EngineConfig;
use crate::debug::{ExecutionObserver, NoopObserver};
use crate::error::{ParseError, RuntimeError};
use crate::eval::expr::Expr;
use crate::eval::stmt::Stmt;
use crate::eval::Interpreter;
use crate::memory::Locals;

pub mod lexer;
mod parser;

use self::parser::Parser;

/// Source name used when compiling breakpoint conditions.
const CONDITION_SOURCE: &str = "<condition>";

/// A compiled script.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Display name the program was compiled under.
    pub name: SmolStr,
    /// Top-level statements.
    pub body: Vec<Stmt>,
}

/// Compile `source` into a program named `name`.
pub fn compile(source: &str, name: &str) -> Result<Program, ParseError> {
    let body = Parser::new(source, name).parse_program()?;
    Ok(Program {
        name: SmolStr::new(name),
        body,
    })
}

/// Parse a standalone expression, as used by breakpoint conditions.
pub fn parse_expression(text: &str) -> Result<Expr, ParseError> {
    Parser::new(text, CONDITION_SOURCE).parse_standalone_expr()
}

/// How a traced run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The program ran to completion; carries its final globals.
    Completed(Locals),
    /// The controller quit the session before the program finished.
    Aborted,
}

/// Compiles and executes scripts, reporting execution to an observer.
pub struct ScriptEngine {
    config: EngineConfig,
    output: Box<dyn Write + Send>,
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine {
    /// Engine with default limits printing to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            output: Box::new(std::io::stdout()),
        }
    }

    /// Redirect `print` output.
    #[must_use]
    pub fn with_output(mut self, output: Box<dyn Write + Send>) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Run without tracing.
    pub fn run(&mut self, source: &str, name: &str) -> Result<Locals, RuntimeError> {
        self.run_traced(source, name, &mut NoopObserver)
    }

    /// Compile and run `source`, reporting every call, line, return and
    /// exception to `observer`. `on_terminate` is always the last
    /// notification, even when compilation fails.
    pub fn run_traced(
        &mut self,
        source: &str,
        name: &str,
        observer: &mut dyn ExecutionObserver,
    ) -> Result<Locals, RuntimeError> {
        let result = match compile(source, name) {
            Ok(program) => {
                tracing::debug!(name, statements = program.body.len(), "running script");
                let mut interp =
                    Interpreter::new(observer, &mut *self.output, self.config.max_call_depth);
                interp.run_module(&program)
            }
            Err(err) => Err(err.into()),
        };
        let flushed = self.output.flush();
        observer.on_terminate();
        let globals = result?;
        flushed?;
        Ok(globals)
    }
}
