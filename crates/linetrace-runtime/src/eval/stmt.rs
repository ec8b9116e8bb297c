//! Statement AST and execution.

#![allow(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::memory::Frame;
use crate::script::compile;
use crate::value::Value;

use super::expr::Expr;
use super::Interpreter;

/// Statement execution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtResult {
    Continue,
    Return(Value),
}

/// Function definition created by a `def` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: SmolStr,
    pub params: Vec<SmolStr>,
    pub body: Vec<Stmt>,
    /// Display name of the source the function was compiled from.
    pub source: SmolStr,
    /// Line of the `def` header.
    pub line: u32,
}

/// Statement node. Every statement records its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        target: SmolStr,
        value: Expr,
        line: u32,
    },
    Expr {
        expr: Expr,
        line: u32,
    },
    Print {
        expr: Option<Expr>,
        line: u32,
    },
    Def {
        def: Arc<FunctionDef>,
        line: u32,
    },
    Return {
        expr: Option<Expr>,
        line: u32,
    },
    If {
        condition: Expr,
        then_block: Vec<Stmt>,
        else_block: Vec<Stmt>,
        line: u32,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        line: u32,
    },
    Raise {
        expr: Expr,
        line: u32,
    },
    Exec {
        expr: Expr,
        line: u32,
    },
}

impl Stmt {
    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            Stmt::Assign { line, .. }
            | Stmt::Expr { line, .. }
            | Stmt::Print { line, .. }
            | Stmt::Def { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::Raise { line, .. }
            | Stmt::Exec { line, .. } => *line,
        }
    }
}

impl Interpreter<'_> {
    /// Execute statements in order until one returns.
    pub fn exec_block(
        &mut self,
        frame: &mut Frame<'_>,
        body: &[Stmt],
    ) -> Result<StmtResult, RuntimeError> {
        for stmt in body {
            if let StmtResult::Return(value) = self.exec_stmt(frame, stmt)? {
                return Ok(StmtResult::Return(value));
            }
        }
        Ok(StmtResult::Continue)
    }

    /// Execute one statement, emitting its line event first.
    pub fn exec_stmt(
        &mut self,
        frame: &mut Frame<'_>,
        stmt: &Stmt,
    ) -> Result<StmtResult, RuntimeError> {
        frame.line = stmt.line();
        self.line_event(frame)?;
        let result = self.exec_stmt_inner(frame, stmt);
        if let Err(err) = &result {
            self.exception_event(frame, err)?;
        }
        result
    }

    fn exec_stmt_inner(
        &mut self,
        frame: &mut Frame<'_>,
        stmt: &Stmt,
    ) -> Result<StmtResult, RuntimeError> {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                let value = self.eval(frame, value)?;
                frame.set_local(target.clone(), value);
                Ok(StmtResult::Continue)
            }
            Stmt::Expr { expr, .. } => {
                let _ = self.eval(frame, expr)?;
                Ok(StmtResult::Continue)
            }
            Stmt::Print { expr, .. } => {
                let text = match expr {
                    Some(expr) => self.eval(frame, expr)?.to_string(),
                    None => String::new(),
                };
                writeln!(self.output, "{text}")?;
                Ok(StmtResult::Continue)
            }
            Stmt::Def { def, .. } => {
                self.functions.insert(def.name.clone(), Arc::clone(def));
                Ok(StmtResult::Continue)
            }
            Stmt::Return { expr, .. } => {
                let value = match expr {
                    Some(expr) => self.eval(frame, expr)?,
                    None => Value::None,
                };
                Ok(StmtResult::Return(value))
            }
            Stmt::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                if self.eval(frame, condition)?.is_truthy() {
                    self.exec_block(frame, then_block)
                } else {
                    self.exec_block(frame, else_block)
                }
            }
            Stmt::While {
                condition,
                body,
                line,
            } => loop {
                if !self.eval(frame, condition)?.is_truthy() {
                    return Ok(StmtResult::Continue);
                }
                if let StmtResult::Return(value) = self.exec_block(frame, body)? {
                    return Ok(StmtResult::Return(value));
                }
                frame.line = *line;
                self.line_event(frame)?;
            },
            Stmt::Raise { expr, .. } => {
                let value = self.eval(frame, expr)?;
                Err(RuntimeError::Raised(SmolStr::new(value.to_string())))
            }
            Stmt::Exec { expr, .. } => {
                let code = self.eval(frame, expr)?;
                let Value::Str(code) = code else {
                    return Err(RuntimeError::UnaryTypeMismatch {
                        op: "exec",
                        operand: code.type_name(),
                    });
                };
                self.exec_count += 1;
                let name = format!("<exec:{}>", self.exec_count);
                let program = compile(&code, &name)?;
                self.run_dynamic(frame, &program)?;
                Ok(StmtResult::Continue)
            }
        }
    }
}
