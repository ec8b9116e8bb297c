//! Expression AST and evaluation.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::memory::Locals;
use crate::value::Value;

use super::ops::{apply_binary, apply_unary, BinaryOp, UnaryOp};

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(SmolStr),
    Call {
        name: SmolStr,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Name resolution and call dispatch for expression evaluation.
pub trait Scope {
    fn read(&self, name: &str) -> Result<Value, RuntimeError>;

    fn call(&mut self, name: &SmolStr, args: Vec<Value>) -> Result<Value, RuntimeError>;
}

/// Read-only scope over a copied set of locals. Calls are rejected.
#[derive(Debug, Clone, Copy)]
pub struct LocalsScope<'a> {
    locals: &'a Locals,
}

impl<'a> LocalsScope<'a> {
    #[must_use]
    pub fn new(locals: &'a Locals) -> Self {
        Self { locals }
    }
}

impl Scope for LocalsScope<'_> {
    fn read(&self, name: &str) -> Result<Value, RuntimeError> {
        self.locals
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(SmolStr::new(name)))
    }

    fn call(&mut self, name: &SmolStr, _args: Vec<Value>) -> Result<Value, RuntimeError> {
        Err(RuntimeError::CallNotPermitted(name.clone()))
    }
}

/// Evaluate an expression to a runtime value.
pub fn eval_expr(scope: &mut dyn Scope, expr: &Expr) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => scope.read(name),
        Expr::Call { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(scope, arg)?);
            }
            scope.call(name, values)
        }
        Expr::Unary { op, expr } => {
            let value = eval_expr(scope, expr)?;
            apply_unary(*op, value)
        }
        Expr::Binary {
            op: op @ (BinaryOp::And | BinaryOp::Or),
            left,
            right,
        } => {
            let left = eval_expr(scope, left)?;
            let short_circuit = match op {
                BinaryOp::And => !left.is_truthy(),
                _ => left.is_truthy(),
            };
            if short_circuit {
                return Ok(left);
            }
            eval_expr(scope, right)
        }
        Expr::Binary { op, left, right } => {
            let left = eval_expr(scope, left)?;
            let right = eval_expr(scope, right)?;
            apply_binary(*op, left, right)
        }
    }
}
