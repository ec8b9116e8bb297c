//! Operator implementations.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::value::Value;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Binary operators. `And`/`Or` short-circuit and are handled by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

pub fn apply_unary(op: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Neg => match value {
            Value::Int(v) => v.checked_neg().map(Value::Int).ok_or(RuntimeError::Overflow),
            other => Err(RuntimeError::UnaryTypeMismatch {
                op: "-",
                operand: other.type_name(),
            }),
        },
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
    }
}

pub fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::And => Ok(if left.is_truthy() { right } else { left }),
        BinaryOp::Or => Ok(if left.is_truthy() { left } else { right }),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, &left, &right),
        BinaryOp::Add => match (left, right) {
            (Value::Str(a), Value::Str(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(&a);
                joined.push_str(&b);
                Ok(Value::Str(SmolStr::new(joined)))
            }
            (left, right) => int_arith(op, &left, &right),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            int_arith(op, &left, &right)
        }
    }
}

fn int_arith(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let (Value::Int(a), Value::Int(b)) = (left, right) else {
        return Err(mismatch(op, left, right));
    };
    let (a, b) = (*a, *b);
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            a.checked_div_euclid(b)
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(RuntimeError::ModuloByZero);
            }
            a.checked_rem_euclid(b)
        }
        _ => return Err(mismatch(op, left, right)),
    };
    result.map(Value::Int).ok_or(RuntimeError::Overflow)
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => return Err(mismatch(op, left, right)),
    };
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => return Err(mismatch(op, left, right)),
    };
    Ok(Value::Bool(result))
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_division_floors_and_rejects_zero() {
        assert_eq!(
            apply_binary(BinaryOp::Div, Value::Int(-7), Value::Int(2)),
            Ok(Value::Int(-4))
        );
        assert_eq!(
            apply_binary(BinaryOp::Div, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::DivisionByZero)
        );
        assert_eq!(
            apply_binary(BinaryOp::Mod, Value::Int(1), Value::Int(0)),
            Err(RuntimeError::ModuloByZero)
        );
    }

    #[test]
    fn mixed_operands_report_both_types() {
        let err = apply_binary(BinaryOp::Sub, Value::from("a"), Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "unsupported operand types for -: str and int");
    }

    #[test]
    fn overflow_is_an_error() {
        assert_eq!(
            apply_binary(BinaryOp::Add, Value::Int(i64::MAX), Value::Int(1)),
            Err(RuntimeError::Overflow)
        );
        assert_eq!(
            apply_unary(UnaryOp::Neg, Value::Int(i64::MIN)),
            Err(RuntimeError::Overflow)
        );
    }
}
