//! Binary and unary operator evaluation.

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::value::Value;
use crate::span::Span;

use super::{Interpreter, RuntimeResult};

impl Interpreter {
    /// Evaluate a binary expression. Both operands evaluate eagerly,
    /// left to right; dispatch is by operand kinds.
    pub(crate) fn evaluate_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        span: Span,
    ) -> RuntimeResult<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        apply_binary(&left, op, &right, span)
    }

    /// `++`/`--`: the target must be an identifier bound to a number.
    /// Mutates the binding by ±1; prefix returns the new value, postfix
    /// the old.
    pub(crate) fn evaluate_unary(
        &mut self,
        operand: &Expr,
        op: UnaryOp,
        prefix: bool,
        span: Span,
    ) -> RuntimeResult<Value> {
        let ExprKind::Identifier(name) = &operand.kind else {
            return Err(RuntimeError::type_error(
                "increment/decrement target must be an identifier",
                span,
            ));
        };

        let current = self
            .environment
            .borrow()
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone(), span))?;
        let Value::Number(old) = current else {
            return Err(RuntimeError::type_error(
                "increment/decrement requires numeric variable",
                span,
            ));
        };

        let new = match op {
            UnaryOp::Increment => old + 1.0,
            UnaryOp::Decrement => old - 1.0,
        };
        self.assign(name, Value::Number(new), span)?;

        Ok(Value::Number(if prefix { new } else { old }))
    }
}

/// Operator dispatch over already-evaluated operands. Shared by the AST
/// evaluator; the VM implements the numeric and string fast paths with
/// identical results.
pub(crate) fn apply_binary(
    left: &Value,
    op: BinaryOp,
    right: &Value,
    span: Span,
) -> RuntimeResult<Value> {
    // Both numbers: arithmetic and comparisons.
    if let (Value::Number(a), Value::Number(b)) = (left, right) {
        match op {
            BinaryOp::Add => return Ok(Value::Number(a + b)),
            BinaryOp::Subtract => return Ok(Value::Number(a - b)),
            BinaryOp::Multiply => return Ok(Value::Number(a * b)),
            BinaryOp::Divide => {
                if *b == 0.0 {
                    return Err(RuntimeError::DivisionByZero(span));
                }
                return Ok(Value::Number(a / b));
            }
            BinaryOp::Modulo => {
                // Both operands truncate to integer before the modulo.
                if (*b as i64) == 0 {
                    return Err(RuntimeError::ModuloByZero(span));
                }
                return Ok(Value::Number(((*a as i64) % (*b as i64)) as f64));
            }
            BinaryOp::Equal => return Ok(Value::Bool(a == b)),
            BinaryOp::NotEqual => return Ok(Value::Bool(a != b)),
            BinaryOp::Less => return Ok(Value::Bool(a < b)),
            BinaryOp::LessEqual => return Ok(Value::Bool(a <= b)),
            BinaryOp::Greater => return Ok(Value::Bool(a > b)),
            BinaryOp::GreaterEqual => return Ok(Value::Bool(a >= b)),
            BinaryOp::And | BinaryOp::Or => {}
        }
    }

    // Both booleans: logic and equality.
    if let (Value::Bool(a), Value::Bool(b)) = (left, right) {
        match op {
            BinaryOp::And => return Ok(Value::Bool(*a && *b)),
            BinaryOp::Or => return Ok(Value::Bool(*a || *b)),
            BinaryOp::Equal => return Ok(Value::Bool(a == b)),
            BinaryOp::NotEqual => return Ok(Value::Bool(a != b)),
            _ => {}
        }
    }

    // Left string: concatenation and equality.
    if let Value::String(a) = left {
        if let Value::String(b) = right {
            match op {
                BinaryOp::Add => return Ok(Value::String(format!("{}{}", a, b))),
                BinaryOp::Equal => return Ok(Value::Bool(a == b)),
                BinaryOp::NotEqual => return Ok(Value::Bool(a != b)),
                _ => {
                    return Err(RuntimeError::type_error(
                        format!("unknown operator {} for string operands", op),
                        span,
                    ))
                }
            }
        } else if op == BinaryOp::Add {
            return Ok(Value::String(format!("{}{}", a, right)));
        }
    }

    // Null compares by null-identity.
    if matches!(left, Value::Null) || matches!(right, Value::Null) {
        let both_null = matches!(left, Value::Null) && matches!(right, Value::Null);
        match op {
            BinaryOp::Equal => return Ok(Value::Bool(both_null)),
            BinaryOp::NotEqual => return Ok(Value::Bool(!both_null)),
            _ => {}
        }
    }

    // Mixed types under equality: always unequal.
    match op {
        BinaryOp::Equal => Ok(Value::Bool(false)),
        BinaryOp::NotEqual => Ok(Value::Bool(true)),
        _ => Err(RuntimeError::type_error(
            format!(
                "unknown operator {} for types {} and {}",
                op,
                left.type_name(),
                right.type_name()
            ),
            span,
        )),
    }
}
