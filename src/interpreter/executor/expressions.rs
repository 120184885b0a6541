//! Expression evaluation.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::environment::AssignError;
use crate::interpreter::value::{Function, Value};
use crate::span::Span;

use super::{Interpreter, RuntimeResult};

impl Interpreter {
    /// Evaluate an expression to a value.
    pub(crate) fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match &expr.kind {
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),

            ExprKind::ArrayLit(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element)?);
                }
                Ok(Value::array(values))
            }

            ExprKind::MapLit(pairs) => {
                let mut entries = IndexMap::with_capacity(pairs.len());
                for (key_expr, value_expr) in pairs {
                    let key = match self.evaluate(key_expr)? {
                        Value::String(key) => key,
                        other => {
                            return Err(RuntimeError::type_error(
                                format!("map key must be a string, got {}", other.type_name()),
                                key_expr.span,
                            ))
                        }
                    };
                    let value = self.evaluate(value_expr)?;
                    entries.insert(key, value);
                }
                Ok(Value::map(entries))
            }

            ExprKind::Identifier(name) => self
                .environment
                .borrow()
                .get(name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone(), expr.span)),

            ExprKind::Binary { left, op, right } => {
                self.evaluate_binary(left, *op, right, expr.span)
            }

            ExprKind::Unary {
                operand,
                op,
                prefix,
            } => self.evaluate_unary(operand, *op, *prefix, expr.span),

            ExprKind::Assignment { target, value } => {
                let ExprKind::Identifier(name) = &target.kind else {
                    // The parser rejects non-identifier targets already.
                    return Err(RuntimeError::type_error(
                        "invalid assignment target",
                        target.span,
                    ));
                };
                let value = self.evaluate(value)?;
                self.assign(name, value.clone(), expr.span)?;
                Ok(value)
            }

            ExprKind::Call { callee, args } => {
                let callee_value = self.evaluate(callee)?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.evaluate(arg)?);
                }
                self.call_value(callee_value, arguments, expr.span)
            }

            ExprKind::Member { object, property } => {
                let object_value = self.evaluate(object)?;
                match object_value {
                    Value::Map(map) => map.borrow().get(property).cloned().ok_or_else(|| {
                        RuntimeError::NoSuchProperty {
                            value_type: "Map".to_string(),
                            property: property.clone(),
                            span: expr.span,
                        }
                    }),
                    other => Err(RuntimeError::type_error(
                        format!(
                            "cannot access property '{}' on {}",
                            property,
                            other.type_name()
                        ),
                        expr.span,
                    )),
                }
            }

            ExprKind::Function { params, body } => Ok(Value::Function(Rc::new(Function {
                name: String::new(),
                params: params.clone(),
                body: body.clone(),
                closure: self.environment.clone(),
            }))),
        }
    }

    /// Apply a callable value to already-evaluated arguments.
    pub(crate) fn call_value(
        &mut self,
        callee: Value,
        arguments: Vec<Value>,
        span: Span,
    ) -> RuntimeResult<Value> {
        match callee {
            Value::NativeFunction(native) => native
                .call(arguments)
                .map_err(|message| RuntimeError::new(message, span)),
            Value::Function(func) => self.call_function(&func, arguments),
            _ => Err(RuntimeError::NotCallable(span)),
        }
    }

    pub(crate) fn assign(
        &mut self,
        name: &str,
        value: Value,
        span: Span,
    ) -> RuntimeResult<()> {
        match self.environment.borrow_mut().assign(name, value) {
            Ok(()) => Ok(()),
            Err(AssignError::Undefined) => {
                Err(RuntimeError::UndefinedVariable(name.to_string(), span))
            }
            Err(AssignError::Constant) => {
                Err(RuntimeError::ConstantReassignment(name.to_string(), span))
            }
        }
    }
}
