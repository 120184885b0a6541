//! Statement execution.

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;
use crate::modules;

use super::{ControlFlow, Interpreter, RuntimeResult};

impl Interpreter {
    /// Execute a statement, returning control flow information.
    pub(crate) fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<ControlFlow> {
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                let value = self.evaluate(expr)?;
                Ok(ControlFlow::Normal(value))
            }

            StmtKind::VarDeclaration {
                name,
                initializer,
                constant,
            } => {
                let value = self.evaluate(initializer)?;
                let declared = self
                    .environment
                    .borrow_mut()
                    .declare(name.clone(), value.clone(), *constant);
                if !declared {
                    return Err(RuntimeError::Redeclaration(name.clone(), stmt.span));
                }
                Ok(ControlFlow::Normal(value))
            }

            StmtKind::Block(statements) => self.execute_block(
                statements,
                Environment::with_enclosing(self.environment.clone()),
            ),

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.evaluate(condition)?;
                if cond.is_truthy() {
                    self.execute_block(
                        then_branch,
                        Environment::with_enclosing(self.environment.clone()),
                    )
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(
                        else_branch,
                        Environment::with_enclosing(self.environment.clone()),
                    )
                } else {
                    Ok(ControlFlow::Normal(Value::Null))
                }
            }

            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    let flow = self.execute_block(
                        body,
                        Environment::with_enclosing(self.environment.clone()),
                    )?;
                    match flow {
                        ControlFlow::Break => break,
                        ControlFlow::Continue | ControlFlow::Normal(_) => {}
                        ControlFlow::Return(v) => return Ok(ControlFlow::Return(v)),
                    }
                }
                Ok(ControlFlow::Normal(Value::Null))
            }

            StmtKind::ForRange {
                iter_var,
                count,
                body,
            } => self.execute_for_range(iter_var, count, body),

            StmtKind::Function(decl) => {
                let func = Value::Function(std::rc::Rc::new(
                    crate::interpreter::value::Function {
                        name: decl.name.clone(),
                        params: decl.params.clone(),
                        body: decl.body.clone(),
                        closure: self.environment.clone(),
                    },
                ));
                let declared = self
                    .environment
                    .borrow_mut()
                    .declare(decl.name.clone(), func.clone(), true);
                if !declared {
                    return Err(RuntimeError::Redeclaration(decl.name.clone(), decl.span));
                }
                Ok(ControlFlow::Normal(func))
            }

            StmtKind::Return(expr) => {
                let value = self.evaluate(expr)?;
                Ok(ControlFlow::Return(value))
            }

            StmtKind::Break => Ok(ControlFlow::Break),
            StmtKind::Continue => Ok(ControlFlow::Continue),

            StmtKind::Try {
                try_block,
                catch_block,
                error_var,
            } => {
                let try_result = self.execute_block(
                    try_block,
                    Environment::with_enclosing(self.environment.clone()),
                );
                match try_result {
                    Ok(flow) => Ok(flow),
                    Err(err) => {
                        let mut catch_env =
                            Environment::with_enclosing(self.environment.clone());
                        catch_env.declare(
                            error_var.clone(),
                            Value::String(err.message()),
                            false,
                        );
                        self.execute_block(catch_block, catch_env)
                    }
                }
            }

            StmtKind::Import { path, alias } => {
                let module = modules::lookup(path)
                    .ok_or_else(|| RuntimeError::UnknownModule(path.clone(), stmt.span))?;
                let declared = self
                    .environment
                    .borrow_mut()
                    .declare(alias.clone(), module.clone(), true);
                if !declared {
                    return Err(RuntimeError::Redeclaration(alias.clone(), stmt.span));
                }
                Ok(ControlFlow::Normal(module))
            }
        }
    }

    /// Counted loop: `i` takes 0..count with a fresh scope per iteration
    /// so `let` bindings in the body never clash across iterations.
    fn execute_for_range(
        &mut self,
        iter_var: &str,
        count: &Expr,
        body: &[Stmt],
    ) -> RuntimeResult<ControlFlow> {
        let count_value = self.evaluate(count)?;
        let Value::Number(n) = count_value else {
            return Err(RuntimeError::type_error(
                "for loop range must be a number",
                count.span,
            ));
        };

        let count = n as i64;
        let mut i = 0;
        while i < count {
            let mut iter_env = Environment::with_enclosing(self.environment.clone());
            iter_env.declare(iter_var.to_string(), Value::Number(i as f64), false);

            let flow = self.execute_block(body, iter_env)?;
            match flow {
                ControlFlow::Break => break,
                ControlFlow::Continue | ControlFlow::Normal(_) => {}
                ControlFlow::Return(v) => return Ok(ControlFlow::Return(v)),
            }
            i += 1;
        }

        Ok(ControlFlow::Normal(Value::Null))
    }
}
