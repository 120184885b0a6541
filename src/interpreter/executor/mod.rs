//! Tree-walking evaluator for Dylang.

mod expressions;
mod operators;
mod statements;

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::builtins::register_builtins;
use crate::interpreter::environment::Environment;
use crate::interpreter::value::{Function, Value};

pub(crate) type RuntimeResult<T> = Result<T, RuntimeError>;

/// How a statement finished. `Return`, `Break` and `Continue` unwind to
/// the nearest syntactic consumer (function call, loop); they are never
/// visible to user programs.
pub enum ControlFlow {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

/// The tree-walking interpreter.
pub struct Interpreter {
    pub(crate) environment: Rc<RefCell<Environment>>,
}

impl Interpreter {
    /// Create an interpreter whose root environment is preloaded with
    /// the printing built-ins.
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        register_builtins(&mut globals.borrow_mut());

        Self {
            environment: globals,
        }
    }

    /// Create an interpreter sharing an existing root environment.
    pub fn with_globals(globals: Rc<RefCell<Environment>>) -> Self {
        Self {
            environment: globals,
        }
    }

    /// The root environment (shared with the VM in hybrid execution).
    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        self.environment.clone()
    }

    /// Interpret a complete program, returning its value: the value of
    /// a top-level `return`, otherwise the last statement's value.
    pub fn interpret(&mut self, program: &Program) -> RuntimeResult<Value> {
        let mut last = Value::Null;
        for stmt in &program.statements {
            match self.execute(stmt)? {
                ControlFlow::Normal(value) => last = value,
                ControlFlow::Return(value) => return Ok(value),
                // A break/continue with no enclosing loop is a no-op.
                ControlFlow::Break | ControlFlow::Continue => {}
            }
        }
        Ok(last)
    }

    /// Execute statements in a fresh scope, restoring the previous
    /// scope on every exit path.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Environment,
    ) -> RuntimeResult<ControlFlow> {
        let previous = std::mem::replace(&mut self.environment, Rc::new(RefCell::new(env)));

        let mut result = Ok(ControlFlow::Normal(Value::Null));
        for stmt in statements {
            result = self.execute(stmt);
            match &result {
                Err(_) => break,
                Ok(ControlFlow::Normal(_)) => {}
                Ok(_) => break,
            }
        }

        self.environment = previous;
        result
    }

    /// Call a user function: bind parameters in a scope enclosing the
    /// captured environment, pad missing arguments with null, ignore
    /// extras. The call evaluates to the returned value, or to the last
    /// statement's value when the body falls off the end.
    pub(crate) fn call_function(
        &mut self,
        func: &Function,
        arguments: Vec<Value>,
    ) -> RuntimeResult<Value> {
        let mut call_env = Environment::with_enclosing(func.closure.clone());

        let mut arguments = arguments.into_iter();
        for param in &func.params {
            let value = arguments.next().unwrap_or(Value::Null);
            call_env.declare(param.clone(), value, false);
        }

        match self.execute_block(&func.body, call_env)? {
            ControlFlow::Normal(value) => Ok(value),
            ControlFlow::Return(value) => Ok(value),
            // Loop sentinels never escape the enclosing function.
            ControlFlow::Break | ControlFlow::Continue => Ok(Value::Null),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn run(source: &str) -> RuntimeResult<Value> {
        let tokens = Scanner::new(source).scan_tokens().expect("lexer error");
        let program = Parser::new(tokens).parse().expect("parser error");
        Interpreter::new().interpret(&program)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("1 + 2 * 3").unwrap(), Value::Number(7.0));
        assert_eq!(run("(1 + 2) * 3").unwrap(), Value::Number(9.0));
        assert_eq!(run("10 / 4").unwrap(), Value::Number(2.5));
    }

    #[test]
    fn test_modulo_truncates_operands() {
        assert_eq!(run("7 % 3").unwrap(), Value::Number(1.0));
        // Both operands truncate toward zero before the modulo.
        assert_eq!(run("7 % (5 / 2)").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_division_by_zero() {
        let err = run("1 / 0").unwrap_err();
        assert_eq!(err.message(), "division by zero");
    }

    #[test]
    fn test_modulo_by_zero() {
        let err = run("1 % 0").unwrap_err();
        assert_eq!(err.message(), "modulo by zero");
    }

    #[test]
    fn test_declarations_and_sum() {
        assert_eq!(
            run("let x = 10 var y = 20 const z = 30 x + y + z").unwrap(),
            Value::Number(60.0)
        );
    }

    #[test]
    fn test_const_reassignment_fails_without_mutation() {
        let err = run("const z = 30 z = 1").unwrap_err();
        assert!(matches!(err, RuntimeError::ConstantReassignment(_, _)));
    }

    #[test]
    fn test_redeclaration_fails() {
        let err = run("let x = 1 let x = 2").unwrap_err();
        assert!(matches!(err, RuntimeError::Redeclaration(_, _)));
    }

    #[test]
    fn test_undefined_variable() {
        let err = run("missing").unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable(_, _)));
    }

    #[test]
    fn test_if_else() {
        assert_eq!(run("let x = 0 if (1 < 2) { x = 1 } else { x = 2 } x").unwrap(), Value::Number(1.0));
        assert_eq!(run("let x = 0 if (1 > 2) { x = 1 } else { x = 2 } x").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_truthiness_in_conditions() {
        assert_eq!(run("let x = 0 if (\"\") { x = 1 } x").unwrap(), Value::Number(0.0));
        assert_eq!(run("let x = 0 if ([]) { x = 1 } x").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run("let i = 0 while (i < 5) { i = i + 1 } i").unwrap(),
            Value::Number(5.0)
        );
    }

    #[test]
    fn test_for_range_count_and_values() {
        assert_eq!(
            run("let sum = 0 for range(i, 5) { sum = sum + i } sum").unwrap(),
            Value::Number(10.0)
        );
    }

    #[test]
    fn test_for_range_truncates_count() {
        assert_eq!(
            run("let n = 0 for range(i, 7 / 2) { n = n + 1 } n").unwrap(),
            Value::Number(3.0)
        );
    }

    #[test]
    fn test_for_range_fresh_iteration_scope() {
        // A let inside the body must not collide across iterations.
        assert_eq!(
            run("let sum = 0 for range(i, 3) { let t = i sum = sum + t } sum").unwrap(),
            Value::Number(3.0)
        );
    }

    #[test]
    fn test_break_and_continue() {
        assert_eq!(
            run("let n = 0 for range(i, 10) { if (i == 3) { break } n = n + 1 } n").unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(
            run("let n = 0 for range(i, 10) { if (i % 2 == 0) { continue } n = n + 1 } n").unwrap(),
            Value::Number(5.0)
        );
    }

    #[test]
    fn test_break_does_not_escape_function() {
        assert_eq!(
            run("funct f() { break } let n = 0 for range(i, 3) { f() n = n + 1 } n").unwrap(),
            Value::Number(3.0)
        );
    }

    #[test]
    fn test_function_call_and_return() {
        assert_eq!(
            run("funct add(a, b) { return a + b } add(2, 3)").unwrap(),
            Value::Number(5.0)
        );
    }

    #[test]
    fn test_missing_args_pad_with_null_extras_ignored() {
        assert_eq!(
            run("funct f(a, b) { return b } f(1)").unwrap(),
            Value::Null
        );
        assert_eq!(
            run("funct f(a) { return a } f(1, 2, 3)").unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn test_closure_capture() {
        let source = r#"
            funct mk() {
                let c = 0
                funct inc() {
                    ++c
                    return c
                }
                return inc
            }
            let f = mk()
            f()
            f()
        "#;
        assert_eq!(run(source).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_return_from_program_top() {
        assert_eq!(run("return 42 let unreachable = 1").unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_return_unwinds_through_loops() {
        assert_eq!(
            run("funct f() { for range(i, 10) { if (i == 2) { return i } } return 99 } f()").unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn test_try_catch_binds_message() {
        assert_eq!(
            run("let m = \"\" try { let a = 1 / 0 } catch(e) { m = e } m").unwrap(),
            Value::String("division by zero".to_string())
        );
    }

    #[test]
    fn test_try_without_error_skips_catch() {
        assert_eq!(
            run("let m = 0 try { m = 1 } catch(e) { m = 2 } m").unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn test_import_fmaths() {
        assert_eq!(
            run("import \"fmaths\" as m m.sqrt(16)").unwrap(),
            Value::Number(4.0)
        );
    }

    #[test]
    fn test_import_unknown_module() {
        let err = run("import \"nonesuch\" as x").unwrap_err();
        assert_eq!(err.message(), "unknown module: nonesuch");
    }

    #[test]
    fn test_import_binding_is_constant() {
        let err = run("import \"time\" as t t = 1").unwrap_err();
        assert!(matches!(err, RuntimeError::ConstantReassignment(_, _)));
    }

    #[test]
    fn test_string_concat() {
        assert_eq!(
            run("\"a\" + \"b\"").unwrap(),
            Value::String("ab".to_string())
        );
        assert_eq!(
            run("\"n = \" + 3").unwrap(),
            Value::String("n = 3".to_string())
        );
    }

    #[test]
    fn test_mixed_equality_is_false() {
        assert_eq!(run("1 == \"1\"").unwrap(), Value::Bool(false));
        assert_eq!(run("1 != \"1\"").unwrap(), Value::Bool(true));
        assert_eq!(run("null == null").unwrap(), Value::Bool(true));
        assert_eq!(run("0 == null").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_logical_requires_booleans() {
        assert_eq!(run("true && false").unwrap(), Value::Bool(false));
        assert_eq!(run("false || true").unwrap(), Value::Bool(true));
        assert!(run("1 && 2").is_err());
    }

    #[test]
    fn test_logical_is_eager() {
        // The right operand evaluates even when the left decides.
        let err = run("false && missing").unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable(_, _)));
    }

    #[test]
    fn test_increment_decrement() {
        assert_eq!(run("let x = 5 ++x").unwrap(), Value::Number(6.0));
        assert_eq!(run("let x = 5 x++").unwrap(), Value::Number(5.0));
        assert_eq!(run("let x = 5 x++ x").unwrap(), Value::Number(6.0));
        assert_eq!(run("let x = 5 --x x").unwrap(), Value::Number(4.0));
    }

    #[test]
    fn test_increment_requires_numeric_identifier() {
        assert!(run("let s = \"x\" ++s").is_err());
        assert!(run("++3").is_err());
    }

    #[test]
    fn test_member_access() {
        assert_eq!(
            run("let m = {\"a\": 1} m.a").unwrap(),
            Value::Number(1.0)
        );
        let err = run("let m = {\"a\": 1} m.b").unwrap_err();
        assert!(matches!(err, RuntimeError::NoSuchProperty { .. }));
        assert!(run("let x = 1 x.a").is_err());
    }

    #[test]
    fn test_map_keys_must_be_strings() {
        assert!(run("let m = {1: 2}").is_err());
    }

    #[test]
    fn test_anonymous_function() {
        assert_eq!(
            run("let f = funct(x) { return x * 2 } f(21)").unwrap(),
            Value::Number(42.0)
        );
    }

    #[test]
    fn test_call_non_function() {
        let err = run("let x = 1 x(2)").unwrap_err();
        assert!(matches!(err, RuntimeError::NotCallable(_)));
    }

    #[test]
    fn test_for_range_non_number_errors() {
        let err = run("for range(i, \"3\") { }").unwrap_err();
        assert!(matches!(err, RuntimeError::TypeError { .. }));
    }
}
