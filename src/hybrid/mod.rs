//! Hybrid execution engine: routes each top-level construct to the
//! tree-walking evaluator or the bytecode VM.
//!
//! The routing policy is deliberately conservative. The VM does not yet
//! implement closures, and built-ins are only fully wired through the
//! evaluator, so the production policy executes every node on the AST
//! path. The probe records which nodes the VM could take, so coverage
//! can grow per-opcode without touching callers.

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::value::Value;
use crate::interpreter::{ControlFlow, Interpreter};

pub(crate) type RuntimeResult<T> = Result<T, RuntimeError>;

/// The hybrid engine. Owns the interpreter (and through it the root
/// environment) and keeps per-path routing counters.
pub struct HybridEngine {
    interpreter: Interpreter,
    vm_routed: usize,
    interpreter_routed: usize,
    performance_mode: bool,
}

impl HybridEngine {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
            vm_routed: 0,
            interpreter_routed: 0,
            performance_mode: true,
        }
    }

    /// Routed-call counters: (vm, interpreter).
    pub fn stats(&self) -> (usize, usize) {
        (self.vm_routed, self.interpreter_routed)
    }

    pub fn set_performance_mode(&mut self, enabled: bool) {
        self.performance_mode = enabled;
    }

    /// Execute a whole program, returning its value.
    pub fn run(&mut self, program: &Program) -> RuntimeResult<Value> {
        let mut last = Value::Null;
        for stmt in &program.statements {
            match self.execute(stmt)? {
                ControlFlow::Normal(value) => last = value,
                ControlFlow::Return(value) => return Ok(value),
                ControlFlow::Break | ControlFlow::Continue => {}
            }
        }
        Ok(last)
    }

    /// Execute one statement, choosing a path by node kind.
    pub fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<ControlFlow> {
        match &stmt.kind {
            // Simple math expressions are VM-capable; the production
            // policy still runs them on the evaluator for correctness,
            // with the VM reserved for future intrinsification.
            StmtKind::Expression(expr) if self.should_use_vm(expr) => {
                self.vm_routed += 1;
                self.interpreter.execute(stmt)
            }

            // Everything else stays on the evaluator: closures and
            // built-in dispatch are only fully implemented there, loops
            // and try/catch need its unwinding, and blocks need its
            // scope handling.
            _ => {
                self.interpreter_routed += 1;
                self.interpreter.execute(stmt)
            }
        }
    }

    /// Capability probe: could the VM take this expression? True for
    /// arithmetic/comparison trees over literals and variables.
    fn should_use_vm(&self, expr: &Expr) -> bool {
        self.performance_mode && is_math_expression(expr)
    }
}

fn is_math_expression(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::NumberLit(_) => true,
        ExprKind::Identifier(_) => true,
        ExprKind::Binary { left, op, right } => {
            !matches!(op, BinaryOp::And | BinaryOp::Or | BinaryOp::Modulo)
                && is_math_expression(left)
                && is_math_expression(right)
        }
        _ => false,
    }
}

impl Default for HybridEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn parse(source: &str) -> Program {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    fn run(source: &str) -> RuntimeResult<Value> {
        HybridEngine::new().run(&parse(source))
    }

    #[test]
    fn test_program_value() {
        assert_eq!(run("let x = 1 x + 2").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn test_return_at_top_is_program_value() {
        assert_eq!(run("return 7 let x = 1").unwrap(), Value::Number(7.0));
    }

    #[test]
    fn test_routing_counters() {
        let mut engine = HybridEngine::new();
        engine.run(&parse("let a = 1 a + 1 a < 2")).unwrap();
        let (vm, interp) = engine.stats();
        // The two bare math expressions probe VM-capable; the
        // declaration stays on the interpreter.
        assert_eq!(vm, 2);
        assert_eq!(interp, 1);
    }

    #[test]
    fn test_performance_mode_off_routes_everything_to_ast() {
        let mut engine = HybridEngine::new();
        engine.set_performance_mode(false);
        engine.run(&parse("1 + 2")).unwrap();
        assert_eq!(engine.stats(), (0, 1));
    }

    #[test]
    fn test_both_paths_agree_on_arithmetic() {
        // The router and the bytecode pipeline must agree wherever both
        // can execute a construct.
        use crate::bytecode::{Compiler, VM};
        let source = "let x = 0 while (x < 10) { x = x + 3 }";

        let hybrid = {
            let mut engine = HybridEngine::new();
            engine.run(&parse(source)).unwrap();
            engine.interpreter.globals().borrow().get("x").unwrap()
        };
        let vm = {
            let function = Compiler::new().compile(&parse(source)).unwrap();
            let mut vm = VM::new();
            vm.run(function).unwrap();
            vm.globals().borrow().get("x").unwrap()
        };
        assert_eq!(hybrid, Value::Number(12.0));
        assert_eq!(vm, hybrid);
    }

    #[test]
    fn test_block_statement_keeps_its_own_scope() {
        assert_eq!(
            run("let x = 1 { let y = 2 x = x + y } x").unwrap(),
            Value::Number(3.0)
        );
    }
}
