//! Dylang: a small dynamically-typed scripting language.
//!
//! A source program is lexed into tokens, parsed into an AST, and then
//! executed by a hybrid engine that dispatches each top-level construct
//! either to a recursive AST evaluator or to a compiled bytecode
//! routine.
//!
//! # Execution Modes
//!
//! - **Hybrid** (default): per-node routing between the evaluator and
//!   the VM.
//! - **TreeWalk**: direct AST interpretation only.
//! - **Bytecode**: whole-program compilation to the stack VM.

pub mod ast;
pub mod bytecode;
pub mod error;
pub mod hybrid;
pub mod interpreter;
pub mod lexer;
pub mod modules;
pub mod parser;
pub mod span;

use error::DylangError;
use interpreter::Value;

/// Execution mode for running Dylang programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Hybrid engine: per-node routing (default).
    #[default]
    Hybrid,
    /// Tree-walking interpreter only.
    TreeWalk,
    /// Bytecode VM for the whole program.
    Bytecode,
}

/// Run a program from source using the default execution mode.
pub fn run(source: &str) -> Result<Value, DylangError> {
    run_with_options(source, ExecutionMode::default())
}

/// Run a program from source with an explicit execution mode. Returns
/// the program's value: a top-level `return`, otherwise the value of
/// the last statement.
pub fn run_with_options(source: &str, mode: ExecutionMode) -> Result<Value, DylangError> {
    let program = parse(source)?;

    match mode {
        ExecutionMode::Hybrid => {
            let mut engine = hybrid::HybridEngine::new();
            Ok(engine.run(&program)?)
        }
        ExecutionMode::TreeWalk => {
            let mut interpreter = interpreter::Interpreter::new();
            Ok(interpreter.interpret(&program)?)
        }
        ExecutionMode::Bytecode => {
            let function = bytecode::Compiler::new().compile(&program)?;
            let mut vm = bytecode::VM::new();
            Ok(vm.run(function)?)
        }
    }
}

/// Run a program from a file path.
pub fn run_file(path: &std::path::Path, mode: ExecutionMode) -> Result<Value, DylangError> {
    let source = std::fs::read_to_string(path)?;
    run_with_options(&source, mode)
}

/// Parse source code into an AST without executing.
pub fn parse(source: &str) -> Result<ast::Program, DylangError> {
    let tokens = lexer::Scanner::new(source).scan_tokens()?;
    let program = parser::Parser::new(tokens).parse()?;
    Ok(program)
}

/// Compile source code to bytecode without executing.
pub fn compile(source: &str) -> Result<bytecode::CompiledFunction, DylangError> {
    let program = parse(source)?;
    let function = bytecode::Compiler::new().compile(&program)?;
    Ok(function)
}

/// Disassemble compiled bytecode to a string.
pub fn disassemble(function: &bytecode::CompiledFunction) -> String {
    bytecode::disassemble_function(function)
}
