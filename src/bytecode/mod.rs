//! Bytecode module for the Dylang VM.
//!
//! - `instruction`: opcode definitions for the instruction set
//! - `chunk`: code vectors with deduplicated constant pools
//! - `compiler`: AST to bytecode, with intrinsics and a peephole pass
//! - `vm`: stack-based virtual machine
//! - `disassembler`: debug output for bytecode inspection

pub mod chunk;
pub mod compiler;
pub mod disassembler;
pub mod instruction;
pub mod vm;

pub use chunk::{Chunk, CompiledFunction};
pub use compiler::Compiler;
pub use disassembler::{disassemble_function, print_disassembly};
pub use instruction::OpCode;
pub use vm::VM;
