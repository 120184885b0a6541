//! Bytecode chunks: a code vector plus a constant pool.

use std::collections::HashMap;

use crate::bytecode::instruction::OpCode;
use crate::interpreter::value::Value;

/// Placeholder word written for forward jumps until they are patched.
pub const PATCH_PLACEHOLDER: u32 = u32::MAX;

/// A chunk of bytecode: opcodes interleaved with operands, and the
/// constant pool they index.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// The code vector. Jump operands are absolute offsets into it.
    pub code: Vec<u32>,
    /// The constant pool.
    pub constants: Vec<Value>,
    /// Dedup cache for small scalar constants.
    const_cache: HashMap<ConstKey, u32>,
}

/// Cache key for deduplicated constants: the numbers 0, 1 and -1, short
/// strings, booleans and null. Larger values are appended unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstKey {
    Zero,
    One,
    NegOne,
    Str(String),
    Bool(bool),
    Null,
}

impl ConstKey {
    fn for_value(value: &Value) -> Option<ConstKey> {
        match value {
            Value::Number(n) if *n == 0.0 => Some(ConstKey::Zero),
            Value::Number(n) if *n == 1.0 => Some(ConstKey::One),
            Value::Number(n) if *n == -1.0 => Some(ConstKey::NegOne),
            Value::String(s) if s.len() <= 63 => Some(ConstKey::Str(s.clone())),
            Value::Bool(b) => Some(ConstKey::Bool(*b)),
            Value::Null => Some(ConstKey::Null),
            _ => None,
        }
    }
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an opcode with no operands.
    pub fn emit(&mut self, op: OpCode) -> usize {
        let at = self.code.len();
        self.code.push(op as u32);
        at
    }

    /// Append an opcode with operand words. Returns the opcode's offset.
    pub fn emit_with(&mut self, op: OpCode, operands: &[u32]) -> usize {
        let at = self.code.len();
        self.code.push(op as u32);
        self.code.extend_from_slice(operands);
        at
    }

    /// Append a jump with a placeholder target; returns the operand
    /// offset for later patching.
    pub fn emit_jump(&mut self, op: OpCode) -> usize {
        self.code.push(op as u32);
        let operand_at = self.code.len();
        self.code.push(PATCH_PLACEHOLDER);
        operand_at
    }

    /// Patch a previously emitted jump operand with an absolute target.
    pub fn patch_jump(&mut self, operand_at: usize, target: usize) {
        self.code[operand_at] = target as u32;
    }

    /// Current end of code (the target of a forward jump).
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Add a constant to the pool, deduplicating small scalars.
    pub fn add_constant(&mut self, value: Value) -> u32 {
        if let Some(key) = ConstKey::for_value(&value) {
            if let Some(&idx) = self.const_cache.get(&key) {
                return idx;
            }
            let idx = self.constants.len() as u32;
            self.constants.push(value);
            self.const_cache.insert(key, idx);
            return idx;
        }
        let idx = self.constants.len() as u32;
        self.constants.push(value);
        idx
    }
}

/// A compiled function: its bytecode plus the number of local slots the
/// VM reserves above the call-frame base.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: String,
    pub arity: usize,
    pub chunk: Chunk,
    pub locals_max: usize,
}

impl CompiledFunction {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            chunk: Chunk::new(),
            locals_max: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_offsets() {
        let mut chunk = Chunk::new();
        chunk.emit_with(OpCode::Const, &[0]);
        let at = chunk.emit(OpCode::Ret);
        assert_eq!(chunk.code, vec![OpCode::Const as u32, 0, OpCode::Ret as u32]);
        assert_eq!(at, 2);
    }

    #[test]
    fn test_constant_dedup_small_scalars() {
        let mut chunk = Chunk::new();
        let a = chunk.add_constant(Value::Number(0.0));
        let b = chunk.add_constant(Value::Number(0.0));
        let c = chunk.add_constant(Value::Number(-1.0));
        let d = chunk.add_constant(Value::Number(-1.0));
        let e = chunk.add_constant(Value::String("x".to_string()));
        let f = chunk.add_constant(Value::String("x".to_string()));
        assert_eq!(a, b);
        assert_eq!(c, d);
        assert_eq!(e, f);
        assert_eq!(chunk.constants.len(), 3);
    }

    #[test]
    fn test_long_strings_not_deduplicated() {
        let mut chunk = Chunk::new();
        let long = "x".repeat(64);
        let a = chunk.add_constant(Value::String(long.clone()));
        let b = chunk.add_constant(Value::String(long));
        assert_ne!(a, b);
    }

    #[test]
    fn test_jump_patching() {
        let mut chunk = Chunk::new();
        let operand_at = chunk.emit_jump(OpCode::JumpIfFalse);
        chunk.emit(OpCode::Pop);
        let target = chunk.current_offset();
        chunk.patch_jump(operand_at, target);
        assert_eq!(chunk.code[operand_at], 3);
    }
}
