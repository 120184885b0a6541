//! Bytecode instruction definitions for the Dylang VM.
//!
//! The code vector is a sequence of words: an opcode followed by its
//! operands. Jump operands are absolute offsets into the vector.

/// Opcodes for the bytecode virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OpCode {
    /// Push a constant by pool index: CONST <idx>
    Const = 0,
    /// Load a global by name constant index: LOAD_GLOBAL <name_idx>
    LoadGlobal,
    /// Store a global (update or declare): STORE_GLOBAL <name_idx>
    StoreGlobal,
    /// Load a local by slot: LOAD_LOCAL <slot>
    LoadLocal,
    /// Store a local by slot (pops): STORE_LOCAL <slot>
    StoreLocal,

    // Fast loads for common constants
    LoadConst0,
    LoadConst1,
    LoadTrue,
    LoadFalse,
    LoadNull,

    // Arithmetic and comparison (pop right then left, push result)
    Add,
    Sub,
    Mul,
    Div,
    CmpEq,
    CmpNe,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,

    // Control flow
    /// Unconditional jump: JUMP <addr>
    Jump,
    /// Pop a boolean, branch on false: JUMP_IF_FALSE <addr>
    JumpIfFalse,
    /// Call the value below the arguments: CALL <argc>
    Call,
    /// Return from the current frame
    Ret,
    /// Discard the top of stack
    Pop,

    // Stack shuffling
    Dup,
    Swap,

    /// Map property access: GET_PROP <name_idx>
    GetProp,
    /// Module import: IMPORT <alias_idx> <path_idx>
    Import,

    /// Counted-loop step: pushes `slot < limit`, then increments the
    /// slot. The limit stays on the stack: FOR_LOOP_NEXT <slot>
    ForLoopNext,
    /// Increment a numeric local in place: INCREMENT_LOCAL <slot>
    IncrementLocal,
    /// Decrement a numeric local in place: DECREMENT_LOCAL <slot>
    DecrementLocal,

    // Intrinsic math (consume top operand(s), push result)
    Pow,
    Sqrt,
    Sin,
    Cos,
    Log,
    Exp,
    Abs,
    Floor,
    Ceil,

    // Aggregate builders
    /// Build an array from N stack values: MAKE_ARRAY <n>
    MakeArray,
    /// Build a map from N key/value pairs: MAKE_MAP <n>
    MakeMap,
    /// Concatenate the top two values as strings
    Concat2,
    /// Concatenate N stack values as strings: CONCAT_N <n>
    ConcatN,
}

impl OpCode {
    /// Number of operand words following this opcode.
    pub fn operand_count(self) -> usize {
        match self {
            OpCode::Const
            | OpCode::LoadGlobal
            | OpCode::StoreGlobal
            | OpCode::LoadLocal
            | OpCode::StoreLocal
            | OpCode::Jump
            | OpCode::JumpIfFalse
            | OpCode::Call
            | OpCode::GetProp
            | OpCode::ForLoopNext
            | OpCode::IncrementLocal
            | OpCode::DecrementLocal
            | OpCode::MakeArray
            | OpCode::MakeMap
            | OpCode::ConcatN => 1,

            OpCode::Import => 2,

            _ => 0,
        }
    }

    /// Convert a code word back to an opcode.
    pub fn from_u32(word: u32) -> Option<OpCode> {
        if word <= OpCode::ConcatN as u32 {
            Some(unsafe { std::mem::transmute::<u32, OpCode>(word) })
        } else {
            None
        }
    }

    /// The mnemonic used by the disassembler.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Const => "CONST",
            OpCode::LoadGlobal => "LOAD_GLOBAL",
            OpCode::StoreGlobal => "STORE_GLOBAL",
            OpCode::LoadLocal => "LOAD_LOCAL",
            OpCode::StoreLocal => "STORE_LOCAL",
            OpCode::LoadConst0 => "LOAD_CONST_0",
            OpCode::LoadConst1 => "LOAD_CONST_1",
            OpCode::LoadTrue => "LOAD_TRUE",
            OpCode::LoadFalse => "LOAD_FALSE",
            OpCode::LoadNull => "LOAD_NULL",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::CmpEq => "CMP_EQ",
            OpCode::CmpNe => "CMP_NE",
            OpCode::CmpLt => "CMP_LT",
            OpCode::CmpLe => "CMP_LE",
            OpCode::CmpGt => "CMP_GT",
            OpCode::CmpGe => "CMP_GE",
            OpCode::Jump => "JUMP",
            OpCode::JumpIfFalse => "JUMP_IF_FALSE",
            OpCode::Call => "CALL",
            OpCode::Ret => "RET",
            OpCode::Pop => "POP",
            OpCode::Dup => "DUP",
            OpCode::Swap => "SWAP",
            OpCode::GetProp => "GET_PROP",
            OpCode::Import => "IMPORT",
            OpCode::ForLoopNext => "FOR_LOOP_NEXT",
            OpCode::IncrementLocal => "INCREMENT_LOCAL",
            OpCode::DecrementLocal => "DECREMENT_LOCAL",
            OpCode::Pow => "POW",
            OpCode::Sqrt => "SQRT",
            OpCode::Sin => "SIN",
            OpCode::Cos => "COS",
            OpCode::Log => "LOG",
            OpCode::Exp => "EXP",
            OpCode::Abs => "ABS",
            OpCode::Floor => "FLOOR",
            OpCode::Ceil => "CEIL",
            OpCode::MakeArray => "MAKE_ARRAY",
            OpCode::MakeMap => "MAKE_MAP",
            OpCode::Concat2 => "CONCAT_2",
            OpCode::ConcatN => "CONCAT_N",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_roundtrip() {
        for word in 0..=OpCode::ConcatN as u32 {
            let op = OpCode::from_u32(word).expect("valid opcode");
            assert_eq!(word, op as u32);
        }
    }

    #[test]
    fn test_invalid_opcode() {
        assert!(OpCode::from_u32(u32::MAX).is_none());
    }
}
