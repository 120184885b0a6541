//! Debug output for bytecode inspection.

use std::fmt::Write;

use crate::bytecode::chunk::CompiledFunction;
use crate::bytecode::instruction::OpCode;
use crate::interpreter::printer::pretty;
use crate::interpreter::value::Value;

/// Render a compiled function (and the functions in its constant pool)
/// as a text listing.
pub fn disassemble_function(function: &CompiledFunction) -> String {
    let mut out = String::new();
    disassemble_into(function, &mut out);
    out
}

/// Print a disassembly listing to stdout.
pub fn print_disassembly(function: &CompiledFunction) {
    print!("{}", disassemble_function(function));
}

fn disassemble_into(function: &CompiledFunction, out: &mut String) {
    let _ = writeln!(
        out,
        "== {} (arity {}, locals {}) ==",
        if function.name.is_empty() {
            "<anonymous>"
        } else {
            &function.name
        },
        function.arity,
        function.locals_max
    );

    let code = &function.chunk.code;
    let mut offset = 0;
    while offset < code.len() {
        let Some(op) = OpCode::from_u32(code[offset]) else {
            let _ = writeln!(out, "{:04}  ?? {}", offset, code[offset]);
            offset += 1;
            continue;
        };

        let operands = &code[offset + 1..offset + 1 + op.operand_count()];
        let _ = write!(out, "{:04}  {:<16}", offset, op.name());
        for operand in operands {
            let _ = write!(out, " {}", operand);
        }

        // Annotate constant operands with their values.
        if matches!(
            op,
            OpCode::Const | OpCode::LoadGlobal | OpCode::StoreGlobal | OpCode::GetProp
        ) {
            if let Some(constant) = function.chunk.constants.get(operands[0] as usize) {
                let _ = write!(out, "  ; {}", annotate(constant));
            }
        }

        let _ = writeln!(out);
        offset += 1 + op.operand_count();
    }

    // Nested functions follow their container.
    for constant in &function.chunk.constants {
        if let Value::VmFunction(inner) = constant {
            let _ = writeln!(out);
            disassemble_into(inner, out);
        }
    }
}

fn annotate(constant: &Value) -> String {
    match constant {
        Value::VmFunction(f) => format!("<fn {}>", f.name),
        other => pretty(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compiler::Compiler;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    #[test]
    fn test_disassembly_lists_instructions() {
        let tokens = Scanner::new("let x = 2 + 3").scan_tokens().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let function = Compiler::new().compile(&program).unwrap();
        let listing = disassemble_function(&function);

        assert!(listing.contains("== <main>"));
        assert!(listing.contains("ADD"));
        assert!(listing.contains("STORE_GLOBAL"));
        assert!(listing.contains("; \"x\""));
    }

    #[test]
    fn test_disassembly_includes_nested_functions() {
        let tokens = Scanner::new("funct f(a) { return a }").scan_tokens().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let function = Compiler::new().compile(&program).unwrap();
        let listing = disassemble_function(&function);
        assert!(listing.contains("== f (arity 1"));
        assert!(listing.contains("RET"));
    }
}
