//! Bytecode compiler: transforms AST into chunks.
//!
//! Coverage is partial by design: constructs the VM has no opcodes for
//! (logical operators, `%`, closures, `try`, loop control) report an
//! `Unsupported` error, which the hybrid engine treats as "route to the
//! AST path".

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::*;
use crate::bytecode::chunk::{Chunk, CompiledFunction};
use crate::bytecode::instruction::OpCode;
use crate::error::CompileError;
use crate::interpreter::value::Value;

pub type CompileResult<T> = Result<T, CompileError>;

/// The bytecode compiler. Each function body (and the top-level
/// program) compiles with its own `Compiler` and its own local slots.
pub struct Compiler {
    function: CompiledFunction,
    locals: HashMap<String, u32>,
    locals_max: usize,
    is_top_level: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            function: CompiledFunction::new("<main>", 0),
            locals: HashMap::new(),
            locals_max: 0,
            is_top_level: true,
        }
    }

    fn for_function(name: &str, params: &[String]) -> Self {
        let mut compiler = Self {
            function: CompiledFunction::new(name, params.len()),
            locals: HashMap::new(),
            locals_max: 0,
            is_top_level: false,
        };
        for param in params {
            compiler.ensure_local(param);
        }
        compiler
    }

    /// Compile a program into its main function. The implicit return
    /// carries the last statement's value, matching the evaluator.
    pub fn compile(&mut self, program: &Program) -> CompileResult<CompiledFunction> {
        self.compile_body(&program.statements)?;
        self.function.chunk.emit(OpCode::Ret);

        self.function.locals_max = self.locals_max;
        optimize_chunk(&mut self.function.chunk);
        Ok(self.function.clone())
    }

    /// Compile a statement list, leaving the final statement's value on
    /// the stack for the implicit return. An empty body yields null.
    fn compile_body(&mut self, statements: &[Stmt]) -> CompileResult<()> {
        match statements.split_last() {
            Some((last, rest)) => {
                for stmt in rest {
                    self.compile_stmt(stmt)?;
                }
                self.compile_trailing_stmt(last)
            }
            None => {
                self.chunk().emit(OpCode::LoadNull);
                Ok(())
            }
        }
    }

    /// Compile the final statement of a body so the value it evaluates
    /// to stays on the stack, mirroring what the evaluator hands back
    /// when a body falls off the end.
    fn compile_trailing_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Expression(expr) => self.compile_trailing_expr_stmt(expr),

            // A declaration evaluates to the declared value.
            StmtKind::VarDeclaration {
                name, initializer, ..
            } => {
                self.compile_expr(initializer)?;
                self.chunk().emit(OpCode::Dup);
                self.store_name(name);
                Ok(())
            }

            StmtKind::Function(decl) => {
                let function = self.compile_function(decl)?;
                let idx = self.constant(Value::VmFunction(Rc::new(function)));
                self.chunk().emit_with(OpCode::Const, &[idx]);
                self.chunk().emit(OpCode::Dup);
                self.store_name(&decl.name);
                Ok(())
            }

            // An import evaluates to the module it bound.
            StmtKind::Import { alias, .. } => {
                self.compile_stmt(stmt)?;
                let idx = self.constant(Value::String(alias.clone()));
                self.chunk().emit_with(OpCode::LoadGlobal, &[idx]);
                Ok(())
            }

            StmtKind::Block(statements) => self.compile_body(statements),

            // A trailing if evaluates to the taken branch's value, or
            // null when there is no else.
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.compile_expr(condition)?;
                let jump_false = self.chunk().emit_jump(OpCode::JumpIfFalse);
                self.compile_body(then_branch)?;
                let jump_end = self.chunk().emit_jump(OpCode::Jump);
                let else_target = self.chunk().current_offset();
                self.chunk().patch_jump(jump_false, else_target);
                match else_branch {
                    Some(else_branch) => self.compile_body(else_branch)?,
                    None => {
                        self.chunk().emit(OpCode::LoadNull);
                    }
                }
                let end = self.chunk().current_offset();
                self.chunk().patch_jump(jump_end, end);
                Ok(())
            }

            // Loops evaluate to null; return compiles its own RET and
            // the trailing null below it is unreachable.
            _ => {
                self.compile_stmt(stmt)?;
                self.chunk().emit(OpCode::LoadNull);
                Ok(())
            }
        }
    }

    /// An expression statement in trailing position: like
    /// `compile_expr_stmt`, but the value stays on the stack.
    fn compile_trailing_expr_stmt(&mut self, expr: &Expr) -> CompileResult<()> {
        match &expr.kind {
            // An assignment evaluates to the assigned value.
            ExprKind::Assignment { target, value } => {
                let ExprKind::Identifier(name) = &target.kind else {
                    return Err(CompileError::general(
                        "invalid assignment target",
                        target.span,
                    ));
                };
                self.compile_expr(value)?;
                self.chunk().emit(OpCode::Dup);
                let name = name.clone();
                self.store_name(&name);
                Ok(())
            }

            // Prefix yields the stepped value, postfix the prior one.
            ExprKind::Unary {
                operand,
                op,
                prefix,
            } => {
                let ExprKind::Identifier(name) = &operand.kind else {
                    return Err(CompileError::general(
                        "increment/decrement target must be an identifier",
                        operand.span,
                    ));
                };
                let Some(&slot) = self.locals.get(name) else {
                    return Err(CompileError::unsupported(
                        "increment/decrement of globals",
                        expr.span,
                    ));
                };
                let opcode = match op {
                    UnaryOp::Increment => OpCode::IncrementLocal,
                    UnaryOp::Decrement => OpCode::DecrementLocal,
                };
                if *prefix {
                    self.chunk().emit_with(opcode, &[slot]);
                    self.chunk().emit_with(OpCode::LoadLocal, &[slot]);
                } else {
                    self.chunk().emit_with(OpCode::LoadLocal, &[slot]);
                    self.chunk().emit_with(opcode, &[slot]);
                }
                Ok(())
            }

            _ => self.compile_expr(expr),
        }
    }

    fn chunk(&mut self) -> &mut Chunk {
        &mut self.function.chunk
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Expression(expr) => self.compile_expr_stmt(expr),

            StmtKind::VarDeclaration {
                name, initializer, ..
            } => {
                self.compile_expr(initializer)?;
                self.store_name(name);
                Ok(())
            }

            StmtKind::Block(statements) => {
                for stmt in statements {
                    self.compile_stmt(stmt)?;
                }
                Ok(())
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.compile_expr(condition)?;
                let jump_false = self.chunk().emit_jump(OpCode::JumpIfFalse);
                for stmt in then_branch {
                    self.compile_stmt(stmt)?;
                }
                let jump_end = self.chunk().emit_jump(OpCode::Jump);
                let else_target = self.chunk().current_offset();
                self.chunk().patch_jump(jump_false, else_target);
                if let Some(else_branch) = else_branch {
                    for stmt in else_branch {
                        self.compile_stmt(stmt)?;
                    }
                }
                let end = self.chunk().current_offset();
                self.chunk().patch_jump(jump_end, end);
                Ok(())
            }

            StmtKind::While { condition, body } => {
                let start = self.chunk().current_offset();
                self.compile_expr(condition)?;
                let jump_false = self.chunk().emit_jump(OpCode::JumpIfFalse);
                for stmt in body {
                    self.compile_stmt(stmt)?;
                }
                let start_word = start as u32;
                self.chunk().emit_with(OpCode::Jump, &[start_word]);
                let end = self.chunk().current_offset();
                self.chunk().patch_jump(jump_false, end);
                Ok(())
            }

            StmtKind::ForRange {
                iter_var,
                count,
                body,
            } => {
                let slot = self.ensure_local(iter_var);

                // Counter starts at zero; the limit stays on the stack
                // for the duration of the loop.
                let zero = self.constant(Value::Number(0.0));
                self.chunk().emit_with(OpCode::Const, &[zero]);
                self.chunk().emit_with(OpCode::StoreLocal, &[slot]);

                self.compile_expr(count)?;
                let loop_start = self.chunk().current_offset();

                self.chunk().emit_with(OpCode::ForLoopNext, &[slot]);
                let jump_false = self.chunk().emit_jump(OpCode::JumpIfFalse);

                for stmt in body {
                    self.compile_stmt(stmt)?;
                }

                let start_word = loop_start as u32;
                self.chunk().emit_with(OpCode::Jump, &[start_word]);
                let end = self.chunk().current_offset();
                self.chunk().patch_jump(jump_false, end);

                // Drop the limit.
                self.chunk().emit(OpCode::Pop);
                Ok(())
            }

            StmtKind::Function(decl) => {
                let function = self.compile_function(decl)?;
                let idx = self.constant(Value::VmFunction(Rc::new(function)));
                self.chunk().emit_with(OpCode::Const, &[idx]);
                self.store_name(&decl.name);
                Ok(())
            }

            StmtKind::Return(expr) => {
                self.compile_expr(expr)?;
                self.chunk().emit(OpCode::Ret);
                Ok(())
            }

            StmtKind::Import { path, alias } => {
                let alias_idx = self.constant(Value::String(alias.clone()));
                let path_idx = self.constant(Value::String(path.clone()));
                self.chunk().emit_with(OpCode::Import, &[alias_idx, path_idx]);
                Ok(())
            }

            StmtKind::Break | StmtKind::Continue => Err(CompileError::unsupported(
                "break/continue",
                stmt.span,
            )),

            StmtKind::Try { .. } => Err(CompileError::unsupported("try/catch", stmt.span)),
        }
    }

    /// An expression in statement position. Assignments and
    /// increment/decrement store directly; anything else is evaluated
    /// and its value popped.
    fn compile_expr_stmt(&mut self, expr: &Expr) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Assignment { target, value } => {
                let ExprKind::Identifier(name) = &target.kind else {
                    return Err(CompileError::general(
                        "invalid assignment target",
                        target.span,
                    ));
                };
                self.compile_expr(value)?;
                let name = name.clone();
                self.store_name(&name);
                Ok(())
            }

            ExprKind::Unary { operand, op, .. } => {
                let ExprKind::Identifier(name) = &operand.kind else {
                    return Err(CompileError::general(
                        "increment/decrement target must be an identifier",
                        operand.span,
                    ));
                };
                let Some(&slot) = self.locals.get(name) else {
                    return Err(CompileError::unsupported(
                        "increment/decrement of globals",
                        expr.span,
                    ));
                };
                let op = match op {
                    UnaryOp::Increment => OpCode::IncrementLocal,
                    UnaryOp::Decrement => OpCode::DecrementLocal,
                };
                self.chunk().emit_with(op, &[slot]);
                Ok(())
            }

            _ => {
                self.compile_expr(expr)?;
                self.chunk().emit(OpCode::Pop);
                Ok(())
            }
        }
    }

    fn compile_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::NumberLit(n) => {
                let idx = self.constant(Value::Number(*n));
                self.chunk().emit_with(OpCode::Const, &[idx]);
                Ok(())
            }
            ExprKind::StringLit(s) => {
                let idx = self.constant(Value::String(s.clone()));
                self.chunk().emit_with(OpCode::Const, &[idx]);
                Ok(())
            }
            ExprKind::BoolLit(b) => {
                let idx = self.constant(Value::Bool(*b));
                self.chunk().emit_with(OpCode::Const, &[idx]);
                Ok(())
            }

            ExprKind::Identifier(name) => {
                if let Some(&slot) = self.locals.get(name) {
                    self.chunk().emit_with(OpCode::LoadLocal, &[slot]);
                } else {
                    let idx = self.constant(Value::String(name.clone()));
                    self.chunk().emit_with(OpCode::LoadGlobal, &[idx]);
                }
                Ok(())
            }

            ExprKind::Binary { left, op, right } => {
                let opcode = match op {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Subtract => OpCode::Sub,
                    BinaryOp::Multiply => OpCode::Mul,
                    BinaryOp::Divide => OpCode::Div,
                    BinaryOp::Equal => OpCode::CmpEq,
                    BinaryOp::NotEqual => OpCode::CmpNe,
                    BinaryOp::Less => OpCode::CmpLt,
                    BinaryOp::LessEqual => OpCode::CmpLe,
                    BinaryOp::Greater => OpCode::CmpGt,
                    BinaryOp::GreaterEqual => OpCode::CmpGe,
                    BinaryOp::Modulo => {
                        return Err(CompileError::unsupported("the % operator", expr.span))
                    }
                    BinaryOp::And | BinaryOp::Or => {
                        return Err(CompileError::unsupported(
                            "logical operators",
                            expr.span,
                        ))
                    }
                };
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.chunk().emit(opcode);
                Ok(())
            }

            ExprKind::Call { callee, args } => {
                if self.try_math_intrinsic(callee, args)? {
                    return Ok(());
                }
                self.compile_expr(callee)?;
                for arg in args {
                    self.compile_expr(arg)?;
                }
                let argc = args.len() as u32;
                self.chunk().emit_with(OpCode::Call, &[argc]);
                Ok(())
            }

            ExprKind::Member { object, property } => {
                self.compile_expr(object)?;
                let idx = self.constant(Value::String(property.clone()));
                self.chunk().emit_with(OpCode::GetProp, &[idx]);
                Ok(())
            }

            ExprKind::ArrayLit(elements) => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                let n = elements.len() as u32;
                self.chunk().emit_with(OpCode::MakeArray, &[n]);
                Ok(())
            }

            ExprKind::MapLit(pairs) => {
                for (key, value) in pairs {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                let n = pairs.len() as u32;
                self.chunk().emit_with(OpCode::MakeMap, &[n]);
                Ok(())
            }

            ExprKind::Assignment { .. } => Err(CompileError::unsupported(
                "assignment expressions",
                expr.span,
            )),
            ExprKind::Unary { .. } => Err(CompileError::unsupported(
                "increment/decrement expressions",
                expr.span,
            )),
            ExprKind::Function { .. } => Err(CompileError::unsupported(
                "anonymous functions",
                expr.span,
            )),
        }
    }

    /// Rewrite `math.f(...)` / `m.f(...)` calls into intrinsic opcodes.
    /// The receiver must be the literal identifier `math` or `m`; this
    /// is a speed optimisation and indistinguishable from the call path.
    fn try_math_intrinsic(&mut self, callee: &Expr, args: &[Expr]) -> CompileResult<bool> {
        let ExprKind::Member { object, property } = &callee.kind else {
            return Ok(false);
        };
        let ExprKind::Identifier(receiver) = &object.kind else {
            return Ok(false);
        };
        if receiver != "math" && receiver != "m" {
            return Ok(false);
        }

        let op = match (property.as_str(), args.len()) {
            ("pow", 2) => OpCode::Pow,
            ("sqrt", 1) => OpCode::Sqrt,
            ("sin", 1) => OpCode::Sin,
            ("cos", 1) => OpCode::Cos,
            ("log", 1) => OpCode::Log,
            ("exp", 1) => OpCode::Exp,
            ("abs", 1) => OpCode::Abs,
            ("floor", 1) => OpCode::Floor,
            ("ceil", 1) => OpCode::Ceil,
            _ => return Ok(false),
        };

        for arg in args {
            self.compile_expr(arg)?;
        }
        self.chunk().emit(op);
        Ok(true)
    }

    fn compile_function(&mut self, decl: &FunctionDecl) -> CompileResult<CompiledFunction> {
        let mut inner = Compiler::for_function(&decl.name, &decl.params);
        // A body that falls off the end returns its last statement's
        // value, the same as the evaluator.
        inner.compile_body(&decl.body)?;
        inner.function.chunk.emit(OpCode::Ret);
        inner.function.locals_max = inner.locals_max;
        optimize_chunk(&mut inner.function.chunk);
        Ok(inner.function)
    }

    /// Store the value on top of the stack into `name`: a local slot
    /// inside functions, a global at the top level.
    fn store_name(&mut self, name: &str) {
        if self.is_top_level {
            let idx = self.constant(Value::String(name.to_string()));
            self.chunk().emit_with(OpCode::StoreGlobal, &[idx]);
        } else {
            let slot = self.ensure_local(name);
            self.chunk().emit_with(OpCode::StoreLocal, &[slot]);
        }
    }

    fn ensure_local(&mut self, name: &str) -> u32 {
        if let Some(&slot) = self.locals.get(name) {
            return slot;
        }
        let slot = self.locals_max as u32;
        self.locals.insert(name.to_string(), slot);
        self.locals_max += 1;
        slot
    }

    fn constant(&mut self, value: Value) -> u32 {
        self.function.chunk.add_constant(value)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

// ===== Peephole optimisation =====

struct Instr {
    op: OpCode,
    operands: Vec<u32>,
    old_offset: usize,
}

/// A single linear peephole pass:
/// 1. `LOAD_LOCAL s; CONST 1; ADD; STORE_LOCAL s` collapses to
///    `INCREMENT_LOCAL s` (and the SUB form to `DECREMENT_LOCAL s`).
/// 2. `CONST k` for 0, 1, true, false or null becomes the fast opcode.
///
/// Rewrites shift absolute jump targets, so the pass re-encodes through
/// an old-to-new offset map and retargets every jump operand.
fn optimize_chunk(chunk: &mut Chunk) {
    let Some(mut instrs) = decode(&chunk.code) else {
        return;
    };

    // Offsets that jumps land on; collapsing across one would corrupt
    // control flow.
    let jump_targets: Vec<usize> = instrs
        .iter()
        .filter(|i| matches!(i.op, OpCode::Jump | OpCode::JumpIfFalse))
        .map(|i| i.operands[0] as usize)
        .collect();

    collapse_local_steps(&mut instrs, chunk, &jump_targets);
    rewrite_fast_constants(&mut instrs, chunk);
    chunk.code = encode(&instrs, chunk.code.len());
}

fn decode(code: &[u32]) -> Option<Vec<Instr>> {
    let mut instrs = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        let op = OpCode::from_u32(code[offset])?;
        let count = op.operand_count();
        if offset + 1 + count > code.len() {
            // Truncated operand list; leave the chunk untouched.
            return None;
        }
        let operands = code[offset + 1..offset + 1 + count].to_vec();
        instrs.push(Instr {
            op,
            operands,
            old_offset: offset,
        });
        offset += 1 + count;
    }
    Some(instrs)
}

fn is_const_one(instr: &Instr, chunk: &Chunk) -> bool {
    instr.op == OpCode::Const
        && chunk
            .constants
            .get(instr.operands[0] as usize)
            .map_or(false, |c| matches!(c, Value::Number(n) if *n == 1.0))
}

fn collapse_local_steps(instrs: &mut Vec<Instr>, chunk: &Chunk, jump_targets: &[usize]) {
    let mut i = 0;
    while i + 3 < instrs.len() {
        let pattern = instrs[i].op == OpCode::LoadLocal
            && is_const_one(&instrs[i + 1], chunk)
            && matches!(instrs[i + 2].op, OpCode::Add | OpCode::Sub)
            && instrs[i + 3].op == OpCode::StoreLocal
            && instrs[i].operands[0] == instrs[i + 3].operands[0];

        let interior_target = (1..=3).any(|k| jump_targets.contains(&instrs[i + k].old_offset));

        if pattern && !interior_target {
            let op = if instrs[i + 2].op == OpCode::Add {
                OpCode::IncrementLocal
            } else {
                OpCode::DecrementLocal
            };
            let slot = instrs[i].operands[0];
            let old_offset = instrs[i].old_offset;
            instrs.splice(
                i..i + 4,
                [Instr {
                    op,
                    operands: vec![slot],
                    old_offset,
                }],
            );
        }
        i += 1;
    }
}

fn rewrite_fast_constants(instrs: &mut [Instr], chunk: &Chunk) {
    for instr in instrs.iter_mut() {
        if instr.op != OpCode::Const {
            continue;
        }
        let fast = match chunk.constants.get(instr.operands[0] as usize) {
            Some(Value::Number(n)) if *n == 0.0 => Some(OpCode::LoadConst0),
            Some(Value::Number(n)) if *n == 1.0 => Some(OpCode::LoadConst1),
            Some(Value::Bool(true)) => Some(OpCode::LoadTrue),
            Some(Value::Bool(false)) => Some(OpCode::LoadFalse),
            Some(Value::Null) => Some(OpCode::LoadNull),
            _ => None,
        };
        if let Some(op) = fast {
            instr.op = op;
            instr.operands.clear();
        }
    }
}

fn encode(instrs: &[Instr], old_len: usize) -> Vec<u32> {
    // First pass: new offset for every old instruction boundary.
    let mut offset_map = HashMap::new();
    let mut new_offset = 0;
    for instr in instrs {
        offset_map.insert(instr.old_offset, new_offset);
        new_offset += 1 + instr.operands.len();
    }
    offset_map.insert(old_len, new_offset);

    // Second pass: emit, retargeting jumps through the map.
    let mut code = Vec::with_capacity(new_offset);
    for instr in instrs {
        code.push(instr.op as u32);
        if matches!(instr.op, OpCode::Jump | OpCode::JumpIfFalse) {
            let old_target = instr.operands[0] as usize;
            let new_target = offset_map.get(&old_target).copied().unwrap_or(old_target);
            code.push(new_target as u32);
        } else {
            code.extend_from_slice(&instr.operands);
        }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn compile_source(source: &str) -> CompileResult<CompiledFunction> {
        let tokens = Scanner::new(source).scan_tokens().expect("lexer error");
        let program = Parser::new(tokens).parse().expect("parser error");
        Compiler::new().compile(&program)
    }

    fn ops(function: &CompiledFunction) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let code = &function.chunk.code;
        let mut offset = 0;
        while offset < code.len() {
            let op = OpCode::from_u32(code[offset]).unwrap();
            ops.push(op);
            offset += 1 + op.operand_count();
        }
        ops
    }

    #[test]
    fn test_fast_constants_rewritten() {
        let function = compile_source("let a = 0 let b = 1 let c = true").unwrap();
        let ops = ops(&function);
        assert!(ops.contains(&OpCode::LoadConst0));
        assert!(ops.contains(&OpCode::LoadConst1));
        assert!(ops.contains(&OpCode::LoadTrue));
        assert!(!ops.contains(&OpCode::Const));
    }

    #[test]
    fn test_increment_collapse_inside_function() {
        let function = compile_source("funct f() { let x = 0 x = x + 1 return x }").unwrap();
        let Value::VmFunction(inner) = &function.chunk.constants[0] else {
            panic!("expected compiled function constant");
        };
        let ops = ops(inner);
        assert!(ops.contains(&OpCode::IncrementLocal));
        assert!(!ops.contains(&OpCode::Add));
    }

    #[test]
    fn test_decrement_collapse() {
        let function = compile_source("funct f() { let x = 5 x = x - 1 return x }").unwrap();
        let Value::VmFunction(inner) = &function.chunk.constants[0] else {
            panic!("expected compiled function constant");
        };
        assert!(ops(inner).contains(&OpCode::DecrementLocal));
    }

    #[test]
    fn test_for_range_uses_loop_intrinsic() {
        let function = compile_source("let s = 0 for range(i, 10) { s = i }").unwrap();
        let ops = ops(&function);
        assert!(ops.contains(&OpCode::ForLoopNext));
        assert!(ops.contains(&OpCode::JumpIfFalse));
        // The limit is popped after the loop.
        assert_eq!(*ops.last().unwrap(), OpCode::Ret);
    }

    #[test]
    fn test_math_intrinsics() {
        let function = compile_source("import \"fmaths\" as m let x = m.sqrt(16)").unwrap();
        let ops = ops(&function);
        assert!(ops.contains(&OpCode::Sqrt));
        assert!(!ops.contains(&OpCode::Call));
    }

    #[test]
    fn test_math_intrinsic_requires_known_receiver() {
        let function =
            compile_source("import \"fmaths\" as fm let x = fm.sqrt(16)").unwrap();
        let ops = ops(&function);
        assert!(!ops.contains(&OpCode::Sqrt));
        assert!(ops.contains(&OpCode::Call));
    }

    #[test]
    fn test_unsupported_constructs_error() {
        assert!(matches!(
            compile_source("true && false"),
            Err(CompileError::Unsupported { .. })
        ));
        assert!(matches!(
            compile_source("7 % 3"),
            Err(CompileError::Unsupported { .. })
        ));
        assert!(matches!(
            compile_source("try { } catch(e) { }"),
            Err(CompileError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_jump_targets_survive_optimisation() {
        // Both branches contain rewritable constants, so all jump
        // targets shift; the VM tests confirm behaviour, this confirms
        // every jump target is a valid instruction boundary.
        let function =
            compile_source("let x = 0 if (x < 1) { x = 1 } else { x = 0 } let y = x").unwrap();
        let code = &function.chunk.code;

        let mut boundaries = Vec::new();
        let mut offset = 0;
        while offset < code.len() {
            boundaries.push(offset);
            offset += 1 + OpCode::from_u32(code[offset]).unwrap().operand_count();
        }
        boundaries.push(code.len());

        let mut offset = 0;
        while offset < code.len() {
            let op = OpCode::from_u32(code[offset]).unwrap();
            if matches!(op, OpCode::Jump | OpCode::JumpIfFalse) {
                let target = code[offset + 1] as usize;
                assert!(
                    boundaries.contains(&target),
                    "jump target {} must be an instruction boundary",
                    target
                );
            }
            offset += 1 + op.operand_count();
        }
    }

    #[test]
    fn test_globals_vs_locals() {
        let function = compile_source("let g = 2 funct f(a) { let b = a return b }").unwrap();
        assert!(ops(&function).contains(&OpCode::StoreGlobal));
        let inner = function
            .chunk
            .constants
            .iter()
            .find_map(|c| match c {
                Value::VmFunction(f) => Some(f.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(inner.arity, 1);
        assert_eq!(inner.locals_max, 2);
        assert!(ops(&inner).contains(&OpCode::StoreLocal));
    }
}
