//! Stack-based virtual machine for executing bytecode.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bytecode::chunk::CompiledFunction;
use crate::bytecode::instruction::OpCode;
use crate::error::RuntimeError;
use crate::interpreter::builtins::register_builtins;
use crate::interpreter::environment::{AssignError, Environment};
use crate::interpreter::value::Value;
use crate::modules;
use crate::span::Span;

/// Initial operand stack capacity; the stack grows by doubling.
const STACK_INITIAL: usize = 1024;

pub type VMResult<T> = Result<T, RuntimeError>;

/// A call frame: the executing function, its instruction pointer, and
/// the operand-stack index of its local slot 0.
struct Frame {
    func: Rc<CompiledFunction>,
    ip: usize,
    base: usize,
}

/// The virtual machine: an operand stack, a call-frame stack, and the
/// global environment.
pub struct VM {
    stack: Vec<Value>,
    sp: usize,
    frames: Vec<Frame>,
    globals: Rc<RefCell<Environment>>,
}

impl VM {
    /// Create a VM with a fresh global environment preloaded with the
    /// printing built-ins.
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        register_builtins(&mut globals.borrow_mut());
        Self::with_globals(globals)
    }

    /// Create a VM sharing an existing global environment.
    pub fn with_globals(globals: Rc<RefCell<Environment>>) -> Self {
        Self {
            stack: vec![Value::Null; STACK_INITIAL],
            sp: 0,
            frames: Vec::with_capacity(64),
            globals,
        }
    }

    /// The global environment (shared with the evaluator in hybrid
    /// execution).
    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        self.globals.clone()
    }

    /// Run a compiled function to completion and return its value.
    pub fn run(&mut self, function: CompiledFunction) -> VMResult<Value> {
        self.sp = 0;
        self.frames.clear();
        self.push_frame(Rc::new(function), 0);
        self.execute()
    }

    fn push_frame(&mut self, func: Rc<CompiledFunction>, argc: usize) {
        let base = self.sp - argc;
        // Reserve the function's local slots above the supplied
        // arguments so loads never touch uninitialised stack.
        let reserve = func.locals_max.max(argc);
        while self.sp < base + reserve {
            self.push(Value::Null);
        }
        self.frames.push(Frame { func, ip: 0, base });
    }

    // ===== Stack primitives =====

    fn push(&mut self, value: Value) {
        if self.sp >= self.stack.len() {
            self.stack.resize(self.stack.len() * 2, Value::Null);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
    }

    fn pop(&mut self) -> VMResult<Value> {
        if self.sp == 0 {
            return Err(RuntimeError::StackUnderflow);
        }
        self.sp -= 1;
        Ok(std::mem::replace(&mut self.stack[self.sp], Value::Null))
    }

    fn peek(&self) -> VMResult<&Value> {
        if self.sp == 0 {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(&self.stack[self.sp - 1])
    }

    fn set_sp(&mut self, new_sp: usize) {
        for slot in new_sp..self.sp {
            self.stack[slot] = Value::Null;
        }
        self.sp = new_sp;
    }

    // ===== Frame helpers =====

    fn read_word(&mut self) -> u32 {
        let frame = self.frames.last_mut().expect("active frame");
        let word = frame.func.chunk.code[frame.ip];
        frame.ip += 1;
        word
    }

    fn frame_base(&self) -> usize {
        self.frames.last().expect("active frame").base
    }

    fn jump_to(&mut self, target: usize) {
        self.frames.last_mut().expect("active frame").ip = target;
    }

    fn constant(&self, idx: u32) -> VMResult<Value> {
        let frame = self.frames.last().expect("active frame");
        frame
            .func
            .chunk
            .constants
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| RuntimeError::new(format!("bad constant index {}", idx), Span::none()))
    }

    fn string_constant(&self, idx: u32) -> VMResult<String> {
        match self.constant(idx)? {
            Value::String(s) => Ok(s),
            other => Err(RuntimeError::new(
                format!("expected string constant, got {}", other.type_name()),
                Span::none(),
            )),
        }
    }

    // ===== Dispatch =====

    fn execute(&mut self) -> VMResult<Value> {
        loop {
            let Some(frame) = self.frames.last() else {
                break;
            };
            if frame.ip >= frame.func.chunk.code.len() {
                // Ran off the end without RET: discard the frame.
                self.frames.pop();
                continue;
            }

            let word = self.read_word();
            let op = OpCode::from_u32(word).ok_or(RuntimeError::UnknownOpcode(word))?;

            match op {
                OpCode::Const => {
                    let idx = self.read_word();
                    let value = self.constant(idx)?;
                    self.push(value);
                }
                OpCode::LoadConst0 => self.push(Value::Number(0.0)),
                OpCode::LoadConst1 => self.push(Value::Number(1.0)),
                OpCode::LoadTrue => self.push(Value::Bool(true)),
                OpCode::LoadFalse => self.push(Value::Bool(false)),
                OpCode::LoadNull => self.push(Value::Null),

                OpCode::LoadGlobal => {
                    let idx = self.read_word();
                    let name = self.string_constant(idx)?;
                    let value = self.globals.borrow().get(&name).ok_or_else(|| {
                        RuntimeError::UndefinedVariable(name.clone(), Span::none())
                    })?;
                    self.push(value);
                }

                OpCode::StoreGlobal => {
                    let idx = self.read_word();
                    let name = self.string_constant(idx)?;
                    let value = self.pop()?;
                    let mut globals = self.globals.borrow_mut();
                    if globals.is_defined(&name) {
                        match globals.assign(&name, value) {
                            Ok(()) => {}
                            Err(AssignError::Constant) => {
                                return Err(RuntimeError::ConstantReassignment(
                                    name,
                                    Span::none(),
                                ))
                            }
                            Err(AssignError::Undefined) => unreachable!(),
                        }
                    } else {
                        globals.declare(name, value, false);
                    }
                }

                OpCode::LoadLocal => {
                    let slot = self.read_word() as usize;
                    let value = self.stack[self.frame_base() + slot].clone();
                    self.push(value);
                }

                OpCode::StoreLocal => {
                    let slot = self.read_word() as usize;
                    let value = self.pop()?;
                    let base = self.frame_base();
                    self.stack[base + slot] = value;
                }

                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let result = arithmetic(op, &left, &right)?;
                    self.push(result);
                }

                OpCode::CmpEq
                | OpCode::CmpNe
                | OpCode::CmpLt
                | OpCode::CmpLe
                | OpCode::CmpGt
                | OpCode::CmpGe => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let result = comparison(op, &left, &right)?;
                    self.push(result);
                }

                OpCode::Jump => {
                    let target = self.read_word() as usize;
                    self.jump_to(target);
                }

                OpCode::JumpIfFalse => {
                    let target = self.read_word() as usize;
                    match self.pop()? {
                        Value::Bool(b) => {
                            if !b {
                                self.jump_to(target);
                            }
                        }
                        other => {
                            return Err(RuntimeError::type_error(
                                format!(
                                    "condition must be a boolean, got {}",
                                    other.type_name()
                                ),
                                Span::none(),
                            ))
                        }
                    }
                }

                OpCode::Call => {
                    let argc = self.read_word() as usize;
                    self.call_value(argc)?;
                }

                OpCode::Ret => {
                    let result = self.pop()?;
                    let frame = self.frames.pop().expect("active frame");
                    if self.frames.is_empty() {
                        return Ok(result);
                    }
                    // Drop locals and the callee below the base.
                    self.set_sp(frame.base - 1);
                    self.push(result);
                }

                OpCode::Pop => {
                    self.pop()?;
                }

                OpCode::Dup => {
                    let value = self.peek()?.clone();
                    self.push(value);
                }

                OpCode::Swap => {
                    let a = self.pop()?;
                    let b = self.pop()?;
                    self.push(a);
                    self.push(b);
                }

                OpCode::GetProp => {
                    let idx = self.read_word();
                    let name = self.string_constant(idx)?;
                    let object = self.pop()?;
                    match object {
                        Value::Map(map) => {
                            let value = map.borrow().get(&name).cloned().ok_or_else(|| {
                                RuntimeError::NoSuchProperty {
                                    value_type: "Map".to_string(),
                                    property: name.clone(),
                                    span: Span::none(),
                                }
                            })?;
                            self.push(value);
                        }
                        other => {
                            return Err(RuntimeError::type_error(
                                format!(
                                    "cannot access property '{}' on {}",
                                    name,
                                    other.type_name()
                                ),
                                Span::none(),
                            ))
                        }
                    }
                }

                OpCode::Import => {
                    let alias_idx = self.read_word();
                    let path_idx = self.read_word();
                    let alias = self.string_constant(alias_idx)?;
                    let path = self.string_constant(path_idx)?;
                    let module = modules::lookup(&path)
                        .ok_or_else(|| RuntimeError::UnknownModule(path, Span::none()))?;
                    if !self.globals.borrow_mut().declare(alias.clone(), module, true) {
                        return Err(RuntimeError::Redeclaration(alias, Span::none()));
                    }
                }

                OpCode::ForLoopNext => {
                    let slot = self.read_word() as usize;
                    let base = self.frame_base();
                    let Value::Number(counter) = self.stack[base + slot] else {
                        return Err(RuntimeError::type_error(
                            "for loop requires numeric values",
                            Span::none(),
                        ));
                    };
                    let Value::Number(limit) = *self.peek()? else {
                        return Err(RuntimeError::type_error(
                            "for loop requires numeric values",
                            Span::none(),
                        ));
                    };
                    // The limit truncates to an integer count.
                    self.push(Value::Bool(counter < (limit as i64) as f64));
                    self.stack[base + slot] = Value::Number(counter + 1.0);
                }

                OpCode::IncrementLocal | OpCode::DecrementLocal => {
                    let slot = self.read_word() as usize;
                    let base = self.frame_base();
                    let Value::Number(n) = self.stack[base + slot] else {
                        return Err(RuntimeError::type_error(
                            if op == OpCode::IncrementLocal {
                                "cannot increment non-number"
                            } else {
                                "cannot decrement non-number"
                            },
                            Span::none(),
                        ));
                    };
                    let delta = if op == OpCode::IncrementLocal { 1.0 } else { -1.0 };
                    self.stack[base + slot] = Value::Number(n + delta);
                }

                OpCode::Pow => {
                    let y = self.pop_number("pow requires numeric arguments")?;
                    let x = self.pop_number("pow requires numeric arguments")?;
                    self.push(Value::Number(x.powf(y)));
                }
                OpCode::Sqrt => {
                    let x = self.pop_number("sqrt requires numeric argument")?;
                    if x < 0.0 {
                        return Err(RuntimeError::new(
                            "sqrt of negative number",
                            Span::none(),
                        ));
                    }
                    self.push(Value::Number(x.sqrt()));
                }
                OpCode::Sin => {
                    let x = self.pop_number("sin requires numeric argument")?;
                    self.push(Value::Number(x.sin()));
                }
                OpCode::Cos => {
                    let x = self.pop_number("cos requires numeric argument")?;
                    self.push(Value::Number(x.cos()));
                }
                OpCode::Log => {
                    let x = self.pop_number("log requires numeric argument")?;
                    if x <= 0.0 {
                        return Err(RuntimeError::new(
                            "log of non-positive number",
                            Span::none(),
                        ));
                    }
                    self.push(Value::Number(x.ln()));
                }
                OpCode::Exp => {
                    let x = self.pop_number("exp requires numeric argument")?;
                    self.push(Value::Number(x.exp()));
                }
                OpCode::Abs => {
                    let x = self.pop_number("abs requires numeric argument")?;
                    self.push(Value::Number(x.abs()));
                }
                OpCode::Floor => {
                    let x = self.pop_number("floor requires numeric argument")?;
                    self.push(Value::Number(x.floor()));
                }
                OpCode::Ceil => {
                    let x = self.pop_number("ceil requires numeric argument")?;
                    self.push(Value::Number(x.ceil()));
                }

                OpCode::MakeArray => {
                    let n = self.read_word() as usize;
                    let mut elements = vec![Value::Null; n];
                    for slot in (0..n).rev() {
                        elements[slot] = self.pop()?;
                    }
                    self.push(Value::array(elements));
                }

                OpCode::MakeMap => {
                    let n = self.read_word() as usize;
                    let mut pairs = Vec::with_capacity(n);
                    for _ in 0..n {
                        let value = self.pop()?;
                        let key = self.pop()?;
                        let Value::String(key) = key else {
                            return Err(RuntimeError::type_error(
                                "map keys must be strings",
                                Span::none(),
                            ));
                        };
                        pairs.push((key, value));
                    }
                    // Pairs pop in reverse; insert in source order so a
                    // repeated key keeps its last value, as the
                    // evaluator does.
                    let mut entries = indexmap::IndexMap::with_capacity(n);
                    for (key, value) in pairs.into_iter().rev() {
                        entries.insert(key, value);
                    }
                    self.push(Value::map(entries));
                }

                OpCode::Concat2 => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.push(Value::String(format!("{}{}", left, right)));
                }

                OpCode::ConcatN => {
                    let n = self.read_word() as usize;
                    let mut result = String::new();
                    for _ in 0..n {
                        result = format!("{}{}", self.pop()?, result);
                    }
                    self.push(Value::String(result));
                }
            }
        }

        // Code exhausted without a final RET.
        if self.sp > 0 {
            self.pop()
        } else {
            Ok(Value::Null)
        }
    }

    fn pop_number(&mut self, message: &str) -> VMResult<f64> {
        match self.pop()? {
            Value::Number(n) => Ok(n),
            _ => Err(RuntimeError::new(message, Span::none())),
        }
    }

    /// `CALL argc`: the callee sits below the arguments at
    /// `sp - argc - 1`.
    fn call_value(&mut self, argc: usize) -> VMResult<()> {
        let callee = self.stack[self.sp - argc - 1].clone();
        match callee {
            Value::NativeFunction(native) => {
                let mut args = vec![Value::Null; argc];
                for slot in (0..argc).rev() {
                    args[slot] = self.pop()?;
                }
                self.pop()?; // the callee
                let result = native
                    .call(args)
                    .map_err(|message| RuntimeError::new(message, Span::none()))?;
                self.push(result);
                Ok(())
            }
            Value::VmFunction(func) => {
                // The callee stays below the base; RET reclaims it.
                self.push_frame(func, argc);
                Ok(())
            }
            _ => Err(RuntimeError::NotCallable(Span::none())),
        }
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

/// Arithmetic fast path: numeric operands, plus string concatenation
/// when either side of `+` is a string. The AST evaluator carries the
/// full dispatch; results agree wherever both paths accept the input.
fn arithmetic(op: OpCode, left: &Value, right: &Value) -> VMResult<Value> {
    if let (Value::Number(a), Value::Number(b)) = (left, right) {
        return match op {
            OpCode::Add => Ok(Value::Number(a + b)),
            OpCode::Sub => Ok(Value::Number(a - b)),
            OpCode::Mul => Ok(Value::Number(a * b)),
            OpCode::Div => {
                if *b == 0.0 {
                    Err(RuntimeError::DivisionByZero(Span::none()))
                } else {
                    Ok(Value::Number(a / b))
                }
            }
            _ => unreachable!(),
        };
    }
    if op == OpCode::Add {
        if let Value::String(a) = left {
            return Ok(Value::String(format!("{}{}", a, right)));
        }
        if let Value::String(b) = right {
            return Ok(Value::String(format!("{}{}", left, b)));
        }
    }
    Err(RuntimeError::type_error(
        format!("unsupported operands for {}", op),
        Span::none(),
    ))
}

fn comparison(op: OpCode, left: &Value, right: &Value) -> VMResult<Value> {
    if let (Value::Number(a), Value::Number(b)) = (left, right) {
        let result = match op {
            OpCode::CmpEq => a == b,
            OpCode::CmpNe => a != b,
            OpCode::CmpLt => a < b,
            OpCode::CmpLe => a <= b,
            OpCode::CmpGt => a > b,
            OpCode::CmpGe => a >= b,
            _ => unreachable!(),
        };
        return Ok(Value::Bool(result));
    }
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return match op {
            OpCode::CmpEq => Ok(Value::Bool(a == b)),
            OpCode::CmpNe => Ok(Value::Bool(a != b)),
            _ => Err(RuntimeError::type_error(
                "unsupported string comparison",
                Span::none(),
            )),
        };
    }
    Err(RuntimeError::type_error(
        "unsupported comparison",
        Span::none(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compiler::Compiler;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn run_source(source: &str) -> VMResult<Value> {
        let tokens = Scanner::new(source)
            .scan_tokens()
            .map_err(|e| RuntimeError::new(e.to_string(), Span::none()))?;
        let program = Parser::new(tokens)
            .parse()
            .map_err(|e| RuntimeError::new(e.to_string(), Span::none()))?;
        let function = Compiler::new()
            .compile(&program)
            .map_err(|e| RuntimeError::new(e.to_string(), Span::none()))?;
        VM::new().run(function)
    }

    /// Run a program and read a global back out of the VM.
    fn run_and_get(source: &str, name: &str) -> Value {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let function = Compiler::new().compile(&program).unwrap();
        let mut vm = VM::new();
        vm.run(function).unwrap();
        let globals = vm.globals.borrow();
        globals.get(name).unwrap()
    }

    #[test]
    fn test_arithmetic_globals() {
        assert_eq!(run_and_get("let x = 1 + 2 * 3", "x"), Value::Number(7.0));
        assert_eq!(run_and_get("let x = 10 / 4", "x"), Value::Number(2.5));
    }

    #[test]
    fn test_division_by_zero() {
        let err = run_source("let x = 1 / 0").unwrap_err();
        assert_eq!(err.message(), "division by zero");
    }

    #[test]
    fn test_string_concat() {
        assert_eq!(
            run_and_get("let s = \"n = \" + 3", "s"),
            Value::String("n = 3".to_string())
        );
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            run_and_get("let x = 0 if (1 < 2) { x = 1 } else { x = 2 }", "x"),
            Value::Number(1.0)
        );
        assert_eq!(
            run_and_get("let x = 0 if (1 > 2) { x = 1 } else { x = 2 }", "x"),
            Value::Number(2.0)
        );
    }

    #[test]
    fn test_jump_if_false_requires_boolean() {
        let err = run_source("if (1) { let x = 2 }").unwrap_err();
        assert!(matches!(err, RuntimeError::TypeError { .. }));
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run_and_get("let i = 0 while (i < 5) { i = i + 1 }", "i"),
            Value::Number(5.0)
        );
    }

    #[test]
    fn test_for_range_loop() {
        assert_eq!(
            run_and_get("let sum = 0 for range(i, 5) { sum = sum + i }", "sum"),
            Value::Number(10.0)
        );
    }

    #[test]
    fn test_for_range_zero_iterations() {
        assert_eq!(
            run_and_get("let n = 0 for range(i, 0) { n = n + 1 }", "n"),
            Value::Number(0.0)
        );
    }

    #[test]
    fn test_function_call() {
        let source = "funct add(a, b) { return a + b } let r = add(2, 3)";
        assert_eq!(run_and_get(source, "r"), Value::Number(5.0));
    }

    #[test]
    fn test_function_missing_args_are_null_padded() {
        // One argument supplied, the second local slot reads null; the
        // body only touches the first.
        let source = "funct first(a, b) { return a } let r = first(7)";
        assert_eq!(run_and_get(source, "r"), Value::Number(7.0));
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            funct fib(n) {
                if (n < 2) { return n }
                return fib(n - 1) + fib(n - 2)
            }
            let r = fib(12)
        "#;
        assert_eq!(run_and_get(source, "r"), Value::Number(144.0));
    }

    #[test]
    fn test_locals_inside_function() {
        let source = r#"
            funct f() {
                let a = 1
                let b = 2
                let c = a + b
                return c
            }
            let r = f()
        "#;
        assert_eq!(run_and_get(source, "r"), Value::Number(3.0));
    }

    #[test]
    fn test_increment_collapse_behaviour() {
        // The peephole rewrites the loop body; results must not change.
        let source = r#"
            funct count(n) {
                let x = 0
                for range(i, n) { x = x + 1 }
                return x
            }
            let r = count(100)
        "#;
        assert_eq!(run_and_get(source, "r"), Value::Number(100.0));
    }

    #[test]
    fn test_call_not_a_function() {
        let err = run_source("let x = 1 let y = x(2)").unwrap_err();
        assert!(matches!(err, RuntimeError::NotCallable(_)));
    }

    #[test]
    fn test_undefined_global() {
        let err = run_source("let x = missing").unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable(_, _)));
    }

    #[test]
    fn test_import_and_member_access() {
        assert_eq!(
            run_and_get("import \"fmaths\" as fm let tau = fm.pi * 2", "tau"),
            Value::Number(std::f64::consts::TAU)
        );
    }

    #[test]
    fn test_unknown_module() {
        let err = run_source("import \"nonesuch\" as x").unwrap_err();
        assert_eq!(err.message(), "unknown module: nonesuch");
    }

    #[test]
    fn test_math_intrinsics_match_module_path() {
        assert_eq!(
            run_and_get("import \"fmaths\" as m let r = m.sqrt(16)", "r"),
            Value::Number(4.0)
        );
        assert_eq!(
            run_and_get("import \"fmaths\" as m let r = m.pow(2, 10)", "r"),
            Value::Number(1024.0)
        );
    }

    #[test]
    fn test_math_intrinsic_domain_error() {
        let err = run_source("import \"fmaths\" as m let r = m.sqrt(0 - 1)").unwrap_err();
        assert_eq!(err.message(), "sqrt of negative number");
    }

    #[test]
    fn test_make_array_and_map() {
        assert_eq!(
            run_and_get("let a = [1, 2, 3]", "a"),
            Value::array(vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Number(3.0)
            ])
        );
        let m = run_and_get("let m = {\"a\": 1, \"b\": 2}", "m");
        let Value::Map(map) = m else { panic!("expected map") };
        assert_eq!(map.borrow().get("a"), Some(&Value::Number(1.0)));
        assert_eq!(map.borrow().get("b"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_program_yields_last_statement_value() {
        assert_eq!(run_source("let x = 1 x + 2").unwrap(), Value::Number(3.0));
        assert_eq!(run_source("let x = 5").unwrap(), Value::Number(5.0));
        assert_eq!(run_source("").unwrap(), Value::Null);
    }

    #[test]
    fn test_function_fall_through_yields_last_statement_value() {
        let source = "funct add(a, b) { a + b } let r = add(2, 3)";
        assert_eq!(run_and_get(source, "r"), Value::Number(5.0));
    }

    #[test]
    fn test_fall_through_after_loop_is_null() {
        assert_eq!(
            run_source("funct f() { for range(i, 3) { } } f()").unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_duplicate_map_key_keeps_last_value() {
        assert_eq!(
            run_and_get("let m = {\"a\": 1, \"a\": 2} let r = m.a", "r"),
            Value::Number(2.0)
        );
    }

    #[test]
    fn test_map_member_access() {
        assert_eq!(
            run_and_get("let m = {\"a\": 41} let r = m.a + 1", "r"),
            Value::Number(42.0)
        );
    }

    #[test]
    fn test_native_call_through_vm() {
        assert_eq!(
            run_and_get("let s = pretty({\"b\": 2, \"a\": 1})", "s"),
            Value::String("{\"a\": 1, \"b\": 2}".to_string())
        );
    }

    #[test]
    fn test_nested_calls_clean_stack() {
        let source = r#"
            funct double(x) { return x * 2 }
            funct quad(x) { return double(double(x)) }
            let r = quad(4)
        "#;
        assert_eq!(run_and_get(source, "r"), Value::Number(16.0));
    }
}
