//! Runtime values for the Dylang interpreter.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Stmt;
use crate::bytecode::chunk::CompiledFunction;
use crate::interpreter::environment::Environment;

/// A runtime value. Numbers are IEEE-754 doubles; arrays own their
/// elements and maps their entries, shared by reference through `Rc`.
#[derive(Debug, Clone)]
pub enum Value {
    /// Number value (f64)
    Number(f64),
    /// String value
    String(String),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Array value
    Array(Rc<RefCell<Vec<Value>>>),
    /// Map value: string keys, insertion-ordered storage
    Map(Rc<RefCell<IndexMap<String, Value>>>),
    /// User-defined function (closure)
    Function(Rc<Function>),
    /// Host-provided built-in function
    NativeFunction(NativeFunction),
    /// Bytecode-compiled function (executed by the VM)
    VmFunction(Rc<CompiledFunction>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Bool(_) => "Boolean",
            Value::Null => "Null",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Function(_) | Value::NativeFunction(_) | Value::VmFunction(_) => "Function",
        }
    }

    /// Truthiness: `false`, `0`, `""` and `null` are falsy; arrays,
    /// maps and functions (even empty ones) are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn map(entries: IndexMap<String, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }
}

/// Structural equality, used by tests and the constant pool. The `==`
/// operator has its own rules (aggregates never compare equal there).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Map(a), Value::Map(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::VmFunction(a), Value::VmFunction(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The plain display form used by string concatenation. Aggregates
/// render opaquely; the recursive forms belong to `pretty`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Array(_) => write!(f, "[...Array]"),
            Value::Map(_) => write!(f, "{{...Map}}"),
            Value::Function(_) | Value::NativeFunction(_) | Value::VmFunction(_) => {
                write!(f, "[function]")
            }
        }
    }
}

/// A user-defined function value. Carries the environment in force at
/// its declaration; assignment through that environment is how closures
/// observe each other's writes.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub closure: Rc<RefCell<Environment>>,
}

/// A host-provided built-in function.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    /// None means variadic.
    pub arity: Option<usize>,
    pub func: Rc<dyn Fn(Vec<Value>) -> Result<Value, String>>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, arity: Option<usize>, func: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, String> + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value, String> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
