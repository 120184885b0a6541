//! Expression AST nodes.

use crate::ast::stmt::Stmt;
use crate::span::Span;

/// An expression in the AST. Nodes are immutable once parsed; the
/// evaluator and the bytecode compiler only read them.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// All expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Number literal: 42
    NumberLit(f64),
    /// String literal: "hello" (raw body, escapes uninterpreted)
    StringLit(String),
    /// Boolean literal: true, false
    BoolLit(bool),
    /// Array literal: [1, 2, 3]
    ArrayLit(Vec<Expr>),
    /// Map literal: { key: value, ... }; keys are arbitrary expressions
    /// that must evaluate to strings
    MapLit(Vec<(Expr, Expr)>),

    /// Variable reference: foo
    Identifier(String),

    /// Binary operation: a + b
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// Increment/decrement: ++x, x--
    Unary {
        operand: Box<Expr>,
        op: UnaryOp,
        prefix: bool,
    },

    /// Assignment: x = 5 (the parser guarantees the target is an
    /// identifier)
    Assignment { target: Box<Expr>, value: Box<Expr> },

    /// Function call: foo(a, b)
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Member access: obj.field
    Member { object: Box<Expr>, property: String },

    /// Anonymous function: funct(a, b) { ... }
    Function {
        params: Vec<String>,
        body: Vec<Stmt>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Operator for a comparison lexeme (`== != < <= > >=`).
    pub fn from_comparison(lexeme: &str) -> Option<BinaryOp> {
        match lexeme {
            "==" => Some(BinaryOp::Equal),
            "!=" => Some(BinaryOp::NotEqual),
            "<" => Some(BinaryOp::Less),
            "<=" => Some(BinaryOp::LessEqual),
            ">" => Some(BinaryOp::Greater),
            ">=" => Some(BinaryOp::GreaterEqual),
            _ => None,
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Subtract => write!(f, "-"),
            BinaryOp::Multiply => write!(f, "*"),
            BinaryOp::Divide => write!(f, "/"),
            BinaryOp::Modulo => write!(f, "%"),
            BinaryOp::Equal => write!(f, "=="),
            BinaryOp::NotEqual => write!(f, "!="),
            BinaryOp::Less => write!(f, "<"),
            BinaryOp::LessEqual => write!(f, "<="),
            BinaryOp::Greater => write!(f, ">"),
            BinaryOp::GreaterEqual => write!(f, ">="),
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
        }
    }
}

/// Unary operators (increment/decrement).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Increment,
    Decrement,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Increment => write!(f, "++"),
            UnaryOp::Decrement => write!(f, "--"),
        }
    }
}
