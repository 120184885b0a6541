//! Error types for all pipeline phases.

use crate::span::Span;
use thiserror::Error;

/// Lexer errors.
#[derive(Debug, Error)]
pub enum LexerError {
    #[error("unrecognized character '{0}'")]
    UnexpectedChar(char, Span),

    #[error("unterminated string")]
    UnterminatedString(Span),

    #[error("could not parse number '{0}'")]
    InvalidNumber(String, Span),
}

impl LexerError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedChar(_, span) => *span,
            Self::UnterminatedString(span) => *span,
            Self::InvalidNumber(_, span) => *span,
        }
    }
}

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("unexpected token '{found}', expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input")]
    UnexpectedEof(Span),

    #[error("invalid assignment target")]
    InvalidAssignmentTarget(Span),

    #[error("{message}")]
    General { message: String, span: Span },
}

impl ParserError {
    pub fn unexpected_token(
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn general(message: impl Into<String>, span: Span) -> Self {
        Self::General {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::UnexpectedEof(span) => *span,
            Self::InvalidAssignmentTarget(span) => *span,
            Self::General { span, .. } => *span,
        }
    }
}

/// Bytecode compilation errors.
///
/// `Unsupported` marks a construct the VM has no opcodes for; the hybrid
/// engine keeps such nodes on the AST path.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("bytecode compiler does not support {construct}")]
    Unsupported { construct: &'static str, span: Span },

    #[error("{message}")]
    General { message: String, span: Span },
}

impl CompileError {
    pub fn unsupported(construct: &'static str, span: Span) -> Self {
        Self::Unsupported { construct, span }
    }

    pub fn general(message: impl Into<String>, span: Span) -> Self {
        Self::General {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Unsupported { span, .. } => *span,
            Self::General { span, .. } => *span,
        }
    }
}

/// Runtime errors. Display renders the bare message; `try/catch` binds
/// exactly this text, and the top-level reporter prepends location.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero(Span),

    #[error("modulo by zero")]
    ModuloByZero(Span),

    #[error("undefined variable: {0}")]
    UndefinedVariable(String, Span),

    #[error("cannot declare variable '{0}': it already exists")]
    Redeclaration(String, Span),

    #[error("cannot assign to constant variable '{0}'")]
    ConstantReassignment(String, Span),

    #[error("not a function")]
    NotCallable(Span),

    #[error("{message}")]
    TypeError { message: String, span: Span },

    #[error("unknown property '{property}' on {value_type}")]
    NoSuchProperty {
        value_type: String,
        property: String,
        span: Span,
    },

    #[error("unknown module: {0}")]
    UnknownModule(String, Span),

    #[error("VM stack underflow")]
    StackUnderflow,

    #[error("unknown opcode: {0}")]
    UnknownOpcode(u32),

    #[error("{message}")]
    General { message: String, span: Span },
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self::General {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::TypeError {
            message: message.into(),
            span,
        }
    }

    /// The message component alone, as bound by `try/catch`.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn span(&self) -> Span {
        match self {
            Self::DivisionByZero(span) => *span,
            Self::ModuloByZero(span) => *span,
            Self::UndefinedVariable(_, span) => *span,
            Self::Redeclaration(_, span) => *span,
            Self::ConstantReassignment(_, span) => *span,
            Self::NotCallable(span) => *span,
            Self::TypeError { span, .. } => *span,
            Self::NoSuchProperty { span, .. } => *span,
            Self::UnknownModule(_, span) => *span,
            Self::StackUnderflow | Self::UnknownOpcode(_) => Span::none(),
            Self::General { span, .. } => *span,
        }
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum DylangError {
    #[error("Lexical error{}: {0}", location(.0.span()))]
    Lexer(#[from] LexerError),

    #[error("Parse error{}: {0}", location(.0.span()))]
    Parser(#[from] ParserError),

    #[error("Compile error{}: {0}", location(.0.span()))]
    Compile(#[from] CompileError),

    #[error("Runtime error{}: {0}", location(.0.span()))]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn location(span: Span) -> String {
    if span.is_known() {
        format!(" at {}", span)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_message_is_bare() {
        let err = RuntimeError::DivisionByZero(Span::new(0, 1, 3, 7));
        assert_eq!(err.message(), "division by zero");
    }

    #[test]
    fn top_level_display_includes_location() {
        let err: DylangError = RuntimeError::DivisionByZero(Span::new(0, 1, 3, 7)).into();
        assert_eq!(err.to_string(), "Runtime error at 3:7: division by zero");
    }

    #[test]
    fn top_level_display_omits_unknown_location() {
        let err: DylangError = RuntimeError::StackUnderflow.into();
        assert_eq!(err.to_string(), "Runtime error: VM stack underflow");
    }
}
