//! Centralised error hierarchy for the **MathScript interpreter**.
//!
//! Every stage of the pipeline (scanner, parser, interpreter, builtins) turns its
//! failure modes into one of the variants defined here. A run fails fast and
//! whole: the first error aborts lexing, parsing or evaluation and is handed
//! back to the host unchanged.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Position;

/// Coarse category of a [`MathScriptError`], for hosts that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    UndefinedName,
    Arity,
    Type,
    DivisionByZero,
    NotIterable,
    Domain,
    Usage,
    Io,
}

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MathScriptError {
    /// A character no token pattern accepts.
    #[error("[{pos}] Unexpected character '{ch}'")]
    UnexpectedChar { ch: char, pos: Position },

    /// A string literal with no closing quote.
    #[error("[{pos}] Unterminated string")]
    UnterminatedString { pos: Position },

    /// A backslash escape the scanner does not know.
    #[error("[{pos}] Unknown escape sequence '\\{ch}'")]
    UnknownEscape { ch: char, pos: Position },

    /// Grammar violation: what the rule wanted and what it got instead.
    #[error("[{pos}] Expected {expected}, found {found}")]
    Parse {
        expected: String,
        found: String,
        pos: Position,
    },

    /// Identifier bound neither in the scope chain nor in the builtins.
    #[error("[{pos}] Undefined name '{name}'")]
    UndefinedName { name: String, pos: Position },

    /// A call supplying the wrong number of arguments.
    #[error("[{pos}] '{name}' expects {expected} argument(s) but got {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
        pos: Position,
    },

    /// Operand kind unsuitable for an operator, builtin or condition.
    #[error("[{pos}] Type error: {message}")]
    Type { message: String, pos: Position },

    #[error("[{pos}] Division by zero")]
    DivisionByZero { pos: Position },

    /// `for` over a value that cannot be iterated.
    #[error("[{pos}] Value of type {type_name} is not iterable")]
    NotIterable {
        type_name: &'static str,
        pos: Position,
    },

    /// A builtin received an argument outside its mathematical domain.
    #[error("[{pos}] {name}: {message}")]
    Domain {
        name: String,
        message: String,
        pos: Position,
    },

    #[error("[{pos}] 'return' outside of a function")]
    ReturnOutsideFunction { pos: Position },

    #[error("[{pos}] Maximum nesting depth of {limit} exceeded")]
    RecursionLimit { limit: usize, pos: Position },

    /// Failure writing to the host output sink. Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MathScriptError {
    /// Helper constructor for the **parser**.
    pub fn parse<E: Into<String>, F: Into<String>>(pos: Position, expected: E, found: F) -> Self {
        let expected: String = expected.into();
        let found: String = found.into();

        info!(
            "Creating Parse error: {}, expected={}, found={}",
            pos, expected, found
        );

        MathScriptError::Parse {
            expected,
            found,
            pos,
        }
    }

    /// Helper constructor for runtime **type** errors.
    pub fn type_error<S: Into<String>>(pos: Position, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Type error: {}, msg={}", pos, message);

        MathScriptError::Type { message, pos }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MathScriptError::UnexpectedChar { .. }
            | MathScriptError::UnterminatedString { .. }
            | MathScriptError::UnknownEscape { .. } => ErrorKind::Lex,
            MathScriptError::Parse { .. } => ErrorKind::Parse,
            MathScriptError::UndefinedName { .. } => ErrorKind::UndefinedName,
            MathScriptError::Arity { .. } => ErrorKind::Arity,
            MathScriptError::Type { .. } => ErrorKind::Type,
            MathScriptError::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            MathScriptError::NotIterable { .. } => ErrorKind::NotIterable,
            MathScriptError::Domain { .. } => ErrorKind::Domain,
            MathScriptError::ReturnOutsideFunction { .. }
            | MathScriptError::RecursionLimit { .. } => ErrorKind::Usage,
            MathScriptError::Io(_) => ErrorKind::Io,
        }
    }

    /// Source position of the failure, when the error has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            MathScriptError::UnexpectedChar { pos, .. }
            | MathScriptError::UnterminatedString { pos }
            | MathScriptError::UnknownEscape { pos, .. }
            | MathScriptError::Parse { pos, .. }
            | MathScriptError::UndefinedName { pos, .. }
            | MathScriptError::Arity { pos, .. }
            | MathScriptError::Type { pos, .. }
            | MathScriptError::DivisionByZero { pos }
            | MathScriptError::NotIterable { pos, .. }
            | MathScriptError::Domain { pos, .. }
            | MathScriptError::ReturnOutsideFunction { pos }
            | MathScriptError::RecursionLimit { pos, .. } => Some(*pos),
            MathScriptError::Io(_) => None,
        }
    }

    /// Lex and parse failures are static; everything else happened while running.
    pub fn is_static(&self) -> bool {
        matches!(self.kind(), ErrorKind::Lex | ErrorKind::Parse)
    }
}

/// Failure raised inside a builtin body. It has no source position; the
/// interpreter attaches the call site with [`NativeError::at`].
#[derive(Debug, Error)]
pub enum NativeError {
    #[error("{0}")]
    Type(String),

    #[error("{0}")]
    Domain(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl NativeError {
    pub fn at(self, name: &str, pos: Position) -> MathScriptError {
        match self {
            NativeError::Type(message) => MathScriptError::Type {
                message: format!("{}: {}", name, message),
                pos,
            },
            NativeError::Domain(message) => MathScriptError::Domain {
                name: name.to_string(),
                message,
                pos,
            },
            NativeError::Io(e) => MathScriptError::Io(e),
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, MathScriptError>;
