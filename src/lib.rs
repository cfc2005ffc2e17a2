//! MathScript: a small expression and statement language with lexical
//! closures, evaluated by a tree‑walking interpreter.
//!
//! Pipeline: source → [`scanner::tokenize`] → [`parser::Parser`] →
//! [`interpreter::Interpreter`].

pub mod ast_printer;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod repl;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

pub use builtins::Builtins;
pub use error::{ErrorKind, MathScriptError, Result};
pub use interpreter::{Flow, Interpreter};
pub use parser::{parse_source, Parser};
pub use scanner::{tokenize, Scanner};
pub use value::Value;
