//! The minnow language: syntax tree, parser and tree-walking evaluator.

pub mod ast;
pub mod env;
pub mod error;
pub mod eval;
pub mod parser;
pub mod value;

pub use self::ast::{Ast, NodeId, NodeTag};
pub use self::env::{EnvRef, Environment};
pub use self::error::EvalError;
pub use self::eval::{DebugHook, Interpreter, NopHook};
pub use self::value::Value;
