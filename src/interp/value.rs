use crate::interp::ast::{Ast, NodeId};
use crate::interp::env::EnvRef;
use crate::interp::error::EvalError;
use itertools::Itertools;
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, EvalError>;

/// A native function installed in the global scope.
pub struct Builtin {
    pub name: &'static str,
    pub run: BuiltinFn,
}

pub static BUILTINS: Lazy<Vec<Builtin>> = Lazy::new(|| {
    vec![
        Builtin {
            name: "puts",
            run: builtin_puts,
        },
        Builtin {
            name: "len",
            run: builtin_len,
        },
    ]
});

fn builtin_puts(args: &[Value]) -> Result<Value, EvalError> {
    println!("{}", args.iter().map(ToString::to_string).join(" "));
    Ok(Value::Nil)
}

fn builtin_len(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [Value::Str(s)] => Ok(Value::Int(s.chars().count() as i64)),
        [Value::Array(items)] => Ok(Value::Int(items.borrow().len() as i64)),
        [other] => Err(EvalError::Builtin(
            "len",
            format!("cannot take the length of {}", other.type_name()),
        )),
        _ => Err(EvalError::Builtin(
            "len",
            "expected exactly one argument".to_string(),
        )),
    }
}

/// A user function value: parameter names, the body node and the captured
/// environment. The owning [`Ast`] is kept alive so the body stays callable
/// after the defining script finished (e.g. from the shell).
pub struct FunctionValue {
    pub params: Vec<String>,
    pub body: NodeId,
    pub ast: Rc<Ast>,
    pub env: EnvRef,
}

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<FunctionValue>),
    Builtin(&'static Builtin),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
        }
    }

    /// Callable bindings are suppressed in bulk symbol dumps.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => write!(
                f,
                "[{}]",
                items.borrow().iter().map(ToString::to_string).join(", ")
            ),
            Value::Function(fun) => write!(f, "fn({})", fun.params.iter().join(", ")),
            Value::Builtin(b) => write!(f, "builtin {}", b.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
