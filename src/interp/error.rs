#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("{0} is not callable")]
    NotCallable(&'static str),
    #[error("expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },
    #[error("`{op}` cannot be applied to {lhs} and {rhs}")]
    BinaryType {
        op: String,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("`{op}` cannot be applied to {operand}")]
    UnaryType {
        op: String,
        operand: &'static str,
    },
    #[error("condition must be a bool or an int, got {0}")]
    Condition(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("cannot index {0}")]
    NotIndexable(&'static str),
    #[error("array index must be an int, got {0}")]
    IndexType(&'static str),
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("integer literal `{0}` out of range")]
    IntOutOfRange(String),
    #[error("`return` outside of a function")]
    ReturnOutsideFunction,
    #[error("{0}: {1}")]
    Builtin(&'static str, String),
}
