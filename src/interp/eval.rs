//! Tree-walking evaluator. Before every statement node it calls the
//! installed [`DebugHook`], which is how the debugger intercepts execution.

use crate::interp::ast::{Ast, NodeId, NodeTag};
use crate::interp::env::{EnvRef, Environment};
use crate::interp::error::EvalError;
use crate::interp::value::{FunctionValue, Value};
use std::rc::Rc;

/// Hook invoked for every statement the evaluator is about to process.
///
/// `force_break` is set for the explicit `debugger` statement. The hook may
/// block on user input; it must not fail — all of its errors are handled
/// internally.
pub trait DebugHook {
    fn on_statement(&mut self, ast: &Ast, node: NodeId, env: &Environment, force_break: bool);
}

/// The no-op debugger installed for regular runs.
pub struct NopHook;

impl DebugHook for NopHook {
    fn on_statement(&mut self, _: &Ast, _: NodeId, _: &Environment, _: bool) {}
}

/// Control flow interruptions that unwind through nested evaluation.
enum Interrupt {
    Return(Value),
    Error(EvalError),
}

impl From<EvalError> for Interrupt {
    fn from(e: EvalError) -> Self {
        Interrupt::Error(e)
    }
}

type Flow<T> = Result<T, Interrupt>;

pub struct Interpreter {
    hook: Box<dyn DebugHook>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_hook(Box::new(NopHook))
    }

    pub fn with_hook(hook: Box<dyn DebugHook>) -> Self {
        Self { hook }
    }

    /// Evaluate a whole program. The value of the last top-level statement is
    /// returned (the shell echoes it).
    pub fn eval(&mut self, ast: &Rc<Ast>, env: &EnvRef) -> Result<Value, EvalError> {
        match self.eval_node(ast, ast.root(), env) {
            Ok(value) => Ok(value),
            Err(Interrupt::Return(_)) => Err(EvalError::ReturnOutsideFunction),
            Err(Interrupt::Error(e)) => Err(e),
        }
    }

    fn eval_node(&mut self, ast: &Rc<Ast>, node: NodeId, env: &EnvRef) -> Flow<Value> {
        match ast.tag(node) {
            NodeTag::Program => self.eval_stmts(ast, node, env),
            NodeTag::Block => {
                let scope = Environment::block(env);
                self.eval_stmts(ast, node, &scope)
            }
            NodeTag::Debugger | NodeTag::Nil => Ok(Value::Nil),
            NodeTag::Int => {
                let token = ast.token(node).unwrap_or_default();
                let value = token
                    .parse::<i64>()
                    .map_err(|_| EvalError::IntOutOfRange(token.to_string()))?;
                Ok(Value::Int(value))
            }
            NodeTag::Str => Ok(Value::Str(Rc::new(
                ast.token(node).unwrap_or_default().to_string(),
            ))),
            NodeTag::Bool => Ok(Value::Bool(ast.token(node) == Some("true"))),
            NodeTag::Identifier => {
                let name = ast.token(node).unwrap_or_default();
                match env.borrow().get(name) {
                    Some(value) => Ok(value),
                    None => Err(EvalError::UndefinedVariable(name.to_string()).into()),
                }
            }
            NodeTag::Array => {
                let mut items = Vec::with_capacity(ast.children(node).len());
                for &elem in ast.children(node) {
                    items.push(self.eval_node(ast, elem, env)?);
                }
                Ok(Value::Array(Rc::new(std::cell::RefCell::new(items))))
            }
            NodeTag::Function => {
                let children = ast.children(node);
                let (&body, params) = children
                    .split_last()
                    .expect("function node always has a body");
                let params = params
                    .iter()
                    .map(|&p| ast.token(p).unwrap_or_default().to_string())
                    .collect();
                Ok(Value::Function(Rc::new(FunctionValue {
                    params,
                    body,
                    ast: Rc::clone(ast),
                    env: Rc::clone(env),
                })))
            }
            NodeTag::Assign => {
                let children = ast.children(node);
                let name = ast.token(children[0]).unwrap_or_default().to_string();
                let value = self.eval_node(ast, children[1], env)?;
                let assigned = env.borrow_mut().assign(&name, value.clone());
                if !assigned {
                    env.borrow_mut().define(name, value.clone());
                }
                Ok(value)
            }
            NodeTag::Return => {
                let value = match ast.children(node) {
                    [] => Value::Nil,
                    [child, ..] => self.eval_node(ast, *child, env)?,
                };
                Err(Interrupt::Return(value))
            }
            NodeTag::If => {
                let children = ast.children(node);
                if truthy(&self.eval_node(ast, children[0], env)?)? {
                    self.eval_node(ast, children[1], env)
                } else if let Some(&else_branch) = children.get(2) {
                    self.eval_node(ast, else_branch, env)
                } else {
                    Ok(Value::Nil)
                }
            }
            NodeTag::While => {
                let children = ast.children(node);
                let (cond, body) = (children[0], children[1]);
                while truthy(&self.eval_node(ast, cond, env)?)? {
                    self.eval_node(ast, body, env)?;
                }
                Ok(Value::Nil)
            }
            NodeTag::Unary => {
                let op = ast.token(node).unwrap_or_default();
                let operand = self.eval_node(ast, ast.children(node)[0], env)?;
                match (op, operand) {
                    ("-", Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
                    ("!", operand) => Ok(Value::Bool(!truthy(&operand)?)),
                    (op, operand) => Err(EvalError::UnaryType {
                        op: op.to_string(),
                        operand: operand.type_name(),
                    }
                    .into()),
                }
            }
            NodeTag::Binary => self.eval_binary(ast, node, env),
            NodeTag::Call => self.eval_call(ast, node, env),
            NodeTag::Index => {
                let children = ast.children(node);
                let target = self.eval_node(ast, children[0], env)?;
                let index = self.eval_node(ast, children[1], env)?;
                match (target, index) {
                    (Value::Array(items), Value::Int(i)) => {
                        let items = items.borrow();
                        let len = items.len();
                        usize::try_from(i)
                            .ok()
                            .and_then(|i| items.get(i).cloned())
                            .ok_or_else(|| {
                                EvalError::IndexOutOfRange { index: i, len }.into()
                            })
                    }
                    (target @ (Value::Nil
                    | Value::Bool(_)
                    | Value::Int(_)
                    | Value::Str(_)
                    | Value::Function(_)
                    | Value::Builtin(_)), Value::Int(_)) => {
                        Err(EvalError::NotIndexable(target.type_name()).into())
                    }
                    (_, index) => Err(EvalError::IndexType(index.type_name()).into()),
                }
            }
        }
    }

    fn eval_stmts(&mut self, ast: &Rc<Ast>, node: NodeId, env: &EnvRef) -> Flow<Value> {
        let mut last = Value::Nil;
        for &stmt in ast.children(node) {
            self.hook.on_statement(
                ast,
                stmt,
                &env.borrow(),
                ast.tag(stmt) == NodeTag::Debugger,
            );
            last = self.eval_node(ast, stmt, env)?;
        }
        Ok(last)
    }

    fn eval_binary(&mut self, ast: &Rc<Ast>, node: NodeId, env: &EnvRef) -> Flow<Value> {
        let op = ast.token(node).unwrap_or_default();
        let children = ast.children(node);
        let (lhs_node, rhs_node) = (children[0], children[1]);

        // logical operators short-circuit
        match op {
            "&&" => {
                let lhs = self.eval_node(ast, lhs_node, env)?;
                if !truthy(&lhs)? {
                    return Ok(Value::Bool(false));
                }
                let rhs = self.eval_node(ast, rhs_node, env)?;
                return Ok(Value::Bool(truthy(&rhs)?));
            }
            "||" => {
                let lhs = self.eval_node(ast, lhs_node, env)?;
                if truthy(&lhs)? {
                    return Ok(Value::Bool(true));
                }
                let rhs = self.eval_node(ast, rhs_node, env)?;
                return Ok(Value::Bool(truthy(&rhs)?));
            }
            _ => {}
        }

        let lhs = self.eval_node(ast, lhs_node, env)?;
        let rhs = self.eval_node(ast, rhs_node, env)?;
        Ok(apply_binary(op, lhs, rhs)?)
    }

    fn eval_call(&mut self, ast: &Rc<Ast>, node: NodeId, env: &EnvRef) -> Flow<Value> {
        let children = ast.children(node);
        let callee = self.eval_node(ast, children[0], env)?;
        let mut args = Vec::with_capacity(children.len() - 1);
        for &arg in &children[1..] {
            args.push(self.eval_node(ast, arg, env)?);
        }

        match callee {
            Value::Function(function) => {
                if function.params.len() != args.len() {
                    return Err(EvalError::Arity {
                        expected: function.params.len(),
                        got: args.len(),
                    }
                    .into());
                }
                let depth = env.borrow().level() + 1;
                let scope = Environment::call(&function.env, depth);
                for (param, arg) in function.params.iter().zip(args) {
                    scope.borrow_mut().define(param.clone(), arg);
                }
                match self.eval_node(&function.ast, function.body, &scope) {
                    Ok(value) => Ok(value),
                    Err(Interrupt::Return(value)) => Ok(value),
                    Err(e) => Err(e),
                }
            }
            Value::Builtin(builtin) => Ok((builtin.run)(&args)?),
            other => Err(EvalError::NotCallable(other.type_name()).into()),
        }
    }
}

fn truthy(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        other => Err(EvalError::Condition(other.type_name())),
    }
}

fn apply_binary(op: &str, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    match (op, &lhs, &rhs) {
        ("+", Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
        ("-", Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
        ("*", Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
        ("/", Value::Int(a), Value::Int(b)) => match a.checked_div(*b) {
            Some(q) => Ok(Value::Int(q)),
            None => Err(EvalError::DivisionByZero),
        },
        ("%", Value::Int(a), Value::Int(b)) => match a.checked_rem(*b) {
            Some(r) => Ok(Value::Int(r)),
            None => Err(EvalError::DivisionByZero),
        },
        ("+", Value::Str(a), Value::Str(b)) => {
            Ok(Value::Str(Rc::new(format!("{a}{b}"))))
        }
        ("<", Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a < b)),
        ("<=", Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a <= b)),
        (">", Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a > b)),
        (">=", Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a >= b)),
        ("<", Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a < b)),
        ("<=", Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a <= b)),
        (">", Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a > b)),
        (">=", Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a >= b)),
        ("==", _, _) => Ok(Value::Bool(lhs == rhs)),
        ("!=", _, _) => Ok(Value::Bool(lhs != rhs)),
        (op, lhs, rhs) => Err(EvalError::BinaryType {
            op: op.to_string(),
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::parser;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run(src: &str) -> Result<Value, EvalError> {
        let ast = Rc::new(parser::parse("(test)", src).expect("source must parse"));
        let env = Environment::global();
        Interpreter::new().eval(&ast, &env)
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(run("1 + 2 * 3").unwrap(), Value::Int(7));
        assert_eq!(run("(1 + 2) * 3").unwrap(), Value::Int(9));
        assert_eq!(run("10 % 4").unwrap(), Value::Int(2));
        assert_eq!(run("-5 + 1").unwrap(), Value::Int(-4));
    }

    #[test]
    fn string_concat_and_compare() {
        assert_eq!(run("\"ab\" + \"cd\"").unwrap(), run("\"abcd\"").unwrap());
        assert_eq!(run("\"ab\" < \"b\"").unwrap(), Value::Bool(true));
    }

    #[test]
    fn assignment_declares_then_overwrites() {
        assert_eq!(run("x = 1\nx = x + 1\nx").unwrap(), Value::Int(2));
    }

    #[test]
    fn functions_capture_their_environment() {
        let src = "
            base = 10
            add = fn(n) { return base + n }
            add(5)
        ";
        assert_eq!(run(src).unwrap(), Value::Int(15));
    }

    #[test]
    fn closures_see_later_global_updates() {
        let src = "
            base = 1
            get = fn() { return base }
            base = 2
            get()
        ";
        assert_eq!(run(src).unwrap(), Value::Int(2));
    }

    #[test]
    fn while_loops_and_conditions() {
        let src = "
            i = 0
            total = 0
            while i < 5 {
                total = total + i
                i = i + 1
            }
            total
        ";
        assert_eq!(run(src).unwrap(), Value::Int(10));
    }

    #[test]
    fn if_else_branches() {
        assert_eq!(run("if 1 < 2 { 10 } else { 20 }").unwrap(), Value::Int(10));
        assert_eq!(run("if 1 > 2 { 10 } else { 20 }").unwrap(), Value::Int(20));
        assert_eq!(run("if false { 10 }").unwrap(), Value::Nil);
    }

    #[test]
    fn arrays_index_and_len() {
        assert_eq!(run("a = [1, 2, 3]\na[1]").unwrap(), Value::Int(2));
        assert_eq!(run("len([1, 2, 3])").unwrap(), Value::Int(3));
        assert!(matches!(
            run("a = [1]\na[5]"),
            Err(EvalError::IndexOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn recursion_works() {
        let src = "
            fact = fn(n) {
                if n <= 1 { return 1 }
                return n * fact(n - 1)
            }
            fact(6)
        ";
        assert_eq!(run(src).unwrap(), Value::Int(720));
    }

    #[test]
    fn runtime_errors_are_reported_not_panicked() {
        assert!(matches!(run("boom"), Err(EvalError::UndefinedVariable(_))));
        assert!(matches!(run("1 / 0"), Err(EvalError::DivisionByZero)));
        assert!(matches!(run("5(1)"), Err(EvalError::NotCallable("int"))));
        assert!(matches!(
            run("f = fn(a) { return a }\nf(1, 2)"),
            Err(EvalError::Arity {
                expected: 1,
                got: 2
            })
        ));
        assert!(matches!(
            run("\"a\" + 1"),
            Err(EvalError::BinaryType { .. })
        ));
    }

    #[test]
    fn logical_operators_short_circuit() {
        // the `boom` operand must never be evaluated
        assert_eq!(run("false && boom").unwrap(), Value::Bool(false));
        assert_eq!(run("true || boom").unwrap(), Value::Bool(true));
    }

    #[test]
    fn return_outside_function_is_an_error() {
        assert!(matches!(
            run("return 1"),
            Err(EvalError::ReturnOutsideFunction)
        ));
    }

    /// Records every hook invocation: (line, level, force_break).
    struct RecordingHook {
        calls: Rc<RefCell<Vec<(u32, usize, bool)>>>,
    }

    impl DebugHook for RecordingHook {
        fn on_statement(&mut self, ast: &Ast, node: NodeId, env: &Environment, force: bool) {
            self.calls
                .borrow_mut()
                .push((ast.line(node), env.level(), force));
        }
    }

    #[test]
    fn hook_fires_per_statement_with_depth_and_force_flag() {
        let src = "\
f = fn(a) {
    b = a + 1
    return b
}
debugger
x = f(1)
";
        let calls = Rc::new(RefCell::new(Vec::new()));
        let ast = Rc::new(parser::parse("(test)", src).expect("source must parse"));
        let env = Environment::global();
        let mut interp = Interpreter::with_hook(Box::new(RecordingHook {
            calls: Rc::clone(&calls),
        }));
        interp.eval(&ast, &env).unwrap();

        let calls = calls.borrow();
        assert_eq!(
            *calls,
            vec![
                (1, 0, false), // f = fn(a) ...
                (5, 0, true),  // debugger
                (6, 0, false), // x = f(1)
                (2, 1, false), // b = a + 1 (inside the call)
                (3, 1, false), // return b
            ]
        );
    }
}
