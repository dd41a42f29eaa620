use crate::interp::value::{Value, BUILTINS};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type EnvRef = Rc<RefCell<Environment>>;

/// A chain of nested variable scopes. `level` is the call-stack depth: block
/// scopes inherit it, function application opens a scope one level deeper.
/// The debugger only reads environments, the evaluator owns and mutates them.
pub struct Environment {
    level: usize,
    outer: Option<EnvRef>,
    bindings: IndexMap<String, Value>,
}

impl Environment {
    /// The top-level scope with builtins installed, at level 0.
    pub fn global() -> EnvRef {
        let mut env = Environment {
            level: 0,
            outer: None,
            bindings: IndexMap::new(),
        };
        for builtin in BUILTINS.iter() {
            env.bindings
                .insert(builtin.name.to_string(), Value::Builtin(builtin));
        }
        Rc::new(RefCell::new(env))
    }

    /// A lexical block scope at the same call depth.
    pub fn block(outer: &EnvRef) -> EnvRef {
        let level = outer.borrow().level;
        Rc::new(RefCell::new(Environment {
            level,
            outer: Some(Rc::clone(outer)),
            bindings: IndexMap::new(),
        }))
    }

    /// A function call scope chained to the captured environment.
    pub fn call(captured: &EnvRef, level: usize) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            level,
            outer: Some(Rc::clone(captured)),
            bindings: IndexMap::new(),
        }))
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
            || self
                .outer
                .as_ref()
                .is_some_and(|outer| outer.borrow().has(name))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.get(name) {
            Some(value) => Some(value.clone()),
            None => self
                .outer
                .as_ref()
                .and_then(|outer| outer.borrow().get(name)),
        }
    }

    /// Bind a name in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Overwrite the nearest existing binding. Returns false when the name
    /// is bound nowhere in the chain.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.bindings.get_mut(name) {
            *slot = value;
            true
        } else if let Some(outer) = &self.outer {
            outer.borrow_mut().assign(name, value)
        } else {
            false
        }
    }
}
