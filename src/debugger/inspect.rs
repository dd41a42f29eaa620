//! Scope-aware symbol inspector: resolves the function enclosing a break
//! point and renders the live bindings it references.

use crate::interp::{Ast, Environment, NodeId, NodeTag};
use std::collections::BTreeSet;

/// Nearest ancestor tagged `Function`, or the root when the break point is
/// in top-level code.
fn enclosing_function(ast: &Ast, node: NodeId) -> NodeId {
    let mut current = ast.parent(node).unwrap_or(node);
    while let Some(parent) = ast.parent(current) {
        if ast.tag(current) == NodeTag::Function {
            break;
        }
        current = parent;
    }
    current
}

/// Every identifier referenced directly in the scope rooted at `node`.
/// Subtrees of nested functions are skipped: their bodies reference their
/// own scope, not the one under inspection.
fn collect_identifiers(ast: &Ast, node: NodeId, references: &mut BTreeSet<String>) {
    for &child in ast.children(node) {
        match ast.tag(child) {
            NodeTag::Identifier => {
                if let Some(token) = ast.token(child) {
                    references.insert(token.to_string());
                }
            }
            NodeTag::Function => {}
            _ => collect_identifiers(ast, child, references),
        }
    }
}

/// Referenced names that are live in `env`, for prompt completion.
pub fn scope_symbols(ast: &Ast, node: NodeId, env: &Environment) -> Vec<String> {
    let mut references = BTreeSet::new();
    collect_identifiers(ast, enclosing_function(ast, node), &mut references);
    references
        .into_iter()
        .filter(|name| env.has(name))
        .collect()
}

/// Render the `print` command. An empty symbol dumps every non-callable
/// binding referenced by the enclosing scope, one `name: value` line each;
/// a named symbol prints that binding or an "is undefined" notice.
pub fn render(ast: &Ast, node: NodeId, env: &Environment, symbol: Option<&str>) -> Vec<String> {
    match symbol {
        None | Some("") => {
            let mut references = BTreeSet::new();
            collect_identifiers(ast, enclosing_function(ast, node), &mut references);
            references
                .iter()
                .filter_map(|name| env.get(name).map(|value| (name, value)))
                .filter(|(_, value)| !value.is_callable())
                .map(|(name, value)| format!("{name}: {value}"))
                .collect()
        }
        Some(name) => match env.get(name) {
            Some(value) => vec![format!("{name}: {value}")],
            None => vec![format!("'{name}' is undefined.")],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{parser, DebugHook, Environment, Interpreter};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Runs the inspector at the first forced break of a script.
    struct InspectProbe {
        symbol: Option<&'static str>,
        lines: Rc<RefCell<Vec<String>>>,
    }

    impl DebugHook for InspectProbe {
        fn on_statement(&mut self, ast: &Ast, node: NodeId, env: &Environment, force: bool) {
            if force {
                *self.lines.borrow_mut() = render(ast, node, env, self.symbol);
            }
        }
    }

    fn inspect_at_break(src: &str, symbol: Option<&'static str>) -> Vec<String> {
        let ast = Rc::new(parser::parse("(test)", src).expect("source must parse"));
        let env = Environment::global();
        let lines = Rc::new(RefCell::new(Vec::new()));
        let mut interp = Interpreter::with_hook(Box::new(InspectProbe {
            symbol,
            lines: Rc::clone(&lines),
        }));
        interp.eval(&ast, &env).expect("script must run");
        let result = lines.borrow().clone();
        result
    }

    const SCRIPT: &str = "\
x = 1
f = fn(a) {
    y = a + x
    debugger
    g = fn(b) { return b + unseen }
    h = g
}
f(2)
";

    #[test]
    fn dump_lists_bound_scope_references_sorted() {
        // referenced in f's scope: a, g, h, unseen?, x, y — `unseen` and `b`
        // only occur inside the nested fn and must not appear; g and h are
        // unbound at the break point
        let lines = inspect_at_break(SCRIPT, None);
        assert_eq!(lines, vec!["a: 2", "x: 1", "y: 3"]);
    }

    #[test]
    fn dump_suppresses_callable_bindings() {
        let src = "\
callee = fn() { return 1 }
probe = fn(a) {
    debugger
    return callee() + a
}
probe(5)
";
        // `callee` is referenced and bound, but it is a function value
        let lines = inspect_at_break(src, None);
        assert_eq!(lines, vec!["a: 5"]);
    }

    #[test]
    fn named_symbol_prints_its_binding() {
        let lines = inspect_at_break(SCRIPT, Some("y"));
        assert_eq!(lines, vec!["y: 3"]);
    }

    #[test]
    fn named_symbol_may_be_callable() {
        let lines = inspect_at_break(SCRIPT, Some("f"));
        assert_eq!(lines, vec!["f: fn(a)"]);
    }

    #[test]
    fn unbound_symbol_reports_undefined() {
        let lines = inspect_at_break(SCRIPT, Some("z"));
        assert_eq!(lines, vec!["'z' is undefined."]);
    }

    #[test]
    fn top_level_break_inspects_the_whole_program() {
        let src = "\
total = 3
debugger
total = total + 1
";
        let lines = inspect_at_break(src, None);
        assert_eq!(lines, vec!["total: 3"]);
    }

    #[test]
    fn scope_symbols_only_lists_live_names() {
        let ast = Rc::new(parser::parse("(test)", SCRIPT).expect("source must parse"));
        let env = Environment::global();
        let lines = Rc::new(RefCell::new(Vec::new()));

        struct SymbolProbe {
            names: Rc<RefCell<Vec<String>>>,
        }
        impl DebugHook for SymbolProbe {
            fn on_statement(&mut self, ast: &Ast, node: NodeId, env: &Environment, force: bool) {
                if force {
                    *self.names.borrow_mut() = scope_symbols(ast, node, env);
                }
            }
        }

        let mut interp = Interpreter::with_hook(Box::new(SymbolProbe {
            names: Rc::clone(&lines),
        }));
        interp.eval(&ast, &env).expect("script must run");
        assert_eq!(*lines.borrow(), vec!["a", "x", "y"]);
    }
}
