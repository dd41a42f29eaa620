use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Kind of a syntax tree node. The evaluator matches on tags exhaustively,
/// the debugger only distinguishes `Identifier` and `Function`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum NodeTag {
    Program,
    Block,
    Debugger,
    Return,
    While,
    If,
    Assign,
    Binary,
    Unary,
    Call,
    Index,
    Function,
    Identifier,
    Int,
    Str,
    Bool,
    Nil,
    Array,
}

/// Stable handle of a node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

#[derive(Debug)]
struct Node {
    tag: NodeTag,
    token: Option<String>,
    line: u32,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Parsed program of a single source. Nodes live in an arena and reference
/// each other by [`NodeId`]; the parent link is a plain handle, so walking
/// up the tree never extends any lifetime.
///
/// Invariant: the root is the first allocated node and the only one with an
/// empty parent.
#[derive(Debug)]
pub struct Ast {
    path: PathBuf,
    nodes: Vec<Node>,
}

impl Ast {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn push(
        &mut self,
        tag: NodeTag,
        token: Option<String>,
        line: u32,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.push(id);
        }
        self.nodes.push(Node {
            tag,
            token,
            line,
            children: Vec::new(),
            parent,
        });
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tag(&self, id: NodeId) -> NodeTag {
        self.nodes[id.0 as usize].tag
    }

    pub fn token(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0 as usize].token.as_deref()
    }

    /// 1-based source line of the node.
    pub fn line(&self, id: NodeId) -> u32 {
        self.nodes[id.0 as usize].line
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0 as usize].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0 as usize].parent
    }

    /// Render the tree for `--ast` output.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root(), 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.nodes[id.0 as usize];
        let indent = depth * 2;
        let _ = match &node.token {
            Some(token) => writeln!(out, "{:indent$}{} `{token}`", "", node.tag),
            None => writeln!(out, "{:indent$}{}", "", node.tag),
        };
        for &child in &node.children {
            self.dump_node(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_links_resolve_to_the_root() {
        let mut ast = Ast::new(PathBuf::from("(test)"));
        let root = ast.push(NodeTag::Program, None, 1, None);
        let stmt = ast.push(NodeTag::Assign, None, 1, Some(root));
        let name = ast.push(NodeTag::Identifier, Some("x".into()), 1, Some(stmt));

        assert_eq!(ast.parent(root), None);
        assert_eq!(ast.parent(stmt), Some(root));
        assert_eq!(ast.parent(name), Some(stmt));
        assert_eq!(ast.children(root), &[stmt]);
        assert_eq!(ast.children(stmt), &[name]);
        assert_eq!(ast.token(name), Some("x"));
    }

    #[test]
    fn dump_renders_tokens_and_nesting() {
        let mut ast = Ast::new(PathBuf::from("(test)"));
        let root = ast.push(NodeTag::Program, None, 1, None);
        ast.push(NodeTag::Int, Some("42".into()), 1, Some(root));

        assert_eq!(ast.dump(), "Program\n  Int `42`\n");
    }
}
