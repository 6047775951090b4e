//! Named-variable syntax tree produced by the parser

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Apply(Box<Node>, Box<Node>),
    Ref(String),
    Lambda(String, Box<Node>),
}

impl Node {
    pub fn apply(func: Node, arg: Node) -> Node {
        Node::Apply(Box::new(func), Box::new(arg))
    }

    pub fn var(name: impl Into<String>) -> Node {
        Node::Ref(name.into())
    }

    pub fn lambda(param: impl Into<String>, body: Node) -> Node {
        Node::Lambda(param.into(), Box::new(body))
    }

    /// Left-nested application of `func` to every argument in turn
    pub fn apply_all(func: Node, args: impl IntoIterator<Item = Node>) -> Node {
        args.into_iter().fold(func, Node::apply)
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            Node::Apply(f, a) => 1 + f.size() + a.size(),
            Node::Ref(_) => 1,
            Node::Lambda(_, body) => 1 + body.size(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Ref(name) => write!(f, "{}", name),
            Node::Lambda(param, body) => write!(f, "(\\{} {})", param, body),
            Node::Apply(func, arg) => write!(f, "({} {})", func, arg),
        }
    }
}

/// A complete top-level statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub node: Node,
    pub loc: super::SourceLoc,
}
