//! Named AST to de Bruijn expression graph
//!
//! Each lambda opens a fresh scope seeded with its parameter at index 0.
//! Any other name seen inside the body gets the next free index of that
//! scope and is recorded as a capture: when the scope closes, every captured
//! name is looked up (or inserted) in the enclosing scope, in first-use
//! order, and that outer index goes into the lambda's `arg_map`.
//!
//! The statement scope has no parameter, so its index 0 is the first free
//! name. Those names are the statement's free identifiers; binding them is
//! left to the caller.

use super::expr::{ArgMap, Expr};
use super::intern::ExprGraph;
use crate::reader::Node;
use rustc_hash::FxHashMap;

/// A compiled top-level statement
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub expr: Expr,
    /// Free names; `free[i]` is statement index `i`
    pub free: Vec<String>,
}

/// A lexical scope, names in first-use order
#[derive(Default)]
struct Scope {
    slots: FxHashMap<String, usize>,
    order: Vec<String>,
}

impl Scope {
    fn with_param(param: &str) -> Self {
        let mut scope = Scope::default();
        scope.slot(param);
        scope
    }

    fn slot(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.slots.get(name) {
            return idx;
        }
        let idx = self.order.len();
        self.slots.insert(name.to_string(), idx);
        self.order.push(name.to_string());
        idx
    }
}

pub struct Analyzer<'g> {
    graph: &'g mut ExprGraph,
    scopes: Vec<Scope>,
}

impl<'g> Analyzer<'g> {
    pub fn new(graph: &'g mut ExprGraph) -> Self {
        Analyzer {
            graph,
            scopes: Vec::new(),
        }
    }

    /// Compile one statement against an empty statement scope
    pub fn analyze_statement(&mut self, node: &Node) -> AnalysisResult {
        self.scopes.push(Scope::default());
        let expr = self.analyze(node);
        let top = self.scopes.pop().unwrap_or_default();
        log::trace!("analyzed statement: {} free names", top.order.len());
        AnalysisResult {
            expr,
            free: top.order,
        }
    }

    fn analyze(&mut self, node: &Node) -> Expr {
        match node {
            Node::Ref(name) => {
                let idx = self.current().slot(name);
                self.graph.reference(idx)
            }
            Node::Apply(func, arg) => {
                let func = self.analyze(func);
                let arg = self.analyze(arg);
                self.graph.apply(func, arg)
            }
            Node::Lambda(param, body) => {
                self.scopes.push(Scope::with_param(param));
                let body = self.analyze(body);
                let inner = self.scopes.pop().unwrap_or_default();
                let outer = self.current();
                let arg_map: ArgMap = inner.order[1..]
                    .iter()
                    .map(|name| outer.slot(name))
                    .collect();
                self.graph.lambda(body, arg_map)
            }
        }
    }

    fn current(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}

/// Compile `node` into `graph`
pub fn analyze_statement(graph: &mut ExprGraph, node: &Node) -> AnalysisResult {
    Analyzer::new(graph).analyze_statement(node)
}
