//! Hash-consing table for expression nodes.
//!
//! One content-keyed map per variant, keyed by child identities. Every node
//! handed out by an `ExprGraph` is unique for its content, so equal
//! sub-expressions are shared and compare equal by pointer. The tables keep
//! their nodes alive for as long as the graph lives.

use super::expr::{ArgMap, Expr, ExprId, ExprKind};
use crate::value::{Closure, ClosureId};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct ExprGraph {
    consts: FxHashMap<ClosureId, Expr>,
    refs: FxHashMap<usize, Expr>,
    lambdas: FxHashMap<(ExprId, ArgMap), Expr>,
    applies: FxHashMap<(ExprId, ExprId), Expr>,
    hits: u64,
}

impl ExprGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(&mut self, value: Closure) -> Expr {
        if let Some(hit) = self.consts.get(&value.id()) {
            self.hits += 1;
            return hit.clone();
        }
        let expr = Expr::new(ExprKind::Const(value.clone()));
        self.consts.insert(value.id(), expr.clone());
        expr
    }

    pub fn reference(&mut self, index: usize) -> Expr {
        if let Some(hit) = self.refs.get(&index) {
            self.hits += 1;
            return hit.clone();
        }
        let expr = Expr::new(ExprKind::Ref(index));
        self.refs.insert(index, expr.clone());
        expr
    }

    pub fn lambda(&mut self, body: Expr, arg_map: ArgMap) -> Expr {
        let key = (body.id(), arg_map);
        if let Some(hit) = self.lambdas.get(&key) {
            self.hits += 1;
            return hit.clone();
        }
        let expr = Expr::new(ExprKind::Lambda {
            body,
            arg_map: key.1.clone(),
        });
        self.lambdas.insert(key, expr.clone());
        expr
    }

    pub fn apply(&mut self, func: Expr, arg: Expr) -> Expr {
        let key = (func.id(), arg.id());
        if let Some(hit) = self.applies.get(&key) {
            self.hits += 1;
            return hit.clone();
        }
        let expr = Expr::new(ExprKind::Apply { func, arg });
        self.applies.insert(key, expr.clone());
        expr
    }

    /// Distinct nodes created so far
    pub fn len(&self) -> usize {
        self.consts.len() + self.refs.len() + self.lambdas.len() + self.applies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Requests answered with an existing node
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
