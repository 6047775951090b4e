//! Constant folding of resolved globals
//!
//! Once a statement's free names are bound, every statement-level `Ref` can
//! be replaced by a `Const` holding the bound closure. Folding then
//! propagates inward:
//!
//! - a lambda whose captures are all constant is built right away (through
//!   the body's construction cache) and becomes a `Const`;
//! - a lambda applied to a `Const` argument is beta-reduced: the argument is
//!   substituted for index 0 of the body and the body's other slots are
//!   remapped onto the enclosing scope.
//!
//! Closures are never applied during folding, so no I/O can move. Every
//! substitution replaces a `Ref` by a `Const` or another `Ref`, so each
//! beta step removes a lambda node and folding terminates.

use super::expr::{ArgMap, Expr, ExprId, ExprKind};
use super::intern::ExprGraph;
use crate::error::{LError, LResult};
use crate::value::Closure;
use rustc_hash::FxHashMap;

/// Counters for one folding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldStats {
    /// Lambdas turned into constants
    pub lambdas_built: u64,
    /// Applications of a lambda to a constant that were reduced
    pub beta_reductions: u64,
}

pub struct Folder<'g> {
    graph: &'g mut ExprGraph,
    stats: FoldStats,
}

impl<'g> Folder<'g> {
    pub fn new(graph: &'g mut ExprGraph) -> Self {
        Folder {
            graph,
            stats: FoldStats::default(),
        }
    }

    pub fn stats(&self) -> FoldStats {
        self.stats
    }

    /// Fold a statement whose slot `i` is bound to `globals[i]`.
    /// The result is closed: it evaluates under an empty environment.
    pub fn fold_statement(&mut self, expr: &Expr, globals: &[Closure]) -> LResult<Expr> {
        let map: Vec<Expr> = globals
            .iter()
            .map(|c| self.graph.constant(c.clone()))
            .collect();
        self.subst(expr, &map, &mut FxHashMap::default())
    }

    /// Rewrite `expr` replacing each `Ref(i)` by `map[i]`. Entries of `map`
    /// are `Ref`s into the target scope or `Const`s.
    fn subst(
        &mut self,
        expr: &Expr,
        map: &[Expr],
        memo: &mut FxHashMap<ExprId, Expr>,
    ) -> LResult<Expr> {
        if let Some(done) = memo.get(&expr.id()) {
            return Ok(done.clone());
        }
        let result = match expr.kind() {
            ExprKind::Const(_) => expr.clone(),
            ExprKind::Ref(idx) => map.get(*idx).cloned().ok_or_else(|| {
                LError::internal(format!(
                    "folding index {} with only {} bindings",
                    idx,
                    map.len()
                ))
            })?,
            ExprKind::Apply { func, arg } => {
                let func = self.subst(func, map, memo)?;
                let arg = self.subst(arg, map, memo)?;
                self.reduce_apply(func, arg)?
            }
            ExprKind::Lambda { body, arg_map } => self.rebuild_lambda(body, arg_map, map)?,
        };
        memo.insert(expr.id(), result.clone());
        Ok(result)
    }

    /// Re-close a lambda over a substituted enclosing scope.
    fn rebuild_lambda(&mut self, body: &Expr, arg_map: &ArgMap, map: &[Expr]) -> LResult<Expr> {
        let mut inner = Vec::with_capacity(arg_map.len() + 1);
        inner.push(self.graph.reference(0));
        let mut captures = ArgMap::new();
        for &outer in arg_map {
            let target = map.get(outer).ok_or_else(|| {
                LError::internal(format!("capture of unbound index {}", outer))
            })?;
            match target.kind() {
                ExprKind::Const(_) => inner.push(target.clone()),
                ExprKind::Ref(idx) => {
                    captures.push(*idx);
                    inner.push(self.graph.reference(captures.len()));
                }
                _ => {
                    return Err(LError::internal(
                        "folding map holds a compound expression",
                    ))
                }
            }
        }
        let body = self.subst(body, &inner, &mut FxHashMap::default())?;
        if captures.is_empty() {
            self.stats.lambdas_built += 1;
            let (closure, _) = body.construct(Vec::new());
            Ok(self.graph.constant(closure))
        } else {
            Ok(self.graph.lambda(body, captures))
        }
    }

    fn reduce_apply(&mut self, func: Expr, arg: Expr) -> LResult<Expr> {
        if let (ExprKind::Lambda { body, arg_map }, ExprKind::Const(_)) = (func.kind(), arg.kind())
        {
            self.stats.beta_reductions += 1;
            let mut inner = Vec::with_capacity(arg_map.len() + 1);
            inner.push(arg.clone());
            for &outer in arg_map {
                inner.push(self.graph.reference(outer));
            }
            return self.subst(body, &inner, &mut FxHashMap::default());
        }
        Ok(self.graph.apply(func, arg))
    }
}

/// Fold `expr` with statement slots bound to `globals`
pub fn fold_statement(
    graph: &mut ExprGraph,
    expr: &Expr,
    globals: &[Closure],
) -> LResult<(Expr, FoldStats)> {
    let mut folder = Folder::new(graph);
    let folded = folder.fold_statement(expr, globals)?;
    Ok((folded, folder.stats()))
}
