//! Static extraction
//!
//! Walks the graph top-down from the roots, threading for every lambda what
//! its captured slots resolve to: either a global (builtin or an already
//! extracted static) or a slot that survives. Captures that resolve to a
//! global are dropped from the child and referenced directly. A child left
//! with no captures becomes a static singleton: its construction is removed
//! and every use of the constructed value refers to `Global(name)`.

use crate::lir::types::{CodeGraph, CodeId, CodeInst, LambdaId};
use rustc_hash::{FxHashMap, FxHashSet};

struct Extractor<'g> {
    graph: &'g mut CodeGraph,
    /// Construction instructions per lambda, counted before the walk
    sites: FxHashMap<LambdaId, usize>,
    visited: FxHashSet<LambdaId>,
    extracted: usize,
}

/// Extract static lambdas. Returns how many became static.
pub fn statics_pass(graph: &mut CodeGraph) -> usize {
    let mut sites = FxHashMap::default();
    for id in graph.ids() {
        sites.insert(id, graph.construction_sites(id));
    }
    let mut extractor = Extractor {
        graph,
        sites,
        visited: FxHashSet::default(),
        extracted: 0,
    };
    for root in extractor.graph.roots.clone() {
        extractor.visit(root, None);
    }
    // Statics from an earlier run are reachable without a construction
    for id in extractor.graph.post_order() {
        extractor.visit(id, None);
    }
    let extracted = extractor.extracted;
    graph.refresh_deps();
    extracted
}

impl Extractor<'_> {
    /// Rewrite `id` given where its captured slots now come from.
    /// `None` keeps every slot as it is.
    fn visit(&mut self, id: LambdaId, slots: Option<&[CodeId]>) {
        if !self.visited.insert(id) {
            return;
        }
        let Some(mut lambda) = self.graph.take(id) else {
            return;
        };

        if let Some(slots) = slots {
            let resolve = |op: CodeId| match op {
                CodeId::Env(k) => slots.get(k as usize).copied().unwrap_or(op),
                other => other,
            };
            for inst in &mut lambda.body {
                inst.map_ids(resolve);
            }
            lambda.ret = resolve(lambda.ret);
            lambda.env_cnt = slots
                .iter()
                .filter(|op| matches!(op, CodeId::Env(_)))
                .count() as u32;
        }

        let mut i = 0;
        while i < lambda.body.len() {
            let CodeInst::Lambda {
                retv,
                lambda: child,
                envs,
            } = lambda.body[i].clone()
            else {
                i += 1;
                continue;
            };
            if self.sites.get(&child).copied().unwrap_or(0) != 1
                || self.graph.roots.contains(&child)
            {
                self.visit(child, None);
                i += 1;
                continue;
            }

            let mut kept = Vec::new();
            let child_slots: Vec<CodeId> = envs
                .iter()
                .map(|&op| match op {
                    CodeId::Global(_) => op,
                    _ => {
                        kept.push(op);
                        CodeId::Env(kept.len() as u32 - 1)
                    }
                })
                .collect();
            self.visit(child, Some(&child_slots));

            if kept.is_empty() {
                let Some(name) = self.graph.get_mut(child).map(|c| {
                    c.is_static = true;
                    c.name
                }) else {
                    i += 1;
                    continue;
                };
                lambda.body.remove(i);
                lambda.substitute_from(i, retv, CodeId::Global(name));
                self.extracted += 1;
                log::trace!("{} is static as @{}", child, name);
                continue;
            }
            lambda.body[i] = CodeInst::Lambda {
                retv,
                lambda: child,
                envs: kept,
            };
            i += 1;
        }

        self.graph.put(id, lambda);
    }
}
