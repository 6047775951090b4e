//! Structural deduplication
//!
//! Lambdas are visited dependency-first. Each one first has its references
//! redirected to the representatives already chosen for its children, then
//! gets canonical numbering: locals and captured slots are renumbered in
//! first-use order and unused slots disappear. Two lambdas with the same
//! canonical form are the same lambda; the later one is dropped and its
//! construction sites pass their captures in the representative's order.

use crate::lir::types::{CodeGraph, CodeId, CodeInst, CodeLambda, LambdaId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Canonical form of a lambda. Children are already representatives, so
/// the instruction list can be compared as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Signature {
    is_static: bool,
    env_cnt: u32,
    body: Vec<CodeInst>,
    ret: CodeId,
}

impl Signature {
    fn of(lambda: &CodeLambda) -> Self {
        Signature {
            is_static: lambda.is_static,
            env_cnt: lambda.env_cnt,
            body: lambda.body.clone(),
            ret: lambda.ret,
        }
    }
}

/// Representative of a lambda, and for each of the representative's slots
/// the slot of the original lambda that fills it
#[derive(Debug, Clone)]
struct Representative {
    id: LambdaId,
    slots: Vec<u32>,
}

/// Collapse structurally equal lambdas. Returns how many were removed.
pub fn dedup_pass(graph: &mut CodeGraph) -> usize {
    let roots: FxHashSet<LambdaId> = graph.roots.iter().copied().collect();
    let mut reps: FxHashMap<LambdaId, Representative> = FxHashMap::default();
    let mut renamed: FxHashMap<u32, u32> = FxHashMap::default();
    let mut table: FxHashMap<Signature, LambdaId> = FxHashMap::default();
    let mut collapsed = 0;

    for id in graph.post_order() {
        let Some(mut lambda) = graph.take(id) else {
            continue;
        };
        redirect(&mut lambda, &reps, &renamed);
        let slots = canonicalize(&mut lambda);

        if roots.contains(&id) {
            graph.put(id, lambda);
            continue;
        }
        let signature = Signature::of(&lambda);
        match table.get(&signature) {
            Some(&rep) => {
                if lambda.is_static {
                    if let Some(target) = graph.get(rep) {
                        renamed.insert(lambda.name, target.name);
                    }
                }
                log::trace!("{} duplicates {}", id, rep);
                reps.insert(id, Representative { id: rep, slots });
                collapsed += 1;
            }
            None => {
                table.insert(signature, id);
                reps.insert(id, Representative { id, slots });
                graph.put(id, lambda);
            }
        }
    }

    graph.prune();
    graph.refresh_deps();
    collapsed
}

/// Point constructions and static references at representatives
fn redirect(
    lambda: &mut CodeLambda,
    reps: &FxHashMap<LambdaId, Representative>,
    renamed: &FxHashMap<u32, u32>,
) {
    let global = |op: CodeId| match op {
        CodeId::Global(name) => CodeId::Global(renamed.get(&name).copied().unwrap_or(name)),
        other => other,
    };
    for inst in &mut lambda.body {
        if let CodeInst::Lambda {
            lambda: child,
            envs,
            ..
        } = inst
        {
            if let Some(rep) = reps.get(child) {
                *envs = rep
                    .slots
                    .iter()
                    .filter_map(|&slot| envs.get(slot as usize).copied())
                    .collect();
                *child = rep.id;
            }
        }
        inst.map_ids(global);
    }
    lambda.ret = global(lambda.ret);
}

/// Renumber locals and captured slots in first-use order. Returns, for
/// each new slot, the slot it used to be.
fn canonicalize(lambda: &mut CodeLambda) -> Vec<u32> {
    let mut locals: FxHashMap<u32, u32> = FxHashMap::default();
    let mut slots: Vec<u32> = Vec::new();
    let mut renumber = |op: CodeId| match op {
        CodeId::Local(n) => {
            let next = locals.len() as u32;
            CodeId::Local(*locals.entry(n).or_insert(next))
        }
        CodeId::Env(k) => match slots.iter().position(|&s| s == k) {
            Some(pos) => CodeId::Env(pos as u32),
            None => {
                slots.push(k);
                CodeId::Env(slots.len() as u32 - 1)
            }
        },
        other => other,
    };
    for inst in &mut lambda.body {
        inst.map_ids(&mut renumber);
    }
    lambda.ret = renumber(lambda.ret);
    lambda.env_cnt = slots.len() as u32;
    slots
}
