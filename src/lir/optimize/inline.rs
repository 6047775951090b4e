//! Temp-lambda inlining
//!
//! A lambda constructed exactly once, whose closure is used only as the
//! function of a single later call, is spliced into that call site. The
//! callee's `Arg` becomes the call argument, `Env(k)` becomes the k-th
//! construction capture and its locals get fresh numbers in the caller.
//! Runs to a fixpoint: a splice can expose new candidates.

use crate::lir::types::{CodeGraph, CodeId, CodeInst, LambdaId};

/// Construction index and call index of an inlinable site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Site {
    construct: usize,
    call: usize,
}

/// Inline every eligible call site. Returns the number of splices.
pub fn inline_pass(graph: &mut CodeGraph) -> usize {
    let mut total = 0;
    loop {
        let mut round = 0;
        for id in graph.ids() {
            while let Some(site) = find_site(graph, id) {
                if !splice(graph, id, site) {
                    break;
                }
                round += 1;
            }
        }
        if round == 0 {
            break;
        }
        total += round;
    }
    graph.refresh_deps();
    total
}

fn find_site(graph: &CodeGraph, parent_id: LambdaId) -> Option<Site> {
    let parent = graph.get(parent_id)?;
    for (i, inst) in parent.body.iter().enumerate() {
        let CodeInst::Lambda { retv, lambda, .. } = inst else {
            continue;
        };
        if parent.use_count(*retv) != 1 {
            continue;
        }
        let call = parent.body[i + 1..]
            .iter()
            .position(|later| matches!(later, CodeInst::Apply { func, .. } if func == retv));
        let Some(offset) = call else {
            continue;
        };
        let eligible = graph
            .get(*lambda)
            .is_some_and(|child| !child.is_static)
            && !graph.roots.contains(lambda)
            && graph.construction_sites(*lambda) == 1;
        if eligible {
            return Some(Site {
                construct: i,
                call: i + 1 + offset,
            });
        }
    }
    None
}

fn splice(graph: &mut CodeGraph, parent_id: LambdaId, site: Site) -> bool {
    let Some(mut parent) = graph.take(parent_id) else {
        return false;
    };
    let (CodeInst::Lambda { lambda: child_id, envs, .. }, CodeInst::Apply { retv: result, arg, .. }) =
        (parent.body[site.construct].clone(), parent.body[site.call].clone())
    else {
        graph.put(parent_id, parent);
        return false;
    };
    let Some(child) = graph.remove(child_id) else {
        graph.put(parent_id, parent);
        return false;
    };

    let base = parent.local_count();
    let ret_is_local = matches!(child.ret, CodeId::Local(_));
    let rename = |id: CodeId| match id {
        CodeId::Arg => arg,
        CodeId::Env(k) => envs.get(k as usize).copied().unwrap_or(id),
        CodeId::Local(_) if id == child.ret => result,
        CodeId::Local(m) => CodeId::Local(base + m),
        CodeId::Global(_) => id,
    };
    let spliced: Vec<CodeInst> = child
        .body
        .iter()
        .cloned()
        .map(|mut inst| {
            inst.map_ids(rename);
            inst
        })
        .collect();
    let value = rename(child.ret);

    let tail = parent.body.split_off(site.call + 1);
    parent.body.truncate(site.call);
    parent.body.remove(site.construct);
    parent.body.extend(spliced);
    let rest = parent.body.len();
    parent.body.extend(tail);
    if !ret_is_local {
        parent.substitute_from(rest, result, value);
    }

    parent.deps.remove(&child_id);
    parent.deps.extend(child.deps.iter().copied());
    log::trace!("inlined {} into {}", child_id, parent_id);
    graph.put(parent_id, parent);
    true
}
