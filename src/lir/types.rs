//! Closure-graph type definitions

use crate::primitives::{Builtin, BUILTINS};
use std::collections::BTreeSet;
use std::fmt;

/// Operand of a closure-graph instruction. Ordered by kind, then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CodeId {
    /// Result of an earlier instruction in the same body (SSA)
    Local(u32),
    /// Captured slot of the running closure
    Env(u32),
    /// The closure's argument
    Arg,
    /// Builtin or static singleton
    Global(u32),
}

impl fmt::Display for CodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeId::Local(n) => write!(f, "%{}", n),
            CodeId::Env(n) => write!(f, "${}", n),
            CodeId::Arg => write!(f, "arg"),
            CodeId::Global(n) => write!(f, "@{}", n),
        }
    }
}

/// Arena index of a `CodeLambda`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LambdaId(pub u32);

impl fmt::Display for LambdaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeInst {
    /// `retv = func(arg)`
    Apply {
        retv: CodeId,
        func: CodeId,
        arg: CodeId,
    },
    /// `retv = new lambda { envs... }`
    Lambda {
        retv: CodeId,
        lambda: LambdaId,
        envs: Vec<CodeId>,
    },
}

impl CodeInst {
    pub fn retv(&self) -> CodeId {
        match self {
            CodeInst::Apply { retv, .. } | CodeInst::Lambda { retv, .. } => *retv,
        }
    }

    /// Operands read by this instruction, in evaluation order
    pub fn operands(&self) -> Vec<CodeId> {
        match self {
            CodeInst::Apply { func, arg, .. } => vec![*func, *arg],
            CodeInst::Lambda { envs, .. } => envs.clone(),
        }
    }

    /// Rewrite the operands read, leaving the destination alone
    pub fn map_operands(&mut self, mut f: impl FnMut(CodeId) -> CodeId) {
        match self {
            CodeInst::Apply { func, arg, .. } => {
                *func = f(*func);
                *arg = f(*arg);
            }
            CodeInst::Lambda { envs, .. } => {
                for env in envs.iter_mut() {
                    *env = f(*env);
                }
            }
        }
    }

    /// Rewrite every operand, the destination included
    pub fn map_ids(&mut self, mut f: impl FnMut(CodeId) -> CodeId) {
        self.map_operands(&mut f);
        match self {
            CodeInst::Apply { retv, .. } | CodeInst::Lambda { retv, .. } => *retv = f(*retv),
        }
    }
}

impl fmt::Display for CodeInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeInst::Apply { retv, func, arg } => write!(f, "{} = {} {}", retv, func, arg),
            CodeInst::Lambda { retv, lambda, envs } => {
                write!(f, "{} = {} [", retv, lambda)?;
                for (i, env) in envs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", env)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A compiled lambda: captured slots, a straight-line body and a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLambda {
    /// Global id naming this lambda's singleton once it is static
    pub name: u32,
    pub env_cnt: u32,
    pub body: Vec<CodeInst>,
    pub ret: CodeId,
    /// Lambdas this one constructs or references as statics
    pub deps: BTreeSet<LambdaId>,
    /// No captures; one shared instance referenced as `Global(name)`
    pub is_static: bool,
}

impl CodeLambda {
    pub fn new(name: u32) -> Self {
        CodeLambda {
            name,
            env_cnt: 0,
            body: Vec::new(),
            ret: CodeId::Arg,
            deps: BTreeSet::new(),
            is_static: false,
        }
    }

    /// One past the highest local index used
    pub fn local_count(&self) -> u32 {
        let mut count = 0;
        let mut see = |id: CodeId| {
            if let CodeId::Local(n) = id {
                count = count.max(n + 1);
            }
        };
        for inst in &self.body {
            see(inst.retv());
            inst.operands().into_iter().for_each(&mut see);
        }
        see(self.ret);
        count
    }

    /// Every occurrence of `id` as an operand or as the result
    pub fn use_count(&self, id: CodeId) -> usize {
        let in_body: usize = self
            .body
            .iter()
            .map(|inst| inst.operands().iter().filter(|&&op| op == id).count())
            .sum();
        in_body + (self.ret == id) as usize
    }

    /// Replace `from` by `to` in operands of `body[start..]` and the result
    pub fn substitute_from(&mut self, start: usize, from: CodeId, to: CodeId) {
        for inst in &mut self.body[start..] {
            inst.map_operands(|id| if id == from { to } else { id });
        }
        if self.ret == from {
            self.ret = to;
        }
    }
}

/// What a global id names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalDef {
    Builtin(Builtin),
    Lambda(LambdaId),
}

/// Arena of lambdas plus the global table
#[derive(Debug, Clone)]
pub struct CodeGraph {
    lambdas: Vec<Option<CodeLambda>>,
    globals: Vec<GlobalDef>,
    /// One per statement, in source order; each takes the world and ignores it
    pub roots: Vec<LambdaId>,
}

impl CodeGraph {
    pub fn new() -> Self {
        CodeGraph {
            lambdas: Vec::new(),
            globals: BUILTINS
                .iter()
                .map(|def| GlobalDef::Builtin(def.builtin))
                .collect(),
            roots: Vec::new(),
        }
    }

    /// Allocate an empty lambda and its global name
    pub fn alloc(&mut self) -> LambdaId {
        let id = LambdaId(self.lambdas.len() as u32);
        let name = self.globals.len() as u32;
        self.globals.push(GlobalDef::Lambda(id));
        self.lambdas.push(Some(CodeLambda::new(name)));
        id
    }

    pub fn get(&self, id: LambdaId) -> Option<&CodeLambda> {
        self.lambdas.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: LambdaId) -> Option<&mut CodeLambda> {
        self.lambdas.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Move a lambda out for editing; `put` it back afterwards
    pub fn take(&mut self, id: LambdaId) -> Option<CodeLambda> {
        self.lambdas.get_mut(id.0 as usize).and_then(Option::take)
    }

    pub fn put(&mut self, id: LambdaId, lambda: CodeLambda) {
        if let Some(slot) = self.lambdas.get_mut(id.0 as usize) {
            *slot = Some(lambda);
        }
    }

    pub fn remove(&mut self, id: LambdaId) -> Option<CodeLambda> {
        self.take(id)
    }

    pub fn global(&self, name: u32) -> Option<GlobalDef> {
        self.globals.get(name as usize).copied()
    }

    pub fn globals(&self) -> &[GlobalDef] {
        &self.globals
    }

    /// Lambda behind a global name, if it names one
    pub fn static_lambda(&self, name: u32) -> Option<LambdaId> {
        match self.global(name)? {
            GlobalDef::Lambda(id) => Some(id),
            GlobalDef::Builtin(_) => None,
        }
    }

    /// Ids of all live lambdas, ascending
    pub fn ids(&self) -> Vec<LambdaId> {
        self.lambdas
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| LambdaId(i as u32))
            .collect()
    }

    /// Number of live lambdas
    pub fn len(&self) -> usize {
        self.lambdas.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop arena slots allocated at or after `mark`
    pub fn truncate(&mut self, mark: (usize, usize)) {
        self.lambdas.truncate(mark.0);
        self.globals.truncate(mark.1);
    }

    /// Current arena and global sizes, for `truncate`
    pub fn mark(&self) -> (usize, usize) {
        (self.lambdas.len(), self.globals.len())
    }

    /// Lambdas reachable from the roots through `deps`
    pub fn reachable(&self) -> BTreeSet<LambdaId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<LambdaId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(lambda) = self.get(id) {
                stack.extend(lambda.deps.iter().copied());
            }
        }
        seen
    }

    /// Remove every lambda the roots cannot reach. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let live = self.reachable();
        let mut removed = 0;
        for id in self.ids() {
            if !live.contains(&id) {
                self.remove(id);
                removed += 1;
            }
        }
        removed
    }

    /// Dependency-first order over everything reachable from the roots
    pub fn post_order(&self) -> Vec<LambdaId> {
        fn visit(
            graph: &CodeGraph,
            id: LambdaId,
            seen: &mut BTreeSet<LambdaId>,
            out: &mut Vec<LambdaId>,
        ) {
            if !seen.insert(id) {
                return;
            }
            if let Some(lambda) = graph.get(id) {
                for &dep in &lambda.deps {
                    visit(graph, dep, seen, out);
                }
            }
            out.push(id);
        }
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for &root in &self.roots {
            visit(self, root, &mut seen, &mut out);
        }
        out
    }

    /// Lambda instructions constructing `target`, across the graph
    pub fn construction_sites(&self, target: LambdaId) -> usize {
        self.lambdas
            .iter()
            .flatten()
            .flat_map(|lambda| lambda.body.iter())
            .filter(|inst| matches!(inst, CodeInst::Lambda { lambda, .. } if *lambda == target))
            .count()
    }

    /// Recompute every `deps` set from constructions and static references
    pub fn refresh_deps(&mut self) {
        for id in self.ids() {
            let Some(lambda) = self.get(id) else { continue };
            let mut deps = BTreeSet::new();
            let mut operands = vec![lambda.ret];
            for inst in &lambda.body {
                if let CodeInst::Lambda { lambda: child, .. } = inst {
                    deps.insert(*child);
                }
                operands.extend(inst.operands());
            }
            for op in operands {
                if let CodeId::Global(name) = op {
                    deps.extend(self.static_lambda(name));
                }
            }
            if let Some(lambda) = self.get_mut(id) {
                lambda.deps = deps;
            }
        }
    }

    /// Total instruction count over live lambdas
    pub fn inst_count(&self) -> usize {
        self.lambdas.iter().flatten().map(|l| l.body.len()).sum()
    }
}

impl Default for CodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CodeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.ids() {
            let Some(lambda) = self.get(id) else { continue };
            write!(f, "{} @{} env={}", id, lambda.name, lambda.env_cnt)?;
            if lambda.is_static {
                write!(f, " static")?;
            }
            if self.roots.contains(&id) {
                write!(f, " root")?;
            }
            writeln!(f)?;
            for inst in &lambda.body {
                writeln!(f, "  {}", inst)?;
            }
            writeln!(f, "  ret {}", lambda.ret)?;
        }
        Ok(())
    }
}
