//! Direct interpreter for closure graphs
//!
//! Runs a closure graph with the same rules as the emitted runtime: every
//! instance has a fresh id, applications are memoized on both ids while
//! pure, static lambdas and builtins are singletons created on first use,
//! and each root is applied to the world sentinel. There is no construction
//! cache, so this measures exactly what the compiled program would do.

use super::types::{CodeGraph, CodeId, CodeInst, GlobalDef, LambdaId};
use crate::effects::Purity;
use crate::primitives::{BitIo, Native, NativeStep};
use crate::vm::{EvalError, EvalStats, Fuel};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// A running instance
#[derive(Debug)]
pub struct Instance {
    id: u64,
    kind: InstanceKind,
}

#[derive(Debug)]
enum InstanceKind {
    Lambda { lambda: LambdaId, env: Vec<Value> },
    Native(Native<Value>),
    World,
}

pub type Value = Rc<Instance>;

impl Instance {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Lambda this instance runs, if it is not a builtin
    pub fn lambda(&self) -> Option<LambdaId> {
        match &self.kind {
            InstanceKind::Lambda { lambda, .. } => Some(*lambda),
            _ => None,
        }
    }
}

pub struct Machine<'g, IO> {
    graph: &'g CodeGraph,
    io: IO,
    next_id: u64,
    memo: FxHashMap<(u64, u64), Value>,
    globals: FxHashMap<u32, Value>,
    purity: Purity,
    fuel: Fuel,
    stats: EvalStats,
}

impl<'g, IO: BitIo> Machine<'g, IO> {
    pub fn new(graph: &'g CodeGraph, io: IO) -> Self {
        Machine {
            graph,
            io,
            next_id: 0,
            memo: FxHashMap::default(),
            globals: FxHashMap::default(),
            purity: Purity::new(),
            fuel: Fuel::unlimited(),
            stats: EvalStats::default(),
        }
    }

    /// Bound the number of uncached applications
    pub fn with_fuel(mut self, fuel: Option<u64>) -> Self {
        self.fuel = Fuel::new(fuel);
        self
    }

    /// Apply every root, in order, to the world value
    pub fn run(&mut self) -> Result<(), EvalError> {
        let graph = self.graph;
        let world = self.alloc(InstanceKind::World);
        for &root in &graph.roots {
            let root = self.alloc(InstanceKind::Lambda {
                lambda: root,
                env: Vec::new(),
            });
            self.apply(&root, &world)?;
        }
        log::debug!("machine finished: {}", self.stats);
        Ok(())
    }

    pub fn apply(&mut self, func: &Value, arg: &Value) -> Result<Value, EvalError> {
        self.stats.applications += 1;
        let key = (func.id, arg.id);
        if let Some(hit) = self.memo.get(&key) {
            self.stats.cache_hits += 1;
            return Ok(hit.clone());
        }
        self.fuel.burn()?;

        let saved = self.purity.enter();
        let result = match &func.kind {
            InstanceKind::Lambda { lambda, env } => self.run_lambda(*lambda, env, arg),
            InstanceKind::Native(native) => self.apply_native(native, arg),
            InstanceKind::World => Err(EvalError::NotCallable("the world value".to_string())),
        };
        let pure = self.purity.leave(saved);
        let result = result?;

        if pure {
            self.memo.insert(key, result.clone());
            self.stats.cache_stores += 1;
        }
        Ok(result)
    }

    fn run_lambda(&mut self, id: LambdaId, env: &[Value], arg: &Value) -> Result<Value, EvalError> {
        let graph = self.graph;
        let lambda = graph
            .get(id)
            .ok_or_else(|| EvalError::NotCallable(format!("missing lambda {}", id)))?;
        let mut locals: Vec<Option<Value>> = vec![None; lambda.local_count() as usize];
        for inst in &lambda.body {
            match inst {
                CodeInst::Apply { retv, func, arg: operand } => {
                    let func = self.load(*func, &locals, env, arg)?;
                    let operand = self.load(*operand, &locals, env, arg)?;
                    let value = self.apply(&func, &operand)?;
                    store(&mut locals, *retv, value)?;
                }
                CodeInst::Lambda { retv, lambda, envs } => {
                    let captured = envs
                        .iter()
                        .map(|&op| self.load(op, &locals, env, arg))
                        .collect::<Result<Vec<_>, _>>()?;
                    let value = self.alloc(InstanceKind::Lambda {
                        lambda: *lambda,
                        env: captured,
                    });
                    self.stats.closures_built += 1;
                    store(&mut locals, *retv, value)?;
                }
            }
        }
        self.load(lambda.ret, &locals, env, arg)
    }

    fn apply_native(&mut self, native: &Native<Value>, arg: &Value) -> Result<Value, EvalError> {
        let (step, effect) = native.step(arg, &mut self.io)?;
        if !effect.is_pure() {
            self.stats.io_events += 1;
        }
        self.purity.record(effect);
        Ok(match step {
            NativeStep::Value(value) => value,
            NativeStep::Partial(partial) => self.alloc(InstanceKind::Native(partial)),
        })
    }

    fn load(
        &mut self,
        op: CodeId,
        locals: &[Option<Value>],
        env: &[Value],
        arg: &Value,
    ) -> Result<Value, EvalError> {
        match op {
            CodeId::Local(n) => locals
                .get(n as usize)
                .and_then(Option::clone)
                .ok_or(EvalError::UnboundIndex {
                    index: n as usize,
                    len: locals.len(),
                }),
            CodeId::Env(k) => env.get(k as usize).cloned().ok_or(EvalError::UnboundIndex {
                index: k as usize,
                len: env.len(),
            }),
            CodeId::Arg => Ok(arg.clone()),
            CodeId::Global(name) => self.global(name),
        }
    }

    fn global(&mut self, name: u32) -> Result<Value, EvalError> {
        if let Some(value) = self.globals.get(&name) {
            return Ok(value.clone());
        }
        let kind = match self.graph.global(name) {
            Some(GlobalDef::Builtin(builtin)) => InstanceKind::Native(builtin.native()),
            Some(GlobalDef::Lambda(lambda)) => InstanceKind::Lambda {
                lambda,
                env: Vec::new(),
            },
            None => {
                return Err(EvalError::UnboundIndex {
                    index: name as usize,
                    len: self.graph.globals().len(),
                })
            }
        };
        let value = self.alloc(kind);
        self.globals.insert(name, value.clone());
        Ok(value)
    }

    fn alloc(&mut self, kind: InstanceKind) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        Rc::new(Instance { id, kind })
    }

    pub fn stats(&self) -> EvalStats {
        self.stats
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn into_io(self) -> IO {
        self.io
    }
}

fn store(locals: &mut [Option<Value>], id: CodeId, value: Value) -> Result<(), EvalError> {
    let CodeId::Local(n) = id else {
        return Err(EvalError::NotCallable(format!("{} is not a destination", id)));
    };
    let len = locals.len();
    let slot = locals.get_mut(n as usize).ok_or(EvalError::UnboundIndex {
        index: n as usize,
        len,
    })?;
    *slot = Some(value);
    Ok(())
}
