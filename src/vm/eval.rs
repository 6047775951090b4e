//! Sequential memoizing evaluator

use super::cache::ApplyCache;
use super::env::ShadowEnv;
use super::types::{EvalError, EvalStats, Fuel};
use crate::effects::Purity;
use crate::hir::{Expr, ExprKind};
use crate::primitives::{BitIo, Native, NativeStep};
use crate::value::{Body, Closure};

/// Recursive evaluator over the expression graph.
///
/// Two memo layers apply. Evaluating a lambda consults the construction
/// cache of its body, so equal captures yield the same closure. Applying a
/// closure consults the application cache keyed by both ids; a result is
/// stored only if no I/O happened while computing it.
pub struct Evaluator<IO> {
    io: IO,
    cache: ApplyCache,
    purity: Purity,
    stats: EvalStats,
    fuel: Fuel,
}

impl<IO: BitIo> Evaluator<IO> {
    pub fn new(io: IO) -> Self {
        Evaluator {
            io,
            cache: ApplyCache::new(),
            purity: Purity::new(),
            stats: EvalStats::default(),
            fuel: Fuel::unlimited(),
        }
    }

    /// Bound the number of uncached applications
    pub fn with_fuel(mut self, fuel: Option<u64>) -> Self {
        self.fuel = Fuel::new(fuel);
        self
    }

    /// Evaluate a statement whose index `i` is bound to `globals[i]`
    pub fn eval_statement(&mut self, expr: &Expr, globals: &[Closure]) -> Result<Closure, EvalError> {
        self.eval(expr, ShadowEnv::flat(globals))
    }

    pub fn eval(&mut self, expr: &Expr, env: ShadowEnv<'_>) -> Result<Closure, EvalError> {
        match expr.kind() {
            ExprKind::Const(value) => Ok(value.clone()),
            ExprKind::Ref(index) => env.get(*index).cloned(),
            ExprKind::Lambda { body, arg_map } => {
                let captured = arg_map
                    .iter()
                    .map(|&idx| env.get(idx).cloned())
                    .collect::<Result<Vec<_>, _>>()?;
                let (closure, hit) = body.construct(captured);
                if hit {
                    self.stats.construction_hits += 1;
                } else {
                    self.stats.closures_built += 1;
                }
                Ok(closure)
            }
            ExprKind::Apply { func, arg } => {
                let func = self.eval(func, env)?;
                let arg = self.eval(arg, env)?;
                self.apply(&func, &arg)
            }
        }
    }

    pub fn apply(&mut self, func: &Closure, arg: &Closure) -> Result<Closure, EvalError> {
        self.stats.applications += 1;
        if let Some(hit) = self.cache.get(func, arg) {
            self.stats.cache_hits += 1;
            return Ok(hit.clone());
        }
        self.fuel.burn()?;

        let saved = self.purity.enter();
        let result = match func.body() {
            Body::Lambda { body, env } => self.eval(body, ShadowEnv::with_overlay(arg, env)),
            Body::Native(native) => self.apply_native(native, arg),
        };
        let pure = self.purity.leave(saved);
        let result = result?;

        if pure {
            self.cache.insert(func, arg, result.clone());
            self.stats.cache_stores += 1;
        }
        Ok(result)
    }

    fn apply_native(&mut self, native: &Native<Closure>, arg: &Closure) -> Result<Closure, EvalError> {
        let (step, effect) = native.step(arg, &mut self.io)?;
        if !effect.is_pure() {
            self.stats.io_events += 1;
        }
        self.purity.record(effect);
        Ok(match step {
            NativeStep::Value(value) => value,
            NativeStep::Partial(partial) => Closure::native(partial),
        })
    }

    pub fn stats(&self) -> EvalStats {
        self.stats
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    pub fn into_io(self) -> IO {
        self.io
    }
}
