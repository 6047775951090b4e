//! Parallel evaluator on a work-stealing pool
//!
//! Each application whose function and argument are both applications
//! evaluates the two sides as a `join`. Values travel with the `Effect` of
//! computing them instead of a shared purity flag.
//!
//! Work stealing is rayon's: every worker owns a deque, and a `join` whose
//! second half was stolen keeps running other jobs until it comes back.
//!
//! The application cache becomes a map of cells. The first worker to miss
//! on a key installs a pending cell and computes; any other worker asking
//! for the same key waits on the cell while yielding to other jobs, so a
//! pure result is computed once. Impure results are not stored: the cell
//! is abandoned and waiters compute the application themselves, exactly as
//! they would have sequentially.
//!
//! Bit I/O goes through a mutex. The relative order of I/O performed by
//! the two sides of one application is not fixed.

use super::cache::ApplyKey;
use super::env::OwnedEnv;
use super::types::{EvalError, EvalStats};
use crate::effects::Effect;
use crate::hir::{Expr, ExprKind};
use crate::primitives::{BitIo, Native, NativeStep};
use crate::value::{Body, Closure};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder, Yield};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
enum CellState {
    Pending,
    Ready(Closure),
    Abandoned,
}

#[derive(Debug)]
struct CacheCell {
    state: Mutex<CellState>,
}

#[derive(Default)]
struct Counters {
    applications: AtomicU64,
    cache_hits: AtomicU64,
    cache_stores: AtomicU64,
    closures_built: AtomicU64,
    construction_hits: AtomicU64,
    io_events: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> EvalStats {
        EvalStats {
            applications: self.applications.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_stores: self.cache_stores.load(Ordering::Relaxed),
            closures_built: self.closures_built.load(Ordering::Relaxed),
            construction_hits: self.construction_hits.load(Ordering::Relaxed),
            io_events: self.io_events.load(Ordering::Relaxed),
        }
    }
}

struct Shared<IO> {
    cache: Mutex<FxHashMap<ApplyKey, Arc<CacheCell>>>,
    io: Mutex<IO>,
    counters: Counters,
    fuel_limited: AtomicBool,
    fuel: AtomicU64,
}

type Evaluated = Result<(Closure, Effect), EvalError>;

pub struct ParallelEvaluator<IO> {
    pool: ThreadPool,
    shared: Arc<Shared<IO>>,
}

impl<IO: BitIo + Send + 'static> ParallelEvaluator<IO> {
    /// Start a pool of `threads` workers with `stack_size`-byte stacks
    pub fn new(io: IO, threads: usize, stack_size: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .stack_size(stack_size)
            .thread_name(|index| format!("lmb-worker-{}", index))
            .build()?;
        log::debug!("worker pool started with {} threads", pool.current_num_threads());
        Ok(ParallelEvaluator {
            pool,
            shared: Arc::new(Shared {
                cache: Mutex::new(FxHashMap::default()),
                io: Mutex::new(io),
                counters: Counters::default(),
                fuel_limited: AtomicBool::new(false),
                fuel: AtomicU64::new(0),
            }),
        })
    }

    pub fn with_fuel(self, fuel: Option<u64>) -> Self {
        self.shared.fuel_limited.store(fuel.is_some(), Ordering::SeqCst);
        self.shared.fuel.store(fuel.unwrap_or(0), Ordering::SeqCst);
        self
    }

    pub fn eval_statement(&self, expr: &Expr, globals: &[Closure]) -> Result<Closure, EvalError> {
        let env = OwnedEnv::flat(globals.to_vec());
        self.pool
            .install(|| eval(&self.shared, expr, &env, &Ancestry::default()))
            .map(|(value, _)| value)
    }

    pub fn apply(&self, func: &Closure, arg: &Closure) -> Result<Closure, EvalError> {
        self.pool
            .install(|| apply(&self.shared, func, arg, &Ancestry::default()))
            .map(|(value, _)| value)
    }

    pub fn stats(&self) -> EvalStats {
        self.shared.counters.snapshot()
    }

    pub fn cache_len(&self) -> usize {
        self.shared
            .cache
            .lock()
            .values()
            .filter(|cell| matches!(*cell.state.lock(), CellState::Ready(_)))
            .count()
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` with exclusive access to the I/O port
    pub fn with_io<R>(&self, f: impl FnOnce(&mut IO) -> R) -> R {
        f(&mut self.shared.io.lock())
    }
}

/// Keys of the applications enclosing an evaluation, innermost first.
/// Travels with forked tasks so a thief knows what its parent is computing.
#[derive(Clone, Default)]
struct Ancestry(Option<Arc<Link>>);

struct Link {
    key: ApplyKey,
    parent: Ancestry,
}

impl Ancestry {
    fn push(&self, key: ApplyKey) -> Ancestry {
        Ancestry(Some(Arc::new(Link {
            key,
            parent: self.clone(),
        })))
    }

    fn contains(&self, key: &ApplyKey) -> bool {
        let mut cursor = &self.0;
        while let Some(link) = cursor {
            if link.key == *key {
                return true;
            }
            cursor = &link.parent.0;
        }
        false
    }
}

thread_local! {
    /// Applications being computed by frames of this thread. A helping
    /// worker may run an unrelated job on top of them.
    static ON_STACK: RefCell<FxHashMap<ApplyKey, u32>> = RefCell::new(FxHashMap::default());
}

struct StackGuard(ApplyKey);

impl StackGuard {
    fn enter(key: ApplyKey) -> Self {
        ON_STACK.with(|stack| *stack.borrow_mut().entry(key).or_insert(0) += 1);
        StackGuard(key)
    }

    fn holds(key: &ApplyKey) -> bool {
        ON_STACK.with(|stack| stack.borrow().contains_key(key))
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        ON_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(count) = stack.get_mut(&self.0) {
                *count -= 1;
                if *count == 0 {
                    stack.remove(&self.0);
                }
            }
        });
    }
}

/// Cheap to evaluate inline: no application underneath
fn is_leaf(expr: &Expr) -> bool {
    !matches!(expr.kind(), ExprKind::Apply { .. })
}

fn eval<IO: BitIo + Send + 'static>(
    shared: &Arc<Shared<IO>>,
    expr: &Expr,
    env: &OwnedEnv,
    ancestry: &Ancestry,
) -> Evaluated {
    match expr.kind() {
        ExprKind::Const(value) => Ok((value.clone(), Effect::Pure)),
        ExprKind::Ref(index) => Ok((env.get(*index)?.clone(), Effect::Pure)),
        ExprKind::Lambda { body, arg_map } => {
            let captured = arg_map
                .iter()
                .map(|&idx| env.get(idx).cloned())
                .collect::<Result<Vec<_>, _>>()?;
            let (closure, hit) = body.construct(captured);
            if hit {
                Counters::bump(&shared.counters.construction_hits);
            } else {
                Counters::bump(&shared.counters.closures_built);
            }
            Ok((closure, Effect::Pure))
        }
        ExprKind::Apply { func, arg } => {
            let (func, arg) = if is_leaf(func) || is_leaf(arg) {
                (
                    eval(shared, func, env, ancestry)?,
                    eval(shared, arg, env, ancestry)?,
                )
            } else {
                let (func, arg) = rayon::join(
                    || eval(shared, func, env, ancestry),
                    || eval(shared, arg, env, ancestry),
                );
                (func?, arg?)
            };
            let (value, effect) = apply(shared, &func.0, &arg.0, ancestry)?;
            Ok((value, Effect::combine_all([func.1, arg.1, effect])))
        }
    }
}

fn apply<IO: BitIo + Send + 'static>(
    shared: &Arc<Shared<IO>>,
    func: &Closure,
    arg: &Closure,
    ancestry: &Ancestry,
) -> Evaluated {
    Counters::bump(&shared.counters.applications);
    let key = (func.id(), arg.id());
    loop {
        let (cell, owner) = {
            let mut cache = shared.cache.lock();
            match cache.get(&key) {
                Some(cell) => (cell.clone(), false),
                None => {
                    let cell = Arc::new(CacheCell {
                        state: Mutex::new(CellState::Pending),
                    });
                    cache.insert(key, cell.clone());
                    (cell, true)
                }
            }
        };
        if owner {
            let result = run_body(shared, func, arg, key, ancestry);
            return settle(shared, key, &cell, result);
        }

        let mut ready = None;
        let mut pending = false;
        match &*cell.state.lock() {
            CellState::Ready(value) => ready = Some(value.clone()),
            CellState::Pending => pending = true,
            CellState::Abandoned => {}
        }
        if pending {
            // The pending computation encloses us; waiting would never end.
            // Sequentially this is a plain uncached re-application.
            if ancestry.contains(&key) || StackGuard::holds(&key) {
                return run_body(shared, func, arg, key, ancestry);
            }
            loop {
                match &*cell.state.lock() {
                    CellState::Pending => {}
                    CellState::Ready(value) => {
                        ready = Some(value.clone());
                        break;
                    }
                    CellState::Abandoned => break,
                }
                if !matches!(rayon::yield_now(), Some(Yield::Executed)) {
                    std::thread::yield_now();
                }
            }
        }
        if let Some(value) = ready {
            Counters::bump(&shared.counters.cache_hits);
            return Ok((value, Effect::Pure));
        }
    }
}

fn run_body<IO: BitIo + Send + 'static>(
    shared: &Arc<Shared<IO>>,
    func: &Closure,
    arg: &Closure,
    key: ApplyKey,
    ancestry: &Ancestry,
) -> Evaluated {
    burn_fuel(shared)?;
    let _guard = StackGuard::enter(key);
    match func.body() {
        Body::Lambda { body, env } => eval(
            shared,
            body,
            &OwnedEnv::with_overlay(arg.clone(), env.clone()),
            &ancestry.push(key),
        ),
        Body::Native(native) => apply_native(shared, native, arg),
    }
}

/// Publish the owner's result to waiters. Only pure results stay cached.
fn settle<IO>(shared: &Shared<IO>, key: ApplyKey, cell: &Arc<CacheCell>, result: Evaluated) -> Evaluated {
    match result {
        Ok((value, Effect::Pure)) => {
            *cell.state.lock() = CellState::Ready(value.clone());
            Counters::bump(&shared.counters.cache_stores);
            Ok((value, Effect::Pure))
        }
        other => {
            *cell.state.lock() = CellState::Abandoned;
            let mut cache = shared.cache.lock();
            if cache.get(&key).is_some_and(|current| Arc::ptr_eq(current, cell)) {
                cache.remove(&key);
            }
            other
        }
    }
}

fn apply_native<IO: BitIo + Send + 'static>(
    shared: &Arc<Shared<IO>>,
    native: &Native<Closure>,
    arg: &Closure,
) -> Evaluated {
    let (step, effect) = native.step(arg, &mut *shared.io.lock())?;
    if !effect.is_pure() {
        Counters::bump(&shared.counters.io_events);
    }
    let value = match step {
        NativeStep::Value(value) => value,
        NativeStep::Partial(partial) => Closure::native(partial),
    };
    Ok((value, effect))
}

fn burn_fuel<IO>(shared: &Shared<IO>) -> Result<(), EvalError> {
    if !shared.fuel_limited.load(Ordering::Relaxed) {
        return Ok(());
    }
    shared
        .fuel
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .map(|_| ())
        .map_err(|_| EvalError::OutOfFuel)
}
