//! End-to-end drivers for both execution modes
//!
//! Interactive mode: each statement is analyzed into the shared expression
//! graph, its free names are bound from the global environment, it is
//! optionally constant-folded and then evaluated. An unresolved name skips
//! that statement only.
//!
//! Compiled mode: every statement is lowered into one closure graph, which is
//! optimized and then emitted as Rust source or run by the graph machine.
//! Any unresolved name or syntax error aborts the compilation.

use crate::config::{EvalConfig, OptConfig};
use crate::error::{LError, LResult};
use crate::hir::{analyze_statement, fold_statement, ExprGraph};
use crate::lir::{lower_statement, optimize, CodeGraph, Emitter, Machine, OptStats};
use crate::primitives::{register_builtins, BitIo, Globals};
use crate::reader::{read_all, Statement, StatementReader};
use crate::value::Closure;
use crate::vm::{EvalStats, Evaluator, ParallelEvaluator};
use std::io::BufRead;

enum Backend<IO> {
    Sequential(Evaluator<IO>),
    Parallel(ParallelEvaluator<IO>),
}

/// Interactive-mode state that outlives single statements
pub struct Session<IO> {
    graph: ExprGraph,
    globals: Globals,
    config: EvalConfig,
    backend: Backend<IO>,
    statements: usize,
}

impl<IO: BitIo + Send + 'static> Session<IO> {
    /// Fails only if the worker pool cannot be started
    pub fn new(io: IO, config: EvalConfig) -> LResult<Self> {
        let mut globals = Globals::new();
        register_builtins(&mut globals);
        let backend = if config.is_parallel() {
            let eval = ParallelEvaluator::new(io, config.jobs, config.stack_size)
                .map_err(|e| LError::internal(format!("cannot start worker pool: {}", e)))?;
            Backend::Parallel(eval.with_fuel(config.fuel))
        } else {
            Backend::Sequential(Evaluator::new(io).with_fuel(config.fuel))
        };
        Ok(Session {
            graph: ExprGraph::new(),
            globals,
            config,
            backend,
            statements: 0,
        })
    }

    /// Compile and evaluate one statement
    pub fn run_statement(&mut self, stmt: &Statement) -> LResult<Closure> {
        let analysis = analyze_statement(&mut self.graph, &stmt.node);
        let bound = self
            .globals
            .resolve(&analysis.free)
            .map_err(|missing| LError::unresolved(missing).with_location(stmt.loc))?;

        let (expr, env) = if self.config.fold_constants {
            let (folded, fold) = fold_statement(&mut self.graph, &analysis.expr, &bound)?;
            log::trace!(
                "folded: {} lambdas built, {} beta reductions",
                fold.lambdas_built,
                fold.beta_reductions
            );
            (folded, Vec::new())
        } else {
            (analysis.expr, bound)
        };
        log::debug!(
            "statement {} at {}: {} free names, {} graph nodes",
            self.statements,
            stmt.loc,
            analysis.free.len(),
            self.graph.len()
        );

        let before = self.stats();
        let value = match &mut self.backend {
            Backend::Sequential(eval) => eval.eval_statement(&expr, &env),
            Backend::Parallel(eval) => eval.eval_statement(&expr, &env),
        }
        .map_err(|e| LError::from(e).with_location(stmt.loc))?;
        log::debug!("statement {}: {}", self.statements, self.stats().since(&before));
        self.statements += 1;
        Ok(value)
    }

    /// Run every statement read from `input`. Recoverable errors go to
    /// `on_error` and processing continues; a fatal one is returned.
    /// Returns how many statements ran.
    pub fn run_reader<R: BufRead>(
        &mut self,
        input: R,
        mut on_error: impl FnMut(&LError),
    ) -> LResult<usize> {
        let mut ran = 0;
        for stmt in StatementReader::new(input) {
            let outcome = stmt.and_then(|stmt| self.run_statement(&stmt));
            match outcome {
                Ok(_) => ran += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => on_error(&e),
            }
        }
        Ok(ran)
    }

    pub fn run_source(&mut self, source: &str, on_error: impl FnMut(&LError)) -> LResult<usize> {
        self.run_reader(source.as_bytes(), on_error)
    }

    pub fn stats(&self) -> EvalStats {
        match &self.backend {
            Backend::Sequential(eval) => eval.stats(),
            Backend::Parallel(eval) => eval.stats(),
        }
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn graph(&self) -> &ExprGraph {
        &self.graph
    }

    /// Statements evaluated so far
    pub fn statements(&self) -> usize {
        self.statements
    }

    /// Run `f` with the bit port
    pub fn with_io<R>(&mut self, f: impl FnOnce(&mut IO) -> R) -> R {
        match &mut self.backend {
            Backend::Sequential(eval) => f(eval.io_mut()),
            Backend::Parallel(eval) => eval.with_io(f),
        }
    }
}

/// Lower every statement of `source` into one optimized closure graph
pub fn compile_source(source: &str, config: &OptConfig) -> LResult<(CodeGraph, OptStats)> {
    let mut graph = CodeGraph::new();
    for stmt in read_all(source) {
        let stmt = stmt?;
        lower_statement(&mut graph, &stmt.node).map_err(|e| e.with_location(stmt.loc))?;
    }
    log::debug!(
        "lowered {} statements into {} lambdas",
        graph.roots.len(),
        graph.len()
    );
    let stats = optimize(&mut graph, config);
    Ok((graph, stats))
}

/// Compile `source` to a standalone Rust program
pub fn emit_source(source: &str, config: &OptConfig, stack_size: usize) -> LResult<String> {
    let (graph, _) = compile_source(source, config)?;
    Ok(Emitter::new(&graph).with_stack_size(stack_size).emit())
}

/// Compile `source` and run the graph directly on `io`
pub fn exec_source<IO: BitIo>(
    source: &str,
    config: &OptConfig,
    io: IO,
    fuel: Option<u64>,
) -> LResult<(IO, EvalStats)> {
    let (graph, _) = compile_source(source, config)?;
    let mut machine = Machine::new(&graph, io).with_fuel(fuel);
    machine.run()?;
    let stats = machine.stats();
    Ok((machine.into_io(), stats))
}
