//! # lmb - a memoizing combinator language
//!
//! lmb programs are untyped lambda terms over three builtins:
//! `__builtin_p0` and `__builtin_p1` write a bit, `__builtin_g` reads one.
//!
//! ## Quick Start
//!
//! ```
//! use lmb::{EvalConfig, MemoryIo, Session};
//!
//! let mut session = Session::new(MemoryIo::default(), EvalConfig::default()).unwrap();
//! session
//!     .run_source("((\\x x) __builtin_p1 __builtin_p0)", |e| panic!("{}", e))
//!     .unwrap();
//! assert_eq!(session.with_io(|io| io.bits().to_vec()), vec![true]);
//! ```
//!
//! ## Architecture
//!
//! 1. **Reader** - Tokenize and parse statements into a named AST
//! 2. **HIR** - Hash-consed de Bruijn expressions, constant folding
//! 3. **VM** - Memoizing evaluators, sequential or work-stealing
//! 4. **LIR** - Closure graph, optimizer passes, Rust emitter
//!
//! ## Memoization
//!
//! - Equal sub-expressions are one node
//! - A lambda evaluated with the same captures yields the same closure
//! - A pure application is computed once per (function, argument) pair

pub mod config;
pub mod effects;
pub mod error;
pub mod hir;
pub mod lir;
pub mod pipeline;
pub mod primitives;
pub mod reader;
pub mod repl;
pub mod value;
pub mod vm;

pub use config::{EvalConfig, OptConfig};
pub use error::{ErrorKind, LError, LResult};
pub use lir::{CodeGraph, Emitter, Machine, OptStats};
pub use pipeline::{compile_source, emit_source, exec_source, Session};
pub use primitives::{BitIo, BitPort, MemoryIo};
pub use reader::{read_all, Node, Statement};
pub use value::Closure;
pub use vm::{EvalError, EvalStats, Evaluator, ParallelEvaluator};
