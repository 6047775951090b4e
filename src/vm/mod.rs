//! Memoizing evaluators over the expression graph
//!
//! `Evaluator` is the default single-threaded recursive strategy.
//! `parallel::ParallelEvaluator` runs the same semantics on a pool of
//! work-stealing workers.

pub mod cache;
pub mod env;
pub mod eval;
pub mod parallel;
pub mod types;

pub use cache::{ApplyCache, ApplyKey};
pub use env::{OwnedEnv, ShadowEnv};
pub use eval::Evaluator;
pub use parallel::ParallelEvaluator;
pub use types::{EvalError, EvalStats, Fuel};
