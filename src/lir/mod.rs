//! Closure graph: the compiled-mode intermediate representation
//!
//! Each lambda of the program is a `CodeLambda` holding a straight-line SSA
//! body over four kinds of operands: locals, captured slots, the argument
//! and globals.
//!
//! Pipeline:
//! ```text
//! AST → Lower → CodeGraph → optimize → Emit → Rust source
//!                                    ↘ Machine (direct execution)
//! ```

mod emit;
mod lower;
mod machine;
pub mod optimize;
mod runtime;
mod types;

pub use emit::Emitter;
pub use lower::{lower_statement, Lowerer};
pub use machine::{Instance, Machine, Value};
pub use optimize::{optimize, OptStats};
pub use runtime::PRELUDE;
pub use types::{CodeGraph, CodeId, CodeInst, CodeLambda, GlobalDef, LambdaId};
