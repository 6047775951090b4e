//! Runtime values. Every value of the language is a closure.

pub mod closure;

pub use closure::{Body, Closure, ClosureId};
