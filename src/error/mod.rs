//! Unified error system for lmb

mod builders;
mod types;

pub use crate::reader::SourceLoc;
pub use types::{ErrorKind, LError, LResult};
