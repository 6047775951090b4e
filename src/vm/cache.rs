//! Application cache: (function id, argument id) to result.
//!
//! Only results of pure applications are stored. Entries are never evicted
//! within a run.

use crate::value::{Closure, ClosureId};
use rustc_hash::FxHashMap;

pub type ApplyKey = (ClosureId, ClosureId);

#[derive(Debug, Default)]
pub struct ApplyCache {
    entries: FxHashMap<ApplyKey, Closure>,
}

impl ApplyCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, func: &Closure, arg: &Closure) -> Option<&Closure> {
        self.entries.get(&(func.id(), arg.id()))
    }

    #[inline]
    pub fn insert(&mut self, func: &Closure, arg: &Closure, result: Closure) {
        self.entries.insert((func.id(), arg.id()), result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
