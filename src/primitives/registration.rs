use super::def::{Builtin, BUILTINS};
use crate::value::Closure;
use rustc_hash::FxHashMap;

/// Global binding environment consulted when a statement's free names are
/// resolved.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    entries: Vec<(String, Closure)>,
    index: FxHashMap<String, usize>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind (or rebind) `name`
    pub fn define(&mut self, name: impl Into<String>, value: Closure) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Closure> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every name, or report all the ones that are missing.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Closure>, Vec<String>> {
        let mut values = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.lookup(name) {
                Some(value) => values.push(value.clone()),
                None => missing.push(name.clone()),
            }
        }
        if missing.is_empty() {
            Ok(values)
        } else {
            Err(missing)
        }
    }
}

/// Bind every builtin in `globals`. Each gets its own native closure.
pub fn register_builtins(globals: &mut Globals) {
    for def in BUILTINS {
        globals.define(def.name, builtin_closure(def.builtin));
        log::trace!("registered builtin {}", def.name);
    }
}

pub fn builtin_closure(builtin: Builtin) -> Closure {
    Closure::native(builtin.native())
}
