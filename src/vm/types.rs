//! Evaluator error, statistics and step budget

use std::fmt;

/// Failure while evaluating or executing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A `Ref` pointed past the environment. Compiled code never does this.
    UnboundIndex { index: usize, len: usize },
    /// Applied something that is not a closure (the world sentinel)
    NotCallable(String),
    /// The host bit source or sink failed
    Io(String),
    /// The configured application budget ran out
    OutOfFuel,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnboundIndex { index, len } => write!(
                f,
                "environment index {} out of bounds (length {})",
                index, len
            ),
            EvalError::NotCallable(what) => write!(f, "cannot apply {}", what),
            EvalError::Io(message) => write!(f, "{}", message),
            EvalError::OutOfFuel => write!(f, "application budget exhausted"),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<std::io::Error> for EvalError {
    fn from(err: std::io::Error) -> Self {
        EvalError::Io(err.to_string())
    }
}

/// Event counters of an evaluator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStats {
    /// Applications requested, hits included
    pub applications: u64,
    /// Applications answered from the application cache
    pub cache_hits: u64,
    /// Application results stored in the cache
    pub cache_stores: u64,
    /// Lambda closures actually allocated
    pub closures_built: u64,
    /// Lambda evaluations answered by a construction cache
    pub construction_hits: u64,
    /// Bits emitted or consumed by builtins
    pub io_events: u64,
}

impl EvalStats {
    /// Counters accumulated since `earlier`
    pub fn since(&self, earlier: &EvalStats) -> EvalStats {
        EvalStats {
            applications: self.applications - earlier.applications,
            cache_hits: self.cache_hits - earlier.cache_hits,
            cache_stores: self.cache_stores - earlier.cache_stores,
            closures_built: self.closures_built - earlier.closures_built,
            construction_hits: self.construction_hits - earlier.construction_hits,
            io_events: self.io_events - earlier.io_events,
        }
    }
}

impl fmt::Display for EvalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "applications={} cache_hits={} cache_stores={} closures_built={} construction_hits={} io={}",
            self.applications,
            self.cache_hits,
            self.cache_stores,
            self.closures_built,
            self.construction_hits,
            self.io_events
        )
    }
}

/// Optional bound on the number of uncached applications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fuel(Option<u64>);

impl Fuel {
    pub fn unlimited() -> Self {
        Fuel(None)
    }

    pub fn limited(steps: u64) -> Self {
        Fuel(Some(steps))
    }

    pub fn new(steps: Option<u64>) -> Self {
        Fuel(steps)
    }

    #[inline]
    pub fn burn(&mut self) -> Result<(), EvalError> {
        match &mut self.0 {
            None => Ok(()),
            Some(0) => Err(EvalError::OutOfFuel),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
        }
    }

    pub fn remaining(&self) -> Option<u64> {
        self.0
    }
}
