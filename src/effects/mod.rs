//! Effect tracking for application caching
//!
//! An application result may only be memoized if computing it performed no
//! bit I/O. The sequential evaluator and the graph machine keep a single
//! flag that is saved and set on entry to every application and cleared by
//! the I/O builtins. The parallel evaluator instead returns an `Effect`
//! alongside every value and combines them.

use std::fmt;

/// Effect classification for a computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Effect {
    /// No I/O happened; the result may be cached
    #[default]
    Pure,
    /// A builtin touched the bit streams
    Io,
}

impl Effect {
    /// Sequencing: I/O anywhere makes the whole computation impure
    pub fn combine(self, other: Effect) -> Effect {
        match (self, other) {
            (Effect::Pure, Effect::Pure) => Effect::Pure,
            _ => Effect::Io,
        }
    }

    pub fn combine_all(effects: impl IntoIterator<Item = Effect>) -> Effect {
        effects.into_iter().fold(Effect::Pure, Effect::combine)
    }

    pub fn is_pure(self) -> bool {
        self == Effect::Pure
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Pure => write!(f, "pure"),
            Effect::Io => write!(f, "io"),
        }
    }
}

/// The purity flag of a single-threaded run.
#[derive(Debug, Clone)]
pub struct Purity {
    pure: bool,
}

impl Purity {
    pub fn new() -> Self {
        Purity { pure: true }
    }

    /// Start an application frame. Returns the flag to hand back to `leave`.
    #[inline]
    pub fn enter(&mut self) -> bool {
        std::mem::replace(&mut self.pure, true)
    }

    /// End an application frame; returns whether the frame stayed pure.
    /// Impurity propagates to the enclosing frame.
    #[inline]
    pub fn leave(&mut self, saved: bool) -> bool {
        let frame_pure = self.pure;
        self.pure = saved && frame_pure;
        frame_pure
    }

    #[inline]
    pub fn record(&mut self, effect: Effect) {
        if effect == Effect::Io {
            self.pure = false;
        }
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }
}

impl Default for Purity {
    fn default() -> Self {
        Self::new()
    }
}
