//! Runtime closures
//!
//! A closure is either a compiled lambda body with its captured
//! environment, or a native builtin (possibly partially applied). Every
//! closure gets a fresh id from a process-wide counter; caches compare
//! closures by id only.

use crate::hir::Expr;
use crate::primitives::Native;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a closure. Never reused within a process.
pub type ClosureId = u64;

static NEXT_CLOSURE_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_id() -> ClosureId {
    NEXT_CLOSURE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub enum Body {
    /// `body` runs with index 0 bound to the argument and index `i > 0`
    /// bound to `env[i - 1]`.
    Lambda { body: Expr, env: Arc<[Closure]> },
    Native(Native<Closure>),
}

#[derive(Debug)]
struct ClosureData {
    id: ClosureId,
    body: Body,
}

/// Reference-counted closure handle
#[derive(Clone)]
pub struct Closure(Arc<ClosureData>);

impl Closure {
    pub fn lambda(body: Expr, env: impl Into<Arc<[Closure]>>) -> Self {
        Closure(Arc::new(ClosureData {
            id: fresh_id(),
            body: Body::Lambda {
                body,
                env: env.into(),
            },
        }))
    }

    pub fn native(native: Native<Closure>) -> Self {
        Closure(Arc::new(ClosureData {
            id: fresh_id(),
            body: Body::Native(native),
        }))
    }

    #[inline]
    pub fn id(&self) -> ClosureId {
        self.0.id
    }

    #[inline]
    pub fn body(&self) -> &Body {
        &self.0.body
    }

    pub fn is_native(&self) -> bool {
        matches!(self.0.body, Body::Native(_))
    }

    /// Captured environment of a lambda closure (empty for natives)
    pub fn env(&self) -> &[Closure] {
        match &self.0.body {
            Body::Lambda { env, .. } => env,
            Body::Native(_) => &[],
        }
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Closure {}

impl std::hash::Hash for Closure {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.body {
            Body::Lambda { env, .. } => {
                write!(f, "#<closure {} captures={}>", self.0.id, env.len())
            }
            Body::Native(native) => {
                let name = match native {
                    Native::Output(false) => "__builtin_p0",
                    Native::Output(true) => "__builtin_p1",
                    Native::Get => "__builtin_g",
                    Native::GetK0(_) => "__builtin_g/1",
                    Native::GetK1(..) => "__builtin_g/2",
                };
                write!(f, "#<native {} {}>", self.0.id, name)
            }
        }
    }
}
