//! Expression graph nodes

use crate::value::{Closure, ClosureId};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type ExprId = u64;

/// Indices into the enclosing scope, one per free slot of a lambda body.
/// `arg_map[i]` supplies body index `i + 1`.
pub type ArgMap = SmallVec<[usize; 4]>;

/// Captured closure ids keying the construction cache
type CaptureKey = SmallVec<[ClosureId; 4]>;

static NEXT_EXPR_ID: AtomicU64 = AtomicU64::new(1);

/// Expression kinds in de Bruijn form
#[derive(Debug)]
pub enum ExprKind {
    /// An already-built closure; produced by constant folding
    Const(Closure),
    /// Environment slot. Inside a lambda body 0 is the parameter.
    Ref(usize),
    Lambda { body: Expr, arg_map: ArgMap },
    Apply { func: Expr, arg: Expr },
}

struct ExprNode {
    id: ExprId,
    kind: ExprKind,
    /// Closures built with this node as their body, by captured ids
    constructed: Mutex<FxHashMap<CaptureKey, Closure>>,
}

/// Shared handle to a hash-consed node. Equality is identity.
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

impl Expr {
    /// Only the graph creates nodes; everything else goes through it so
    /// that structural equality implies identity.
    pub(super) fn new(kind: ExprKind) -> Self {
        Expr(Arc::new(ExprNode {
            id: NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            constructed: Mutex::new(FxHashMap::default()),
        }))
    }

    #[inline]
    pub fn id(&self) -> ExprId {
        self.0.id
    }

    #[inline]
    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    pub fn as_const(&self) -> Option<&Closure> {
        match &self.0.kind {
            ExprKind::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Closure with this node as body and `captured` as environment.
    ///
    /// Two requests with the same captured ids get the same closure. The
    /// flag reports whether it came from the cache.
    pub fn construct(&self, captured: Vec<Closure>) -> (Closure, bool) {
        let key: CaptureKey = captured.iter().map(Closure::id).collect();
        let mut cache = self.0.constructed.lock();
        if let Some(hit) = cache.get(&key) {
            return (hit.clone(), true);
        }
        let closure = Closure::lambda(self.clone(), captured);
        cache.insert(key, closure.clone());
        (closure, false)
    }

    /// Number of distinct closures built from this body so far
    pub fn constructed_count(&self) -> usize {
        self.0.constructed.lock().len()
    }

    /// Node count of the expression viewed as a tree
    pub fn tree_size(&self) -> usize {
        match &self.0.kind {
            ExprKind::Const(_) | ExprKind::Ref(_) => 1,
            ExprKind::Lambda { body, .. } => 1 + body.tree_size(),
            ExprKind::Apply { func, arg } => 1 + func.tree_size() + arg.tree_size(),
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Expr {}

impl std::hash::Hash for Expr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ExprKind::Const(c) => write!(f, "{}", c),
            ExprKind::Ref(i) => write!(f, "%{}", i),
            ExprKind::Lambda { body, arg_map } => {
                write!(f, "(\\[")?;
                for (i, idx) in arg_map.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", idx)?;
                }
                write!(f, "] {})", body)
            }
            ExprKind::Apply { func, arg } => write!(f, "({} {})", func, arg),
        }
    }
}
