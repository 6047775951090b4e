//! Hash-consed expression graph
//!
//! The interactive pipeline compiles each statement into this form:
//!
//! ```text
//! Node → Analyze → Expr → (Fold) → Evaluate
//! ```
//!
//! Nodes are de Bruijn indexed and interned per variant, so structurally
//! equal sub-expressions are one object and lambda bodies can carry their
//! own closure construction cache.

mod analyze;
mod expr;
mod fold;
mod intern;

pub use analyze::{analyze_statement, AnalysisResult, Analyzer};
pub use expr::{ArgMap, Expr, ExprId, ExprKind};
pub use fold::{fold_statement, FoldStats, Folder};
pub use intern::ExprGraph;
