//! Closure-graph optimizer
//!
//! Three passes, in this order: temp-lambda inlining, static extraction and
//! structural deduplication. Each can be switched off through `OptConfig`.

pub mod dedup;
pub mod inline;
pub mod statics;

pub use dedup::dedup_pass;
pub use inline::inline_pass;
pub use statics::statics_pass;

use super::types::CodeGraph;
use crate::config::OptConfig;
use std::fmt;

/// What the optimizer did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptStats {
    pub lambdas_before: usize,
    pub lambdas_after: usize,
    /// Call sites spliced by inlining
    pub inlined: usize,
    /// Lambdas turned into static singletons
    pub statics: usize,
    /// Lambdas removed as structural duplicates
    pub deduplicated: usize,
}

impl fmt::Display for OptStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} lambdas ({} inlined, {} static, {} duplicates)",
            self.lambdas_before, self.lambdas_after, self.inlined, self.statics, self.deduplicated
        )
    }
}

/// Run the enabled passes over `graph`
pub fn optimize(graph: &mut CodeGraph, config: &OptConfig) -> OptStats {
    let mut stats = OptStats {
        lambdas_before: graph.len(),
        ..OptStats::default()
    };
    graph.refresh_deps();
    graph.prune();

    if config.inline {
        stats.inlined = inline_pass(graph);
        log::debug!(
            "inline: {} call sites, {} lambdas left",
            stats.inlined,
            graph.len()
        );
    }
    if config.statics {
        stats.statics = statics_pass(graph);
        log::debug!("statics: {} extracted", stats.statics);
    }
    if config.dedup {
        stats.deduplicated = dedup_pass(graph);
        log::debug!(
            "dedup: {} collapsed, {} lambdas left",
            stats.deduplicated,
            graph.len()
        );
    }

    stats.lambdas_after = graph.len();
    log::info!("optimizer: {}", stats);
    stats
}
