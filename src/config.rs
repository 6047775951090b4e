//! Run-time configuration for the evaluator and the optimizer

/// Default worker stack: deep programs recurse once per application
pub const DEFAULT_STACK_SIZE: usize = 256 << 20;

/// How interactive-mode statements are evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Substitute globals and closed lambdas as constants before evaluation
    pub fold_constants: bool,
    /// Worker threads; 1 selects the sequential evaluator
    pub jobs: usize,
    /// Stack size in bytes of every evaluating thread
    pub stack_size: usize,
    /// Upper bound on uncached applications, if any
    pub fuel: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            fold_constants: true,
            jobs: 1,
            stack_size: DEFAULT_STACK_SIZE,
            fuel: None,
        }
    }
}

impl EvalConfig {
    pub fn with_fold_constants(mut self, fold: bool) -> Self {
        self.fold_constants = fold;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn with_fuel(mut self, fuel: Option<u64>) -> Self {
        self.fuel = fuel;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.jobs > 1
    }
}

/// Which closure-graph passes run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptConfig {
    pub inline: bool,
    pub statics: bool,
    pub dedup: bool,
}

impl Default for OptConfig {
    fn default() -> Self {
        OptConfig {
            inline: true,
            statics: true,
            dedup: true,
        }
    }
}

impl OptConfig {
    /// Every pass off: the raw lowered graph
    pub fn none() -> Self {
        OptConfig {
            inline: false,
            statics: false,
            dedup: false,
        }
    }

    pub fn with_inline(mut self, on: bool) -> Self {
        self.inline = on;
        self
    }

    pub fn with_statics(mut self, on: bool) -> Self {
        self.statics = on;
        self
    }

    pub fn with_dedup(mut self, on: bool) -> Self {
        self.dedup = on;
        self
    }
}
