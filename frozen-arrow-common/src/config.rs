//! Recognized execution options (spec.md §6 "Configuration").

/// Tunables accepted by [`crate`]'s consumers. All fields have the documented
/// defaults; construct with `ExecutionConfig::default()` and override via the
/// builder methods.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Route execution through the logical-plan pipeline (C9-C17) rather than
    /// a legacy direct path. Always `true` in this workspace: only the direct
    /// path is implemented (see DESIGN.md's Open Question decisions).
    pub use_logical_plan_execution: bool,
    /// Enable the plan cache (C13).
    pub use_logical_plan_cache: bool,
    /// Enable predicate compilation into a fused decision function (C15).
    pub use_compiled_queries: bool,
    /// Enable the adaptive-execution feedback loop (C16).
    pub use_adaptive_execution: bool,
    /// Row count above which the physical planner considers `Parallel`.
    pub parallel_threshold: i64,
    /// Row count above which the physical planner considers `SIMD`.
    pub simd_threshold: i64,
    /// Rows per zone-map chunk.
    pub chunk_rows: i32,
    /// Plan cache capacity before LRU-style eviction of the oldest 25%.
    pub plan_cache_capacity: i32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            use_logical_plan_execution: true,
            use_logical_plan_cache: true,
            use_compiled_queries: true,
            use_adaptive_execution: true,
            parallel_threshold: 50_000,
            simd_threshold: 1_000,
            chunk_rows: 16_384,
            plan_cache_capacity: 256,
        }
    }
}

impl ExecutionConfig {
    pub fn with_parallel_threshold(mut self, v: i64) -> Self {
        self.parallel_threshold = v;
        self
    }

    pub fn with_simd_threshold(mut self, v: i64) -> Self {
        self.simd_threshold = v;
        self
    }

    pub fn with_chunk_rows(mut self, v: i32) -> Self {
        self.chunk_rows = v;
        self
    }

    pub fn with_plan_cache_capacity(mut self, v: i32) -> Self {
        self.plan_cache_capacity = v;
        self
    }

    pub fn with_adaptive_execution(mut self, enabled: bool) -> Self {
        self.use_adaptive_execution = enabled;
        self
    }

    pub fn with_compiled_queries(mut self, enabled: bool) -> Self {
        self.use_compiled_queries = enabled;
        self
    }

    pub fn with_plan_cache(mut self, enabled: bool) -> Self {
        self.use_logical_plan_cache = enabled;
        self
    }
}
