//! C14: picks a `Strategy` per filter/aggregate node using the static cost
//! model from spec.md §4.14, and records `is_ordered`/`is_partitioned`
//! properties propagated from child nodes to suppress unnecessary resorts.

/// Execution strategy for a filter or aggregate physical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    SIMD,
    Parallel,
}

impl Strategy {
    fn cost_multiplier(self) -> f64 {
        match self {
            Strategy::Sequential => 1.0,
            Strategy::SIMD => 0.25,
            Strategy::Parallel => 0.5,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Strategy::Sequential => "Sequential",
            Strategy::SIMD => "SIMD",
            Strategy::Parallel => "Parallel",
        };
        f.write_str(s)
    }
}

/// Group-by strategy: array-indexed for small cardinality, hash otherwise
/// (spec.md §4.17, dispatch point 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupByStrategy {
    ArrayIndexed,
    Hash,
}

/// Cardinality at or below which `GroupBy` uses the array-indexed
/// aggregator instead of a hash map.
pub const ARRAY_INDEXED_CARDINALITY_LIMIT: i64 = 256;

/// A strategy choice plus its estimated cost and ordering properties, for
/// one physical filter/aggregate/group-by node.
#[derive(Debug, Clone, Copy)]
pub struct PhysicalDecision {
    pub strategy: Strategy,
    pub estimated_cost: f64,
    pub is_ordered: bool,
    pub is_partitioned: bool,
}

/// Static cost-model thresholds (spec.md §4.14), overridable via
/// [`frozen_arrow_common::ExecutionConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    pub parallel_threshold: i64,
    pub simd_threshold: i64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            parallel_threshold: 50_000,
            simd_threshold: 1_000,
        }
    }
}

impl From<&frozen_arrow_common::ExecutionConfig> for PlannerConfig {
    fn from(cfg: &frozen_arrow_common::ExecutionConfig) -> Self {
        PlannerConfig {
            parallel_threshold: cfg.parallel_threshold,
            simd_threshold: cfg.simd_threshold,
        }
    }
}

/// Chooses a strategy for a `Scan -> Filter` node plus its cost, given the
/// estimated row count and predicate count, per spec.md §4.14's thresholds:
/// `rows >= PARALLEL_THRESHOLD && npredicates > 1` wins Parallel first,
/// then `rows >= SIMD_THRESHOLD` wins SIMD, else Sequential.
pub fn plan_filter(rows: i64, npredicates: usize, simd_available: bool, config: &PlannerConfig) -> PhysicalDecision {
    let strategy = if rows >= config.parallel_threshold && npredicates > 1 {
        Strategy::Parallel
    } else if rows >= config.simd_threshold && simd_available {
        Strategy::SIMD
    } else {
        Strategy::Sequential
    };
    let estimated_cost = rows as f64 * npredicates.max(1) as f64 * 1e-4 * strategy.cost_multiplier();
    PhysicalDecision {
        strategy,
        estimated_cost,
        is_ordered: strategy != Strategy::Parallel,
        is_partitioned: strategy == Strategy::Parallel,
    }
}

pub fn cost_scan(rows: i64) -> f64 {
    rows as f64 * 1e-3
}

pub fn cost_hash_group_by(rows: i64, groupby_keys: i64) -> f64 {
    rows as f64 * (1.0 + 0.5 * groupby_keys as f64) * 1e-4
}

/// Chooses between the array-indexed and hash group-by aggregators based on
/// the estimated number of distinct groups.
pub fn plan_group_by(estimated_distinct_groups: i64, rows: i64, simd_available: bool, config: &PlannerConfig) -> (GroupByStrategy, PhysicalDecision) {
    let gb_strategy = if estimated_distinct_groups <= ARRAY_INDEXED_CARDINALITY_LIMIT {
        GroupByStrategy::ArrayIndexed
    } else {
        GroupByStrategy::Hash
    };
    let filter_like = plan_filter(rows, 1, simd_available, config);
    let cost = cost_hash_group_by(rows, estimated_distinct_groups.max(1));
    (
        gb_strategy,
        PhysicalDecision {
            estimated_cost: cost,
            ..filter_like
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_rows_are_sequential() {
        let d = plan_filter(100, 3, true, &PlannerConfig::default());
        assert_eq!(d.strategy, Strategy::Sequential);
    }

    #[test]
    fn many_rows_single_predicate_is_simd_not_parallel() {
        let d = plan_filter(100_000, 1, true, &PlannerConfig::default());
        assert_eq!(d.strategy, Strategy::SIMD);
    }

    #[test]
    fn many_rows_multi_predicate_is_parallel() {
        let d = plan_filter(100_000, 2, true, &PlannerConfig::default());
        assert_eq!(d.strategy, Strategy::Parallel);
    }

    #[test]
    fn small_cardinality_group_by_is_array_indexed() {
        let (strategy, _) = plan_group_by(3, 10_000, true, &PlannerConfig::default());
        assert_eq!(strategy, GroupByStrategy::ArrayIndexed);
    }

    #[test]
    fn large_cardinality_group_by_is_hash() {
        let (strategy, _) = plan_group_by(10_000, 100_000, true, &PlannerConfig::default());
        assert_eq!(strategy, GroupByStrategy::Hash);
    }
}
