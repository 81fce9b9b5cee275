//! The vectorized execution engine (C4-C8), physical planner (C14), and
//! predicate compiler (C15) for the FrozenArrow query engine.

pub mod block_iter;
pub mod compiler;
pub mod fused_aggregate;
pub mod parallel;
pub mod physical_plan;
pub mod sparse;
pub mod streaming;

pub use block_iter::{evaluate_filter, evaluate_filter_into};
pub use compiler::{predicate_list_hash, try_compile, CompiledPredicate, CompiledPredicateCache};
pub use fused_aggregate::{fused_aggregate, fused_aggregate_range, AggregateKind, Accumulator};
pub use parallel::{parallel_aggregate, parallel_filter, partition_ranges, CancellationToken};
pub use physical_plan::{
    cost_hash_group_by, cost_scan, plan_filter, plan_group_by, GroupByStrategy, PhysicalDecision,
    PlannerConfig, Strategy, ARRAY_INDEXED_CARDINALITY_LIMIT,
};
pub use sparse::{collect_sparse, SPARSE_SELECTIVITY_THRESHOLD};
pub use streaming::{any_matches, first_matching_row};
