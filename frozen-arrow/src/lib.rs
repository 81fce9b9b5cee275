//! FrozenArrow: an in-memory analytical query engine over immutable,
//! columnar Arrow record batches (spec.md §1). A batch is frozen into a
//! [`FrozenArrow`] once; every query after that runs read-only and
//! concurrently against the same data, choosing between sequential, SIMD-
//! friendly and parallel execution per query (C14) and caching both the
//! optimized plan (C13) and the compiled predicate (C15) across calls.

pub mod adaptive;
pub mod plan_builder;
pub mod plan_cache;
pub mod query_provider;

pub use adaptive::{AdaptiveStatsTracker, Recommendation};
pub use plan_builder::QueryBuilder;
pub use plan_cache::{PlanCache, PlanCacheStats};
pub use query_provider::{FromRow, FrozenArrow, RowSet};

pub use frozen_arrow_common::{ExecutionConfig, FrozenArrowError, Result, ScalarValue};
pub use frozen_arrow_common::schema::{DataType, Field, Schema};
pub use frozen_arrow_expr::{AggregateFn, CmpOp, ColumnPredicate, LogicalPlan, ProjectionField, SortKey, StringOpKind};
pub use frozen_arrow_physical::Strategy;
