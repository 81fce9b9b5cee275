//! Predicate model (C2) and logical plan (C9) for the FrozenArrow query
//! engine, plus the zone-map pruning queries that sit alongside the
//! predicate kinds they inspect.

pub mod logical_plan;
pub mod predicate;
pub mod zone_map_query;

pub use logical_plan::{
    AggregateFn, Aggregate, Distinct, Filter, GroupBy, Limit, LogicalPlan, LogicalPlanVisitor,
    Offset, Project, ProjectionField, Scan, Sort, SortKey,
};
pub use predicate::{CmpOp, ColumnPredicate, StringOpKind};
pub use zone_map_query::ZoneMapQuery;
