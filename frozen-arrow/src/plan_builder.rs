//! C11: translates the host query surface into a [`LogicalPlan`].
//!
//! The source system's translator walks a tree of method calls and lambdas
//! because that surface is built from reflectable expression trees. Rust has
//! no equivalent runtime reflection, so the host surface here is a typed
//! fluent builder instead: every predicate a caller passes in is already a
//! constructed [`ColumnPredicate`], resolved against the schema at
//! construction time exactly as spec.md §9 requires ("predicate state fully
//! initialized at construction"). The translator's remaining job is
//! assembling those typed pieces into plan nodes, which is where
//! `UnsupportedPattern` still applies: a predicate that doesn't type-check
//! against the schema never reaches [`QueryBuilder`] at all, it fails at the
//! `ColumnPredicate` constructor.

use std::sync::Arc;

use frozen_arrow_common::error::Result;
use frozen_arrow_common::schema::Schema;
use frozen_arrow_expr::{AggregateFn, ColumnPredicate, LogicalPlan, ProjectionField, SortKey};

/// Fluent builder mirroring the host surface's `Where/Select/GroupBy/
/// Take/Skip/Distinct/OrderBy` chain (spec.md §4.11). Each method consumes
/// `self` and returns a new builder wrapping an immutable plan node, the
/// same value-tree discipline [`LogicalPlan`] itself follows.
pub struct QueryBuilder {
    plan: Arc<LogicalPlan>,
}

impl QueryBuilder {
    /// `Scan`: the root of every query, one per frozen batch.
    pub fn scan(schema: Schema, estimated_row_count: i64) -> Self {
        QueryBuilder {
            plan: Arc::new(LogicalPlan::scan(schema, estimated_row_count)),
        }
    }

    /// `Where` → `Filter`. `&&` is expressed by passing `ColumnPredicate::And`,
    /// which this flattens into `Filter.predicates` (the list the optimizer
    /// reorders); `||`/`!` keep their compound `Or`/`Not` shape, which the
    /// optimizer and executor evaluate as a single leaf.
    pub fn filter(self, predicate: ColumnPredicate) -> Result<Self> {
        let predicates = flatten_and(predicate);
        let selectivity = predicates
            .iter()
            .map(|p| p.default_selectivity())
            .product::<f64>()
            .clamp(0.0, 1.0);
        Ok(QueryBuilder {
            plan: Arc::new(LogicalPlan::filter(self.plan, predicates, selectivity)?),
        })
    }

    /// `Select` → `Project`, one field reference per output column.
    pub fn project(self, projections: Vec<ProjectionField>) -> Self {
        QueryBuilder {
            plan: Arc::new(LogicalPlan::project(self.plan, projections)),
        }
    }

    /// A bare terminal aggregate with no preceding `GroupBy`
    /// (`Count()`, `Sum(col)`, ...).
    pub fn aggregate(self, aggregates: Vec<AggregateFn>) -> Self {
        QueryBuilder {
            plan: Arc::new(LogicalPlan::aggregate(self.plan, aggregates)),
        }
    }

    /// `GroupBy(keySel).Select(aggProjector)` → `GroupBy`.
    pub fn group_by(
        self,
        key_column: usize,
        key_name: impl Into<String>,
        aggregates: Vec<AggregateFn>,
        estimated_distinct_groups: i64,
    ) -> Self {
        QueryBuilder {
            plan: Arc::new(LogicalPlan::group_by(
                self.plan,
                key_column,
                key_name.into(),
                aggregates,
                estimated_distinct_groups,
            )),
        }
    }

    /// `Take(n)` → `Limit`.
    pub fn limit(self, count: i64) -> Result<Self> {
        Ok(QueryBuilder {
            plan: Arc::new(LogicalPlan::limit(self.plan, count)?),
        })
    }

    /// `Skip(n)` → `Offset`.
    pub fn offset(self, count: i64) -> Result<Self> {
        Ok(QueryBuilder {
            plan: Arc::new(LogicalPlan::offset(self.plan, count)?),
        })
    }

    pub fn distinct(self) -> Self {
        QueryBuilder {
            plan: Arc::new(LogicalPlan::distinct(self.plan)),
        }
    }

    /// `OrderBy`/`ThenBy` → `Sort`, one key per call in priority order.
    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        QueryBuilder {
            plan: Arc::new(LogicalPlan::sort(self.plan, keys)),
        }
    }

    pub fn build(self) -> Arc<LogicalPlan> {
        self.plan
    }
}

/// Splits a top-level `And` back into the flat list `Filter.predicates`
/// expects; any other shape is already a single leaf.
fn flatten_and(pred: ColumnPredicate) -> Vec<ColumnPredicate> {
    match pred {
        ColumnPredicate::And(list) => list,
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frozen_arrow_common::schema::{DataType, Field};
    use frozen_arrow_expr::CmpOp;

    fn schema() -> Schema {
        Schema::from_fields(vec![
            Field { name: "Age".into(), index: 0, data_type: DataType::Int32, nullable: false },
            Field { name: "Score".into(), index: 1, data_type: DataType::Float64, nullable: false },
        ])
    }

    #[test]
    fn filter_then_limit_builds_expected_tree() {
        let schema = schema();
        let pred = ColumnPredicate::i32_cmp(&schema, "Age", CmpOp::Gt, 30).unwrap();
        let plan = QueryBuilder::scan(schema, 1000)
            .filter(pred)
            .unwrap()
            .limit(10)
            .unwrap()
            .build();
        let LogicalPlan::Limit(l) = plan.as_ref() else { panic!("expected limit") };
        assert_eq!(l.count, 10);
        assert!(matches!(l.input.as_ref(), LogicalPlan::Filter(_)));
    }

    #[test]
    fn and_predicate_flattens_into_filter_list() {
        let schema = schema();
        let a = ColumnPredicate::i32_cmp(&schema, "Age", CmpOp::Gt, 30).unwrap();
        let b = ColumnPredicate::f64_cmp(&schema, "Score", CmpOp::Lt, 50.0).unwrap();
        let plan = QueryBuilder::scan(schema, 1000)
            .filter(ColumnPredicate::And(vec![a, b]))
            .unwrap()
            .build();
        let LogicalPlan::Filter(f) = plan.as_ref() else { panic!("expected filter") };
        assert_eq!(f.predicates.len(), 2);
    }

    #[test]
    fn group_by_produces_key_and_aggregate_fields() {
        let schema = schema();
        let plan = QueryBuilder::scan(schema, 1000)
            .group_by(0, "Age", vec![AggregateFn::Count], 45)
            .build();
        let LogicalPlan::GroupBy(g) = plan.as_ref() else { panic!("expected group by") };
        assert_eq!(g.key_name, "Age");
        assert_eq!(g.estimated_distinct_groups, 45);
    }
}
