//! Immutable logical plan tree (spec.md §4.9).
//!
//! Nine node kinds, each owning its child by `Arc` so a plan tree can be
//! cheaply shared across threads once built (the plan cache hands out the
//! same optimized tree to every caller). Constructors validate the node's
//! invariants at build time; nothing about a node mutates afterward.

use std::sync::Arc;

use frozen_arrow_common::error::{FrozenArrowError, Result};
use frozen_arrow_common::schema::{DataType, Schema};

use crate::predicate::ColumnPredicate;

/// One aggregate function bound to a column (`Count` needs none).
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateFn {
    Count,
    Sum(usize),
    Avg(usize),
    Min(usize),
    Max(usize),
}

impl AggregateFn {
    pub fn output_name(&self, schema: &Schema) -> String {
        match self {
            AggregateFn::Count => "count".to_string(),
            AggregateFn::Sum(c) => format!("sum_{}", schema.field(*c).map(|f| f.name.as_str()).unwrap_or("?")),
            AggregateFn::Avg(c) => format!("avg_{}", schema.field(*c).map(|f| f.name.as_str()).unwrap_or("?")),
            AggregateFn::Min(c) => format!("min_{}", schema.field(*c).map(|f| f.name.as_str()).unwrap_or("?")),
            AggregateFn::Max(c) => format!("max_{}", schema.field(*c).map(|f| f.name.as_str()).unwrap_or("?")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scan {
    pub schema: Schema,
    pub estimated_row_count: i64,
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub input: Arc<LogicalPlan>,
    pub predicates: Vec<ColumnPredicate>,
    pub schema: Schema,
    /// Combined estimated selectivity across `predicates`, in `[0, 1]`.
    pub selectivity: f64,
}

#[derive(Debug, Clone)]
pub struct ProjectionField {
    pub source_column: usize,
    pub output_name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub input: Arc<LogicalPlan>,
    pub projections: Vec<ProjectionField>,
    pub schema: Schema,
}

#[derive(Debug, Clone)]
pub struct Aggregate {
    pub input: Arc<LogicalPlan>,
    pub aggregates: Vec<AggregateFn>,
    pub schema: Schema,
}

#[derive(Debug, Clone)]
pub struct GroupBy {
    pub input: Arc<LogicalPlan>,
    pub key_column: usize,
    pub key_name: String,
    pub aggregates: Vec<AggregateFn>,
    pub schema: Schema,
    pub estimated_distinct_groups: i64,
}

#[derive(Debug, Clone)]
pub struct Limit {
    pub input: Arc<LogicalPlan>,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct Offset {
    pub input: Arc<LogicalPlan>,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct Distinct {
    pub input: Arc<LogicalPlan>,
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub column: usize,
    pub ascending: bool,
}

#[derive(Debug, Clone)]
pub struct Sort {
    pub input: Arc<LogicalPlan>,
    pub keys: Vec<SortKey>,
}

/// The nine logical-plan node kinds (spec.md §4.9).
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    Scan(Scan),
    Filter(Filter),
    Project(Project),
    Aggregate(Aggregate),
    GroupBy(GroupBy),
    Limit(Limit),
    Offset(Offset),
    Distinct(Distinct),
    Sort(Sort),
}

impl LogicalPlan {
    pub fn scan(schema: Schema, estimated_row_count: i64) -> Self {
        LogicalPlan::Scan(Scan {
            schema,
            estimated_row_count,
        })
    }

    pub fn filter(input: Arc<LogicalPlan>, predicates: Vec<ColumnPredicate>, selectivity: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&selectivity) {
            return Err(FrozenArrowError::BoundsError(format!(
                "filter selectivity {selectivity} out of [0, 1]"
            )));
        }
        let schema = input.output_schema().clone();
        Ok(LogicalPlan::Filter(Filter {
            input,
            predicates,
            schema,
            selectivity,
        }))
    }

    pub fn project(input: Arc<LogicalPlan>, projections: Vec<ProjectionField>) -> Self {
        let fields = projections
            .iter()
            .enumerate()
            .map(|(i, p)| frozen_arrow_common::schema::Field {
                name: p.output_name.clone(),
                index: i,
                data_type: p.data_type,
                nullable: true,
            })
            .collect();
        LogicalPlan::Project(Project {
            input,
            projections,
            schema: Schema::from_fields(fields),
        })
    }

    pub fn aggregate(input: Arc<LogicalPlan>, aggregates: Vec<AggregateFn>) -> Self {
        let source_schema = input.output_schema().clone();
        let fields = aggregates
            .iter()
            .enumerate()
            .map(|(i, a)| frozen_arrow_common::schema::Field {
                name: a.output_name(&source_schema),
                index: i,
                data_type: DataType::Float64,
                nullable: false,
            })
            .collect();
        LogicalPlan::Aggregate(Aggregate {
            input,
            aggregates,
            schema: Schema::from_fields(fields),
        })
    }

    pub fn group_by(
        input: Arc<LogicalPlan>,
        key_column: usize,
        key_name: String,
        aggregates: Vec<AggregateFn>,
        estimated_distinct_groups: i64,
    ) -> Self {
        let source_schema = input.output_schema().clone();
        let mut fields = vec![frozen_arrow_common::schema::Field {
            name: key_name.clone(),
            index: 0,
            data_type: DataType::Utf8,
            nullable: false,
        }];
        for (i, a) in aggregates.iter().enumerate() {
            fields.push(frozen_arrow_common::schema::Field {
                name: a.output_name(&source_schema),
                index: i + 1,
                data_type: DataType::Float64,
                nullable: false,
            });
        }
        LogicalPlan::GroupBy(GroupBy {
            input,
            key_column,
            key_name,
            aggregates,
            schema: Schema::from_fields(fields),
            estimated_distinct_groups,
        })
    }

    pub fn limit(input: Arc<LogicalPlan>, count: i64) -> Result<Self> {
        if count < 0 {
            return Err(FrozenArrowError::BoundsError(format!("Limit.count {count} must be >= 0")));
        }
        Ok(LogicalPlan::Limit(Limit { input, count }))
    }

    pub fn offset(input: Arc<LogicalPlan>, count: i64) -> Result<Self> {
        if count < 0 {
            return Err(FrozenArrowError::BoundsError(format!("Offset.count {count} must be >= 0")));
        }
        Ok(LogicalPlan::Offset(Offset { input, count }))
    }

    pub fn distinct(input: Arc<LogicalPlan>) -> Self {
        LogicalPlan::Distinct(Distinct { input })
    }

    pub fn sort(input: Arc<LogicalPlan>, keys: Vec<SortKey>) -> Self {
        LogicalPlan::Sort(Sort { input, keys })
    }

    pub fn input(&self) -> Option<&Arc<LogicalPlan>> {
        match self {
            LogicalPlan::Scan(_) => None,
            LogicalPlan::Filter(n) => Some(&n.input),
            LogicalPlan::Project(n) => Some(&n.input),
            LogicalPlan::Aggregate(n) => Some(&n.input),
            LogicalPlan::GroupBy(n) => Some(&n.input),
            LogicalPlan::Limit(n) => Some(&n.input),
            LogicalPlan::Offset(n) => Some(&n.input),
            LogicalPlan::Distinct(n) => Some(&n.input),
            LogicalPlan::Sort(n) => Some(&n.input),
        }
    }

    pub fn output_schema(&self) -> &Schema {
        match self {
            LogicalPlan::Scan(n) => &n.schema,
            LogicalPlan::Filter(n) => &n.schema,
            LogicalPlan::Project(n) => &n.schema,
            LogicalPlan::Aggregate(n) => &n.schema,
            LogicalPlan::GroupBy(n) => &n.schema,
            LogicalPlan::Limit(n) => n.input.output_schema(),
            LogicalPlan::Offset(n) => n.input.output_schema(),
            LogicalPlan::Distinct(n) => n.input.output_schema(),
            LogicalPlan::Sort(n) => n.input.output_schema(),
        }
    }

    pub fn estimated_row_count(&self) -> i64 {
        match self {
            LogicalPlan::Scan(n) => n.estimated_row_count,
            LogicalPlan::Filter(n) => {
                ((n.input.estimated_row_count() as f64) * n.selectivity).ceil() as i64
            }
            LogicalPlan::Project(n) => n.input.estimated_row_count(),
            LogicalPlan::Aggregate(_) => 1,
            LogicalPlan::GroupBy(n) => n.estimated_distinct_groups,
            LogicalPlan::Limit(n) => n.count.min(n.input.estimated_row_count()),
            LogicalPlan::Offset(n) => (n.input.estimated_row_count() - n.count).max(0),
            LogicalPlan::Distinct(n) => n.input.estimated_row_count(),
            LogicalPlan::Sort(n) => n.input.estimated_row_count(),
        }
    }

    /// A stable, canonical string used both for `EXPLAIN`-style output and
    /// as the plan cache key (spec.md §4.13): includes literal values, so
    /// `age > 30` and `age > 40` produce distinct descriptions.
    pub fn description(&self) -> String {
        match self {
            LogicalPlan::Scan(n) => format!("Scan: rows={}", n.estimated_row_count),
            LogicalPlan::Filter(n) => format!(
                "Filter: [{}] <- {}",
                n.predicates
                    .iter()
                    .map(describe_predicate)
                    .collect::<Vec<_>>()
                    .join(" AND "),
                n.input.description()
            ),
            LogicalPlan::Project(n) => format!(
                "Project: [{}] <- {}",
                n.projections
                    .iter()
                    .map(|p| format!("{}:{}", p.source_column, p.output_name))
                    .collect::<Vec<_>>()
                    .join(", "),
                n.input.description()
            ),
            LogicalPlan::Aggregate(n) => format!(
                "Aggregate: [{}] <- {}",
                n.aggregates.iter().map(describe_agg).collect::<Vec<_>>().join(", "),
                n.input.description()
            ),
            LogicalPlan::GroupBy(n) => format!(
                "GroupBy: key={} [{}] <- {}",
                n.key_name,
                n.aggregates.iter().map(describe_agg).collect::<Vec<_>>().join(", "),
                n.input.description()
            ),
            LogicalPlan::Limit(n) => format!("Limit: {} <- {}", n.count, n.input.description()),
            LogicalPlan::Offset(n) => format!("Offset: {} <- {}", n.count, n.input.description()),
            LogicalPlan::Distinct(n) => format!("Distinct <- {}", n.input.description()),
            LogicalPlan::Sort(n) => format!(
                "Sort: [{}] <- {}",
                n.keys
                    .iter()
                    .map(|k| format!("{}{}", k.column, if k.ascending { "" } else { " DESC" }))
                    .collect::<Vec<_>>()
                    .join(", "),
                n.input.description()
            ),
        }
    }

    /// Rebuilds this node with a new child, keeping every other field. Used
    /// by the optimizer to thread bottom-up rewrites back up the tree
    /// without each rule needing to know every node's shape.
    pub fn with_new_input(&self, new_input: Arc<LogicalPlan>) -> Result<LogicalPlan> {
        Ok(match self {
            LogicalPlan::Scan(n) => LogicalPlan::Scan(n.clone()),
            LogicalPlan::Filter(n) => {
                LogicalPlan::filter(new_input, n.predicates.clone(), n.selectivity)?
            }
            LogicalPlan::Project(n) => LogicalPlan::project(new_input, n.projections.clone()),
            LogicalPlan::Aggregate(n) => LogicalPlan::aggregate(new_input, n.aggregates.clone()),
            LogicalPlan::GroupBy(n) => LogicalPlan::group_by(
                new_input,
                n.key_column,
                n.key_name.clone(),
                n.aggregates.clone(),
                n.estimated_distinct_groups,
            ),
            LogicalPlan::Limit(n) => LogicalPlan::limit(new_input, n.count)?,
            LogicalPlan::Offset(n) => LogicalPlan::offset(new_input, n.count)?,
            LogicalPlan::Distinct(_) => LogicalPlan::distinct(new_input),
            LogicalPlan::Sort(n) => LogicalPlan::sort(new_input, n.keys.clone()),
        })
    }

    pub fn accept<T>(&self, visitor: &mut dyn LogicalPlanVisitor<T>) -> T {
        match self {
            LogicalPlan::Scan(n) => visitor.visit_scan(n),
            LogicalPlan::Filter(n) => visitor.visit_filter(n),
            LogicalPlan::Project(n) => visitor.visit_project(n),
            LogicalPlan::Aggregate(n) => visitor.visit_aggregate(n),
            LogicalPlan::GroupBy(n) => visitor.visit_group_by(n),
            LogicalPlan::Limit(n) => visitor.visit_limit(n),
            LogicalPlan::Offset(n) => visitor.visit_offset(n),
            LogicalPlan::Distinct(n) => visitor.visit_distinct(n),
            LogicalPlan::Sort(n) => visitor.visit_sort(n),
        }
    }
}

fn describe_predicate(p: &ColumnPredicate) -> String {
    use crate::predicate::ColumnPredicate::*;
    match p {
        I32Cmp { column, op, value } => format!("col{column} {} {value}", op.as_str()),
        F64Cmp { column, op, value } => format!("col{column} {} {value}", op.as_str()),
        DecCmp { column, op, value } => format!("col{column} {} {value}", op.as_str()),
        StrCmp { column, op, value } => format!("col{column} {} '{value}'", op.as_str()),
        BoolEq { column, value } => format!("col{column} = {value}"),
        IsNull { column } => format!("col{column} IS NULL"),
        StringOp { column, kind, needle } => format!("col{column} {:?} '{needle}'", kind),
        And(list) => format!("({})", list.iter().map(describe_predicate).collect::<Vec<_>>().join(" AND ")),
        Or(a, b) => format!("({} OR {})", describe_predicate(a), describe_predicate(b)),
        Not(inner) => format!("NOT ({})", describe_predicate(inner)),
    }
}

fn describe_agg(a: &AggregateFn) -> String {
    match a {
        AggregateFn::Count => "COUNT".to_string(),
        AggregateFn::Sum(c) => format!("SUM(col{c})"),
        AggregateFn::Avg(c) => format!("AVG(col{c})"),
        AggregateFn::Min(c) => format!("MIN(col{c})"),
        AggregateFn::Max(c) => format!("MAX(col{c})"),
    }
}

/// Visitor over [`LogicalPlan`], enabling transformers (optimizer, explainer,
/// hasher, cost model) without matching on the enum at every call site.
pub trait LogicalPlanVisitor<T> {
    fn visit_scan(&mut self, node: &Scan) -> T;
    fn visit_filter(&mut self, node: &Filter) -> T;
    fn visit_project(&mut self, node: &Project) -> T;
    fn visit_aggregate(&mut self, node: &Aggregate) -> T;
    fn visit_group_by(&mut self, node: &GroupBy) -> T;
    fn visit_limit(&mut self, node: &Limit) -> T;
    fn visit_offset(&mut self, node: &Offset) -> T;
    fn visit_distinct(&mut self, node: &Distinct) -> T;
    fn visit_sort(&mut self, node: &Sort) -> T;
}

#[cfg(test)]
mod tests {
    use super::*;
    use frozen_arrow_common::schema::Field;

    fn base_schema() -> Schema {
        Schema::from_fields(vec![Field {
            name: "age".into(),
            index: 0,
            data_type: DataType::Int32,
            nullable: false,
        }])
    }

    #[test]
    fn filter_row_count_propagates_selectivity() {
        let scan = Arc::new(LogicalPlan::scan(base_schema(), 1000));
        let filter = LogicalPlan::filter(scan, vec![], 0.4).unwrap();
        assert_eq!(filter.estimated_row_count(), 400);
    }

    #[test]
    fn aggregate_produces_one_row() {
        let scan = Arc::new(LogicalPlan::scan(base_schema(), 1000));
        let agg = LogicalPlan::aggregate(scan, vec![AggregateFn::Count]);
        assert_eq!(agg.estimated_row_count(), 1);
    }

    #[test]
    fn limit_rejects_negative_count() {
        let scan = Arc::new(LogicalPlan::scan(base_schema(), 1000));
        assert!(LogicalPlan::limit(scan, -1).is_err());
    }

    #[test]
    fn filter_rejects_out_of_range_selectivity() {
        let scan = Arc::new(LogicalPlan::scan(base_schema(), 1000));
        assert!(LogicalPlan::filter(scan, vec![], 1.5).is_err());
    }

    #[test]
    fn description_includes_literal_values() {
        let schema = base_schema();
        let scan = Arc::new(LogicalPlan::scan(schema.clone(), 1000));
        let pred = ColumnPredicate::i32_cmp(&schema, "age", crate::predicate::CmpOp::Gt, 30).unwrap();
        let filter_a = LogicalPlan::filter(scan.clone(), vec![pred], 0.5).unwrap();
        let pred2 = ColumnPredicate::i32_cmp(&schema, "age", crate::predicate::CmpOp::Gt, 40).unwrap();
        let filter_b = LogicalPlan::filter(scan, vec![pred2], 0.5).unwrap();
        assert_ne!(filter_a.description(), filter_b.description());
    }
}
