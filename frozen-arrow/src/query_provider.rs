//! C17: the query provider/executor — the entry points a host surface calls
//! for each request, wiring together the plan cache (C13), physical planner
//! (C14), predicate compiler (C15) and adaptive feedback loop (C16) around
//! the vectorized executors (C4-C8), exactly as spec.md §4.17 lists the
//! seven dispatch steps.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

use ahash::AHasher;
use arrow::record_batch::RecordBatch;
use log::trace;

use frozen_arrow_common::error::{FrozenArrowError, Result};
use frozen_arrow_common::schema::{ColumnView, DataType, FrozenBatch, Schema};
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_common::{ExecutionConfig, ScalarValue};
use frozen_arrow_expr::{Aggregate, AggregateFn, ColumnPredicate, Filter, GroupBy, LogicalPlan, SortKey};
use frozen_arrow_physical::{
    any_matches, collect_sparse, evaluate_filter, first_matching_row, fused_aggregate, parallel_aggregate,
    parallel_filter, plan_filter, Accumulator, AggregateKind, CompiledPredicateCache, PlannerConfig, Strategy,
    SPARSE_SELECTIVITY_THRESHOLD,
};

use crate::adaptive::{log_recommendations, AdaptiveStatsTracker};
use crate::plan_builder::QueryBuilder;
use crate::plan_cache::{PlanCache, PlanCacheStats};

/// A materialized query result: a schema plus zero or more rows of typed
/// scalars. Covers plain row projections, single-row aggregate results, and
/// group-by results uniformly, matching spec.md §6's "iterator of row views
/// providing typed column access by output name" for every shape.
#[derive(Debug, Clone)]
pub struct RowSet {
    pub schema: Schema,
    pub rows: Vec<Vec<ScalarValue>>,
}

impl RowSet {
    /// `execute_sql_scalar`'s backing accessor: succeeds only for a single
    /// row, single column result (a bare aggregate with one function).
    pub fn into_scalar(self) -> Result<ScalarValue> {
        if self.rows.len() != 1 || self.rows[0].len() != 1 {
            return Err(FrozenArrowError::unsupported(
                "query did not produce a single scalar value",
            ));
        }
        Ok(self.rows.into_iter().next().unwrap().into_iter().next().unwrap())
    }
}

/// Maps a materialized row to a caller's own type by column name — the
/// Rust analogue of `execute_sql_as<R>` (spec.md §6). There is no
/// reflection here, so implement this by hand per result shape, the same
/// way `tokio_postgres::Row`'s `FromRow` convention works.
pub trait FromRow: Sized {
    fn from_row(schema: &Schema, row: &[ScalarValue]) -> Result<Self>;
}

/// Owns one frozen batch and every piece of shared, process-wide state
/// spec.md §5 calls for: the zone map, the plan cache, the compiled-
/// predicate cache and the adaptive stats tracker. Constructed once per
/// batch; every query runs against the same `&self`.
pub struct FrozenArrow {
    batch: Arc<FrozenBatch>,
    zone_map: ZoneMap,
    plan_cache: PlanCache,
    compiled_cache: CompiledPredicateCache,
    adaptive: AdaptiveStatsTracker,
    config: ExecutionConfig,
}

impl FrozenArrow {
    pub fn new(batch: RecordBatch) -> Self {
        Self::with_config(batch, ExecutionConfig::default())
    }

    pub fn with_config(batch: RecordBatch, config: ExecutionConfig) -> Self {
        let batch = Arc::new(FrozenBatch::new(batch));
        let zone_map = ZoneMap::build(&batch, config.chunk_rows.max(1) as usize);
        FrozenArrow {
            batch,
            zone_map,
            plan_cache: PlanCache::new(config.plan_cache_capacity.max(1) as usize),
            compiled_cache: CompiledPredicateCache::new(),
            adaptive: AdaptiveStatsTracker::new(),
            config,
        }
    }

    pub fn schema(&self) -> &Schema {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn plan_cache_stats(&self) -> PlanCacheStats {
        self.plan_cache.stats()
    }

    /// The compiled-predicate cache a caller can inspect post-hoc to
    /// confirm C15 is warm, e.g. in the concurrency stress test.
    pub fn compiled_cache_len(&self) -> usize {
        self.compiled_cache.len()
    }

    /// Starts a fluent query against this batch's schema (C11).
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::scan(self.batch.schema().clone(), self.batch.num_rows() as i64)
    }

    /// Executes a plan built via [`QueryBuilder`] or produced by
    /// [`frozen_arrow_sql::parse_sql`]: cache lookup/optimize (C13/C10),
    /// then dispatch (C17 step 6).
    pub fn execute(&self, raw_plan: Arc<LogicalPlan>) -> Result<RowSet> {
        let optimized = self.optimize_cached(raw_plan)?;
        self.dispatch(&optimized)
    }

    pub fn execute_sql(&self, sql: &str) -> Result<RowSet> {
        let raw = frozen_arrow_sql::parse_sql(self.batch.schema(), self.batch.num_rows() as i64, sql)?;
        self.execute(Arc::new(raw))
    }

    pub fn execute_sql_scalar(&self, sql: &str) -> Result<ScalarValue> {
        self.execute_sql(sql)?.into_scalar()
    }

    pub fn execute_sql_as<R: FromRow>(&self, sql: &str) -> Result<Vec<R>> {
        let result = self.execute_sql(sql)?;
        result.rows.iter().map(|row| R::from_row(&result.schema, row)).collect()
    }

    /// `Any()`: dispatches straight to the streaming executor (C8), never
    /// building a selection bitmap, per spec.md §4.17 point 6.
    pub fn any(&self, predicates: &[ColumnPredicate]) -> bool {
        any_matches(&self.batch, predicates, &self.zone_map)
    }

    /// `First()`/`FirstOrDefault()`: the smallest matching row index,
    /// materialized against `schema`.
    pub fn first(&self, predicates: &[ColumnPredicate], schema: &Schema) -> Option<Vec<ScalarValue>> {
        first_matching_row(&self.batch, predicates, &self.zone_map).map(|row| materialize_row(&self.batch, schema, row))
    }

    fn optimize_cached(&self, raw_plan: Arc<LogicalPlan>) -> Result<Arc<LogicalPlan>> {
        if self.config.use_logical_plan_cache {
            let key = raw_plan.description();
            self.plan_cache.get_or_optimize(&key, &self.zone_map, || raw_plan.clone())
        } else {
            frozen_arrow_optimizer::optimize(&raw_plan, &self.zone_map)
        }
    }

    fn query_hash(plan: &LogicalPlan) -> u64 {
        let mut hasher = AHasher::default();
        plan.description().hash(&mut hasher);
        hasher.finish()
    }

    /// C17 step 4: adaptive override when enabled and learned, else the
    /// physical planner's static heuristic (C14).
    fn resolve_strategy(&self, query_hash: u64, rows: i64, npredicates: usize) -> Strategy {
        if self.config.use_adaptive_execution {
            if let Some(learned) = self.adaptive.suggest(query_hash) {
                trace!("query {query_hash:x}: adaptive override -> {learned}");
                return learned;
            }
        }
        let planner_config = PlannerConfig::from(&self.config);
        let decision = plan_filter(rows, npredicates, true, &planner_config);
        trace!("query {query_hash:x}: planner chose {} (cost {})", decision.strategy, decision.estimated_cost);
        decision.strategy
    }

    fn record_adaptive(&self, query_hash: u64, strategy: Strategy, start: Instant, rows: i64, selectivity_actual: f64) {
        if !self.config.use_adaptive_execution {
            return;
        }
        let wall_ns = start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
        self.adaptive.record(query_hash, strategy, wall_ns, rows, selectivity_actual);
        log_recommendations(&self.adaptive.recommendations(query_hash));
    }

    /// If `use_compiled_queries` is enabled, warms C15's cache for
    /// `predicates` so a caller executing the same query repeatedly amortizes
    /// compilation; the compiled function itself is consulted only by the
    /// row-at-a-time streaming/sparse paths, which already call it directly.
    fn warm_compiled_cache(&self, predicates: &[ColumnPredicate]) {
        if self.config.use_compiled_queries {
            self.compiled_cache.get_or_compile(predicates);
        }
    }

    fn dispatch(&self, plan: &LogicalPlan) -> Result<RowSet> {
        match plan {
            LogicalPlan::Scan(s) => Ok(self.materialize_all(&s.schema)),
            LogicalPlan::Filter(f) => self.execute_filter(f, Self::query_hash(plan)),
            LogicalPlan::Aggregate(a) => self.execute_aggregate(a, Self::query_hash(plan)),
            LogicalPlan::GroupBy(g) => self.execute_group_by(g, Self::query_hash(plan)),
            LogicalPlan::Project(p) => {
                let input = self.dispatch(p.input.as_ref())?;
                let rows = input
                    .rows
                    .iter()
                    .map(|row| p.projections.iter().map(|proj| row[proj.source_column].clone()).collect())
                    .collect();
                Ok(RowSet { schema: p.schema.clone(), rows })
            }
            LogicalPlan::Limit(l) => {
                let mut result = self.dispatch(l.input.as_ref())?;
                result.rows.truncate(l.count.max(0) as usize);
                Ok(result)
            }
            LogicalPlan::Offset(o) => {
                let mut result = self.dispatch(o.input.as_ref())?;
                let skip = (o.count.max(0) as usize).min(result.rows.len());
                result.rows.drain(0..skip);
                Ok(result)
            }
            LogicalPlan::Distinct(d) => {
                let mut result = self.dispatch(d.input.as_ref())?;
                dedup_rows(&mut result.rows);
                Ok(result)
            }
            LogicalPlan::Sort(s) => {
                let mut result = self.dispatch(s.input.as_ref())?;
                sort_rows(&mut result.rows, &s.keys);
                Ok(result)
            }
        }
    }

    /// `Aggregate`/`GroupBy`'s input must resolve directly to a `Scan` or a
    /// `Filter` atop one: the predicates both apply against the raw batch,
    /// not a derived projection (a documented scoping choice, see
    /// DESIGN.md).
    fn predicates_of(plan: &LogicalPlan) -> Result<Vec<ColumnPredicate>> {
        match plan {
            LogicalPlan::Scan(_) => Ok(Vec::new()),
            LogicalPlan::Filter(f) => Ok(f.predicates.clone()),
            _ => Err(FrozenArrowError::unsupported(
                "aggregate/group-by input must be a scan or a filter over a scan",
            )),
        }
    }

    fn execute_filter(&self, f: &Filter, query_hash: u64) -> Result<RowSet> {
        self.warm_compiled_cache(&f.predicates);
        let rows = self.batch.num_rows() as i64;
        let strategy = self.resolve_strategy(query_hash, rows, f.predicates.len().max(1));
        let start = Instant::now();

        let indices = if f.selectivity < SPARSE_SELECTIVITY_THRESHOLD {
            collect_sparse(&self.batch, &f.predicates, &self.zone_map)?
        } else {
            let selection = match strategy {
                Strategy::Parallel => parallel_filter(&self.batch, &f.predicates, &self.zone_map, None)?,
                _ => evaluate_filter(&self.batch, &f.predicates, &self.zone_map)?,
            };
            selection.iter_selected_indices().collect()
        };

        let actual_selectivity = indices.len() as f64 / (rows.max(1) as f64);
        self.record_adaptive(query_hash, strategy, start, rows, actual_selectivity);
        Ok(self.materialize_rows(&f.schema, &indices))
    }

    fn execute_aggregate(&self, a: &Aggregate, query_hash: u64) -> Result<RowSet> {
        let predicates = Self::predicates_of(a.input.as_ref())?;
        self.warm_compiled_cache(&predicates);
        let rows = self.batch.num_rows() as i64;
        let strategy = self.resolve_strategy(query_hash, rows, predicates.len().max(1));
        let start = Instant::now();

        let source_schema = a.input.output_schema();
        let values = self.compute_aggregates(&predicates, strategy, &a.aggregates, source_schema)?;

        self.record_adaptive(query_hash, strategy, start, rows, 1.0);
        Ok(RowSet { schema: a.schema.clone(), rows: vec![values] })
    }

    fn compute_aggregates(
        &self,
        predicates: &[ColumnPredicate],
        strategy: Strategy,
        aggregates: &[AggregateFn],
        source_schema: &Schema,
    ) -> Result<Vec<ScalarValue>> {
        let mut by_column: HashMap<Option<usize>, Accumulator> = HashMap::new();
        for agg in aggregates {
            let (_, column) = kind_and_column(agg);
            if by_column.contains_key(&column) {
                continue;
            }
            let acc = match strategy {
                Strategy::Parallel => parallel_aggregate(&self.batch, predicates, &self.zone_map, column, None)?,
                _ => fused_aggregate(&self.batch, predicates, &self.zone_map, column)?,
            };
            by_column.insert(column, acc);
        }

        aggregates
            .iter()
            .map(|agg| {
                let (kind, column) = kind_and_column(agg);
                let acc = by_column.get(&column).expect("computed above");
                finish_aggregate(acc, kind, column, source_schema)
            })
            .collect()
    }

    fn execute_group_by(&self, g: &GroupBy, query_hash: u64) -> Result<RowSet> {
        let predicates = Self::predicates_of(g.input.as_ref())?;
        self.warm_compiled_cache(&predicates);
        let rows = self.batch.num_rows() as i64;
        let strategy = self.resolve_strategy(query_hash, rows, predicates.len().max(1));
        let start = Instant::now();

        // The array-indexed/hash split (C14) only changes which aggregator
        // backs each group once cardinality is known; both run the same
        // row loop here (see DESIGN.md).
        let selection = match strategy {
            Strategy::Parallel => parallel_filter(&self.batch, &predicates, &self.zone_map, None)?,
            _ => evaluate_filter(&self.batch, &predicates, &self.zone_map)?,
        };

        let source_schema = g.input.output_schema();
        let key_col = self.batch.column(g.key_column);
        let mut groups: HashMap<String, (ScalarValue, Vec<Accumulator>)> = HashMap::new();

        for row in selection.iter_selected_indices() {
            let key_scalar = read_scalar(&key_col, row);
            let key = key_scalar.to_string();
            let entry = groups
                .entry(key)
                .or_insert_with(|| (key_scalar.clone(), vec![Accumulator::default(); g.aggregates.len()]));
            for (slot, agg) in g.aggregates.iter().enumerate() {
                match agg {
                    AggregateFn::Count => entry.1[slot].count += 1,
                    AggregateFn::Sum(c) | AggregateFn::Avg(c) | AggregateFn::Min(c) | AggregateFn::Max(c) => {
                        let column = self.batch.column(*c);
                        if let Some(v) = numeric_scalar(&column, row) {
                            entry.1[slot].fold_value(v);
                        }
                    }
                }
            }
        }

        let mut rows_out = Vec::with_capacity(groups.len());
        for (_, (key_scalar, accs)) in groups {
            let mut row = Vec::with_capacity(1 + accs.len());
            row.push(key_scalar);
            for (acc, agg) in accs.iter().zip(g.aggregates.iter()) {
                let (kind, column) = kind_and_column(agg);
                row.push(finish_aggregate(acc, kind, column, source_schema)?);
            }
            rows_out.push(row);
        }

        let actual_selectivity = selection.count_set() as f64 / (rows.max(1) as f64);
        self.record_adaptive(query_hash, strategy, start, rows, actual_selectivity);
        Ok(RowSet { schema: g.schema.clone(), rows: rows_out })
    }

    fn materialize_all(&self, schema: &Schema) -> RowSet {
        let indices: Vec<usize> = (0..self.batch.num_rows()).collect();
        self.materialize_rows(schema, &indices)
    }

    fn materialize_rows(&self, schema: &Schema, indices: &[usize]) -> RowSet {
        let rows = indices
            .iter()
            .map(|&row| materialize_row(&self.batch, schema, row))
            .collect();
        RowSet { schema: schema.clone(), rows }
    }
}

fn materialize_row(batch: &FrozenBatch, schema: &Schema, row: usize) -> Vec<ScalarValue> {
    schema
        .fields()
        .iter()
        .map(|field| read_scalar(&batch.column(field.index), row))
        .collect()
}

fn kind_and_column(agg: &AggregateFn) -> (AggregateKind, Option<usize>) {
    match agg {
        AggregateFn::Count => (AggregateKind::Count, None),
        AggregateFn::Sum(c) => (AggregateKind::Sum, Some(*c)),
        AggregateFn::Avg(c) => (AggregateKind::Avg, Some(*c)),
        AggregateFn::Min(c) => (AggregateKind::Min, Some(*c)),
        AggregateFn::Max(c) => (AggregateKind::Max, Some(*c)),
    }
}

fn finish_aggregate(acc: &Accumulator, kind: AggregateKind, column: Option<usize>, source_schema: &Schema) -> Result<ScalarValue> {
    let is_integer = column
        .map(|c| matches!(source_schema.data_type(c), Some(DataType::Int32) | Some(DataType::Int64)))
        .unwrap_or(true);
    let name = column
        .and_then(|c| source_schema.field(c))
        .map(|f| f.name.clone())
        .unwrap_or_else(|| "*".to_string());
    acc.finish(kind, is_integer, &name)
}

fn read_scalar(col: &ColumnView<'_>, row: usize) -> ScalarValue {
    if !col.is_valid(row) {
        return ScalarValue::Null;
    }
    match col {
        ColumnView::Int32(a) => ScalarValue::Int32(a.value(row)),
        ColumnView::Int64(a) => ScalarValue::Int64(a.value(row)),
        ColumnView::Float64(a) => ScalarValue::Float64(a.value(row)),
        ColumnView::Decimal128(a) => ScalarValue::Int64(a.value(row) as i64),
        ColumnView::Bool(a) => ScalarValue::Bool(a.value(row)),
        ColumnView::Utf8(a) => ScalarValue::Utf8(a.value(row).to_string()),
        ColumnView::Utf8Dict(dict, values) => {
            let key = dict.keys().value(row);
            ScalarValue::Utf8(values.value(key as usize).to_string())
        }
        ColumnView::Timestamp(a) => ScalarValue::Int64(a.value(row)),
        ColumnView::Other(_) => ScalarValue::Null,
    }
}

fn numeric_scalar(col: &ColumnView<'_>, row: usize) -> Option<f64> {
    if !col.is_valid(row) {
        return None;
    }
    match col {
        ColumnView::Int32(a) => Some(a.value(row) as f64),
        ColumnView::Int64(a) => Some(a.value(row) as f64),
        ColumnView::Float64(a) => Some(a.value(row)),
        ColumnView::Decimal128(a) => Some(a.value(row) as f64),
        ColumnView::Timestamp(a) => Some(a.value(row) as f64),
        _ => None,
    }
}

fn dedup_rows(rows: &mut Vec<Vec<ScalarValue>>) {
    let mut seen = HashSet::new();
    rows.retain(|row| {
        let key = row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("\u{1}");
        seen.insert(key)
    });
}

fn sort_rows(rows: &mut [Vec<ScalarValue>], keys: &[SortKey]) {
    rows.sort_by(|a, b| {
        for key in keys {
            let ordering = compare_scalar(&a[key.column], &b[key.column]);
            let ordering = if key.ascending { ordering } else { ordering.reverse() };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

fn compare_scalar(a: &ScalarValue, b: &ScalarValue) -> std::cmp::Ordering {
    if let Some(ordering) = a.partial_cmp_numeric(b) {
        return ordering;
    }
    match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) => x.cmp(y),
        _ => std::cmp::Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use frozen_arrow_expr::CmpOp;

    fn seed_dataset() -> RecordBatch {
        let n = 1000;
        let ids: Vec<i32> = (0..n).collect();
        let ages: Vec<i32> = (0..n).map(|i| 20 + i % 45).collect();
        let active: Vec<bool> = (0..n).map(|i| i % 2 == 0).collect();
        let scores: Vec<f64> = (0..n).map(|i| (i as f64 * 1.5) % 100.0).collect();
        let cats: Vec<&str> = (0..n)
            .map(|i| match i % 3 {
                0 => "A",
                1 => "B",
                _ => "C",
            })
            .collect();

        let schema = Arc::new(ArrowSchema::new(vec![
            ArrowField::new("Id", ArrowDataType::Int32, false),
            ArrowField::new("Age", ArrowDataType::Int32, false),
            ArrowField::new("Active", ArrowDataType::Boolean, false),
            ArrowField::new("Score", ArrowDataType::Float64, false),
            ArrowField::new("Cat", ArrowDataType::Utf8, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(ids)),
                Arc::new(Int32Array::from(ages)),
                Arc::new(BooleanArray::from(active)),
                Arc::new(Float64Array::from(scores)),
                Arc::new(StringArray::from(cats)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn count_with_age_filter_matches_seed_scenario() {
        let engine = FrozenArrow::new(seed_dataset());
        let pred = ColumnPredicate::i32_cmp(engine.schema(), "Age", CmpOp::Gt, 55).unwrap();
        let plan = engine.query().filter(pred).unwrap().aggregate(vec![AggregateFn::Count]).build();
        let result = engine.execute(plan).unwrap();
        assert_eq!(result.into_scalar().unwrap(), ScalarValue::Int64(198));
    }

    #[test]
    fn any_matches_first_cat_a_row() {
        let engine = FrozenArrow::new(seed_dataset());
        let pred = ColumnPredicate::str_cmp(engine.schema(), "Cat", CmpOp::Eq, "A").unwrap();
        assert!(engine.any(&[pred]));
    }

    #[test]
    fn group_by_cat_reports_seed_scenario_counts() {
        let engine = FrozenArrow::new(seed_dataset());
        let plan = engine
            .query()
            .group_by(4, "Cat", vec![AggregateFn::Count, AggregateFn::Sum(3)], 3)
            .build();
        let result = engine.execute(plan).unwrap();
        assert_eq!(result.rows.len(), 3);
        let counts: HashMap<String, i64> = result
            .rows
            .iter()
            .map(|row| (row[0].as_str().unwrap().to_string(), row[1].as_i64().unwrap()))
            .collect();
        assert_eq!(counts.get("A"), Some(&334));
        assert_eq!(counts.get("B"), Some(&333));
        assert_eq!(counts.get("C"), Some(&333));
    }

    #[test]
    fn sql_group_by_matches_builder_group_by() {
        let engine = FrozenArrow::new(seed_dataset());
        let sql_result = engine
            .execute_sql("SELECT Cat, COUNT(*) FROM t WHERE Age > 40 GROUP BY Cat")
            .unwrap();

        let pred = ColumnPredicate::i32_cmp(engine.schema(), "Age", CmpOp::Gt, 40).unwrap();
        let builder_plan = engine
            .query()
            .filter(pred)
            .unwrap()
            .group_by(4, "Cat", vec![AggregateFn::Count], 3)
            .build();
        let builder_result = engine.execute(builder_plan).unwrap();

        let as_counts = |rs: &RowSet| -> HashMap<String, i64> {
            rs.rows
                .iter()
                .map(|row| (row[0].as_str().unwrap().to_string(), row[1].as_i64().unwrap()))
                .collect()
        };
        assert_eq!(as_counts(&sql_result), as_counts(&builder_result));
    }

    #[test]
    fn like_without_wildcards_text_matches_all_rows() {
        let engine = FrozenArrow::new(seed_dataset());
        let all = engine.execute_sql("SELECT * FROM t WHERE Cat LIKE '%'").unwrap();
        assert_eq!(all.rows.len(), 1000);

        let a_only = engine.execute_sql("SELECT * FROM t WHERE Cat LIKE 'A%'").unwrap();
        assert_eq!(a_only.rows.len(), 334);
    }

    #[test]
    fn plan_cache_reports_hits_on_repeated_query() {
        let engine = FrozenArrow::new(seed_dataset());
        for _ in 0..3 {
            engine.execute_sql("SELECT COUNT(*) FROM t WHERE Age > 55").unwrap();
        }
        let stats = engine.plan_cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }
}
