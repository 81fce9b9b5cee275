//! C10 Plan Optimizer: a small, pure set of bottom-up rewrite rules
//! (spec.md §4.10). `optimize` never mutates its input; it returns a new
//! tree. No cost-based reordering across logical operators happens here —
//! that is the physical planner's job (C14, in `frozen-arrow-physical`).

pub mod predicate_hoisting;
pub mod predicate_reordering;
pub mod rule;
pub mod trivial_elimination;

use std::sync::Arc;

use frozen_arrow_common::error::Result;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::LogicalPlan;

pub use predicate_hoisting::PredicateHoisting;
pub use predicate_reordering::PredicateReordering;
pub use rule::OptimizerRule;
pub use trivial_elimination::TrivialElimination;

/// Applies the standard rule set bottom-up, once, and returns a new plan.
pub fn optimize(plan: &Arc<LogicalPlan>, zone_map: &ZoneMap) -> Result<Arc<LogicalPlan>> {
    let rules: Vec<Box<dyn OptimizerRule>> = vec![
        Box::new(TrivialElimination),
        Box::new(PredicateReordering),
        Box::new(PredicateHoisting),
    ];
    optimize_with_rules(plan, zone_map, &rules)
}

/// Same as [`optimize`] but with an explicit rule set, for tests and callers
/// that want to disable a rule.
pub fn optimize_with_rules(
    plan: &Arc<LogicalPlan>,
    zone_map: &ZoneMap,
    rules: &[Box<dyn OptimizerRule>],
) -> Result<Arc<LogicalPlan>> {
    // Rewrite children first (bottom-up), then apply every rule to the
    // rebuilt node in turn.
    let rebuilt = match plan.input() {
        Some(child) => {
            let new_child = optimize_with_rules(child, zone_map, rules)?;
            if Arc::ptr_eq(&new_child, child) {
                plan.clone()
            } else {
                Arc::new(plan.with_new_input(new_child)?)
            }
        }
        None => plan.clone(),
    };

    let mut current = rebuilt;
    for rule in rules {
        if let Some(rewritten) = rule.try_optimize(&current, zone_map)? {
            current = rewritten;
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use frozen_arrow_common::schema::{DataType, Field, FrozenBatch, Schema};
    use frozen_arrow_expr::{CmpOp, ColumnPredicate};
    use std::sync::Arc as StdArc;

    fn schema() -> Schema {
        Schema::from_fields(vec![Field {
            name: "age".into(),
            index: 0,
            data_type: DataType::Int32,
            nullable: false,
        }])
    }

    fn zone_map() -> ZoneMap {
        let arrow_schema = StdArc::new(ArrowSchema::new(vec![ArrowField::new("age", ArrowDataType::Int32, false)]));
        let array = StdArc::new(Int32Array::from((0..1000).collect::<Vec<i32>>()));
        let batch = FrozenBatch::new(RecordBatch::try_new(arrow_schema, vec![array]).unwrap());
        ZoneMap::build(&batch, 16_384)
    }

    #[test]
    fn optimize_is_idempotent() {
        let schema = schema();
        let zm = zone_map();
        let pred = ColumnPredicate::i32_cmp(&schema, "age", CmpOp::Gt, 30).unwrap();
        let scan = Arc::new(LogicalPlan::scan(schema, 1000));
        let filter = Arc::new(LogicalPlan::filter(scan, vec![pred], 0.5).unwrap());

        let once = optimize(&filter, &zm).unwrap();
        let twice = optimize(&once, &zm).unwrap();
        assert_eq!(once.description(), twice.description());
    }

    #[test]
    fn optimize_preserves_row_count_semantics() {
        let schema = schema();
        let zm = zone_map();
        let offset = Arc::new(LogicalPlan::offset(Arc::new(LogicalPlan::scan(schema, 1000)), 0).unwrap());
        let optimized = optimize(&offset, &zm).unwrap();
        assert_eq!(optimized.estimated_row_count(), 1000);
    }
}
