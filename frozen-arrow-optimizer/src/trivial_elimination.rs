//! Rule 3 (spec.md §4.10): `Offset(0)`, `Limit(very_large)` and
//! `Filter(no predicates)` collapse to their child — they cost a pass over
//! the data for no effect.

use std::sync::Arc;

use frozen_arrow_common::error::Result;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::LogicalPlan;

use crate::rule::OptimizerRule;

/// Limits at or above this are treated as "no limit" for elimination
/// purposes; nothing in this engine ever materializes more rows than exist.
const VERY_LARGE_LIMIT: i64 = i64::MAX / 2;

#[derive(Default)]
pub struct TrivialElimination;

impl OptimizerRule for TrivialElimination {
    fn try_optimize(&self, plan: &Arc<LogicalPlan>, _zone_map: &ZoneMap) -> Result<Option<Arc<LogicalPlan>>> {
        let collapsed = match plan.as_ref() {
            LogicalPlan::Offset(o) if o.count == 0 => Some(o.input.clone()),
            LogicalPlan::Limit(l) if l.count >= VERY_LARGE_LIMIT => Some(l.input.clone()),
            LogicalPlan::Filter(f) if f.predicates.is_empty() => Some(f.input.clone()),
            _ => None,
        };
        if let Some(ref child) = collapsed {
            log::debug!("trivial_elimination: collapsed {} into child", plan.description());
            let _ = child;
        }
        Ok(collapsed)
    }

    fn name(&self) -> &str {
        "trivial_elimination"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use frozen_arrow_common::schema::{DataType, Field, Schema};

    fn schema() -> Schema {
        Schema::from_fields(vec![Field {
            name: "a".into(),
            index: 0,
            data_type: DataType::Int32,
            nullable: false,
        }])
    }

    fn empty_zone_map() -> ZoneMap {
        use arrow::array::Int32Array;
        use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
        use arrow::record_batch::RecordBatch;
        use frozen_arrow_common::schema::FrozenBatch;
        use std::sync::Arc as StdArc;

        let arrow_schema = StdArc::new(ArrowSchema::new(vec![ArrowField::new("a", ArrowDataType::Int32, false)]));
        let array = StdArc::new(Int32Array::from(vec![1, 2, 3]));
        let batch = FrozenBatch::new(RecordBatch::try_new(arrow_schema, vec![array]).unwrap());
        ZoneMap::build(&batch, 16_384)
    }

    #[test]
    fn offset_zero_collapses() {
        let scan = Arc::new(LogicalPlan::scan(schema(), 100));
        let offset = Arc::new(LogicalPlan::offset(scan.clone(), 0).unwrap());
        let rule = TrivialElimination;
        let result = rule.try_optimize(&offset, &empty_zone_map()).unwrap();
        assert!(Arc::ptr_eq(&result.unwrap(), &scan));
    }

    #[test]
    fn huge_limit_collapses() {
        let scan = Arc::new(LogicalPlan::scan(schema(), 100));
        let limit = Arc::new(LogicalPlan::limit(scan.clone(), i64::MAX).unwrap());
        let rule = TrivialElimination;
        let result = rule.try_optimize(&limit, &empty_zone_map()).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn empty_filter_collapses() {
        let scan = Arc::new(LogicalPlan::scan(schema(), 100));
        let filter = Arc::new(LogicalPlan::filter(scan.clone(), vec![], 1.0).unwrap());
        let rule = TrivialElimination;
        let result = rule.try_optimize(&filter, &empty_zone_map()).unwrap();
        assert!(Arc::ptr_eq(&result.unwrap(), &scan));
    }

    #[test]
    fn small_offset_is_untouched() {
        let scan = Arc::new(LogicalPlan::scan(schema(), 100));
        let offset = Arc::new(LogicalPlan::offset(scan, 5).unwrap());
        let rule = TrivialElimination;
        assert!(rule.try_optimize(&offset, &empty_zone_map()).unwrap().is_none());
    }
}
