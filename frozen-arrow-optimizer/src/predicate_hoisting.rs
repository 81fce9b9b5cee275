//! Rule 2 (spec.md §4.10): predicate hoisting above `Limit`.
//!
//! When a `Limit` sits atop a `Filter` and `limit.count * (1 / selectivity)`
//! is much smaller than the input row count, the source system keeps the
//! existing order so the filter can stream and short-circuit once `count`
//! rows are found rather than materializing the full selection first.
//! FrozenArrow's executors (C4–C8) already decide streaming vs. bitmap
//! per query kind rather than per logical-plan shape, so this rule never
//! rewrites the tree; it only records, at debug level, which decision it
//! would have made, for parity with the source's documented behavior and to
//! leave a hook if a future physical-planner strategy wants it.
//!
//! This is the rule referenced in DESIGN.md's Open Question decisions: only
//! the direct path is implemented, so hoisting has no observable plan
//! rewrite in this workspace.

use std::sync::Arc;

use frozen_arrow_common::error::Result;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::LogicalPlan;

use crate::rule::OptimizerRule;

#[derive(Default)]
pub struct PredicateHoisting;

impl OptimizerRule for PredicateHoisting {
    fn try_optimize(&self, plan: &Arc<LogicalPlan>, _zone_map: &ZoneMap) -> Result<Option<Arc<LogicalPlan>>> {
        let LogicalPlan::Limit(limit) = plan.as_ref() else {
            return Ok(None);
        };
        let LogicalPlan::Filter(filter) = limit.input.as_ref() else {
            return Ok(None);
        };
        let selectivity = filter.selectivity.max(1e-6);
        let rows_needed = (limit.count as f64 / selectivity).ceil();
        let input_rows = filter.input.estimated_row_count() as f64;
        if rows_needed < input_rows * 0.1 {
            log::debug!(
                "predicate_hoisting: Limit({}) over Filter keeps streaming order (needs ~{rows_needed} of {input_rows} rows)",
                limit.count
            );
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "predicate_hoisting"
    }
}
