//! The `OptimizerRule` trait each rewrite implements.

use std::sync::Arc;

use frozen_arrow_common::error::Result;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::LogicalPlan;

/// A single, pure rewrite rule. `try_optimize` returns `Ok(None)` when the
/// rule does not apply to `plan`, and `Ok(Some(new_plan))` with a freshly
/// built replacement otherwise. Rules never mutate `plan` in place.
pub trait OptimizerRule {
    fn try_optimize(&self, plan: &Arc<LogicalPlan>, zone_map: &ZoneMap) -> Result<Option<Arc<LogicalPlan>>>;

    fn name(&self) -> &str;
}
