//! Rule 1 (spec.md §4.10): within any `Filter`, sort predicates ascending by
//! estimated selectivity so the cheapest-to-fail predicate runs first. A
//! stable sort preserves the user's original order on ties.

use std::sync::Arc;

use frozen_arrow_common::error::Result;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::{LogicalPlan, ZoneMapQuery};

use crate::rule::OptimizerRule;

#[derive(Default)]
pub struct PredicateReordering;

impl OptimizerRule for PredicateReordering {
    fn try_optimize(&self, plan: &Arc<LogicalPlan>, zone_map: &ZoneMap) -> Result<Option<Arc<LogicalPlan>>> {
        let LogicalPlan::Filter(filter) = plan.as_ref() else {
            return Ok(None);
        };
        if filter.predicates.len() < 2 {
            return Ok(None);
        }

        let mut indexed: Vec<(usize, f64)> = filter
            .predicates
            .iter()
            .enumerate()
            .map(|(i, p)| (i, zone_map.estimate_selectivity(p)))
            .collect();
        // `sort_by` is a stable sort: ties keep the user's original order.
        indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        if indexed.iter().enumerate().all(|(pos, (orig, _))| pos == *orig) {
            return Ok(None);
        }

        log::debug!(
            "predicate_reordering: reordered {} predicates by estimated selectivity",
            filter.predicates.len()
        );

        let reordered = indexed
            .into_iter()
            .map(|(i, _)| filter.predicates[i].clone())
            .collect();
        let new_plan = LogicalPlan::filter(filter.input.clone(), reordered, filter.selectivity)?;
        Ok(Some(Arc::new(new_plan)))
    }

    fn name(&self) -> &str {
        "predicate_reordering"
    }
}
