//! C7: index-list fast path for highly-selective enumerations.
//!
//! Used instead of a full bitmap when the optimizer/physical planner
//! estimates selectivity below 5% and the caller wants materialized rows
//! rather than a count (spec.md §4.7: "Count queries are explicitly
//! excluded, popcount on a bitmap is faster than list.size").

pub const SPARSE_SELECTIVITY_THRESHOLD: f64 = 0.05;

use frozen_arrow_common::error::Result;
use frozen_arrow_common::schema::FrozenBatch;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::{ColumnPredicate, ZoneMapQuery};

/// Collects matching row indices in ascending order without ever building a
/// full-length bitmap: each chunk appends directly to the growable list.
pub fn collect_sparse(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for chunk in 0..zone_map.num_chunks().max(1) {
        if zone_map.num_rows() == 0 {
            break;
        }
        let (lo, hi) = zone_map.chunk_bounds(chunk);
        if lo >= hi {
            continue;
        }
        if predicates.iter().any(|p| zone_map.can_skip(p, chunk)) {
            continue;
        }
        for row in lo..hi {
            if predicates.iter().all(|p| p.scalar_eval(batch, row)) {
                indices.push(row);
            }
        }
    }
    Ok(indices)
}
