//! C8: row-by-row short-circuit scan for `Any` / `First` / `FirstOrDefault`.
//! Never materializes a bitmap; returns as soon as a match is found.

use frozen_arrow_common::schema::FrozenBatch;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::{ColumnPredicate, ZoneMapQuery};

/// Returns the smallest row index matching every predicate, or `None` if no
/// unskippable chunk contains a match.
pub fn first_matching_row(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
) -> Option<usize> {
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
                return Some(row);
            }
        }
    }
    None
}

/// `Any()`: true iff some row matches every predicate.
pub fn any_matches(batch: &FrozenBatch, predicates: &[ColumnPredicate], zone_map: &ZoneMap) -> bool {
    first_matching_row(batch, predicates, zone_map).is_some()
}
