//! C6: chunked parallel filter/aggregate with monoid reductions.
//!
//! Activates when the physical planner (C14) picks `Strategy::Parallel`.
//! Partitions `[0, N)` into contiguous worker ranges sized to keep each
//! worker's working set small, runs the same filter/aggregate pipeline
//! (§4.4/§4.5) per range via `rayon`, and reduces without locks: the map
//! phase touches no shared mutable state, and the reduction is a plain fold.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use frozen_arrow_common::bitmap::SelectionBitmap;
use frozen_arrow_common::error::{FrozenArrowError, Result};
use frozen_arrow_common::schema::FrozenBatch;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::{ColumnPredicate, ZoneMapQuery};

use crate::fused_aggregate::Accumulator;

/// Target working set per worker partition, in rows of a single column
/// (spec.md §4.6: "~16 KB of column data"); a worker handles roughly this
/// many rows times a column's element width before another worker takes over.
const TARGET_PARTITION_BYTES: usize = 16 * 1024;

/// A token workers poll between chunks; tripping it discards partial work.
#[derive(Debug, Default)]
pub struct CancellationToken(AtomicBool);

impl CancellationToken {
    pub fn new() -> Arc<Self> {
        Arc::new(CancellationToken(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Splits `[0, num_rows)` into contiguous ranges, one per worker, sized so
/// each worker's slice of a representative 8-byte column stays near
/// `TARGET_PARTITION_BYTES`, but never fewer than 1 row or more workers than
/// `num_cpus::get()`.
pub fn partition_ranges(num_rows: usize, element_width: usize) -> Vec<(usize, usize)> {
    if num_rows == 0 {
        return vec![];
    }
    let rows_per_partition = (TARGET_PARTITION_BYTES / element_width.max(1)).max(1);
    let num_workers = num_rows.div_ceil(rows_per_partition).min(num_cpus::get().max(1));
    let chunk = num_rows.div_ceil(num_workers.max(1));
    let mut ranges = Vec::with_capacity(num_workers);
    let mut lo = 0;
    while lo < num_rows {
        let hi = (lo + chunk).min(num_rows);
        ranges.push((lo, hi));
        lo = hi;
    }
    ranges
}

/// Runs the filter pipeline over each worker's range and stitches the
/// per-worker bitmap segments into one global selection. Bit-identical to
/// the sequential result (spec.md §8).
pub fn parallel_filter(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
    cancellation: Option<&CancellationToken>,
) -> Result<SelectionBitmap> {
    let ranges = partition_ranges(batch.num_rows(), 8);
    let segments: Vec<Result<SelectionBitmap>> = ranges
        .into_par_iter()
        .map(|(lo, hi)| {
            if cancellation.map(|c| c.is_cancelled()).unwrap_or(false) {
                return Err(FrozenArrowError::Cancelled);
            }
            let mut segment = SelectionBitmap::create(batch.num_rows(), false);
            for i in lo..hi {
                segment.set(i);
            }
            evaluate_range_against_chunks(batch, predicates, zone_map, lo, hi, &mut segment)?;
            Ok(segment)
        })
        .collect();

    let mut result = SelectionBitmap::create(batch.num_rows(), false);
    for segment in segments {
        let segment = segment?;
        result.or(&segment)?;
    }
    Ok(result)
}

/// Narrows `segment` over `[lo, hi)` using the same chunk-skip logic as the
/// sequential scanner (§4.4), clipped to the chunks that overlap this
/// worker's partition.
fn evaluate_range_against_chunks(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
    lo: usize,
    hi: usize,
    segment: &mut SelectionBitmap,
) -> Result<()> {
    for chunk in 0..zone_map.num_chunks().max(1) {
        if zone_map.num_rows() == 0 {
            break;
        }
        let (chunk_lo, chunk_hi) = zone_map.chunk_bounds(chunk);
        let clipped_lo = chunk_lo.max(lo);
        let clipped_hi = chunk_hi.min(hi);
        if clipped_lo >= clipped_hi {
            continue;
        }
        for pred in predicates {
            if zone_map.can_skip(pred, chunk) {
                segment.clear_range(clipped_lo, clipped_hi)?;
                break;
            }
            pred.evaluate_range(batch, clipped_lo, clipped_hi, segment)?;
        }
    }
    Ok(())
}

/// Runs `filter -> aggregate` per worker range and reduces with the
/// aggregate's monoid (sum/min/max/count=sum).
pub fn parallel_aggregate(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
    column: Option<usize>,
    cancellation: Option<&CancellationToken>,
) -> Result<Accumulator> {
    let ranges = partition_ranges(batch.num_rows(), 8);
    let partials: Vec<Result<Accumulator>> = ranges
        .into_par_iter()
        .map(|(lo, hi)| {
            if cancellation.map(|c| c.is_cancelled()).unwrap_or(false) {
                return Err(FrozenArrowError::Cancelled);
            }
            crate::fused_aggregate::fused_aggregate_range(batch, predicates, zone_map, column, lo, hi)
        })
        .collect();

    let mut total = Accumulator::default();
    for partial in partials {
        total.merge(&partial?);
    }
    Ok(total)
}
