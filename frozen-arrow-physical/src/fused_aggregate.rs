//! C5: single-pass filter+aggregate. Never materializes a selection bitmap
//! larger than one chunk, and never materializes an index list at all.

use arrow::array::Array;
use frozen_arrow_common::bitmap::SelectionBitmap;
use frozen_arrow_common::error::{FrozenArrowError, Result};
use frozen_arrow_common::schema::{ColumnView, FrozenBatch};
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::{ColumnPredicate, ZoneMapQuery};

/// The aggregate kinds C5/C6 support (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Running state for one aggregate, folded one block at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
    pub count: i64,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Accumulator {
    /// Combines `other` into `self` using each field's monoid (spec.md §4.6:
    /// "aggregates combine with the operation's monoid"). Used both to merge
    /// blocks within a chunk and to reduce per-worker partials (C6).
    pub fn merge(&mut self, other: &Accumulator) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, None) => a,
            (None, b) => b,
        };
    }

    /// Folds one numeric value into the running count/sum/min/max. Exposed
    /// so a caller building its own per-group accumulators (hash group-by)
    /// can reuse the same monoid `fused_aggregate` folds chunks with.
    pub fn fold_value(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
    }

    /// Finalizes into the scalar the caller asked for.
    pub fn finish(&self, kind: AggregateKind, is_integer: bool, column: &str) -> Result<frozen_arrow_common::ScalarValue> {
        use frozen_arrow_common::ScalarValue;
        match kind {
            AggregateKind::Count => Ok(ScalarValue::Int64(self.count)),
            AggregateKind::Sum => {
                if is_integer {
                    let whole = self.sum.round();
                    if whole > i64::MAX as f64 || whole < i64::MIN as f64 {
                        return Err(FrozenArrowError::Overflow { column: column.to_string() });
                    }
                    Ok(ScalarValue::Int64(whole as i64))
                } else {
                    Ok(ScalarValue::Float64(self.sum))
                }
            }
            AggregateKind::Avg => {
                if self.count == 0 {
                    return Err(FrozenArrowError::EmptyAggregate);
                }
                Ok(ScalarValue::Float64(self.sum / self.count as f64))
            }
            AggregateKind::Min => self.min.map(ScalarValue::Float64).ok_or(FrozenArrowError::EmptyAggregate),
            AggregateKind::Max => self.max.map(ScalarValue::Float64).ok_or(FrozenArrowError::EmptyAggregate),
        }
    }
}

/// Runs `filter -> aggregate(column, kind)` as a single pass, chunk by
/// chunk, block by block. `column` is `None` for `Count(*)`.
pub fn fused_aggregate(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
    column: Option<usize>,
) -> Result<Accumulator> {
    let mut acc = Accumulator::default();
    for chunk in 0..zone_map.num_chunks().max(1) {
        if zone_map.num_rows() == 0 {
            break;
        }
        let (lo, hi) = zone_map.chunk_bounds(chunk);
        if lo >= hi {
            continue;
        }
        let mut selection = SelectionBitmap::create(batch.num_rows(), false);
        for i in lo..hi {
            selection.set(i);
        }
        let mut skip_chunk = false;
        for pred in predicates {
            if zone_map.can_skip(pred, chunk) {
                selection.clear_range(lo, hi)?;
                skip_chunk = true;
                break;
            }
            pred.evaluate_range(batch, lo, hi, &mut selection)?;
        }
        if skip_chunk {
            continue;
        }
        fold_chunk(batch, column, &selection, lo, hi, &mut acc);
    }
    Ok(acc)
}

/// Same as [`fused_aggregate`] but restricted to `[range_lo, range_hi)`,
/// clipped to the zone-map chunks that overlap it. Used by the parallel
/// executor (C6) to fold one worker's partition independently.
pub fn fused_aggregate_range(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
    column: Option<usize>,
    range_lo: usize,
    range_hi: usize,
) -> Result<Accumulator> {
    let mut acc = Accumulator::default();
    for chunk in 0..zone_map.num_chunks().max(1) {
        if zone_map.num_rows() == 0 {
            break;
        }
        let (chunk_lo, chunk_hi) = zone_map.chunk_bounds(chunk);
        let lo = chunk_lo.max(range_lo);
        let hi = chunk_hi.min(range_hi);
        if lo >= hi {
            continue;
        }
        let mut selection = SelectionBitmap::create(batch.num_rows(), false);
        for i in lo..hi {
            selection.set(i);
        }
        let mut skip_chunk = false;
        for pred in predicates {
            if zone_map.can_skip(pred, chunk) {
                selection.clear_range(lo, hi)?;
                skip_chunk = true;
                break;
            }
            pred.evaluate_range(batch, lo, hi, &mut selection)?;
        }
        if skip_chunk {
            continue;
        }
        fold_chunk(batch, column, &selection, lo, hi, &mut acc);
    }
    Ok(acc)
}

/// Iterates the chunk's blocks via `iter_blocks()`, taking the dense
/// fast path for a fully-set, in-range, 64-row block and falling back to
/// peeling individual indices otherwise (spec.md §4.5).
fn fold_chunk(batch: &FrozenBatch, column: Option<usize>, selection: &SelectionBitmap, lo: usize, hi: usize, acc: &mut Accumulator) {
    let Some(column) = column else {
        // Count(*): no column to read, just popcount the chunk's selection.
        acc.count += (lo..hi).filter(|&i| selection.get(i)).count() as i64;
        return;
    };
    let col = batch.column(column);
    for (block_idx, mask) in selection.iter_blocks() {
        let (block_lo, block_hi) = selection.block_row_range(block_idx);
        if block_lo >= hi || block_hi <= lo {
            continue;
        }
        let dense = mask == u64::MAX && block_lo >= lo && block_hi <= hi && block_hi - block_lo == 64;
        if dense {
            for row in block_lo..block_hi {
                if let Some(v) = numeric_value(&col, row) {
                    acc.fold_value(v);
                }
            }
        } else {
            let mut bits = mask;
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                let row = block_lo + bit;
                if row >= lo && row < hi {
                    if let Some(v) = numeric_value(&col, row) {
                        acc.fold_value(v);
                    }
                }
            }
        }
    }
}

fn numeric_value(col: &ColumnView<'_>, row: usize) -> Option<f64> {
    match col {
        ColumnView::Int32(a) => a.is_valid(row).then(|| a.value(row) as f64),
        ColumnView::Int64(a) => a.is_valid(row).then(|| a.value(row) as f64),
        ColumnView::Float64(a) => a.is_valid(row).then(|| a.value(row)),
        ColumnView::Decimal128(a) => a.is_valid(row).then(|| a.value(row) as f64),
        ColumnView::Timestamp(a) => a.is_valid(row).then(|| a.value(row) as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use frozen_arrow_common::ScalarValue;
    use frozen_arrow_expr::CmpOp;
    use std::sync::Arc;

    fn batch(values: Vec<i32>) -> FrozenBatch {
        let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new("v", ArrowDataType::Int32, false)]));
        let array = Arc::new(Int32Array::from(values));
        FrozenBatch::new(RecordBatch::try_new(schema, vec![array]).unwrap())
    }

    #[test]
    fn count_star_counts_selected_rows() {
        let batch = batch((0..1000).collect());
        let zm = ZoneMap::build(&batch, 16_384);
        let pred = ColumnPredicate::i32_cmp(batch.schema(), "v", CmpOp::Gt, 500).unwrap();
        let acc = fused_aggregate(&batch, &[pred], &zm, None).unwrap();
        assert_eq!(acc.count, 499);
    }

    #[test]
    fn sum_over_all_rows() {
        let batch = batch((1..=100).collect());
        let zm = ZoneMap::build(&batch, 16_384);
        let acc = fused_aggregate(&batch, &[], &zm, Some(0)).unwrap();
        let result = acc.finish(AggregateKind::Sum, true, "v").unwrap();
        assert_eq!(result, ScalarValue::Int64(5050));
    }

    #[test]
    fn min_max_over_empty_selection_fails() {
        let batch = batch(vec![1, 2, 3]);
        let zm = ZoneMap::build(&batch, 16_384);
        let pred = ColumnPredicate::i32_cmp(batch.schema(), "v", CmpOp::Gt, 1000).unwrap();
        let acc = fused_aggregate(&batch, &[pred], &zm, Some(0)).unwrap();
        assert!(matches!(acc.finish(AggregateKind::Min, true, "v"), Err(FrozenArrowError::EmptyAggregate)));
    }

    #[test]
    fn dense_block_boundary_is_exact() {
        let batch = batch((0..128).collect());
        let zm = ZoneMap::build(&batch, 16_384);
        let acc = fused_aggregate(&batch, &[], &zm, Some(0)).unwrap();
        assert_eq!(acc.count, 128);
        assert_eq!(acc.sum, (0..128).sum::<i32>() as f64);
    }
}
