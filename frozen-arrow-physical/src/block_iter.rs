//! C4: the block/chunk scanner every sequential executor sits on.
//!
//! `evaluate_filter` is the single "filter" primitive: an all-ones bitmap,
//! narrowed chunk by chunk, skipping whole chunks the zone map proves can't
//! match before ever touching their predicates.

use frozen_arrow_common::bitmap::SelectionBitmap;
use frozen_arrow_common::error::Result;
use frozen_arrow_common::schema::FrozenBatch;
use frozen_arrow_common::zonemap::ZoneMap;
use frozen_arrow_expr::{ColumnPredicate, ZoneMapQuery};

/// Evaluates `predicates` (already reordered by the optimizer) over the
/// whole batch, chunk by chunk, pruning with `zone_map` first.
pub fn evaluate_filter(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
) -> Result<SelectionBitmap> {
    let mut selection = SelectionBitmap::create(batch.num_rows(), true);
    evaluate_filter_into(batch, predicates, zone_map, &mut selection)?;
    Ok(selection)
}

/// Same as [`evaluate_filter`] but narrows a caller-owned bitmap in place,
/// so the parallel executor (C6) can reuse this per worker segment.
pub fn evaluate_filter_into(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
    selection: &mut SelectionBitmap,
) -> Result<()> {
    for chunk in 0..zone_map.num_chunks().max(1) {
        let (lo, hi) = if zone_map.num_rows() == 0 {
            (0, 0)
        } else {
            zone_map.chunk_bounds(chunk)
        };
        if lo >= hi {
            continue;
        }
        evaluate_chunk(batch, predicates, zone_map, chunk, lo, hi, selection)?;
    }
    Ok(())
}

/// Evaluates every predicate over one chunk's `[lo, hi)` range, clearing the
/// whole range up front on the first predicate a zone map proves skippable.
fn evaluate_chunk(
    batch: &FrozenBatch,
    predicates: &[ColumnPredicate],
    zone_map: &ZoneMap,
    chunk: usize,
    lo: usize,
    hi: usize,
    selection: &mut SelectionBitmap,
) -> Result<()> {
    for pred in predicates {
        if zone_map.can_skip(pred, chunk) {
            selection.clear_range(lo, hi)?;
            return Ok(());
        }
        pred.evaluate_range(batch, lo, hi, selection)?;
        if range_is_empty(selection, lo, hi) {
            return Ok(());
        }
    }
    Ok(())
}

fn range_is_empty(selection: &SelectionBitmap, lo: usize, hi: usize) -> bool {
    (lo..hi).all(|i| !selection.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use frozen_arrow_expr::CmpOp;
    use std::sync::Arc;

    fn batch(n: i32) -> FrozenBatch {
        let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new("v", ArrowDataType::Int32, false)]));
        let array = Arc::new(Int32Array::from((0..n).collect::<Vec<i32>>()));
        FrozenBatch::new(RecordBatch::try_new(schema, vec![array]).unwrap())
    }

    #[test]
    fn skips_whole_chunks_via_zone_map() {
        let batch = batch(1000);
        let zm = ZoneMap::build(&batch, 100);
        let pred = ColumnPredicate::i32_cmp(batch.schema(), "v", CmpOp::Ge, 500).unwrap();
        let selection = evaluate_filter(&batch, &[pred], &zm).unwrap();
        assert_eq!(selection.count_set(), 500);
        for i in 0..500 {
            assert!(!selection.get(i));
        }
    }

    #[test]
    fn boundary_chunk_sizes_give_correct_counts() {
        for n in [16_383usize, 16_384, 16_385] {
            let batch = batch(n as i32);
            let zm = ZoneMap::build(&batch, 16_384);
            let pred = ColumnPredicate::i32_cmp(batch.schema(), "v", CmpOp::Ge, 0).unwrap();
            let selection = evaluate_filter(&batch, &[pred], &zm).unwrap();
            assert_eq!(selection.count_set(), n);
        }
    }

    #[test]
    fn empty_batch_yields_empty_selection() {
        let batch = batch(0);
        let zm = ZoneMap::build(&batch, 16_384);
        let selection = evaluate_filter(&batch, &[], &zm).unwrap();
        assert_eq!(selection.count_set(), 0);
    }
}
