//! Predicate-aware zone map queries (spec.md §4.3): "can this predicate be
//! skipped entirely for this chunk" and "what fraction of rows does this
//! predicate's zone-map-adjusted selectivity suggest".
//!
//! These live here, next to [`ColumnPredicate`], rather than as inherent
//! methods on `ZoneMap` itself, because they pattern-match on predicate
//! kinds that `frozen-arrow-common` does not know about. `ZoneMap`'s raw
//! per-chunk summaries stay in the lower-level crate; the pruning logic that
//! interprets them against a specific predicate sits at the same layer as
//! the predicate model.

use frozen_arrow_common::scalar::ScalarValue;
use frozen_arrow_common::zonemap::ZoneMap;

use crate::predicate::{CmpOp, ColumnPredicate};

/// Extension trait implemented for [`ZoneMap`].
pub trait ZoneMapQuery {
    /// Returns `true` iff `predicate` is guaranteed not to match any row of
    /// `chunk`. Conservative: false negatives ("didn't detect a skip") are
    /// allowed; false positives ("skip, even though a row would match") are
    /// a correctness bug.
    fn can_skip(&self, predicate: &ColumnPredicate, chunk: usize) -> bool;

    /// Fraction of rows in non-skippable chunks estimated to pass
    /// `predicate`, adjusted by operator.
    fn estimate_selectivity(&self, predicate: &ColumnPredicate) -> f64;
}

impl ZoneMapQuery for ZoneMap {
    fn can_skip(&self, predicate: &ColumnPredicate, chunk: usize) -> bool {
        match predicate {
            ColumnPredicate::I32Cmp { column, op, value } => {
                self.can_skip_numeric(*column, chunk, *op, ScalarValue::Int32(*value))
            }
            ColumnPredicate::F64Cmp { column, op, value } => {
                self.can_skip_numeric(*column, chunk, *op, ScalarValue::Float64(*value))
            }
            ColumnPredicate::DecCmp { column, op, value } => {
                self.can_skip_numeric(*column, chunk, *op, ScalarValue::Int64(*value as i64))
            }
            ColumnPredicate::StrCmp { column, op, value } => {
                self.can_skip_string(*column, chunk, *op, value)
            }
            ColumnPredicate::IsNull { column } => {
                // Skippable iff the chunk provably has no nulls at all.
                match self.summary(*column, chunk) {
                    Some(s) => !s.has_null && s.row_count > 0,
                    None => false,
                }
            }
            ColumnPredicate::BoolEq { .. } | ColumnPredicate::StringOp { .. } => false,
            ColumnPredicate::And(list) => list.iter().any(|p| self.can_skip(p, chunk)),
            ColumnPredicate::Or(a, b) => self.can_skip(a, chunk) && self.can_skip(b, chunk),
            // Skipping a `Not(p)` would require proving every row matches
            // `p`; the zone map only tracks min/max, not "all rows match",
            // so this is conservatively never skipped.
            ColumnPredicate::Not(_) => false,
        }
    }

    fn estimate_selectivity(&self, predicate: &ColumnPredicate) -> f64 {
        match predicate {
            ColumnPredicate::I32Cmp { column, .. }
            | ColumnPredicate::F64Cmp { column, .. }
            | ColumnPredicate::DecCmp { column, .. } => {
                self.estimate_numeric_selectivity(*column, predicate)
            }
            ColumnPredicate::And(list) => list
                .iter()
                .map(|p| self.estimate_selectivity(p))
                .product::<f64>()
                .clamp(0.0, 1.0),
            ColumnPredicate::Or(a, b) => {
                let sa = self.estimate_selectivity(a);
                let sb = self.estimate_selectivity(b);
                (sa + sb - sa * sb).clamp(0.0, 1.0)
            }
            ColumnPredicate::Not(inner) => 1.0 - self.estimate_selectivity(inner),
            _ => predicate.default_selectivity(),
        }
    }
}

trait ZoneMapQueryPrivate {
    fn can_skip_numeric(&self, column: usize, chunk: usize, op: CmpOp, value: ScalarValue) -> bool;
    fn can_skip_string(&self, column: usize, chunk: usize, op: CmpOp, value: &str) -> bool;
    fn estimate_numeric_selectivity(&self, column: usize, predicate: &ColumnPredicate) -> f64;
}

impl ZoneMapQueryPrivate for ZoneMap {
    fn can_skip_numeric(&self, column: usize, chunk: usize, op: CmpOp, value: ScalarValue) -> bool {
        let Some(summary) = self.summary(column, chunk) else {
            return false;
        };
        let (Some(min), Some(max)) = (&summary.min, &summary.max) else {
            return summary.row_count == 0;
        };
        let below_min = value.partial_cmp_numeric(min) == Some(std::cmp::Ordering::Less);
        let above_max = value.partial_cmp_numeric(max) == Some(std::cmp::Ordering::Greater);
        match op {
            CmpOp::Eq => below_min || above_max,
            CmpOp::Gt => matches!(value.partial_cmp_numeric(max), Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)),
            CmpOp::Ge => matches!(value.partial_cmp_numeric(max), Some(std::cmp::Ordering::Greater)),
            CmpOp::Lt => matches!(value.partial_cmp_numeric(min), Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)),
            CmpOp::Le => matches!(value.partial_cmp_numeric(min), Some(std::cmp::Ordering::Less)),
            CmpOp::Ne => false,
        }
    }

    fn can_skip_string(&self, column: usize, chunk: usize, op: CmpOp, value: &str) -> bool {
        if op != CmpOp::Eq {
            return false;
        }
        let Some(summary) = self.summary(column, chunk) else {
            return false;
        };
        match (&summary.min, &summary.max) {
            (Some(ScalarValue::Utf8(min)), Some(ScalarValue::Utf8(max))) => {
                value.to_string() < *min || value.to_string() > *max
            }
            _ => false,
        }
    }

    fn estimate_numeric_selectivity(&self, column: usize, predicate: &ColumnPredicate) -> f64 {
        let non_skippable_rows: usize = (0..self.num_chunks())
            .filter(|&c| !self.can_skip(predicate, c))
            .map(|c| self.summary(column, c).map(|s| s.row_count).unwrap_or(0))
            .sum();
        if self.num_rows() == 0 {
            return 0.0;
        }
        let coverage = non_skippable_rows as f64 / self.num_rows() as f64;
        coverage * predicate.default_selectivity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use frozen_arrow_common::schema::FrozenBatch;
    use std::sync::Arc;

    fn batch() -> FrozenBatch {
        let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new(
            "v",
            ArrowDataType::Int32,
            false,
        )]));
        let array = Arc::new(Int32Array::from((0..100).collect::<Vec<i32>>()));
        FrozenBatch::new(RecordBatch::try_new(schema, vec![array]).unwrap())
    }

    #[test]
    fn can_skip_chunk_entirely_above_predicate() {
        let batch = batch();
        let zm = ZoneMap::build(&batch, 10);
        let pred = ColumnPredicate::i32_cmp(batch.schema(), "v", CmpOp::Lt, 5).unwrap();
        // chunk 0 covers [0,10) so it can't be skipped, chunk 9 covers [90,100)
        assert!(!zm.can_skip(&pred, 0));
        assert!(zm.can_skip(&pred, 9));
    }

    #[test]
    fn no_false_positives_against_scalar_eval() {
        let batch = batch();
        let zm = ZoneMap::build(&batch, 10);
        let pred = ColumnPredicate::i32_cmp(batch.schema(), "v", CmpOp::Eq, 42).unwrap();
        for chunk in 0..zm.num_chunks() {
            if zm.can_skip(&pred, chunk) {
                let (lo, hi) = zm.chunk_bounds(chunk);
                for row in lo..hi {
                    assert!(!pred.scalar_eval(&batch, row));
                }
            }
        }
    }
}
