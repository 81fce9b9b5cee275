//! Per-chunk min/max/null summary, built once per batch and read-only for
//! the lifetime of the owning collection.
//!
//! The zone map itself only stores per-column, per-chunk summaries; the
//! predicate-aware `can_skip` / `estimate_selectivity` queries live next to
//! the predicate model in `frozen-arrow-expr` (as the `ZoneMapQuery`
//! extension trait) since they need to pattern-match on predicate kinds that
//! this crate does not know about. This mirrors the same layering
//! `datafusion-common`'s `Statistics`/`ColumnStatistics` use: the summary
//! lives low in the stack, predicate-specific pruning logic lives with the
//! expressions.

use arrow::array::Array;
use crate::scalar::ScalarValue;
use crate::schema::FrozenBatch;

/// Min/max/null summary for one column within one chunk.
#[derive(Debug, Clone)]
pub struct ChunkSummary {
    pub min: Option<ScalarValue>,
    pub max: Option<ScalarValue>,
    pub has_null: bool,
    pub null_count: usize,
    pub row_count: usize,
}

impl ChunkSummary {
    fn empty(row_count: usize) -> Self {
        ChunkSummary {
            min: None,
            max: None,
            has_null: false,
            null_count: 0,
            row_count,
        }
    }
}

/// Per-column, per-chunk summaries for an entire batch.
#[derive(Debug)]
pub struct ZoneMap {
    chunk_rows: usize,
    num_chunks: usize,
    num_rows: usize,
    /// `columns[col_index][chunk_index]`; `None` for a column whose type the
    /// zone map does not summarize (forces `can_skip` to conservatively
    /// return `false` for predicates over it).
    columns: Vec<Option<Vec<ChunkSummary>>>,
}

impl ZoneMap {
    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn chunk_bounds(&self, chunk: usize) -> (usize, usize) {
        let lo = chunk * self.chunk_rows;
        let hi = (lo + self.chunk_rows).min(self.num_rows);
        (lo, hi)
    }

    pub fn summary(&self, column: usize, chunk: usize) -> Option<&ChunkSummary> {
        self.columns.get(column).and_then(|c| c.as_ref()).and_then(|v| v.get(chunk))
    }

    /// Builds summaries for every column of `batch`, chunked into
    /// `chunk_rows`-row ranges (the last chunk may be shorter).
    pub fn build(batch: &FrozenBatch, chunk_rows: usize) -> Self {
        use crate::schema::ColumnView;

        let num_rows = batch.num_rows();
        let num_chunks = if num_rows == 0 {
            0
        } else {
            num_rows.div_ceil(chunk_rows)
        };

        let mut columns = Vec::with_capacity(batch.schema().fields().len());
        for field in batch.schema().fields() {
            let col = batch.column(field.index);
            let mut chunks = Vec::with_capacity(num_chunks);
            for chunk in 0..num_chunks {
                let lo = chunk * chunk_rows;
                let hi = (lo + chunk_rows).min(num_rows);
                chunks.push(summarize_range(&col, lo, hi));
            }
            let summarizable = !matches!(col, ColumnView::Other(_));
            columns.push(if summarizable { Some(chunks) } else { None });
        }

        ZoneMap {
            chunk_rows,
            num_chunks,
            num_rows,
            columns,
        }
    }
}

fn summarize_range(col: &crate::schema::ColumnView<'_>, lo: usize, hi: usize) -> ChunkSummary {
    use crate::schema::ColumnView::*;

    let row_count = hi - lo;
    if row_count == 0 {
        return ChunkSummary::empty(0);
    }

    macro_rules! numeric_summary {
        ($arr:expr, $wrap:expr) => {{
            let mut min: Option<ScalarValue> = None;
            let mut max: Option<ScalarValue> = None;
            let mut null_count = 0usize;
            for i in lo..hi {
                if !$arr.is_valid(i) {
                    null_count += 1;
                    continue;
                }
                let v = $wrap($arr.value(i));
                min = Some(match min {
                    None => v.clone(),
                    Some(m) if v.partial_cmp_numeric(&m) == Some(std::cmp::Ordering::Less) => v.clone(),
                    Some(m) => m,
                });
                max = Some(match max {
                    None => v.clone(),
                    Some(m) if v.partial_cmp_numeric(&m) == Some(std::cmp::Ordering::Greater) => v.clone(),
                    Some(m) => m,
                });
            }
            ChunkSummary {
                min,
                max,
                has_null: null_count > 0,
                null_count,
                row_count,
            }
        }};
    }

    match col {
        Int32(a) => numeric_summary!(a, ScalarValue::Int32),
        Int64(a) => numeric_summary!(a, ScalarValue::Int64),
        Float64(a) => numeric_summary!(a, ScalarValue::Float64),
        Decimal128(a) => numeric_summary!(a, |v: i128| ScalarValue::Int64(v as i64)),
        Bool(a) => {
            let mut any_true = false;
            let mut any_false = false;
            let mut null_count = 0usize;
            for i in lo..hi {
                if !a.is_valid(i) {
                    null_count += 1;
                    continue;
                }
                if a.value(i) {
                    any_true = true;
                } else {
                    any_false = true;
                }
            }
            ChunkSummary {
                min: Some(ScalarValue::Bool(!any_false)),
                max: Some(ScalarValue::Bool(any_true)),
                has_null: null_count > 0,
                null_count,
                row_count,
            }
        }
        Utf8(a) => {
            let mut min: Option<String> = None;
            let mut max: Option<String> = None;
            let mut null_count = 0usize;
            for i in lo..hi {
                if !a.is_valid(i) {
                    null_count += 1;
                    continue;
                }
                let v = a.value(i);
                if min.as_deref().map(|m| v < m).unwrap_or(true) {
                    min = Some(v.to_string());
                }
                if max.as_deref().map(|m| v > m).unwrap_or(true) {
                    max = Some(v.to_string());
                }
            }
            ChunkSummary {
                min: min.map(ScalarValue::Utf8),
                max: max.map(ScalarValue::Utf8),
                has_null: null_count > 0,
                null_count,
                row_count,
            }
        }
        Utf8Dict(keys, values) => {
            let mut min: Option<String> = None;
            let mut max: Option<String> = None;
            let mut null_count = 0usize;
            for i in lo..hi {
                if !keys.is_valid(i) {
                    null_count += 1;
                    continue;
                }
                let key = keys.keys().value(i);
                let v = values.value(key as usize);
                if min.as_deref().map(|m| v < m).unwrap_or(true) {
                    min = Some(v.to_string());
                }
                if max.as_deref().map(|m| v > m).unwrap_or(true) {
                    max = Some(v.to_string());
                }
            }
            ChunkSummary {
                min: min.map(ScalarValue::Utf8),
                max: max.map(ScalarValue::Utf8),
                has_null: null_count > 0,
                null_count,
                row_count,
            }
        }
        Timestamp(a) => numeric_summary!(a, ScalarValue::Int64),
        Other(_) => ChunkSummary::empty(row_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn batch_of(values: Vec<Option<i32>>) -> FrozenBatch {
        let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new(
            "v",
            ArrowDataType::Int32,
            true,
        )]));
        let array = Arc::new(Int32Array::from(values));
        FrozenBatch::new(RecordBatch::try_new(schema, vec![array]).unwrap())
    }

    #[test]
    fn min_max_over_single_chunk() {
        let batch = batch_of(vec![Some(5), Some(1), None, Some(9)]);
        let zm = ZoneMap::build(&batch, 16_384);
        let summary = zm.summary(0, 0).unwrap();
        assert_eq!(summary.min, Some(ScalarValue::Int32(1)));
        assert_eq!(summary.max, Some(ScalarValue::Int32(9)));
        assert_eq!(summary.null_count, 1);
        assert!(summary.has_null);
    }

    #[test]
    fn chunk_count_matches_chunk_rows() {
        let batch = batch_of((0..100).map(Some).collect());
        let zm = ZoneMap::build(&batch, 30);
        assert_eq!(zm.num_chunks(), 4);
        assert_eq!(zm.chunk_bounds(3), (90, 100));
    }
}
