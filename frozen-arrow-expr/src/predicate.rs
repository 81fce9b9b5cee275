//! Typed, immutable column predicates (spec.md §4.2).
//!
//! Every leaf predicate resolves its `column_index` once, at construction,
//! against the batch's schema (spec.md §9: "Late column-index binding via
//! reflection ⇒ explicit binding"). Nothing mutates a predicate afterward, so
//! predicates are freely shareable across worker threads.

use arrow::array::Array;
use frozen_arrow_common::bitmap::SelectionBitmap;
use frozen_arrow_common::error::Result;
use frozen_arrow_common::schema::{ColumnView, DataType, Schema};
use frozen_arrow_common::{FrozenArrowError, FrozenBatch};

/// Comparison operators supported by numeric and string leaf predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn apply<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Pattern kind for `StringOp` (`Contains`/`StartsWith`/`EndsWith`), plus the
/// `Equal` case the SQL `LIKE` translator needs for a wildcard-free pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOpKind {
    Contains,
    StartsWith,
    EndsWith,
    Equal,
}

/// A typed, immutable predicate over a single column, or a compound of them.
#[derive(Debug, Clone)]
pub enum ColumnPredicate {
    I32Cmp { column: usize, op: CmpOp, value: i32 },
    F64Cmp { column: usize, op: CmpOp, value: f64 },
    DecCmp { column: usize, op: CmpOp, value: i128 },
    StrCmp { column: usize, op: CmpOp, value: String },
    BoolEq { column: usize, value: bool },
    IsNull { column: usize },
    StringOp { column: usize, kind: StringOpKind, needle: String },
    And(Vec<ColumnPredicate>),
    Or(Box<ColumnPredicate>, Box<ColumnPredicate>),
    Not(Box<ColumnPredicate>),
}

impl ColumnPredicate {
    pub fn i32_cmp(schema: &Schema, column: &str, op: CmpOp, value: i32) -> Result<Self> {
        let idx = Self::resolve(schema, column, &[DataType::Int32], op.as_str())?;
        Ok(ColumnPredicate::I32Cmp { column: idx, op, value })
    }

    pub fn f64_cmp(schema: &Schema, column: &str, op: CmpOp, value: f64) -> Result<Self> {
        let idx = Self::resolve(schema, column, &[DataType::Float64], op.as_str())?;
        Ok(ColumnPredicate::F64Cmp { column: idx, op, value })
    }

    pub fn dec_cmp(schema: &Schema, column: &str, op: CmpOp, value: i128) -> Result<Self> {
        let idx = Self::resolve(schema, column, &[DataType::Decimal128], op.as_str())?;
        Ok(ColumnPredicate::DecCmp { column: idx, op, value })
    }

    pub fn str_cmp(schema: &Schema, column: &str, op: CmpOp, value: impl Into<String>) -> Result<Self> {
        let idx = Self::resolve(schema, column, &[DataType::Utf8, DataType::Utf8Dict], op.as_str())?;
        Ok(ColumnPredicate::StrCmp {
            column: idx,
            op,
            value: value.into(),
        })
    }

    pub fn bool_eq(schema: &Schema, column: &str, value: bool) -> Result<Self> {
        let idx = Self::resolve(schema, column, &[DataType::Bool], "=")?;
        Ok(ColumnPredicate::BoolEq { column: idx, value })
    }

    pub fn is_null(schema: &Schema, column: &str) -> Result<Self> {
        let idx = schema.column_index(column)?;
        Ok(ColumnPredicate::IsNull { column: idx })
    }

    pub fn string_op(
        schema: &Schema,
        column: &str,
        kind: StringOpKind,
        needle: impl Into<String>,
    ) -> Result<Self> {
        let idx = Self::resolve(schema, column, &[DataType::Utf8, DataType::Utf8Dict], "string-op")?;
        Ok(ColumnPredicate::StringOp {
            column: idx,
            kind,
            needle: needle.into(),
        })
    }

    fn resolve(schema: &Schema, column: &str, allowed: &[DataType], op: &str) -> Result<usize> {
        let idx = schema.column_index(column)?;
        let actual = schema.data_type(idx).unwrap();
        if !allowed.contains(&actual) {
            return Err(FrozenArrowError::type_mismatch(column, op, actual));
        }
        Ok(idx)
    }

    /// `-1` for compound predicates, matching the spec's C-style sentinel.
    pub fn column_index(&self) -> i32 {
        match self {
            ColumnPredicate::I32Cmp { column, .. }
            | ColumnPredicate::F64Cmp { column, .. }
            | ColumnPredicate::DecCmp { column, .. }
            | ColumnPredicate::StrCmp { column, .. }
            | ColumnPredicate::BoolEq { column, .. }
            | ColumnPredicate::IsNull { column, .. }
            | ColumnPredicate::StringOp { column, .. } => *column as i32,
            ColumnPredicate::And(_) | ColumnPredicate::Or(_, _) | ColumnPredicate::Not(_) => -1,
        }
    }

    /// Refines `selection` in place over the whole batch.
    pub fn evaluate(&self, batch: &FrozenBatch, selection: &mut SelectionBitmap) -> Result<()> {
        self.evaluate_range(batch, 0, batch.num_rows(), selection)
    }

    /// Refines `selection` in place over `[lo, hi)` only. Used by the
    /// block/chunk scanner and the parallel executor at chunk boundaries.
    pub fn evaluate_range(
        &self,
        batch: &FrozenBatch,
        lo: usize,
        hi: usize,
        selection: &mut SelectionBitmap,
    ) -> Result<()> {
        match self {
            ColumnPredicate::I32Cmp { column, op, value } => {
                eval_numeric_range(batch, *column, lo, hi, selection, *op, *value as f64)
            }
            ColumnPredicate::F64Cmp { column, op, value } => {
                eval_numeric_range(batch, *column, lo, hi, selection, *op, *value)
            }
            ColumnPredicate::DecCmp { column, op, value } => {
                if let ColumnView::Decimal128(arr) = batch.column(*column) {
                    and_with_nulls(&batch.column(*column), selection, lo, hi);
                    for i in lo..hi {
                        if selection.get(i) && !op.apply(arr.value(i), *value) {
                            selection.clear(i);
                        }
                    }
                }
                Ok(())
            }
            ColumnPredicate::StrCmp { column, op, value } => {
                eval_str_cmp_range(batch, *column, lo, hi, selection, *op, value)
            }
            ColumnPredicate::BoolEq { column, value } => {
                if let ColumnView::Bool(arr) = batch.column(*column) {
                    and_with_nulls(&batch.column(*column), selection, lo, hi);
                    for i in lo..hi {
                        if selection.get(i) && arr.value(i) != *value {
                            selection.clear(i);
                        }
                    }
                }
                Ok(())
            }
            ColumnPredicate::IsNull { column } => {
                let col = batch.column(*column);
                for i in lo..hi {
                    if selection.get(i) && col.is_valid(i) {
                        selection.clear(i);
                    }
                }
                Ok(())
            }
            ColumnPredicate::StringOp { column, kind, needle } => {
                eval_string_op_range(batch, *column, lo, hi, selection, *kind, needle)
            }
            ColumnPredicate::And(list) => {
                for pred in list {
                    pred.evaluate_range(batch, lo, hi, selection)?;
                    if selection.count_set() == 0 {
                        break;
                    }
                }
                Ok(())
            }
            ColumnPredicate::Or(a, b) => {
                let mut left = SelectionBitmap::create(selection.len(), false);
                for i in lo..hi {
                    if selection.get(i) {
                        left.set(i);
                    }
                }
                let mut right = left.clone();
                a.evaluate_range(batch, lo, hi, &mut left)?;
                b.evaluate_range(batch, lo, hi, &mut right)?;
                left.or(&right)?;
                // Only rows within [lo, hi) may change; rows outside the
                // range are left untouched rather than cleared by a
                // whole-bitmap AND.
                for i in lo..hi {
                    if selection.get(i) && !left.get(i) {
                        selection.clear(i);
                    }
                }
                Ok(())
            }
            ColumnPredicate::Not(inner) => {
                let mut live = SelectionBitmap::create(selection.len(), false);
                for i in lo..hi {
                    if selection.get(i) {
                        live.set(i);
                    }
                }
                let mut matched = live.clone();
                inner.evaluate_range(batch, lo, hi, &mut matched)?;
                for i in lo..hi {
                    if selection.get(i) && matched.get(i) {
                        selection.clear(i);
                    }
                }
                Ok(())
            }
        }
    }

    /// Evaluates a single row without touching a bitmap; used by the
    /// streaming and sparse paths.
    pub fn scalar_eval(&self, batch: &FrozenBatch, row: usize) -> bool {
        match self {
            ColumnPredicate::I32Cmp { column, op, value } => match batch.column(*column) {
                ColumnView::Int32(a) => a.is_valid(row) && op.apply(a.value(row), *value),
                _ => false,
            },
            ColumnPredicate::F64Cmp { column, op, value } => match batch.column(*column) {
                ColumnView::Float64(a) => a.is_valid(row) && op.apply(a.value(row), *value),
                _ => false,
            },
            ColumnPredicate::DecCmp { column, op, value } => match batch.column(*column) {
                ColumnView::Decimal128(a) => a.is_valid(row) && op.apply(a.value(row), *value),
                _ => false,
            },
            ColumnPredicate::StrCmp { column, op, value } => scalar_str_cmp(batch, *column, row, *op, value),
            ColumnPredicate::BoolEq { column, value } => match batch.column(*column) {
                ColumnView::Bool(a) => a.is_valid(row) && a.value(row) == *value,
                _ => false,
            },
            ColumnPredicate::IsNull { column } => !batch.column(*column).is_valid(row),
            ColumnPredicate::StringOp { column, kind, needle } => scalar_string_op(batch, *column, row, *kind, needle),
            ColumnPredicate::And(list) => list.iter().all(|p| p.scalar_eval(batch, row)),
            ColumnPredicate::Or(a, b) => a.scalar_eval(batch, row) || b.scalar_eval(batch, row),
            ColumnPredicate::Not(inner) => !inner.scalar_eval(batch, row),
        }
    }

    /// Heuristic selectivity used when no zone map is available (e.g. before
    /// a collection has built one, or for compound predicates during
    /// optimizer bring-up). `ZoneMapQuery::estimate_selectivity` refines this
    /// with real chunk statistics.
    pub fn default_selectivity(&self) -> f64 {
        match self {
            ColumnPredicate::I32Cmp { op, .. } | ColumnPredicate::F64Cmp { op, .. } | ColumnPredicate::DecCmp { op, .. } => {
                match op {
                    CmpOp::Eq => 0.1,
                    CmpOp::Ne => 0.9,
                    _ => 0.33,
                }
            }
            ColumnPredicate::StrCmp { op, .. } => match op {
                CmpOp::Eq => 0.1,
                CmpOp::Ne => 0.9,
                _ => 0.33,
            },
            ColumnPredicate::BoolEq { .. } => 0.5,
            ColumnPredicate::IsNull { .. } => 0.05,
            ColumnPredicate::StringOp { .. } => 0.2,
            ColumnPredicate::And(list) => list.iter().map(|p| p.default_selectivity()).product(),
            ColumnPredicate::Or(a, b) => {
                let sa = a.default_selectivity();
                let sb = b.default_selectivity();
                (sa + sb - sa * sb).clamp(0.0, 1.0)
            }
            ColumnPredicate::Not(inner) => 1.0 - inner.default_selectivity(),
        }
    }
}

/// `selection &= validity` for `[lo, hi)`, run once before a hot comparison
/// loop so the loop body stays branch-free (spec.md §9, "Null handling via
/// bulk bitmap AND, not per-row branch").
fn and_with_nulls(col: &ColumnView<'_>, selection: &mut SelectionBitmap, lo: usize, hi: usize) {
    if !col.has_nulls() {
        return;
    }
    for i in lo..hi {
        if selection.get(i) && !col.is_valid(i) {
            selection.clear(i);
        }
    }
}

/// 8-lane-unrolled comparison loop over a numeric column. The unroll lets the
/// compiler auto-vectorize; there is no hand-written SIMD intrinsic here, in
/// keeping with a pure-safe-Rust core.
fn eval_numeric_range(
    batch: &FrozenBatch,
    column: usize,
    lo: usize,
    hi: usize,
    selection: &mut SelectionBitmap,
    op: CmpOp,
    value: f64,
) -> Result<()> {
    let col = batch.column(column);
    and_with_nulls(&col, selection, lo, hi);
    match col {
        ColumnView::Int32(arr) => {
            let values = arr.values();
            let mut i = lo;
            while i + 8 <= hi {
                for j in 0..8 {
                    let row = i + j;
                    if selection.get(row) && !op.apply(values[row] as f64, value) {
                        selection.clear(row);
                    }
                }
                i += 8;
            }
            while i < hi {
                if selection.get(i) && !op.apply(values[i] as f64, value) {
                    selection.clear(i);
                }
                i += 1;
            }
        }
        ColumnView::Int64(arr) => {
            let values = arr.values();
            for i in lo..hi {
                if selection.get(i) && !op.apply(values[i] as f64, value) {
                    selection.clear(i);
                }
            }
        }
        ColumnView::Float64(arr) => {
            let values = arr.values();
            let mut i = lo;
            while i + 4 <= hi {
                for j in 0..4 {
                    let row = i + j;
                    if selection.get(row) && !op.apply(values[row], value) {
                        selection.clear(row);
                    }
                }
                i += 4;
            }
            while i < hi {
                if selection.get(i) && !op.apply(values[i], value) {
                    selection.clear(i);
                }
                i += 1;
            }
        }
        ColumnView::Timestamp(arr) => {
            let values = arr.values();
            for i in lo..hi {
                if selection.get(i) && !op.apply(values[i] as f64, value) {
                    selection.clear(i);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn eval_str_cmp_range(
    batch: &FrozenBatch,
    column: usize,
    lo: usize,
    hi: usize,
    selection: &mut SelectionBitmap,
    op: CmpOp,
    needle: &str,
) -> Result<()> {
    let col = batch.column(column);
    and_with_nulls(&col, selection, lo, hi);
    match col {
        ColumnView::Utf8(arr) => {
            for i in lo..hi {
                if selection.get(i) && !op.apply(arr.value(i), needle) {
                    selection.clear(i);
                }
            }
        }
        ColumnView::Utf8Dict(keys, values) => {
            // Resolve the needle to a dictionary index once, then compare
            // indices only rather than re-comparing strings per row.
            let needle_key = (0..values.len()).find(|&k| values.value(k) == needle);
            for i in lo..hi {
                if !selection.get(i) {
                    continue;
                }
                let row_key = keys.keys().value(i);
                let matches = match (op, needle_key) {
                    (CmpOp::Eq, Some(k)) => row_key as usize == k,
                    (CmpOp::Eq, None) => false,
                    (CmpOp::Ne, Some(k)) => row_key as usize != k,
                    (CmpOp::Ne, None) => true,
                    _ => op.apply(values.value(row_key as usize), needle),
                };
                if !matches {
                    selection.clear(i);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn scalar_str_cmp(batch: &FrozenBatch, column: usize, row: usize, op: CmpOp, needle: &str) -> bool {
    match batch.column(column) {
        ColumnView::Utf8(arr) => arr.is_valid(row) && op.apply(arr.value(row), needle),
        ColumnView::Utf8Dict(keys, values) => {
            keys.is_valid(row) && op.apply(values.value(keys.keys().value(row) as usize), needle)
        }
        _ => false,
    }
}

fn eval_string_op_range(
    batch: &FrozenBatch,
    column: usize,
    lo: usize,
    hi: usize,
    selection: &mut SelectionBitmap,
    kind: StringOpKind,
    needle: &str,
) -> Result<()> {
    for i in lo..hi {
        if selection.get(i) && !scalar_string_op(batch, column, i, kind, needle) {
            selection.clear(i);
        }
    }
    Ok(())
}

fn scalar_string_op(batch: &FrozenBatch, column: usize, row: usize, kind: StringOpKind, needle: &str) -> bool {
    let value = match batch.column(column) {
        ColumnView::Utf8(arr) => {
            if !arr.is_valid(row) {
                return false;
            }
            arr.value(row)
        }
        ColumnView::Utf8Dict(keys, values) => {
            if !keys.is_valid(row) {
                return false;
            }
            values.value(keys.keys().value(row) as usize)
        }
        _ => return false,
    };
    match kind {
        StringOpKind::Contains => value.contains(needle),
        StringOpKind::StartsWith => value.starts_with(needle),
        StringOpKind::EndsWith => value.ends_with(needle),
        StringOpKind::Equal => value == needle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Int32Array, StringArray};
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn test_batch() -> FrozenBatch {
        let schema = Arc::new(ArrowSchema::new(vec![
            ArrowField::new("age", ArrowDataType::Int32, false),
            ArrowField::new("active", ArrowDataType::Boolean, false),
            ArrowField::new("cat", ArrowDataType::Utf8, false),
        ]));
        let age = Arc::new(Int32Array::from(vec![20, 56, 70, 30]));
        let active = Arc::new(BooleanArray::from(vec![true, false, true, true]));
        let cat = Arc::new(StringArray::from(vec!["A", "B", "A", "C"]));
        FrozenBatch::new(RecordBatch::try_new(schema, vec![age, active, cat]).unwrap())
    }

    #[test]
    fn i32_cmp_filters_rows() {
        let batch = test_batch();
        let pred = ColumnPredicate::i32_cmp(batch.schema(), "age", CmpOp::Gt, 55).unwrap();
        let mut selection = SelectionBitmap::create(batch.num_rows(), true);
        pred.evaluate(&batch, &mut selection).unwrap();
        assert_eq!(selection.iter_selected_indices().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn scalar_eval_matches_bitmap_eval() {
        let batch = test_batch();
        let pred = ColumnPredicate::bool_eq(batch.schema(), "active", true).unwrap();
        let mut selection = SelectionBitmap::create(batch.num_rows(), true);
        pred.evaluate(&batch, &mut selection).unwrap();
        let from_bitmap: Vec<usize> = selection.iter_selected_indices().collect();
        let from_scalar: Vec<usize> = (0..batch.num_rows())
            .filter(|&i| pred.scalar_eval(&batch, i))
            .collect();
        assert_eq!(from_bitmap, from_scalar);
    }

    #[test]
    fn and_short_circuits_on_empty_selection() {
        let batch = test_batch();
        let pred = ColumnPredicate::And(vec![
            ColumnPredicate::i32_cmp(batch.schema(), "age", CmpOp::Gt, 1000).unwrap(),
            ColumnPredicate::bool_eq(batch.schema(), "active", true).unwrap(),
        ]);
        let mut selection = SelectionBitmap::create(batch.num_rows(), true);
        pred.evaluate(&batch, &mut selection).unwrap();
        assert_eq!(selection.count_set(), 0);
    }

    #[test]
    fn or_combines_two_predicates() {
        let batch = test_batch();
        let pred = ColumnPredicate::Or(
            Box::new(ColumnPredicate::str_cmp(batch.schema(), "cat", CmpOp::Eq, "B").unwrap()),
            Box::new(ColumnPredicate::str_cmp(batch.schema(), "cat", CmpOp::Eq, "C").unwrap()),
        );
        let mut selection = SelectionBitmap::create(batch.num_rows(), true);
        pred.evaluate(&batch, &mut selection).unwrap();
        assert_eq!(selection.iter_selected_indices().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn not_inverts_within_live_range() {
        let batch = test_batch();
        let pred = ColumnPredicate::Not(Box::new(
            ColumnPredicate::str_cmp(batch.schema(), "cat", CmpOp::Eq, "A").unwrap(),
        ));
        let mut selection = SelectionBitmap::create(batch.num_rows(), true);
        pred.evaluate(&batch, &mut selection).unwrap();
        assert_eq!(selection.iter_selected_indices().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn unknown_column_is_schema_mismatch() {
        let batch = test_batch();
        let err = ColumnPredicate::i32_cmp(batch.schema(), "nope", CmpOp::Eq, 1).unwrap_err();
        assert!(matches!(err, FrozenArrowError::SchemaMismatch { .. }));
    }

    #[test]
    fn wrong_type_is_type_mismatch() {
        let batch = test_batch();
        let err = ColumnPredicate::i32_cmp(batch.schema(), "cat", CmpOp::Eq, 1).unwrap_err();
        assert!(matches!(err, FrozenArrowError::TypeMismatch { .. }));
    }
}
