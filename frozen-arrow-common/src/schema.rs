//! Schema and typed column views over an externally-built Arrow `RecordBatch`.
//!
//! FrozenArrow never builds or mutates a `RecordBatch`; that is the job of
//! the record-batch builder named as an external collaborator in the design.
//! This module only narrows the batch's schema and columns into the small
//! closed set of types the query engine understands.

use std::sync::Arc;

use arrow::array::{
    Array, BooleanArray, Decimal128Array, DictionaryArray, Float64Array, Int32Array, Int64Array,
    StringArray, TimestampNanosecondArray,
};
use arrow::datatypes::{DataType as ArrowDataType, Int32Type};
use arrow::record_batch::RecordBatch;

use crate::error::{FrozenArrowError, Result};

/// The closed set of column types the core query engine reasons about.
/// Anything else passes through as [`DataType::Other`] and forces query
/// translation to fail with `UnsupportedPattern` for predicates that touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int32,
    Int64,
    Float64,
    Decimal128,
    Bool,
    Utf8,
    Utf8Dict,
    Timestamp,
    Other,
}

impl DataType {
    pub fn from_arrow(dt: &ArrowDataType) -> Self {
        match dt {
            ArrowDataType::Int32 => DataType::Int32,
            ArrowDataType::Int64 => DataType::Int64,
            ArrowDataType::Float64 => DataType::Float64,
            ArrowDataType::Decimal128(_, _) => DataType::Decimal128,
            ArrowDataType::Boolean => DataType::Bool,
            ArrowDataType::Utf8 => DataType::Utf8,
            ArrowDataType::Dictionary(_, value) if matches!(value.as_ref(), ArrowDataType::Utf8) => {
                DataType::Utf8Dict
            }
            ArrowDataType::Timestamp(_, _) => DataType::Timestamp,
            _ => DataType::Other,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::Float64 | DataType::Decimal128
        )
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Float64 => "Float64",
            DataType::Decimal128 => "Decimal",
            DataType::Bool => "Bool",
            DataType::Utf8 => "String",
            DataType::Utf8Dict => "String(dict)",
            DataType::Timestamp => "Timestamp",
            DataType::Other => "Other",
        };
        f.write_str(s)
    }
}

/// One column's name, ordinal position and narrowed type.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub index: usize,
    pub data_type: DataType,
    pub nullable: bool,
}

/// Ordered `name -> (index, type)` mapping resolved once against a batch.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Builds a schema directly from a list of fields, e.g. for the output
    /// of a `Project`, `Aggregate` or `GroupBy` logical-plan node that has no
    /// backing `RecordBatch` of its own.
    pub fn from_fields(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    pub fn from_batch(batch: &RecordBatch) -> Self {
        let arrow_schema = batch.schema();
        let fields = arrow_schema
            .fields()
            .iter()
            .enumerate()
            .map(|(index, f)| Field {
                name: f.name().clone(),
                index,
                data_type: DataType::from_arrow(f.data_type()),
                nullable: f.is_nullable(),
            })
            .collect();
        Schema { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Resolves a column name to its index, failing with `SchemaMismatch` if
    /// absent. Predicates call this exactly once, at construction time.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.index)
            .ok_or_else(|| FrozenArrowError::schema_mismatch(name))
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn data_type(&self, index: usize) -> Option<DataType> {
        self.fields.get(index).map(|f| f.data_type)
    }
}

/// A read-only, typed handle onto one column's underlying Arrow array.
/// Borrows for the batch's lifetime; the batch outlives every view of it.
pub enum ColumnView<'a> {
    Int32(&'a Int32Array),
    Int64(&'a Int64Array),
    Float64(&'a Float64Array),
    Decimal128(&'a Decimal128Array),
    Bool(&'a BooleanArray),
    Utf8(&'a StringArray),
    Utf8Dict(&'a DictionaryArray<Int32Type>, &'a StringArray),
    Timestamp(&'a TimestampNanosecondArray),
    Other(&'a dyn Array),
}

impl<'a> ColumnView<'a> {
    pub fn from_batch(batch: &'a RecordBatch, index: usize) -> Self {
        let array = batch.column(index).as_ref();
        match array.data_type() {
            ArrowDataType::Int32 => {
                ColumnView::Int32(array.as_any().downcast_ref::<Int32Array>().unwrap())
            }
            ArrowDataType::Int64 => {
                ColumnView::Int64(array.as_any().downcast_ref::<Int64Array>().unwrap())
            }
            ArrowDataType::Float64 => {
                ColumnView::Float64(array.as_any().downcast_ref::<Float64Array>().unwrap())
            }
            ArrowDataType::Decimal128(_, _) => {
                ColumnView::Decimal128(array.as_any().downcast_ref::<Decimal128Array>().unwrap())
            }
            ArrowDataType::Boolean => {
                ColumnView::Bool(array.as_any().downcast_ref::<BooleanArray>().unwrap())
            }
            ArrowDataType::Utf8 => {
                ColumnView::Utf8(array.as_any().downcast_ref::<StringArray>().unwrap())
            }
            ArrowDataType::Dictionary(_, value) if matches!(value.as_ref(), ArrowDataType::Utf8) => {
                let dict = array
                    .as_any()
                    .downcast_ref::<DictionaryArray<Int32Type>>()
                    .unwrap();
                let values = dict
                    .values()
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .unwrap();
                ColumnView::Utf8Dict(dict, values)
            }
            ArrowDataType::Timestamp(_, _) => ColumnView::Timestamp(
                array
                    .as_any()
                    .downcast_ref::<TimestampNanosecondArray>()
                    .unwrap(),
            ),
            _ => ColumnView::Other(array),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnView::Int32(a) => a.len(),
            ColumnView::Int64(a) => a.len(),
            ColumnView::Float64(a) => a.len(),
            ColumnView::Decimal128(a) => a.len(),
            ColumnView::Bool(a) => a.len(),
            ColumnView::Utf8(a) => a.len(),
            ColumnView::Utf8Dict(a, _) => a.len(),
            ColumnView::Timestamp(a) => a.len(),
            ColumnView::Other(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the underlying array can contain nulls at all (has a null buffer).
    pub fn has_nulls(&self) -> bool {
        match self {
            ColumnView::Int32(a) => a.null_count() > 0,
            ColumnView::Int64(a) => a.null_count() > 0,
            ColumnView::Float64(a) => a.null_count() > 0,
            ColumnView::Decimal128(a) => a.null_count() > 0,
            ColumnView::Bool(a) => a.null_count() > 0,
            ColumnView::Utf8(a) => a.null_count() > 0,
            ColumnView::Utf8Dict(a, _) => a.null_count() > 0,
            ColumnView::Timestamp(a) => a.null_count() > 0,
            ColumnView::Other(a) => a.null_count() > 0,
        }
    }

    pub fn is_valid(&self, row: usize) -> bool {
        match self {
            ColumnView::Int32(a) => a.is_valid(row),
            ColumnView::Int64(a) => a.is_valid(row),
            ColumnView::Float64(a) => a.is_valid(row),
            ColumnView::Decimal128(a) => a.is_valid(row),
            ColumnView::Bool(a) => a.is_valid(row),
            ColumnView::Utf8(a) => a.is_valid(row),
            ColumnView::Utf8Dict(a, _) => a.is_valid(row),
            ColumnView::Timestamp(a) => a.is_valid(row),
            ColumnView::Other(a) => a.is_valid(row),
        }
    }

    /// Iterates `(validity_byte_index, byte)` over the Arrow LSB-first null
    /// bitmap, for bulk repacking into a [`crate::selection bitmap`]-style
    /// 64-bit block array. Returns `None` if the array has no null buffer
    /// (treated as "all valid").
    pub fn null_bitmap_bytes(&self) -> Option<(&[u8], usize)> {
        let nulls = match self {
            ColumnView::Int32(a) => a.nulls(),
            ColumnView::Int64(a) => a.nulls(),
            ColumnView::Float64(a) => a.nulls(),
            ColumnView::Decimal128(a) => a.nulls(),
            ColumnView::Bool(a) => a.nulls(),
            ColumnView::Utf8(a) => a.nulls(),
            ColumnView::Utf8Dict(a, _) => a.nulls(),
            ColumnView::Timestamp(a) => a.nulls(),
            ColumnView::Other(a) => a.nulls(),
        }?;
        let buffer = nulls.buffer();
        Some((buffer.as_slice(), nulls.offset()))
    }
}

/// A read-only handle to a frozen Arrow record batch plus its resolved schema.
/// This is the unit of work every plan, predicate and executor operates over.
pub struct FrozenBatch {
    batch: RecordBatch,
    schema: Schema,
}

impl FrozenBatch {
    pub fn new(batch: RecordBatch) -> Self {
        let schema = Schema::from_batch(&batch);
        FrozenBatch { batch, schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column(&self, index: usize) -> ColumnView<'_> {
        ColumnView::from_batch(&self.batch, index)
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }
}

impl From<RecordBatch> for FrozenBatch {
    fn from(batch: RecordBatch) -> Self {
        FrozenBatch::new(batch)
    }
}

pub type BatchRef = Arc<FrozenBatch>;
