//! Shared types for the FrozenArrow query engine: the flat error type, the
//! narrowed schema/column/scalar model over an externally-built Arrow
//! `RecordBatch`, and the recognized execution configuration.

pub mod bitmap;
pub mod config;
pub mod error;
pub mod scalar;
pub mod schema;
pub mod zonemap;

pub use bitmap::SelectionBitmap;
pub use config::ExecutionConfig;
pub use error::{FrozenArrowError, Result};
pub use scalar::ScalarValue;
pub use schema::{BatchRef, ColumnView, DataType, Field, FrozenBatch, Schema};
pub use zonemap::{ChunkSummary, ZoneMap};

/// Default chunk size for zone maps and parallel partitioning (spec.md §3).
pub const DEFAULT_CHUNK_ROWS: usize = 16_384;
/// Default row threshold above which the physical planner considers `Parallel`.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 50_000;
/// Default row threshold above which the physical planner considers `SIMD`.
pub const DEFAULT_SIMD_THRESHOLD: usize = 1_000;
