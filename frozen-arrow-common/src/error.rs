//! The single flat error type shared by every FrozenArrow crate.
//!
//! Mirrors the "one enum, no hierarchy" shape used throughout the engine's
//! ancestry: every fallible operation returns [`Result<T>`], and every error
//! kind documented in the engine's design is a variant here, not a distinct
//! type.

use std::fmt;

/// Errors produced anywhere in the FrozenArrow query engine.
#[derive(Debug, thiserror::Error)]
pub enum FrozenArrowError {
    /// A predicate or projection referenced a column name absent from the schema.
    #[error("schema mismatch: column '{column}' is not present in the batch schema")]
    SchemaMismatch { column: String },

    /// A predicate operator was applied to a column of an incompatible type.
    #[error("type mismatch: operator '{op}' is not valid for column '{column}' of type {actual}")]
    TypeMismatch {
        column: String,
        op: String,
        actual: String,
    },

    /// The query translator or SQL parser could not reduce an expression into
    /// a supported logical-plan shape. Callers should fall back to scalar
    /// evaluation; see [`FrozenArrowError::is_unsupported_pattern`].
    #[error("unsupported query pattern: {0}")]
    UnsupportedPattern(String),

    /// Integer accumulation exceeded the widened accumulator type.
    #[error("integer overflow accumulating column '{column}'")]
    Overflow { column: String },

    /// `Min`/`Max` requested over an empty selection.
    #[error("aggregate requested over an empty selection")]
    EmptyAggregate,

    /// Internal bitmap or range misuse; indicates an engine bug, not user error.
    #[error("bounds error: {0}")]
    BoundsError(String),

    /// The query's cancellation token was tripped before completion.
    #[error("query cancelled")]
    Cancelled,
}

impl FrozenArrowError {
    pub fn schema_mismatch(column: impl Into<String>) -> Self {
        FrozenArrowError::SchemaMismatch {
            column: column.into(),
        }
    }

    pub fn type_mismatch(
        column: impl Into<String>,
        op: impl Into<String>,
        actual: impl fmt::Display,
    ) -> Self {
        FrozenArrowError::TypeMismatch {
            column: column.into(),
            op: op.into(),
            actual: actual.to_string(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        FrozenArrowError::UnsupportedPattern(msg.into())
    }

    /// True for the one error kind the engine documents a recovery path for.
    pub fn is_unsupported_pattern(&self) -> bool {
        matches!(self, FrozenArrowError::UnsupportedPattern(_))
    }
}

/// The `Result` alias used throughout the FrozenArrow workspace.
pub type Result<T, E = FrozenArrowError> = std::result::Result<T, E>;
