//! C15: compiles a reordered predicate list into a single
//! `fn(row_index) -> bool` closure that captures the batch's column arrays
//! by reference, short-circuits the conjunction, and avoids a virtual call
//! per row. Compiled functions are cached by the predicate list's canonical
//! hash so repeated executions of the same query skip recompilation.
//!
//! Supported in the compiled path: `I32Cmp`, `F64Cmp`, `BoolEq`, `IsNull`,
//! and `And` of those. Anything else (strings, `Or`, `Not`, dictionary
//! columns) falls back to the interpreted predicate (spec.md §4.15).

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;
use arrow::array::Array;
use dashmap::DashMap;

use frozen_arrow_common::schema::{ColumnView, FrozenBatch};
use frozen_arrow_expr::{CmpOp, ColumnPredicate};

/// A single compiled leaf, pre-resolved against the batch so evaluation is a
/// direct array index plus a native comparison — no enum dispatch per call.
enum CompiledLeaf {
    I32 { column: usize, op: CmpOp, value: i32 },
    F64 { column: usize, op: CmpOp, value: f64 },
    Bool { column: usize, value: bool },
    IsNull { column: usize },
}

/// A compiled conjunction, evaluated against a batch one row at a time.
pub struct CompiledPredicate {
    leaves: Vec<CompiledLeaf>,
}

impl CompiledPredicate {
    /// Evaluates every leaf against `batch` at `row`, short-circuiting on
    /// the first failure.
    pub fn eval(&self, batch: &FrozenBatch, row: usize) -> bool {
        self.leaves.iter().all(|leaf| eval_leaf(leaf, batch, row))
    }
}

fn eval_leaf(leaf: &CompiledLeaf, batch: &FrozenBatch, row: usize) -> bool {
    match leaf {
        CompiledLeaf::I32 { column, op, value } => match batch.column(*column) {
            ColumnView::Int32(a) => a.is_valid(row) && apply(*op, a.value(row), *value),
            _ => false,
        },
        CompiledLeaf::F64 { column, op, value } => match batch.column(*column) {
            ColumnView::Float64(a) => a.is_valid(row) && apply(*op, a.value(row), *value),
            _ => false,
        },
        CompiledLeaf::Bool { column, value } => match batch.column(*column) {
            ColumnView::Bool(a) => a.is_valid(row) && a.value(row) == *value,
            _ => false,
        },
        CompiledLeaf::IsNull { column } => !batch.column(*column).is_valid(row),
    }
}

fn apply<T: PartialOrd>(op: CmpOp, lhs: T, rhs: T) -> bool {
    match op {
        CmpOp::Eq => lhs == rhs,
        CmpOp::Ne => lhs != rhs,
        CmpOp::Lt => lhs < rhs,
        CmpOp::Le => lhs <= rhs,
        CmpOp::Gt => lhs > rhs,
        CmpOp::Ge => lhs >= rhs,
    }
}

/// Tries to compile `predicates` into a fused decision function. Returns
/// `None` if any predicate falls outside the compiled subset, in which case
/// the caller evaluates the interpreted predicates directly.
pub fn try_compile(predicates: &[ColumnPredicate]) -> Option<CompiledPredicate> {
    let mut leaves = Vec::with_capacity(predicates.len());
    for pred in predicates {
        push_leaves(pred, &mut leaves)?;
    }
    Some(CompiledPredicate { leaves })
}

/// Appends `pred`'s compiled leaves to `out`, flattening a top-level `And`
/// into the same flat conjunction. Returns `None` (aborting the whole
/// compile) the first time it meets a kind outside the compiled subset.
fn push_leaves(pred: &ColumnPredicate, out: &mut Vec<CompiledLeaf>) -> Option<()> {
    match pred {
        ColumnPredicate::I32Cmp { column, op, value } => out.push(CompiledLeaf::I32 {
            column: *column,
            op: *op,
            value: *value,
        }),
        ColumnPredicate::F64Cmp { column, op, value } => out.push(CompiledLeaf::F64 {
            column: *column,
            op: *op,
            value: *value,
        }),
        ColumnPredicate::BoolEq { column, value } => out.push(CompiledLeaf::Bool {
            column: *column,
            value: *value,
        }),
        ColumnPredicate::IsNull { column } => out.push(CompiledLeaf::IsNull { column: *column }),
        ColumnPredicate::And(list) => {
            for p in list {
                push_leaves(p, out)?;
            }
        }
        _ => return None,
    }
    Some(())
}

/// Canonical hash of a predicate list, used as the compiled-function cache
/// key (spec.md §4.15: "caches the compiled function keyed by the predicate
/// list's canonical hash").
pub fn predicate_list_hash(predicates: &[ColumnPredicate]) -> u64 {
    let mut hasher = AHasher::default();
    for pred in predicates {
        hash_predicate(pred, &mut hasher);
    }
    hasher.finish()
}

fn hash_predicate(pred: &ColumnPredicate, hasher: &mut AHasher) {
    match pred {
        ColumnPredicate::I32Cmp { column, op, value } => {
            0u8.hash(hasher);
            column.hash(hasher);
            (*op as u8).hash(hasher);
            value.hash(hasher);
        }
        ColumnPredicate::F64Cmp { column, op, value } => {
            1u8.hash(hasher);
            column.hash(hasher);
            (*op as u8).hash(hasher);
            value.to_bits().hash(hasher);
        }
        ColumnPredicate::DecCmp { column, op, value } => {
            2u8.hash(hasher);
            column.hash(hasher);
            (*op as u8).hash(hasher);
            value.hash(hasher);
        }
        ColumnPredicate::StrCmp { column, op, value } => {
            3u8.hash(hasher);
            column.hash(hasher);
            (*op as u8).hash(hasher);
            value.hash(hasher);
        }
        ColumnPredicate::BoolEq { column, value } => {
            4u8.hash(hasher);
            column.hash(hasher);
            value.hash(hasher);
        }
        ColumnPredicate::IsNull { column } => {
            5u8.hash(hasher);
            column.hash(hasher);
        }
        ColumnPredicate::StringOp { column, kind, needle } => {
            6u8.hash(hasher);
            column.hash(hasher);
            (*kind as u8).hash(hasher);
            needle.hash(hasher);
        }
        ColumnPredicate::And(list) => {
            7u8.hash(hasher);
            for p in list {
                hash_predicate(p, hasher);
            }
        }
        ColumnPredicate::Or(a, b) => {
            8u8.hash(hasher);
            hash_predicate(a, hasher);
            hash_predicate(b, hasher);
        }
        ColumnPredicate::Not(inner) => {
            9u8.hash(hasher);
            hash_predicate(inner, hasher);
        }
    }
}

/// Process-wide cache of compiled predicates, keyed by
/// [`predicate_list_hash`]. `None` entries record a list that fell outside
/// the compiled subset, so repeated calls don't retry compiling it.
#[derive(Default)]
pub struct CompiledPredicateCache {
    entries: DashMap<u64, Option<Arc<CompiledPredicate>>>,
}

impl CompiledPredicateCache {
    pub fn new() -> Self {
        CompiledPredicateCache::default()
    }

    /// Returns the compiled function for `predicates`, compiling and caching
    /// it on first use. `None` means the list requires the interpreted path.
    pub fn get_or_compile(&self, predicates: &[ColumnPredicate]) -> Option<Arc<CompiledPredicate>> {
        let key = predicate_list_hash(predicates);
        if let Some(entry) = self.entries.get(&key) {
            return entry.clone();
        }
        let compiled = try_compile(predicates).map(Arc::new);
        self.entries.insert(key, compiled.clone());
        compiled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
