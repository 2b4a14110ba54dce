//! Error classes for the storage core (§7).
//!
//! The donor crate hand-rolls its few error types (e.g. `world::access::ConflictError`)
//! with a manual `Display` impl and no error-derive dependency. This core's error
//! surface covers two genuinely distinct fatal classes, so it reaches for
//! `thiserror` instead, following the convention used throughout the wider
//! example pack for this shape of error enum.

use thiserror::Error;

use crate::storage::Row;

/// The two fatal error classes a mutation operation can raise, per §7.
///
/// Both are fatal: there is no retry and no backpressure at this layer. A
/// caller that receives either should treat the table (or the whole world)
/// as unusable going forward.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A column, `Data` envelope, or growth could not be allocated.
    ///
    /// Rust's global allocator aborts the process on true allocation
    /// failure rather than returning an error the way C's `malloc` would, so
    /// in practice this variant is raised only for layout computations that
    /// would overflow `isize` (detected before ever calling into the
    /// allocator), not for a null pointer coming back from `alloc`.
    #[error("allocation failure while {context}")]
    OutOfMemory {
        /// What the core was trying to allocate for, e.g. "growing column 2".
        context: &'static str,
    },

    /// A collaborator, row index, or column state violated a core invariant.
    #[error("internal invariant violation: {kind}")]
    Internal {
        /// The specific invariant that was violated.
        kind: InternalErrorKind,
    },
}

/// The specific internal invariants [`StorageError::Internal`] can report.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InternalErrorKind {
    /// `delete` was asked to remove a row from a table with zero rows.
    #[error("delete from an empty table")]
    DeleteFromEmptyTable,

    /// A row index was out of the table's current bounds.
    #[error("row {row:?} out of bounds (row count {row_count})")]
    RowOutOfBounds {
        /// The offending row.
        row: Row,
        /// The table's row count at the time of the access.
        row_count: usize,
    },

    /// `merge`'s destination type was not a superset of the source type.
    #[error("merge destination type is not a superset of the source type")]
    MergeNotSuperset,

    /// `merge` was called with `old_table == new_table`.
    #[error("merge called with identical source and destination tables")]
    MergeSameTable,

    /// Two columns that should carry the same row count diverged.
    #[error("column length mismatch: expected {expected}, found {found}")]
    ColumnLengthMismatch {
        /// The row count every column should carry.
        expected: usize,
        /// The row count actually observed on the offending column.
        found: usize,
    },
}

/// Convenience alias for fallible storage-core operations.
pub type Result<T> = std::result::Result<T, StorageError>;
