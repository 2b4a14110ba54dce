//! The value-typed body of a table: the entity-id column plus the parallel
//! component columns (§3 "Data").
//!
//! A `Data` is deliberately a plain value type with no identity of its own —
//! it is the thing `replace_columns` (§4.8) swaps wholesale, and the thing a
//! [`Stage`](super::stage::Stage) holds one of per `Type` while mutations are
//! in progress (§4.2).

use crate::component::{ComponentDescriptors, Type};
use crate::entity::Entity;

use super::column::Column;
use super::row::Row;

/// The entity-id column plus one `Column` per entry of a `Type`, in lockstep.
pub struct Data {
    entities: Vec<Entity>,
    columns: Vec<Column>,
}

impl Data {
    /// Allocate a `Data` with one column per id in `ty`, consulting
    /// `descriptors` for each id's size per §4.1:
    /// - a positive-size descriptor becomes a data-bearing column of that size;
    /// - a zero-size (tag) descriptor, or no descriptor at all (relation id),
    ///   becomes a bufferless column.
    pub fn new(ty: &Type, descriptors: &impl ComponentDescriptors) -> Self {
        let columns = ty
            .ids()
            .iter()
            .map(|id| {
                let size = descriptors.describe(*id).column_size().unwrap_or(0);
                Column::new(size)
            })
            .collect();
        Self {
            entities: Vec::new(),
            columns,
        }
    }

    /// Row count. The entity column's length is authoritative (§5 "Ordering
    /// guarantees").
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether this `Data` currently has zero rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Borrow the entity-id column.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Borrow the component columns, parallel to the owning table's `Type`.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Mutably borrow the component columns.
    #[inline]
    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Borrow a single column by its position in the owning table's `Type`.
    #[inline]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Mutably borrow a single column by its position in the owning table's
    /// `Type`.
    #[inline]
    pub fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    /// Append one uninitialized row for `entity` (§4.3 step 1-2).
    ///
    /// Returns the new row and whether any column buffer reallocated.
    pub fn push_row(&mut self, entity: Entity) -> (Row, bool) {
        self.entities.push(entity);
        let row = Row::new(self.entities.len() - 1);
        let mut reallocated = false;
        for column in &mut self.columns {
            reallocated |= column.push_uninit();
        }
        (row, reallocated)
    }

    /// Append `count` contiguous uninitialized rows whose entity ids are
    /// `first_entity, first_entity+1, ...` (§4.4).
    ///
    /// Returns the first new row and whether any column buffer reallocated.
    pub fn grow_rows(&mut self, count: usize, first_entity: Entity) -> (Row, bool) {
        let first_row = Row::new(self.entities.len());
        self.entities
            .extend((0..count as u64).map(|i| Entity::from_raw(first_entity.to_raw() + i)));
        let mut reallocated = false;
        for column in &mut self.columns {
            reallocated |= column.push_n_uninit(count);
        }
        (first_row, reallocated)
    }

    /// Swap-remove `row` (§4.5): if it is the last row, simply pop every
    /// column; otherwise overwrite it with the current last row and
    /// truncate. Returns the entity that was moved into `row`, or `None` if
    /// `row` was already the last row (nothing moved).
    pub fn swap_remove(&mut self, row: Row) -> Option<Entity> {
        let last = self.entities.len() - 1;
        let moved = if row.index() == last {
            None
        } else {
            Some(self.entities[last])
        };

        if let Some(moved) = moved {
            self.entities[row.index()] = moved;
        }
        self.entities.truncate(last);

        for column in &mut self.columns {
            column.swap_remove(row);
        }

        moved
    }

    /// Exchange rows `r1` and `r2` (§4.6). No-op if equal.
    pub fn swap(&mut self, r1: Row, r2: Row) {
        if r1 == r2 {
            return;
        }
        self.entities.swap(r1.index(), r2.index());
        for column in &mut self.columns {
            column.swap(r1, r2);
        }
    }

    /// Rotate the window `[row-1, row+count-1]` one slot to the left (§4.7):
    /// the element at `row-1` is saved, `row..row+count-1` shifts down to
    /// `row-1..row+count-2`, and the saved element lands at `row+count-1`.
    pub fn move_back_and_swap(&mut self, row: usize, count: usize) {
        if count == 0 {
            return;
        }
        let saved_entity = self.entities[row - 1];
        for i in 0..count {
            self.entities[row - 1 + i] = self.entities[row + i];
        }
        self.entities[row - 1 + count] = saved_entity;

        for column in &mut self.columns {
            let saved: Option<Vec<u8>> = column.get(Row::new(row - 1)).map(<[u8]>::to_vec);
            for i in 0..count {
                column.copy_row(Row::new(row - 1 + i), Row::new(row + i));
            }
            if let Some(saved) = saved {
                column.write(Row::new(row - 1 + count), &saved);
            }
        }
    }

    /// Append `other`'s entity ids onto this `Data`'s entity column,
    /// leaving `other`'s entity column empty (§4.11 step 4). Component
    /// columns are merged separately, column by column, since a merge may
    /// drop ids the destination type doesn't carry.
    pub(crate) fn append_entities_from(&mut self, other: &mut Data) {
        self.entities.append(&mut other.entities);
    }

    /// Ensure every column has room for `size` rows altogether without
    /// changing the current row count (`table_set_size`, §6). Returns
    /// whether any column buffer reallocated, for the same
    /// `world.should_resolve` bookkeeping `push_row`/`grow_rows` drive.
    pub fn set_size(&mut self, size: usize) -> bool {
        if size > self.entities.capacity() {
            self.entities.reserve(size - self.entities.len());
        }
        let mut reallocated = false;
        for column in &mut self.columns {
            reallocated |= column.reserve_total(size);
        }
        reallocated
    }

    /// Free every column's buffer and truncate all rows to zero (§4.8
    /// `clear`). The entity column is cleared too.
    pub fn clear(&mut self) {
        self.entities.clear();
        for column in &mut self.columns {
            *column = Column::new(column.size());
        }
    }

    /// Cross-check of the invariant in §8: every column's length matches the
    /// entity column's length. Raised as a real, always-checked error rather
    /// than a debug assertion, since a divergence here means some earlier
    /// mutation left two columns out of lockstep — a real bug, not a
    /// debug-only sanity net.
    pub fn verify_invariants(&self) -> crate::error::Result<()> {
        let n = self.len();
        for (i, column) in self.columns.iter().enumerate() {
            if column.len() != n {
                return Err(crate::error::StorageError::Internal {
                    kind: crate::error::InternalErrorKind::ColumnLengthMismatch {
                        expected: n,
                        found: column.len(),
                    },
                });
            }
            debug_assert!(
                !column.is_tag() || column.capacity() == 0,
                "tag column {i} unexpectedly has a buffer"
            );
        }
        Ok(())
    }
}
