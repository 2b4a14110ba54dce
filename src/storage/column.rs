//! Untyped, byte-sized column storage (§3, §9 "Untyped column storage").
//!
//! Unlike the donor crate's `Column`, which is generic over a Rust
//! `Component` type and checks `TypeId`/`Layout` in debug builds, a `Column`
//! here knows only a byte size. This matches the specification directly: a
//! component is described by nothing more than `{size}`, and the core never
//! has a static Rust type to check against. Callers read and write rows as
//! raw `&[u8]`/`&mut [u8]` slices of exactly `size` bytes.
//!
//! A column with `size == 0` (a tag, or any column the caller chooses not to
//! back with memory) never allocates: its `buffer` is `None` and its data
//! pointer is always null, per §3.

use super::mem::{GrowthStrategy, IndexedMemory};
use super::row::Row;
use std::alloc::Layout;

/// A packed, growable array of fixed-size elements, or a bufferless tag
/// column when `size == 0`.
pub struct Column {
    size: usize,
    buffer: Option<IndexedMemory>,
    len: usize,
}

impl Column {
    /// Create a new, empty column for elements of `size` bytes.
    ///
    /// A `size` of 0 creates a tag column: no memory is ever allocated for
    /// it, and every accessor that would otherwise return a byte slice
    /// returns `None`/an empty slice instead.
    pub fn new(size: usize) -> Self {
        let buffer = (size > 0).then(|| {
            let layout = Layout::from_size_align(size, 1).expect("column element size too large");
            IndexedMemory::new(layout, GrowthStrategy::Multiply(2))
        });
        Self {
            size,
            buffer,
            len: 0,
        }
    }

    /// The element size this column was created for.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether this is a bufferless tag column.
    #[inline]
    pub const fn is_tag(&self) -> bool {
        self.size == 0
    }

    /// Number of initialized rows.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the column has no rows.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current reserved capacity in elements (always 0 for a tag column).
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().map_or(0, IndexedMemory::capacity)
    }

    /// Reserve room for `additional` more rows without changing `len`.
    ///
    /// Returns `true` if the reservation caused the backing buffer to grow
    /// past its previous capacity (i.e. a reallocation occurred), which the
    /// caller uses to drive `world.should_resolve` (§5 "Reallocation
    /// visibility").
    pub fn reserve(&mut self, additional: usize) -> bool {
        let Some(buffer) = self.buffer.as_mut() else {
            return false;
        };
        buffer.ensure_capacity(self.len + additional)
    }

    /// Append one uninitialized row, growing the buffer if needed.
    ///
    /// Returns `true` if this reallocated. The caller must write the new
    /// row's bytes before reading them back.
    pub fn push_uninit(&mut self) -> bool {
        let reallocated = self.reserve(1);
        self.len += 1;
        reallocated
    }

    /// Append `count` uninitialized rows in one reservation (§4.4 `grow`).
    pub fn push_n_uninit(&mut self, count: usize) -> bool {
        let reallocated = self.reserve(count);
        self.len += count;
        reallocated
    }

    /// Ensure this column has room for `total` rows altogether, without
    /// advancing `len` (`table_set_size`, §6). Idempotent: calling this
    /// again with the same or a smaller `total` is a no-op.
    pub fn reserve_total(&mut self, total: usize) -> bool {
        let Some(buffer) = self.buffer.as_mut() else {
            return false;
        };
        buffer.ensure_capacity(total)
    }

    /// Borrow the bytes at `row`, or `None` for a tag column or an
    /// out-of-bounds row.
    pub fn get(&self, row: Row) -> Option<&[u8]> {
        let buffer = self.buffer.as_ref()?;
        if row.index() >= self.len {
            return None;
        }
        // SAFETY: row.index() < len <= capacity, and every initialized row
        // was written through `write` before being exposed to a caller.
        let ptr = buffer.ptr_at(row.index());
        Some(unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.size) })
    }

    /// Mutably borrow the bytes at `row`, or `None` for a tag column or an
    /// out-of-bounds row.
    pub fn get_mut(&mut self, row: Row) -> Option<&mut [u8]> {
        if row.index() >= self.len {
            return None;
        }
        let size = self.size;
        let buffer = self.buffer.as_mut()?;
        let ptr = buffer.ptr_at_mut(row.index());
        // SAFETY: row.index() < len <= capacity.
        Some(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    /// Overwrite the bytes at `row` with `value`. `row` must already be an
    /// initialized (`< len`) or freshly-reserved (`< capacity`) slot.
    ///
    /// # Panics
    /// Panics if `value.len() != self.size()` or if this is a tag column.
    pub fn write(&mut self, row: Row, value: &[u8]) {
        assert_eq!(value.len(), self.size, "value size does not match column element size");
        let buffer = self
            .buffer
            .as_mut()
            .expect("cannot write into a tag column");
        debug_assert!(
            row.index() < buffer.capacity(),
            "row index exceeds reserved capacity"
        );
        let ptr = buffer.ptr_at_mut(row.index());
        // SAFETY: ptr is valid for `size` bytes within the reserved capacity.
        unsafe { std::ptr::copy_nonoverlapping(value.as_ptr(), ptr.as_ptr(), self.size) };
    }

    /// Swap-remove `row`: overwrite it with the current last row (a raw
    /// bytewise copy, §4.5) and shrink `len` by one. No-op copy if `row` is
    /// already the last row.
    pub fn swap_remove(&mut self, row: Row) {
        assert!(self.len > 0, "swap_remove on an empty column");
        let last = self.len - 1;
        if let Some(buffer) = self.buffer.as_mut()
            && row.index() != last
        {
            let dst = buffer.ptr_at_mut(row.index());
            let src = buffer.ptr_at(last);
            // SAFETY: dst and src are distinct, valid, non-overlapping ranges
            // of `size` bytes within the buffer's reserved capacity.
            unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), self.size) };
        }
        self.len -= 1;
    }

    /// Exchange the bytes at `r1` and `r2`. No-op if `r1 == r2` (§4.6).
    pub fn swap(&mut self, r1: Row, r2: Row) {
        if r1 == r2 {
            return;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let size = self.size;
        let p1 = buffer.ptr_at_mut(r1.index()).as_ptr();
        let p2 = buffer.ptr_at_mut(r2.index()).as_ptr();
        // SAFETY: p1 != p2 (r1 != r2), both within the buffer's reserved
        // capacity, both `size` bytes wide and non-overlapping.
        unsafe { std::ptr::swap_nonoverlapping(p1, p2, size) };
    }

    /// Copy row `src` on top of row `dst` (a raw bytewise overwrite). Used by
    /// `move_back_and_swap` (§4.7) to shift rows one slot to the left.
    pub fn copy_row(&mut self, dst: Row, src: Row) {
        if dst == src {
            return;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            return;
        };
        let size = self.size;
        let dst_ptr = buffer.ptr_at_mut(dst.index()).as_ptr();
        let src_ptr = buffer.ptr_at(src.index()).as_ptr();
        // SAFETY: dst_ptr != src_ptr, both within reserved capacity.
        unsafe { std::ptr::copy_nonoverlapping(src_ptr, dst_ptr, size) };
    }

    /// Directly set the row count without touching the buffer. Used when a
    /// caller has just written a contiguous run of rows via [`Column::write`]
    /// (matching the donor's "reserve then write then set_len" pattern).
    ///
    /// # Safety
    /// Every row in `0..new_len` must already hold a validly-written value.
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity() || self.is_tag());
        self.len = new_len;
    }

    /// Truncate the column to zero rows, releasing no memory (matches
    /// `clear`, §4.8, which frees the whole buffer at the `Data` level
    /// instead — see [`super::data::Data::clear`]).
    pub fn truncate(&mut self) {
        self.len = 0;
    }

    /// Append `other`'s rows onto the end of this column, taking ownership
    /// of `other`'s buffer outright when this column is currently empty
    /// (§4.12 "transplant when destination is empty").
    pub fn merge_from(&mut self, other: Column) {
        debug_assert_eq!(self.size, other.size, "merge_vector size mismatch");
        if self.is_empty() {
            *self = other;
            return;
        }
        if other.is_empty() {
            return;
        }
        self.reserve(other.len);
        for i in 0..other.len {
            self.push_uninit();
            let row = Row::new(self.len - 1);
            if let Some(bytes) = other.get(Row::new(i)) {
                self.write(row, bytes);
            }
        }
    }
}
