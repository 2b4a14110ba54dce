//! The query engine and removal-notification collaborators (§6), expressed
//! as narrow traits the storage core dispatches to rather than owns.
//!
//! Neither a query language nor a scheduler is in scope here (§1 Non-goals);
//! what the core does need is a place to *signal* a table's empty/non-empty
//! transitions, and a place to *notify* that a table's rows are about to be
//! dropped. Both are out-of-scope collaborators named in §6, mirrored here
//! the way the donor crate keeps its `world::Access`/scheduling machinery as
//! separate types the storage layer only calls into, never owns.

use crate::entity::Entity;
use crate::storage::{Row, TableId};

/// Opaque handle to a query, as registered with a [`Table`](crate::storage::Table).
///
/// The storage core never interprets a `QueryId` beyond equality and using it
/// as a key into [`Table::queries`](crate::storage::Table); the query engine
/// that hands these out and interprets them is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryId(u32);

impl QueryId {
    /// Wrap a raw query identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw identifier.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl From<u32> for QueryId {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// The query engine's activation callback (§4.10, §6).
///
/// Activation is a signal, not a state: a `Table` never tracks whether it is
/// "active" for a query. Every empty-to-non-empty or non-empty-to-empty
/// transition on the *committed* Data calls this once per subscribed query
/// (or once for a single query on registration, §4.9); the query engine
/// owns whatever bookkeeping it wants to do with that signal.
pub trait QueryActivation {
    /// Notify that `table` transitioned to (`active == true`) or from
    /// (`active == false`) having at least one row, for `query`.
    fn activate_table(&mut self, query: QueryId, table: TableId, active: bool);
}

impl<T: QueryActivation + ?Sized> QueryActivation for &mut T {
    fn activate_table(&mut self, query: QueryId, table: TableId, active: bool) {
        (**self).activate_table(query, table, active)
    }
}

/// The OnRemove dispatcher (§4.8 `deinit`, §6): notified with the full row
/// range of a table immediately before its rows are dropped, so that
/// per-component remove hooks can run before the data disappears.
pub trait OnRemove {
    /// `table` is about to drop every row in `0..row_count`; `entities`
    /// lists the ids in their current row order.
    fn on_remove(&mut self, table: TableId, entities: &[Entity], first_row: Row);
}

impl<T: OnRemove + ?Sized> OnRemove for &mut T {
    fn on_remove(&mut self, table: TableId, entities: &[Entity], first_row: Row) {
        (**self).on_remove(table, entities, first_row)
    }
}
