//! The ownership context a table's mutation operations are threaded through
//! (§5 "Ownership", §6).
//!
//! The storage core does not own an entity index, a component descriptor
//! table, a query engine, or an OnRemove dispatcher — it only ever borrows
//! them for the duration of one call. `World` is generic over all four so
//! that a caller's concrete types flow straight through without the core
//! ever boxing or downcasting them, matching the donor crate's habit of
//! keeping its `TypeRegistry`/`Archetypes` collaborators as plain fields a
//! caller assembles rather than hiding them behind one god object.
use crate::component::ComponentDescriptors;
use crate::query::QueryActivation;
use crate::storage::EntityIndex;

/// The external state every table mutation operation needs access to.
///
/// - `in_progress`: when `true`, mutations target per-stage shadow `Data`
///   and suppress activation (§5 "Scheduling model"). A caller flips this
///   around a batch of staged work; the core itself never sets it.
/// - `should_resolve`: latched `true` by the core whenever a grow on the
///   *committed* Data reallocates a column buffer (§5 "Reallocation
///   visibility"). A caller should clear it after resolving any cached
///   pointers and consult it before trusting one.
pub struct World<I, D, Q, R> {
    /// Whether mutations are currently staged rather than committed.
    pub in_progress: bool,
    /// Set by the core when committed column storage has reallocated.
    pub should_resolve: bool,
    /// Maps entity ids to the table and row they currently occupy.
    pub entity_index: I,
    /// Resolves entity ids appearing in a `Type` to their column layout.
    pub descriptors: D,
    /// Receives activation signals for tables' empty/non-empty transitions.
    pub queries: Q,
    /// Receives notification before a table's rows are dropped.
    pub on_remove: R,
}

impl<I, D, Q, R> World<I, D, Q, R>
where
    I: EntityIndex,
    D: ComponentDescriptors,
    Q: QueryActivation,
    R: crate::query::OnRemove,
{
    /// Assemble a world from its four collaborators, outside of any
    /// in-progress staging batch.
    pub fn new(entity_index: I, descriptors: D, queries: Q, on_remove: R) -> Self {
        Self {
            in_progress: false,
            should_resolve: false,
            entity_index,
            descriptors,
            queries,
            on_remove,
        }
    }
}
