//! A table: the owner of one archetype's identity, its committed `Data`,
//! its query subscriptions, and the mutation operations exposed to the rest
//! of the runtime (§2, §4, §6).
//!
//! Grounded on the donor crate's `storage::Table`, which likewise bundles an
//! id, an entity column, and a set of component columns behind inherent
//! methods rather than free functions — generalized here to the
//! byte-size-erased [`Data`]/[`Column`] model and to the explicit
//! `World`/`Stage` threading the specification calls for.

use crate::component::{ComponentDescriptors, Type};
use crate::entity::Entity;
use crate::error::{InternalErrorKind, Result, StorageError};
use crate::query::{OnRemove, QueryActivation, QueryId};
use crate::storage::index::{EntityIndex, EntityRecord};
use crate::world::World;

use super::data::Data;
use super::row::Row;
use super::stage::Stage;

/// Ids at or below this value are reserved for built-in components; a
/// table whose `Type` contains one gets [`TableFlags::HAS_BUILTINS`].
///
/// Not specified numerically by the specification; chosen here the way a
/// caller wiring a real type registry would — a low, fixed range of
/// well-known ids allocated before any user component. Recorded as an open
/// decision in `DESIGN.md`.
pub const LAST_BUILTIN_ID: u64 = 255;

/// The built-in "Prefab" tag id. A table whose `Type` contains it gets
/// [`TableFlags::IS_PREFAB`].
pub const PREFAB_ID: Entity = Entity::from_raw(3);

/// The identifier for a table, assigned by whatever owns the table
/// collection (out of scope here — this core only ever receives one).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(u32);

impl TableId {
    /// Wrap a raw table identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw identifier.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Bit flags derived once, at `Data` creation, from a table's `Type` (§3).
///
/// Flags are never recomputed after construction: adding or removing a
/// builtin or prefab id from a table's type would require creating a new
/// table under the new `Type` anyway (a table's `Type` is immutable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableFlags(u32);

impl TableFlags {
    /// No flags set.
    pub const NONE: TableFlags = TableFlags(0);
    /// The table's type contains an id `<= LAST_BUILTIN_ID`.
    pub const HAS_BUILTINS: TableFlags = TableFlags(1 << 0);
    /// The table's type contains the Prefab tag.
    pub const IS_PREFAB: TableFlags = TableFlags(1 << 1);

    /// Derive the flags implied by `ty`.
    fn derive(ty: &Type) -> Self {
        let mut flags = Self::NONE;
        if ty.ids().iter().any(|id| id.to_raw() <= LAST_BUILTIN_ID) {
            flags = flags | Self::HAS_BUILTINS;
        }
        if ty.contains(PREFAB_ID) {
            flags = flags | Self::IS_PREFAB;
        }
        flags
    }

    /// Whether every bit in `other` is set in `self`.
    #[inline]
    pub const fn contains(&self, other: TableFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TableFlags {
    type Output = TableFlags;
    #[inline]
    fn bitor(self, rhs: TableFlags) -> TableFlags {
        TableFlags(self.0 | rhs.0)
    }
}

/// An archetype table: immutable `Type`, mutable committed `Data`, mutable
/// query subscription list, and flags derived once from the `Type` (§3).
pub struct Table {
    id: TableId,
    ty: Type,
    data: Data,
    queries: Vec<QueryId>,
    flags: TableFlags,
}

impl Table {
    /// `table_init` (§4.1): allocate a table's committed `Data` for `ty`,
    /// consulting `descriptors` for column sizes and deriving `flags` from
    /// `ty` once.
    pub fn new(id: TableId, ty: Type, descriptors: &impl ComponentDescriptors) -> Self {
        let flags = TableFlags::derive(&ty);
        let data = Data::new(&ty, descriptors);
        Self {
            id,
            ty,
            data,
            queries: Vec::new(),
            flags,
        }
    }

    /// This table's identifier.
    #[inline]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// This table's archetype identity.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The flags derived from this table's `Type` at construction.
    #[inline]
    pub fn flags(&self) -> TableFlags {
        self.flags
    }

    /// The query ids currently subscribed to this table.
    #[inline]
    pub fn queries(&self) -> &[QueryId] {
        &self.queries
    }

    /// Number of rows in the committed `Data`.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Whether the committed `Data` has zero rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read-only access to the committed `Data`.
    #[inline]
    pub fn committed_data(&self) -> &Data {
        &self.data
    }

    /// Mutable access to the committed `Data`, for callers writing
    /// component values into rows just reserved by `insert`/`grow`.
    #[inline]
    pub fn committed_data_mut(&mut self) -> &mut Data {
        &mut self.data
    }

    /// `get_data` (§4.2): resolve the `Data` that mutations should target.
    ///
    /// Returns the committed `Data` when `world.in_progress` is `false`;
    /// otherwise returns (creating if necessary) this table's shadow `Data`
    /// in `stage`.
    pub fn get_data<'a, I, D, Q, R>(
        &'a mut self,
        world: &World<I, D, Q, R>,
        stage: &'a mut Stage,
    ) -> &'a mut Data
    where
        D: ComponentDescriptors,
    {
        if world.in_progress {
            stage.data_for(&self.ty, &world.descriptors)
        } else {
            &mut self.data
        }
    }

    fn activate<I, D, Q, R>(&self, world: &mut World<I, D, Q, R>, query: Option<QueryId>, active: bool)
    where
        Q: QueryActivation,
    {
        log::trace!("table {:?} activation signal active={active}", self.id);
        match query {
            Some(query) => world.queries.activate_table(query, self.id, active),
            None => {
                for &query in &self.queries {
                    world.queries.activate_table(query, self.id, active);
                }
            }
        }
    }

    /// `table_insert` (§4.3): append one uninitialized row for `entity`.
    pub fn insert<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>, stage: &mut Stage, entity: Entity) -> Row
    where
        I: EntityIndex,
        D: ComponentDescriptors,
        Q: QueryActivation,
    {
        let in_progress = world.in_progress;
        let (row, reallocated, became_first) = if in_progress {
            let data = stage.data_for(&self.ty, &world.descriptors);
            let (row, reallocated) = data.push_row(entity);
            (row, reallocated, false)
        } else {
            let was_empty = self.data.is_empty();
            let (row, reallocated) = self.data.push_row(entity);
            (row, reallocated, was_empty)
        };

        if !in_progress {
            if became_first {
                self.activate(world, None, true);
            }
            if reallocated {
                log::trace!("table {:?} column reallocated on insert, marking should_resolve", self.id);
                world.should_resolve = true;
            }
            world.entity_index.set(entity, EntityRecord::new(self.ty.clone(), row));
        }

        row
    }

    /// `table_grow` (§4.4): bulk-append `count` contiguous uninitialized
    /// rows whose entity ids start at `first_entity`.
    pub fn grow<I, D, Q, R>(
        &mut self,
        world: &mut World<I, D, Q, R>,
        stage: &mut Stage,
        count: usize,
        first_entity: Entity,
    ) -> Row
    where
        I: EntityIndex,
        D: ComponentDescriptors,
        Q: QueryActivation,
    {
        let in_progress = world.in_progress;
        let (first_row, reallocated, became_first) = if in_progress {
            let data = stage.data_for(&self.ty, &world.descriptors);
            let was_empty = data.is_empty();
            let (first_row, reallocated) = data.grow_rows(count, first_entity);
            (first_row, reallocated, was_empty)
        } else {
            let was_empty = self.data.is_empty();
            let (first_row, reallocated) = self.data.grow_rows(count, first_entity);
            (first_row, reallocated, was_empty)
        };

        if !in_progress {
            if became_first && count > 0 {
                self.activate(world, None, true);
            }
            if reallocated {
                log::trace!("table {:?} column reallocated on grow, marking should_resolve", self.id);
                world.should_resolve = true;
            }
            for i in 0..count {
                let entity = Entity::from_raw(first_entity.to_raw() + i as u64);
                world
                    .entity_index
                    .set(entity, EntityRecord::new(self.ty.clone(), Row::new(first_row.index() + i)));
            }
        }

        first_row
    }

    /// `table_delete` (§4.5): swap-remove `row` from the committed `Data`.
    pub fn delete<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>, stage: &mut Stage, row: Row) -> Result<()>
    where
        I: EntityIndex,
        D: ComponentDescriptors,
        Q: QueryActivation,
    {
        let in_progress = world.in_progress;
        let row_count = if in_progress {
            stage.data_for(&self.ty, &world.descriptors).len()
        } else {
            self.data.len()
        };
        if row_count == 0 {
            return Err(StorageError::Internal { kind: InternalErrorKind::DeleteFromEmptyTable });
        }
        if row.index() >= row_count {
            return Err(StorageError::Internal {
                kind: InternalErrorKind::RowOutOfBounds { row, row_count },
            });
        }

        let moved = if in_progress {
            stage.data_for(&self.ty, &world.descriptors).swap_remove(row)
        } else {
            self.data.swap_remove(row)
        };

        if let Some(moved_entity) = moved {
            let record = EntityRecord::new(self.ty.clone(), row);
            // §3/§4.5: while in-progress, a row move on the shadow `Data`
            // must update the per-stage overlay, not the committed index —
            // a query may still be iterating the committed table.
            if in_progress {
                stage.set_entity(moved_entity, record);
            } else {
                world.entity_index.set(moved_entity, record);
            }
        }

        if !in_progress && self.data.is_empty() {
            self.activate(world, None, false);
        }

        Ok(())
    }

    /// `table_swap` (§4.6): exchange rows `r1` and `r2`.
    pub fn swap<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>, stage: &mut Stage, r1: Row, r2: Row)
    where
        I: EntityIndex,
        D: ComponentDescriptors,
    {
        if r1 == r2 {
            return;
        }
        let in_progress = world.in_progress;
        let (e1, e2) = {
            let data = if in_progress {
                stage.data_for(&self.ty, &world.descriptors)
            } else {
                &mut self.data
            };
            data.swap(r1, r2);
            (data.entities()[r1.index()], data.entities()[r2.index()])
        };
        let rec1 = EntityRecord::new(self.ty.clone(), r1);
        let rec2 = EntityRecord::new(self.ty.clone(), r2);
        // §3/§4.6: the shadow case routes to the per-stage overlay, same as
        // `delete` above.
        if in_progress {
            stage.set_entity(e1, rec1);
            stage.set_entity(e2, rec2);
        } else {
            world.entity_index.set(e1, rec1);
            world.entity_index.set(e2, rec2);
        }
    }

    /// `table_move_back_and_swap` (§4.7): rotate the window
    /// `[row-1, row+count-1]` one slot to the left.
    pub fn move_back_and_swap<I, D, Q, R>(
        &mut self,
        world: &mut World<I, D, Q, R>,
        stage: &mut Stage,
        row: usize,
        count: usize,
    ) where
        I: EntityIndex,
        D: ComponentDescriptors,
    {
        if count == 0 {
            return;
        }
        let in_progress = world.in_progress;
        let moved: Vec<(Entity, usize)> = {
            let data = if in_progress {
                stage.data_for(&self.ty, &world.descriptors)
            } else {
                &mut self.data
            };
            data.move_back_and_swap(row, count);
            ((row - 1)..(row + count)).map(|i| (data.entities()[i], i)).collect()
        };
        // §3/§4.7: same overlay routing as `delete`/`swap`.
        for (entity, i) in moved {
            let record = EntityRecord::new(self.ty.clone(), Row::new(i));
            if in_progress {
                stage.set_entity(entity, record);
            } else {
                world.entity_index.set(entity, record);
            }
        }
    }

    /// `table_set_size` (§6): ensure the working `Data` has room for `size`
    /// rows altogether without changing the current row count. Not called
    /// out with its own numbered subsection in §4, but named among the
    /// core's exposed operations in §6 — callers use it to pre-size a table
    /// before a bulk `insert`/`grow` burst they know the count of in
    /// advance, avoiding repeated reallocation.
    pub fn set_size<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>, stage: &mut Stage, size: usize)
    where
        D: ComponentDescriptors,
    {
        let in_progress = world.in_progress;
        let reallocated = if in_progress {
            stage.data_for(&self.ty, &world.descriptors).set_size(size)
        } else {
            self.data.set_size(size)
        };

        if !in_progress && reallocated {
            log::trace!("table {:?} column reallocated on set_size({size}), marking should_resolve", self.id);
            world.should_resolve = true;
        }
    }

    /// `table_clear` (§4.8): free every column buffer. Does not invoke
    /// OnRemove; used for rollback.
    pub fn clear<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>)
    where
        Q: QueryActivation,
    {
        let had_rows = !self.data.is_empty();
        self.data.clear();
        if had_rows {
            self.activate(world, None, false);
        }
    }

    /// `table_replace_columns` (§4.8): install `new_data` as the committed
    /// `Data`, firing activation if emptiness changed.
    ///
    /// The donor specification's equivalent C routine frees the old
    /// columns and then indexes through the table's data pointer again,
    /// which is a use-after-free on a literal translation. Taking the
    /// previous `Data` out by value before installing the new one (as done
    /// here) makes that hazard structurally impossible: the old `Data` is
    /// simply dropped once this function returns.
    pub fn replace_columns<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>, new_data: Data)
    where
        Q: QueryActivation,
    {
        let was_empty = self.data.is_empty();
        let will_be_empty = new_data.is_empty();
        log::debug!("table {:?} replace_columns ({} -> {} rows)", self.id, self.data.len(), new_data.len());
        self.data = new_data;

        if was_empty && !will_be_empty {
            self.activate(world, None, true);
        } else if !was_empty && will_be_empty {
            self.activate(world, None, false);
        }
    }

    /// `table_deinit` (§4.8): if the table has rows, notify the OnRemove
    /// dispatcher across the full row range before any further teardown.
    pub fn deinit<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>)
    where
        R: OnRemove,
    {
        if !self.data.is_empty() {
            world.on_remove.on_remove(self.id, self.data.entities(), Row::new(0));
        }
    }

    /// `table_delete_all` (§4.8): `deinit` followed by `clear`.
    pub fn delete_all<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>)
    where
        Q: QueryActivation,
        R: OnRemove,
    {
        self.deinit(world);
        self.clear(world);
    }

    /// `table_free` (§4.8): release the committed `Data` and the query
    /// subscription list. No OnRemove, no activation — used during world
    /// teardown, where every collaborator is being torn down together.
    pub fn free(&mut self) {
        self.data.clear();
        self.queries.clear();
    }

    /// `table_register_query` (§4.9): subscribe `query` to this table,
    /// activating it immediately if the table already has rows.
    pub fn register_query<I, D, Q, R>(&mut self, world: &mut World<I, D, Q, R>, query: QueryId)
    where
        Q: QueryActivation,
    {
        self.queries.push(query);
        if !self.data.is_empty() {
            self.activate(world, Some(query), true);
        }
    }

    /// `table_merge` (§4.11), full contract including the "new_table is
    /// null" case: delegate to [`Table::delete_all`] when there is no
    /// destination table, otherwise behave as [`Table::merge`].
    pub fn merge_into<I, D, Q, R>(
        new_table: Option<&mut Table>,
        old_table: &mut Table,
        world: &mut World<I, D, Q, R>,
    ) -> Result<()>
    where
        I: EntityIndex,
        Q: QueryActivation,
        R: OnRemove,
    {
        match new_table {
            Some(new_table) => Table::merge(new_table, old_table, world),
            None => {
                log::debug!("table {:?} merge target is null, deleting all rows instead", old_table.id);
                old_table.delete_all(world);
                Ok(())
            }
        }
    }

    /// `table_merge` (§4.11): move every row of `old_table` into
    /// `new_table`, appending.
    ///
    /// Preconditions (§4.11): `old_table` and `new_table` are distinct
    /// tables of distinct types, and `new_table.ty()` is a superset of
    /// `old_table.ty()`. Violations are reported as
    /// [`InternalErrorKind::MergeSameTable`] /
    /// [`InternalErrorKind::MergeNotSuperset`] rather than panicking, since
    /// a caller assembling a merge plan from external type information can
    /// legitimately hit them.
    pub fn merge<I, D, Q, R>(new_table: &mut Table, old_table: &mut Table, world: &mut World<I, D, Q, R>) -> Result<()>
    where
        I: EntityIndex,
    {
        if new_table.ty == old_table.ty {
            return Err(StorageError::Internal { kind: InternalErrorKind::MergeSameTable });
        }
        if !new_table.ty.is_superset_of(&old_table.ty) {
            return Err(StorageError::Internal { kind: InternalErrorKind::MergeNotSuperset });
        }

        let new_row_count = new_table.data.len();
        let old_count = old_table.data.len();
        log::debug!(
            "merging table {:?} ({old_count} rows) into table {:?} ({new_row_count} rows)",
            old_table.id,
            new_table.id
        );

        // Step 1 (§4.11, §9 open question): the row written here is
        // literally `i + new_row_count`, 0-based, matching the
        // specification's preserved (not "corrected") convention.
        for (i, &entity) in old_table.data.entities().iter().enumerate() {
            world.entity_index.set(
                entity,
                EntityRecord::from_raw(new_table.ty.clone(), (i + new_row_count) as u32),
            );
        }

        if old_count == 0 {
            return Ok(());
        }

        // Step 3: walk both ordered type arrays in parallel, merging
        // matching data-bearing columns and discarding columns the new
        // type doesn't carry. A new-only column (one `new_table.ty` has
        // and `old_table.ty` doesn't) has no source to merge from, but it
        // must still grow by `old_count` uninitialized rows to keep pace
        // with the appended entity rows — otherwise it is left `old_count`
        // rows short of every other column (§8 length invariant, spec
        // scenario 5), which is the common "add one component" promotion
        // path, not a corner case.
        let new_ids = new_table.ty.ids();
        let old_ids = old_table.ty.ids();
        let mut i_new = 0usize;
        for (i_old, &old_id) in old_ids.iter().enumerate() {
            if old_id.is_relation() {
                continue;
            }
            while i_new < new_ids.len() && new_ids[i_new] < old_id {
                new_table
                    .data
                    .column_mut(i_new)
                    .expect("new column index in bounds")
                    .push_n_uninit(old_count);
                i_new += 1;
            }
            if i_new >= new_ids.len() || new_ids[i_new] != old_id {
                return Err(StorageError::Internal { kind: InternalErrorKind::MergeNotSuperset });
            }
            let old_size = old_table.data.column(i_old).map(|c| c.size()).unwrap_or(0);
            let taken = std::mem::replace(
                old_table.data.column_mut(i_old).expect("old column index in bounds"),
                super::column::Column::new(old_size),
            );
            new_table
                .data
                .column_mut(i_new)
                .expect("new column index in bounds")
                .merge_from(taken);
            i_new += 1;
        }
        // Any new-only columns after the last matched old id also need
        // growing by `old_count` rows.
        while i_new < new_ids.len() {
            new_table
                .data
                .column_mut(i_new)
                .expect("new column index in bounds")
                .push_n_uninit(old_count);
            i_new += 1;
        }

        // Step 4: merge the entity columns themselves.
        new_table.data.append_entities_from(&mut old_table.data);

        new_table.data.verify_invariants()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::MapDescriptors;
    use crate::query::OnRemove;
    use crate::storage::HashEntityIndex;

    #[derive(Default)]
    struct RecordingCollaborators {
        activations: Vec<(QueryId, TableId, bool)>,
        removed: Vec<(TableId, usize)>,
    }

    impl QueryActivation for RecordingCollaborators {
        fn activate_table(&mut self, query: QueryId, table: TableId, active: bool) {
            self.activations.push((query, table, active));
        }
    }

    impl OnRemove for RecordingCollaborators {
        fn on_remove(&mut self, table: TableId, entities: &[Entity], _first_row: Row) {
            self.removed.push((table, entities.len()));
        }
    }

    fn test_world() -> World<HashEntityIndex, MapDescriptors, RecordingCollaborators, RecordingCollaborators> {
        World::new(
            HashEntityIndex::new(),
            MapDescriptors::new(),
            RecordingCollaborators::default(),
            RecordingCollaborators::default(),
        )
    }

    fn data_component(descriptors: &MapDescriptors, raw: u64, size: usize) -> Entity {
        let id = Entity::from_raw(raw);
        descriptors.register_data(id, size);
        id
    }

    #[test]
    fn insert_activates_on_first_row_and_updates_entity_index() {
        let mut world = test_world();
        let position = data_component(&world.descriptors, 10, 8);
        let ty = Type::new(vec![position]);
        let mut table = Table::new(TableId::new(1), ty.clone(), &world.descriptors);
        let mut stage = Stage::new();

        let row = table.insert(&mut world, &mut stage, Entity::from_raw(1000));

        assert_eq!(row, Row::new(0));
        assert_eq!(world.queries.activations, vec![(QueryId::new(0), TableId::new(1), true)]);
        assert_eq!(
            world.entity_index.get(Entity::from_raw(1000)).unwrap().row_index(),
            Some(Row::new(0))
        );

        // A second insert must not re-activate.
        table.insert(&mut world, &mut stage, Entity::from_raw(1001));
        assert_eq!(world.queries.activations.len(), 1);
    }

    #[test]
    fn insert_during_in_progress_does_not_activate_or_touch_committed_data() {
        let mut world = test_world();
        let health = data_component(&world.descriptors, 11, 4);
        let ty = Type::new(vec![health]);
        let mut table = Table::new(TableId::new(2), ty, &world.descriptors);
        table.register_query(&mut world, QueryId::new(5));
        world.queries.activations.clear();
        let mut stage = Stage::new();

        world.in_progress = true;
        table.insert(&mut world, &mut stage, Entity::from_raw(2000));

        assert!(world.queries.activations.is_empty());
        assert_eq!(table.count(), 0);
    }

    #[test]
    fn delete_during_in_progress_updates_the_stage_overlay_not_the_committed_index() {
        // Given: two committed rows, then a staged delete of one of them.
        let mut world = test_world();
        let mut table = Table::new(TableId::new(15), Type::new(vec![]), &world.descriptors);
        let mut stage = Stage::new();
        let e1 = Entity::from_raw(10);
        let e2 = Entity::from_raw(20);
        table.insert(&mut world, &mut stage, e1);
        table.insert(&mut world, &mut stage, e2);
        // Seed the shadow Data with the same two rows, mirroring a staged
        // copy-on-write snapshot of the committed table.
        world.in_progress = true;
        table.insert(&mut world, &mut stage, e1);
        table.insert(&mut world, &mut stage, e2);
        let committed_record_before = world.entity_index.get(e2).unwrap().clone();

        // When: deleting row 0 of the shadow Data swap-removes e2 into e1's slot.
        table.delete(&mut world, &mut stage, Row::new(0)).unwrap();

        // Then: the committed index for e2 must be untouched (still row 1,
        // from the very first, non-staged insert)...
        assert_eq!(world.entity_index.get(e2).unwrap(), &committed_record_before);
        // ...while the per-stage overlay reflects the shadow row move.
        assert_eq!(stage.get_entity(e2).unwrap().row_index(), Some(Row::new(0)));
    }

    #[test]
    fn swap_during_in_progress_updates_the_stage_overlay_not_the_committed_index() {
        let mut world = test_world();
        let mut table = Table::new(TableId::new(16), Type::new(vec![]), &world.descriptors);
        let mut stage = Stage::new();
        let e1 = Entity::from_raw(1);
        let e2 = Entity::from_raw(2);
        table.insert(&mut world, &mut stage, e1);
        table.insert(&mut world, &mut stage, e2);
        let committed_e1_before = world.entity_index.get(e1).unwrap().clone();
        let committed_e2_before = world.entity_index.get(e2).unwrap().clone();

        world.in_progress = true;
        table.insert(&mut world, &mut stage, e1);
        table.insert(&mut world, &mut stage, e2);

        table.swap(&mut world, &mut stage, Row::new(0), Row::new(1));

        assert_eq!(world.entity_index.get(e1).unwrap(), &committed_e1_before);
        assert_eq!(world.entity_index.get(e2).unwrap(), &committed_e2_before);
        assert_eq!(stage.get_entity(e1).unwrap().row_index(), Some(Row::new(1)));
        assert_eq!(stage.get_entity(e2).unwrap().row_index(), Some(Row::new(0)));
    }

    #[test]
    fn delete_last_row_deactivates() {
        let mut world = test_world();
        let ty = Type::new(vec![]);
        let mut table = Table::new(TableId::new(3), ty, &world.descriptors);
        let mut stage = Stage::new();
        let row = table.insert(&mut world, &mut stage, Entity::from_raw(1));

        table.delete(&mut world, &mut stage, row).unwrap();

        assert!(table.is_empty());
        assert!(world.queries.activations.iter().any(|&(_, _, active)| !active));
    }

    #[test]
    fn delete_from_empty_table_is_an_error() {
        let mut world = test_world();
        let mut table = Table::new(TableId::new(4), Type::new(vec![]), &world.descriptors);
        let mut stage = Stage::new();

        let err = table.delete(&mut world, &mut stage, Row::new(0)).unwrap_err();

        assert!(matches!(
            err,
            StorageError::Internal { kind: InternalErrorKind::DeleteFromEmptyTable }
        ));
    }

    #[test]
    fn register_query_on_nonempty_table_activates_immediately() {
        let mut world = test_world();
        let mut table = Table::new(TableId::new(5), Type::new(vec![]), &world.descriptors);
        let mut stage = Stage::new();
        table.insert(&mut world, &mut stage, Entity::from_raw(1));
        world.queries.activations.clear();

        table.register_query(&mut world, QueryId::new(9));

        assert_eq!(world.queries.activations, vec![(QueryId::new(9), TableId::new(5), true)]);
    }

    #[test]
    fn deinit_notifies_on_remove_only_when_nonempty() {
        let mut world = test_world();
        let mut table = Table::new(TableId::new(6), Type::new(vec![]), &world.descriptors);
        let mut stage = Stage::new();

        table.deinit(&mut world);
        assert!(world.on_remove.removed.is_empty());

        table.insert(&mut world, &mut stage, Entity::from_raw(1));
        table.deinit(&mut world);
        assert_eq!(world.on_remove.removed, vec![(TableId::new(6), 1)]);
    }

    #[test]
    fn merge_moves_rows_and_preserves_component_values() {
        let mut world = test_world();
        let position = data_component(&world.descriptors, 20, 4);
        let velocity = data_component(&world.descriptors, 21, 4);
        let old_ty = Type::new(vec![position]);
        let new_ty = Type::new(vec![position, velocity]);

        let mut old_table = Table::new(TableId::new(7), old_ty, &world.descriptors);
        let mut new_table = Table::new(TableId::new(8), new_ty, &world.descriptors);
        let mut stage = Stage::new();

        let row = old_table.insert(&mut world, &mut stage, Entity::from_raw(3000));
        old_table
            .committed_data_mut()
            .column_mut(0)
            .unwrap()
            .write(row, &42u32.to_ne_bytes());

        Table::merge(&mut new_table, &mut old_table, &mut world).unwrap();

        assert_eq!(new_table.count(), 1);
        assert_eq!(old_table.count(), 0);
        let moved_row = new_table
            .committed_data()
            .entities()
            .iter()
            .position(|&e| e == Entity::from_raw(3000))
            .unwrap();
        let bytes = new_table.committed_data().column(0).unwrap().get(Row::new(moved_row)).unwrap();
        assert_eq!(u32::from_ne_bytes(bytes.try_into().unwrap()), 42);
    }

    #[test]
    fn merge_grows_new_only_column_to_match_appended_rows() {
        // Spec §8 scenario 5: Old=[A(8)] x3 into New=[A(8),B(4)] x1 (new_table
        // already has a row, so the B column has a nonzero starting length
        // and any failure to grow it in lockstep with the appended rows is
        // directly observable, unlike `merge_moves_rows_and_preserves_component_values`
        // above where new_table starts empty).
        let mut world = test_world();
        let a = data_component(&world.descriptors, 50, 8);
        let b = data_component(&world.descriptors, 51, 4);
        let old_ty = Type::new(vec![a]);
        let new_ty = Type::new(vec![a, b]);

        let mut old_table = Table::new(TableId::new(20), old_ty, &world.descriptors);
        let mut new_table = Table::new(TableId::new(21), new_ty, &world.descriptors);
        let mut stage = Stage::new();

        // New=[A,B] x1: e9.
        new_table.insert(&mut world, &mut stage, Entity::from_raw(9));
        // Old=[A] x3: e1, e2, e3.
        for e in [1u64, 2, 3] {
            old_table.insert(&mut world, &mut stage, Entity::from_raw(e));
        }

        Table::merge(&mut new_table, &mut old_table, &mut world).unwrap();

        assert_eq!(new_table.count(), 4);
        assert_eq!(old_table.count(), 0);
        // Every data-bearing column must carry exactly as many rows as the
        // entity column, per the §8 length invariant.
        assert_eq!(new_table.committed_data().column(0).unwrap().len(), 4);
        assert_eq!(new_table.committed_data().column(1).unwrap().len(), 4);
        assert_eq!(
            new_table.committed_data().entities(),
            &[Entity::from_raw(9), Entity::from_raw(1), Entity::from_raw(2), Entity::from_raw(3)]
        );
    }

    #[test]
    fn merge_writes_zero_based_row_per_spec_open_question() {
        let mut world = test_world();
        let old_ty = Type::new(vec![]);
        let new_ty = Type::new(vec![Entity::from_raw(999)]);
        let mut old_table = Table::new(TableId::new(9), old_ty, &world.descriptors);
        let mut new_table = Table::new(TableId::new(10), new_ty, &world.descriptors);
        let mut stage = Stage::new();

        // Seed new_table with one row so new_row_count == 1 at merge time.
        new_table.insert(&mut world, &mut stage, Entity::from_raw(1));
        old_table.insert(&mut world, &mut stage, Entity::from_raw(2));

        Table::merge(&mut new_table, &mut old_table, &mut world).unwrap();

        // old row i=0 merges at new_row_count=1, so the spec's literal
        // (unconverted) row value written to the entity index is 1 -- not
        // the 1-based "2" every other path would write for row index 1.
        let record = world.entity_index.get(Entity::from_raw(2)).unwrap();
        assert_eq!(record.row_index(), Some(Row::new(0)));
    }

    #[test]
    fn set_size_reserves_capacity_without_inserting_rows() {
        let mut world = test_world();
        let position = data_component(&world.descriptors, 40, 8);
        let mut table = Table::new(TableId::new(13), Type::new(vec![position]), &world.descriptors);
        let mut stage = Stage::new();

        table.set_size(&mut world, &mut stage, 32);

        assert_eq!(table.count(), 0);
        assert!(world.should_resolve);
    }

    #[test]
    fn merge_into_with_no_destination_deletes_all_rows_instead() {
        let mut world = test_world();
        let mut old_table = Table::new(TableId::new(14), Type::new(vec![]), &world.descriptors);
        let mut stage = Stage::new();
        old_table.insert(&mut world, &mut stage, Entity::from_raw(1));

        Table::merge_into(None, &mut old_table, &mut world).unwrap();

        assert!(old_table.is_empty());
        assert_eq!(world.on_remove.removed, vec![(TableId::new(14), 1)]);
    }

    #[test]
    fn merge_rejects_non_superset_destination() {
        let mut world = test_world();
        let unrelated = data_component(&world.descriptors, 30, 4);
        let old_ty = Type::new(vec![unrelated]);
        let new_ty = Type::new(vec![]);
        let mut old_table = Table::new(TableId::new(11), old_ty, &world.descriptors);
        let mut new_table = Table::new(TableId::new(12), new_ty, &world.descriptors);

        let err = Table::merge(&mut new_table, &mut old_table, &mut world).unwrap_err();

        assert!(matches!(
            err,
            StorageError::Internal { kind: InternalErrorKind::MergeNotSuperset }
        ));
    }
}
