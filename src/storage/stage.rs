//! Per-stage shadow storage (§3, §4.2, §4.5, §5).
//!
//! While a world is `in_progress`, mutations must not touch a table's
//! committed `Data` or fire activation signals — a query iterating the
//! committed store must see a stable snapshot. `Stage` is where those
//! mutations land instead: one shadow `Data` per `Type`, created lazily on
//! first use and folded back into the owning table later via
//! `Table::replace_columns` or `Table::merge`.
//!
//! A `Stage` also carries the per-stage entity-index *overlay* named in §3
//! ("(b) `entity_index`: per-stage entity→record mapping that overlays the
//! main entity index") and required by §4.5/§4.6/§4.7: row-move operations
//! (`delete`, `swap`, `move_back_and_swap`) performed against a shadow
//! `Data` must update this overlay, not the committed `EntityIndex` — the
//! committed index must stay stable for whatever query is still iterating
//! committed tables while the stage is in progress.

use std::collections::HashMap;

use crate::component::{ComponentDescriptors, Type};
use crate::entity::Entity;

use super::data::Data;
use super::index::EntityRecord;

/// Lazily-populated shadow `Data`, keyed by `Type`, plus the entity-index
/// overlay, for in-progress mutations.
#[derive(Default)]
pub struct Stage {
    data_stage: HashMap<Type, Data>,
    entity_index: HashMap<Entity, EntityRecord>,
}

impl Stage {
    /// An empty stage with no shadow data or overlaid entity records yet.
    pub fn new() -> Self {
        Self {
            data_stage: HashMap::new(),
            entity_index: HashMap::new(),
        }
    }

    /// Resolve the shadow `Data` for `ty`, creating one via
    /// [`Data::new`] if this is the first mutation against `ty` since the
    /// stage was last cleared.
    pub fn data_for(&mut self, ty: &Type, descriptors: &impl ComponentDescriptors) -> &mut Data {
        self.data_stage
            .entry(ty.clone())
            .or_insert_with(|| Data::new(ty, descriptors))
    }

    /// Remove and return the shadow `Data` for `ty`, if any was staged.
    pub fn take(&mut self, ty: &Type) -> Option<Data> {
        self.data_stage.remove(ty)
    }

    /// Whether any type currently has shadow data staged.
    pub fn is_empty(&self) -> bool {
        self.data_stage.is_empty()
    }

    /// Discard every shadow `Data` and overlaid entity record, e.g. after a
    /// commit phase has folded them all back into their owning tables.
    pub fn clear(&mut self) {
        self.data_stage.clear();
        self.entity_index.clear();
    }

    /// Record `entity`'s shadow-resident location in the per-stage overlay
    /// (§3, §4.5), leaving the committed `EntityIndex` untouched.
    pub fn set_entity(&mut self, entity: Entity, record: EntityRecord) {
        self.entity_index.insert(entity, record);
    }

    /// Look up `entity`'s per-stage overlay record, if a row move has
    /// placed one there since the stage was last cleared.
    pub fn get_entity(&self, entity: Entity) -> Option<&EntityRecord> {
        self.entity_index.get(&entity)
    }

    /// Forget the per-stage overlay record for `entity`.
    pub fn remove_entity(&mut self, entity: Entity) -> Option<EntityRecord> {
        self.entity_index.remove(&entity)
    }
}
