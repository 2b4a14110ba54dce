//! A reference [`ComponentDescriptors`] implementation.
//!
//! This is **not** the type registry named as out of scope in §1 — it is a
//! minimal, self-contained stand-in used by this crate's own tests and
//! doctests so they don't need a full registry to exercise the storage core.
//! It follows the donor crate's `component::Registry` in using a lock-free
//! `DashMap` for concurrent reads, since a real descriptor table is shared
//! read-mostly state in exactly the same way.

use dashmap::DashMap;

use crate::component::Descriptor;
use crate::entity::Entity;

use super::ComponentDescriptors;

/// A simple concurrent map from entity id to [`Descriptor`].
#[derive(Debug, Default)]
pub struct MapDescriptors {
    entries: DashMap<Entity, Descriptor>,
}

impl MapDescriptors {
    /// Create an empty descriptor table.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Register `id` as a data-bearing component of `size` bytes.
    pub fn register_data(&self, id: Entity, size: usize) {
        self.entries.insert(id, Descriptor::Data { size });
    }

    /// Register `id` as a zero-size tag.
    pub fn register_tag(&self, id: Entity) {
        self.entries.insert(id, Descriptor::Tag);
    }
}

impl ComponentDescriptors for MapDescriptors {
    fn describe(&self, id: Entity) -> Descriptor {
        if id.is_relation() {
            return Descriptor::Absent;
        }
        self.entries
            .get(&id)
            .map(|entry| *entry.value())
            .unwrap_or(Descriptor::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_id_is_absent() {
        // Given
        let descriptors = MapDescriptors::new();

        // When / Then
        assert_eq!(
            descriptors.describe(Entity::from_raw(1)),
            Descriptor::Absent
        );
    }

    #[test]
    fn registered_data_component_reports_its_size() {
        // Given
        let descriptors = MapDescriptors::new();
        let position = Entity::from_raw(1);
        descriptors.register_data(position, 8);

        // When / Then
        assert_eq!(
            descriptors.describe(position),
            Descriptor::Data { size: 8 }
        );
    }

    #[test]
    fn registered_tag_has_no_size() {
        // Given
        let descriptors = MapDescriptors::new();
        let disabled = Entity::from_raw(2);
        descriptors.register_tag(disabled);

        // When / Then
        assert_eq!(descriptors.describe(disabled), Descriptor::Tag);
        assert_eq!(descriptors.describe(disabled).column_size(), None);
    }

    #[test]
    fn relation_ids_are_always_absent_even_if_registered() {
        use crate::entity::ENTITY_FLAGS_MASK;

        // Given
        let descriptors = MapDescriptors::new();
        let childof = Entity::from_raw(5 | ENTITY_FLAGS_MASK);
        descriptors.register_data(childof, 8);

        // When / Then
        assert_eq!(descriptors.describe(childof), Descriptor::Absent);
    }
}
