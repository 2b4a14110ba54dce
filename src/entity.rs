//! Entity identity for the archetype storage core.
//!
//! An [`Entity`] is an opaque 64-bit handle. Unlike the split `id`/`generation`
//! model used elsewhere in this codebase's component registries, entities and
//! components here share a single id space: a `Type` is simply an ordered list
//! of entity ids, and a subset of the id space (the high bits masked by
//! [`ENTITY_FLAGS_MASK`]) is reserved for *relation ids* that carry no column
//! data of their own (e.g. `CHILDOF`, `INSTANCEOF` style links).
//!
//! This module intentionally does not provide an allocator or a dead-pool:
//! minting and recycling entity ids is the job of the (out of scope) entity
//! index collaborator, not of the storage core.

use std::fmt;

/// High bits of the 64-bit id space reserved for relation flags.
///
/// An id with any of these bits set is a *relation id*: it contributes
/// membership to a `Type` but never backs a column, whether or not a
/// component descriptor exists for it (see [`crate::component::Descriptor`]).
///
/// The top byte is reserved, matching the donor crate's convention of
/// reserving high bits of packed ids (see `ecs::entity::Generation`) for
/// metadata distinct from the raw index.
pub const ENTITY_FLAGS_MASK: u64 = 0xFF00_0000_0000_0000;

/// An opaque entity identifier.
///
/// `Entity` is `Copy`, ordered by raw id value (the "shared total order" the
/// specification's `Type` invariant depends on), and hashable so it can key
/// entity-index maps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u64);

impl Entity {
    /// Construct an entity from a raw 64-bit value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw 64-bit value of this entity id.
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Returns `true` if this id has any bit of [`ENTITY_FLAGS_MASK`] set.
    ///
    /// Relation ids are never data-bearing: `merge` (§4.11) stops walking a
    /// type's columns the moment it encounters one, and `new_data` (§4.1)
    /// never allocates a buffer for one even if a descriptor happens to
    /// exist.
    #[inline]
    pub const fn is_relation(self) -> bool {
        self.0 & ENTITY_FLAGS_MASK != 0
    }

    /// The flag bits set on this id, with the base id bits masked out.
    #[inline]
    pub const fn flags(self) -> u64 {
        self.0 & ENTITY_FLAGS_MASK
    }

    /// The id with any relation flag bits cleared.
    #[inline]
    pub const fn base(self) -> Self {
        Self(self.0 & !ENTITY_FLAGS_MASK)
    }
}

impl From<u64> for Entity {
    #[inline]
    fn from(value: u64) -> Self {
        Self::from_raw(value)
    }
}

impl From<Entity> for u64 {
    #[inline]
    fn from(value: Entity) -> Self {
        value.to_raw()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_relation() {
            write!(f, "Entity(#{:x}, relation)", self.0)
        } else {
            write!(f, "Entity(#{:x})", self.0)
        }
    }
}
