//! Component identity and descriptors.
//!
//! ## Architecture
//!
//! - [`Type`]: the ordered, duplicate-free list of entity ids that gives a
//!   table its archetype identity.
//! - [`Descriptor`]: what an entity id means when it appears in a `Type` —
//!   a data-bearing component, a zero-size tag, or a relation id with no
//!   storage at all.
//! - [`ComponentDescriptors`]: the external lookup the core consults to turn
//!   a `Type` into column sizes. Out of scope as an implementation (the
//!   "type registry" collaborator named in §1); this crate only depends on
//!   the trait, plus ships [`descriptors::MapDescriptors`] as a reference
//!   implementation for tests and doctests.

mod descriptors;
mod spec;

pub use descriptors::MapDescriptors;
pub use spec::Type;

use crate::entity::Entity;

/// What a single entity id contributes to a table's column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// A data-bearing component of the given byte size.
    Data {
        /// Size in bytes of one element of this component.
        size: usize,
    },
    /// A zero-size tag: contributes membership but no column.
    Tag,
    /// No descriptor is registered for this id (typically a relation id).
    Absent,
}

impl Descriptor {
    /// The column size this descriptor implies: `Some(size)` for data-bearing
    /// components, `None` for tags and absent descriptors (both contribute
    /// no buffer per §4.1).
    #[inline]
    pub fn column_size(self) -> Option<usize> {
        match self {
            Descriptor::Data { size } if size > 0 => Some(size),
            _ => None,
        }
    }
}

/// External lookup from entity id to [`Descriptor`].
///
/// This is the "component descriptor lookup" collaborator named in §6:
/// `get_component(world, stage, id) -> {size} | tag | absent`. The storage
/// core never registers or owns entries in this table; it only reads.
pub trait ComponentDescriptors {
    /// Resolve the descriptor for `id`.
    ///
    /// Implementations should return [`Descriptor::Absent`] for relation ids
    /// (ids with [`crate::entity::ENTITY_FLAGS_MASK`] bits set) even if they
    /// happen to hold an entry, since `new_data` never consults this for a
    /// flagged id (§4.1, §4.11 step 3).
    fn describe(&self, id: Entity) -> Descriptor;
}

impl<T: ComponentDescriptors + ?Sized> ComponentDescriptors for &T {
    fn describe(&self, id: Entity) -> Descriptor {
        (**self).describe(id)
    }
}
