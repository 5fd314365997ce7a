//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the entity table
//! - A generation counter for safe reuse
//!
//! Each entity record maps every attached component kind to the pool slot
//! holding it; the pool supplies the slot's generation.

use bytemuck::{Pod, Zeroable};

use super::component::{ComponentKind, MAX_COMPONENT_KINDS};

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the entity table
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a new entity ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("entity(null)")
        } else {
            write!(f, "entity({}v{})", self.index(), self.generation())
        }
    }
}

/// One slot of the entity table.
///
/// Records live in the world's arena, so the layout is plain data. A
/// disabled slot keeps its last id so the next occupant can bump the
/// generation. An all-zero record is a disabled slot.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct Entity {
    /// The identifier of the current (or last) occupant.
    pub id: EntityId,
    /// Bitmask of attached component kinds.
    pub component_mask: u32,
    alive: u32,
    /// Pool slot per kind, meaningful where the mask bit is set.
    slots: [u32; MAX_COMPONENT_KINDS],
}

impl Entity {
    /// Creates an enabled entity with no components.
    #[inline]
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            component_mask: 0,
            alive: 1,
            slots: [0; MAX_COMPONENT_KINDS],
        }
    }

    /// Creates a dead/empty entity slot.
    #[inline]
    #[must_use]
    pub fn dead() -> Self {
        Self::zeroed()
    }

    /// Whether this entity slot is currently enabled.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive != 0
    }

    /// Checks if this entity has a component of `kind`.
    #[inline]
    #[must_use]
    pub const fn has_component(&self, kind: ComponentKind) -> bool {
        self.component_mask & kind.bit() != 0
    }

    /// Checks if this entity has every kind in `mask`.
    #[inline]
    #[must_use]
    pub const fn matches(&self, mask: u32) -> bool {
        self.component_mask & mask == mask
    }

    /// Pool slot of the attached component of `kind`, if any.
    #[inline]
    #[must_use]
    pub fn slot(&self, kind: ComponentKind) -> Option<u32> {
        self.has_component(kind).then(|| self.slots[kind.index()])
    }

    /// Records `slot` as this entity's component of `kind`, returning the
    /// slot it replaces.
    pub(crate) fn attach(&mut self, kind: ComponentKind, slot: u32) -> Option<u32> {
        let previous = self.slot(kind);
        self.slots[kind.index()] = slot;
        self.component_mask |= kind.bit();
        previous
    }

    /// Clears this entity's component of `kind`, returning its slot.
    pub(crate) fn detach(&mut self, kind: ComponentKind) -> Option<u32> {
        let previous = self.slot(kind);
        self.slots[kind.index()] = 0;
        self.component_mask &= !kind.bit();
        previous
    }

    /// Iterates over `(kind, slot)` for every attached component.
    pub fn slots(&self) -> impl Iterator<Item = (ComponentKind, u32)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(raw, &slot)| Some((ComponentKind::new(raw as u8)?, slot)))
            .filter(|(kind, _)| self.has_component(*kind))
    }

    /// Marks the slot disabled and forgets its components. The id is kept.
    pub(crate) fn disable(&mut self) {
        self.alive = 0;
        self.component_mask = 0;
        self.slots = [0; MAX_COMPONENT_KINDS];
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::dead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert!(!id.is_null());
        assert!(EntityId::default().is_null());
    }

    #[test]
    fn attach_and_detach_track_the_mask() {
        let transform = ComponentKind::TRANSFORM;
        let camera = ComponentKind::CAMERA;
        let mut entity = Entity::new(EntityId::new(0, 0));
        assert!(!entity.has_component(transform));

        assert_eq!(entity.attach(transform, 3), None);
        assert_eq!(entity.attach(camera, 0), None);
        assert!(entity.has_component(transform));
        assert!(entity.matches(transform.bit() | camera.bit()));
        assert_eq!(entity.slot(transform), Some(3));
        assert_eq!(entity.slot(camera), Some(0));

        assert_eq!(entity.attach(transform, 4), Some(3));
        assert_eq!(entity.detach(transform), Some(4));
        assert!(!entity.has_component(transform));
        assert_eq!(entity.slot(transform), None);

        let attached: Vec<_> = entity.slots().collect();
        assert_eq!(attached, vec![(camera, 0)]);
    }

    #[test]
    fn disable_keeps_the_id() {
        let mut entity = Entity::new(EntityId::new(7, 3));
        entity.attach(ComponentKind::TRANSFORM, 0);
        entity.disable();
        assert!(!entity.is_alive());
        assert_eq!(entity.component_mask, 0);
        assert_eq!(entity.id, EntityId::new(7, 3));
        assert_eq!(entity.slots().count(), 0);
    }

    #[test]
    fn zeroed_record_is_a_dead_slot() {
        let entity = Entity::dead();
        assert!(!entity.is_alive());
        assert_eq!(entity.slots().count(), 0);
        assert_eq!(std::mem::size_of::<Entity>(), 144);
    }
}
