//! # Views
//!
//! A view is a declared set of component kinds. Its matching entities are
//! cached as entity indices in an arena-backed [`HandleList`] and rebuilt by
//! a linear scan of the entity table when something it depends on changed.
//!
//! The list is reserved for every entity slot when the view is registered,
//! so a rebuild never allocates. Scratch scopes opened later can roll the
//! arena back without touching it.

use super::component::ComponentKind;
use super::entity::{Entity, EntityId};
use crate::collections::{HandleIter, HandleList};
use crate::error::MemoryResult;
use crate::memory::{Allocation, Arena};

/// Handle to a registered view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewId(pub(crate) u32);

impl ViewId {
    /// Position of the view in registration order.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub(crate) struct View<'a> {
    arena: &'a Arena,
    mask: u32,
    entities: HandleList<'a>,
    dirty: bool,
}

impl<'a> View<'a> {
    /// Reserves room for `max_entities` matches up front.
    pub(crate) fn new(
        arena: &'a Arena,
        kinds: &[ComponentKind],
        max_entities: usize,
    ) -> MemoryResult<Self> {
        Ok(Self {
            arena,
            mask: ComponentKind::mask_of(kinds),
            entities: HandleList::with_capacity(arena, max_entities)?,
            dirty: true,
        })
    }

    pub(crate) const fn mask(&self) -> u32 {
        self.mask
    }

    /// Flags the view for a rebuild if a change to `changed` kinds can
    /// affect it. A view over no kinds matches every entity, so any entity
    /// change affects it.
    pub(crate) fn touch(&mut self, changed: u32) {
        if self.mask == 0 || self.mask & changed != 0 {
            self.dirty = true;
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Rebuilds the list from the `count` records in `table` if dirty.
    pub(crate) fn refresh(&mut self, table: Allocation, count: usize) -> MemoryResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.entities.clear();
        for index in 0..count {
            let Some(entity) = self.arena.read::<Entity>(table, index) else {
                break;
            };
            if entity.is_alive() && entity.matches(self.mask) {
                self.entities.push(index as i32)?;
            }
        }
        self.dirty = false;
        tracing::trace!(
            mask = self.mask,
            matched = self.entities.len(),
            "rebuilt view"
        );
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.entities.len()
    }

    pub(crate) fn iter(&self, table: Allocation) -> ViewIter<'_, 'a> {
        ViewIter {
            arena: self.arena,
            table,
            indices: self.entities.iter(),
        }
    }
}

/// Iterator over the entities matching a view.
#[derive(Debug)]
pub struct ViewIter<'v, 'a> {
    arena: &'a Arena,
    table: Allocation,
    indices: HandleIter<'v, 'a>,
}

impl Iterator for ViewIter<'_, '_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let index = self.indices.next()?;
        self.arena
            .read::<Entity>(self.table, index as usize)
            .map(|entity| entity.id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl ExactSizeIterator for ViewIter<'_, '_> {}
