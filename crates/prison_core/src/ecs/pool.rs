//! # Component Pools
//!
//! Fixed-capacity storage for one component kind, carved out of the
//! world's arena at registration.
//!
//! - All slots are allocated at creation: a `[C]` value array plus a
//!   `[SlotState]` array of enabled flags and generations
//! - `create` takes the first disabled slot (linear scan, O(capacity))
//! - Every lookup validates the slot generation
//!
//! Pools only hold arena ranges, so every operation takes the arena that
//! backs them. The world talks to pools through the [`ComponentPool`]
//! trait, one boxed pool per registered kind; typed access downcasts to
//! [`Pool<C>`].

use std::any::Any;
use std::cell::{Ref, RefMut};
use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

use super::component::{Component, ComponentId, ComponentKind};
use crate::error::{EcsError, EcsResult, MemoryResult};
use crate::memory::{Allocation, Arena};

/// Type-erased operations the world dispatches per component kind.
pub trait ComponentPool: Any {
    /// Kind this pool is registered under.
    fn kind(&self) -> ComponentKind;

    /// Total number of slots.
    fn capacity(&self) -> usize;

    /// Number of enabled slots.
    fn len(&self) -> usize;

    /// Returns `true` if no slot is enabled.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enables the first free slot with the kind's default value.
    ///
    /// # Errors
    ///
    /// [`EcsError::PoolFull`] if every slot is enabled,
    /// [`EcsError::Memory`] if the arena is borrowed.
    fn create(&mut self, arena: &Arena) -> EcsResult<ComponentId>;

    /// Disables the slot `id` refers to. Stale ids are a no-op returning
    /// `false`.
    fn remove(&mut self, arena: &Arena, id: ComponentId) -> bool;

    /// Returns `true` if `id` refers to an enabled slot of this generation.
    fn contains(&self, arena: &Arena, id: ComponentId) -> bool;

    /// Id of the component currently in `slot`, if the slot is enabled.
    fn id_at(&self, arena: &Arena, slot: u32) -> Option<ComponentId>;

    /// Disables every slot. Generations are kept.
    fn clear(&mut self, arena: &Arena);

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Per-slot bookkeeping stored next to the values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct SlotState {
    enabled: u32,
    generation: u32,
}

impl SlotState {
    #[inline]
    fn holds(self, id: ComponentId) -> bool {
        self.enabled != 0 && self.generation == id.generation()
    }
}

/// Fixed-capacity pool of `C` records in an arena.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: Pool<Transform> = Pool::new(&arena, 1024)?;
/// let id = pool.create(&arena)?;
/// pool.get_mut(&arena, id).unwrap().position = Vec2::new(4.0, 2.0);
/// ```
#[derive(Debug)]
pub struct Pool<C: Component> {
    values: Allocation,
    states: Allocation,
    capacity: usize,
    len: usize,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Component> Pool<C> {
    /// Allocates `capacity` disabled slots in `arena`.
    ///
    /// # Errors
    ///
    /// Fails if the arena cannot hold both arrays.
    pub fn new(arena: &Arena, capacity: usize) -> MemoryResult<Self> {
        let values = arena.alloc_slice::<C>(capacity)?;
        let states = arena.alloc_slice::<SlotState>(capacity)?;
        Ok(Self {
            values,
            states,
            capacity,
            len: 0,
            _marker: PhantomData,
        })
    }

    /// The record `id` refers to, if it is still enabled.
    ///
    /// The guard keeps the arena borrowed; allocating from it meanwhile
    /// fails with [`MemoryError::Borrowed`](crate::MemoryError::Borrowed).
    #[must_use]
    pub fn get<'r>(&self, arena: &'r Arena, id: ComponentId) -> Option<Ref<'r, C>> {
        let index = self.live_slot(arena, id)?;
        arena.element::<C>(self.values, index)
    }

    /// Mutable access to the record `id` refers to.
    pub fn get_mut<'r>(&mut self, arena: &'r Arena, id: ComponentId) -> Option<RefMut<'r, C>> {
        let index = self.live_slot(arena, id)?;
        arena.element_mut::<C>(self.values, index)
    }

    /// Ids of the enabled slots, in slot order.
    pub fn ids<'r>(&self, arena: &'r Arena) -> impl Iterator<Item = ComponentId> + 'r {
        let states = self.states;
        (0..self.capacity).filter_map(move |index| {
            let state = arena.read::<SlotState>(states, index)?;
            (state.enabled != 0).then(|| ComponentId::new(index as u32, state.generation))
        })
    }

    /// Runs `f` on every enabled record.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Borrowed`](crate::MemoryError::Borrowed) if the arena
    /// is borrowed.
    pub fn for_each_mut(
        &mut self,
        arena: &Arena,
        mut f: impl FnMut(ComponentId, &mut C),
    ) -> MemoryResult<()> {
        let states = arena.with_slice::<SlotState, _>(self.states, |states| {
            states
                .iter()
                .enumerate()
                .filter(|(_, state)| state.enabled != 0)
                .map(|(index, state)| (index, state.generation))
                .collect::<Vec<_>>()
        })?;
        arena.with_slice_mut::<C, _>(self.values, |values| {
            for (index, generation) in states {
                f(ComponentId::new(index as u32, generation), &mut values[index]);
            }
        })
    }

    fn live_slot(&self, arena: &Arena, id: ComponentId) -> Option<usize> {
        let index = id.index() as usize;
        arena
            .read::<SlotState>(self.states, index)
            .filter(|state| state.holds(id))
            .map(|_| index)
    }
}

impl<C: Component> ComponentPool for Pool<C> {
    fn kind(&self) -> ComponentKind {
        C::KIND
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.len
    }

    fn create(&mut self, arena: &Arena) -> EcsResult<ComponentId> {
        let free = arena.with_slice_mut::<SlotState, _>(self.states, |states| {
            let index = states.iter().position(|state| state.enabled == 0)?;
            let state = &mut states[index];
            state.generation = state.generation.wrapping_add(1);
            state.enabled = 1;
            Some(ComponentId::new(index as u32, state.generation))
        })?;

        let Some(id) = free else {
            tracing::warn!(kind = %C::KIND, capacity = self.capacity, "component pool full");
            return Err(EcsError::PoolFull {
                kind: C::KIND,
                capacity: self.capacity,
            });
        };

        arena.write::<C>(self.values, id.index() as usize, C::default());
        self.len += 1;
        Ok(id)
    }

    fn remove(&mut self, arena: &Arena, id: ComponentId) -> bool {
        let Some(index) = self.live_slot(arena, id) else {
            return false;
        };
        let disabled = arena.write(
            self.states,
            index,
            SlotState {
                enabled: 0,
                generation: id.generation(),
            },
        );
        if disabled {
            self.len -= 1;
        }
        disabled
    }

    fn contains(&self, arena: &Arena, id: ComponentId) -> bool {
        self.live_slot(arena, id).is_some()
    }

    fn id_at(&self, arena: &Arena, slot: u32) -> Option<ComponentId> {
        let state = arena.read::<SlotState>(self.states, slot as usize)?;
        (state.enabled != 0).then(|| ComponentId::new(slot, state.generation))
    }

    fn clear(&mut self, arena: &Arena) {
        let cleared = arena.with_slice_mut::<SlotState, _>(self.states, |states| {
            for state in states {
                state.enabled = 0;
            }
        });
        if cleared.is_ok() {
            self.len = 0;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Camera, Transform, Vec2};
    use crate::memory::kilobytes;

    #[test]
    fn create_returns_defaults() {
        let arena = Arena::new(kilobytes(1));
        let mut pool: Pool<Transform> = Pool::new(&arena, 4).unwrap();
        let id = pool.create(&arena).unwrap();
        assert_eq!(pool.get(&arena, id).map(|t| *t), Some(Transform::default()));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.kind(), ComponentKind::TRANSFORM);
    }

    #[test]
    fn slots_live_in_the_arena() {
        let arena = Arena::new(kilobytes(1));
        let _pool: Pool<Camera> = Pool::new(&arena, 8).unwrap();
        assert!(arena.used() >= 8 * (std::mem::size_of::<Camera>() + 8));

        let small = Arena::new(64);
        assert!(Pool::<Transform>::new(&small, 8).is_err());
    }

    #[test]
    fn first_free_slot_is_reused() {
        let arena = Arena::new(kilobytes(1));
        let mut pool: Pool<Camera> = Pool::new(&arena, 3).unwrap();
        let a = pool.create(&arena).unwrap();
        let b = pool.create(&arena).unwrap();
        assert!(pool.remove(&arena, a));
        let c = pool.create(&arena).unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert!(pool.contains(&arena, b));
        assert_eq!(pool.id_at(&arena, c.index()), Some(c));
    }

    #[test]
    fn stale_ids_do_not_alias() {
        let arena = Arena::new(kilobytes(1));
        let mut pool: Pool<Transform> = Pool::new(&arena, 1).unwrap();
        let old = pool.create(&arena).unwrap();
        pool.get_mut(&arena, old).unwrap().position = Vec2::new(5.0, 5.0);
        assert!(pool.remove(&arena, old));
        assert!(!pool.remove(&arena, old));
        assert_eq!(pool.id_at(&arena, old.index()), None);

        let new = pool.create(&arena).unwrap();
        assert!(pool.get(&arena, old).is_none());
        assert!(pool.get_mut(&arena, old).is_none());
        assert_eq!(pool.get(&arena, new).map(|t| t.position), Some(Vec2::ZERO));
    }

    #[test]
    fn full_pool_reports_kind() {
        let arena = Arena::new(kilobytes(1));
        let mut pool: Pool<Camera> = Pool::new(&arena, 2).unwrap();
        pool.create(&arena).unwrap();
        pool.create(&arena).unwrap();
        assert_eq!(
            pool.create(&arena),
            Err(EcsError::PoolFull {
                kind: ComponentKind::CAMERA,
                capacity: 2
            })
        );
    }

    #[test]
    fn clear_and_iterate() {
        let arena = Arena::new(kilobytes(1));
        let mut pool: Pool<Transform> = Pool::new(&arena, 8).unwrap();
        for _ in 0..5 {
            pool.create(&arena).unwrap();
        }
        pool.for_each_mut(&arena, |_, transform| transform.rotation = 90.0)
            .unwrap();
        let ids: Vec<_> = pool.ids(&arena).collect();
        assert_eq!(ids.len(), 5);
        assert!(ids
            .iter()
            .all(|&id| pool.get(&arena, id).map(|t| t.rotation) == Some(90.0)));

        pool.clear(&arena);
        assert!(pool.is_empty());
        assert_eq!(pool.ids(&arena).count(), 0);
    }

    #[test]
    fn held_guard_blocks_allocation_without_panicking() {
        let arena = Arena::new(kilobytes(1));
        let mut pool: Pool<Camera> = Pool::new(&arena, 2).unwrap();
        let id = pool.create(&arena).unwrap();

        let camera = pool.get(&arena, id).unwrap();
        assert_eq!(arena.alloc(8), Err(crate::MemoryError::Borrowed));
        assert_eq!(camera.zoom, 1.0);
        drop(camera);
        assert!(arena.alloc(8).is_ok());
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let arena = Arena::new(kilobytes(1));
        let mut pool: Pool<Transform> = Pool::new(&arena, 2).unwrap();
        assert!(!pool.remove(&arena, ComponentId::new(9, 1)));
        assert!(!pool.contains(&arena, ComponentId::NULL));
        assert!(pool.get(&arena, ComponentId::NULL).is_none());
        assert_eq!(pool.id_at(&arena, 9), None);
    }
}
