//! # ECS World
//!
//! The central container for all entities, component pools and views.
//! The entity table, every pool and every view list are carved out of the
//! world's arena when they are created; nothing grows afterwards.

use std::cell::{Ref, RefMut};

use super::component::{
    AnimRender, Camera, Component, ComponentId, ComponentKind, MapRender, SpriteRender,
    Transform, MAX_COMPONENT_KINDS,
};
use super::entity::{Entity, EntityId};
use super::pool::{ComponentPool, Pool};
use super::view::{View, ViewId, ViewIter};
use crate::config::EcsConfig;
use crate::error::{EcsError, EcsResult, MemoryError};
use crate::memory::{Allocation, Arena};

/// The ECS World - container for all game objects.
///
/// Component kinds must be registered once, before any entity creates a
/// component of that kind. Component guards handed out by the world borrow
/// it, so they cannot outlive a structural change. While a guard is alive
/// the arena is borrowed too; allocating from it directly fails with
/// [`MemoryError::Borrowed`].
///
/// # Example
///
/// ```rust,ignore
/// let arena = Arena::new(kilobytes(256));
/// let mut world = World::with_default_pools(&arena, &EcsConfig::default())?;
///
/// let player = world.create_entity()?;
/// world.create_component::<Transform>(player)?.position = Vec2::new(64.0, 32.0);
/// world.create_component::<SpriteRender>(player)?;
///
/// let drawable = world.register_view(&[ComponentKind::TRANSFORM, ComponentKind::SPRITE_RENDER])?;
/// for entity in world.query(drawable)? { /* ... */ }
/// ```
pub struct World<'a> {
    arena: &'a Arena,
    /// All entity slots, `[Entity; capacity]` in the arena.
    entities: Allocation,
    capacity: usize,
    /// Number of currently enabled entities.
    alive_count: usize,
    /// One pool per registered kind, indexed by kind.
    pools: Vec<Option<Box<dyn ComponentPool>>>,
    views: Vec<View<'a>>,
}

impl<'a> World<'a> {
    /// Creates a world with `config.max_entities` entity slots and no
    /// registered component kinds.
    ///
    /// # Errors
    ///
    /// [`EcsError::Memory`] if the arena cannot hold the entity table.
    pub fn new(arena: &'a Arena, config: &EcsConfig) -> EcsResult<Self> {
        let entities = arena.alloc_slice::<Entity>(config.max_entities)?;
        let mut pools = Vec::with_capacity(MAX_COMPONENT_KINDS);
        pools.resize_with(MAX_COMPONENT_KINDS, || None);

        Ok(Self {
            arena,
            entities,
            capacity: config.max_entities,
            alive_count: 0,
            pools,
            views: Vec::new(),
        })
    }

    /// Creates a world and registers the built-in component kinds with the
    /// pool capacities from `config`.
    ///
    /// # Errors
    ///
    /// [`EcsError::Memory`] if the arena cannot hold the table and pools.
    pub fn with_default_pools(arena: &'a Arena, config: &EcsConfig) -> EcsResult<Self> {
        let mut world = Self::new(arena, config)?;
        let pools = &config.pools;
        world.register_pool::<Transform>(pools.transform)?;
        world.register_pool::<SpriteRender>(pools.sprite_render)?;
        world.register_pool::<AnimRender>(pools.anim_render)?;
        world.register_pool::<MapRender>(pools.map_render)?;
        world.register_pool::<Camera>(pools.camera)?;
        tracing::debug!(
            max_entities = config.max_entities,
            arena_used = arena.used(),
            "world created with built-in pools"
        );
        Ok(world)
    }

    /// Allocates a [`Pool<C>`] of `capacity` slots in the world's arena and
    /// registers it for `C::KIND`.
    ///
    /// # Errors
    ///
    /// [`EcsError::KindAlreadyRegistered`] if the kind has a pool,
    /// [`EcsError::Memory`] if the pool does not fit.
    pub fn register_pool<C: Component>(&mut self, capacity: usize) -> EcsResult<()> {
        if self.is_registered(C::KIND) {
            return Err(EcsError::KindAlreadyRegistered(C::KIND));
        }
        let pool = Pool::<C>::new(self.arena, capacity)?;
        self.register(Box::new(pool))
    }

    /// Registers a pool implementation for its kind. The pool must keep its
    /// storage in [`World::arena`].
    ///
    /// # Errors
    ///
    /// [`EcsError::KindAlreadyRegistered`] if the kind has a pool.
    pub fn register(&mut self, pool: Box<dyn ComponentPool>) -> EcsResult<()> {
        let kind = pool.kind();
        let entry = &mut self.pools[kind.index()];
        if entry.is_some() {
            return Err(EcsError::KindAlreadyRegistered(kind));
        }
        tracing::trace!(%kind, capacity = pool.capacity(), "registered component pool");
        *entry = Some(pool);
        Ok(())
    }

    /// Returns `true` if `kind` has a registered pool.
    #[must_use]
    pub fn is_registered(&self, kind: ComponentKind) -> bool {
        self.pools[kind.index()].is_some()
    }

    /// Returns the maximum number of entities.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently enabled entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// The arena backing the entity table, pools and view lists.
    #[inline]
    #[must_use]
    pub const fn arena(&self) -> &'a Arena {
        self.arena
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Enables the first disabled entity slot.
    ///
    /// The slot's generation is bumped, so ids of its previous occupant stop
    /// resolving. The scan is O(capacity).
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityTableFull`] if every slot is enabled,
    /// [`EcsError::Memory`] if the arena is borrowed.
    pub fn create_entity(&mut self) -> EcsResult<EntityId> {
        let free = (0..self.capacity)
            .filter_map(|index| Some((index, self.record(index)?)))
            .find(|(_, entity)| !entity.is_alive());
        let Some((index, previous)) = free else {
            tracing::warn!(capacity = self.capacity, "entity table full");
            return Err(EcsError::EntityTableFull {
                capacity: self.capacity,
            });
        };

        let generation = previous.id.generation().wrapping_add(1);
        let id = EntityId::new(index as u32, generation);
        self.store(index, Entity::new(id))?;
        self.alive_count += 1;
        self.touch_views(0);

        Ok(id)
    }

    /// Removes every component of the entity, then disables it.
    ///
    /// Returns `false` (and does nothing) for null, out-of-range, disabled or
    /// stale ids.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let Some((index, entity)) = self.live(id) else {
            return false;
        };

        let mut disabled = entity;
        disabled.disable();
        if self.store(index, disabled).is_err() {
            return false;
        }
        for (kind, slot) in entity.slots() {
            if let Some(pool) = self.pools[kind.index()].as_mut() {
                if let Some(component) = pool.id_at(self.arena, slot) {
                    pool.remove(self.arena, component);
                }
            }
        }
        self.alive_count -= 1;
        self.touch_views(entity.component_mask);

        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.live(id).is_some()
    }

    /// A copy of the entity record, if `id` is alive.
    #[inline]
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.live(id).map(|(_, entity)| entity)
    }

    /// Iterates over copies of all alive entity records.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        (0..self.capacity)
            .filter_map(|index| self.record(index))
            .filter(Entity::is_alive)
    }

    /// Disables every entity and empties every pool.
    ///
    /// Generations are kept, so ids issued before the clear stay stale.
    ///
    /// # Errors
    ///
    /// [`EcsError::Memory`] if the arena is borrowed; nothing is cleared.
    pub fn clear(&mut self) -> EcsResult<()> {
        tracing::debug!(
            alive = self.alive_count,
            arena_used = self.arena.used(),
            arena_capacity = self.arena.capacity(),
            "clearing world"
        );
        self.arena
            .with_slice_mut::<Entity, _>(self.entities, |entities| {
                entities.iter_mut().for_each(Entity::disable);
            })?;
        for pool in self.pools.iter_mut().flatten() {
            pool.clear(self.arena);
        }
        for view in &mut self.views {
            view.invalidate();
        }
        self.alive_count = 0;
        Ok(())
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Creates a `C` on the entity and returns it, default-initialized.
    ///
    /// An existing component of the same kind is replaced and its slot
    /// released.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`], [`EcsError::UnregisteredKind`],
    /// [`EcsError::PoolTypeMismatch`], [`EcsError::PoolFull`] or
    /// [`EcsError::Memory`].
    pub fn create_component<C: Component>(&mut self, entity: EntityId) -> EcsResult<RefMut<'_, C>> {
        self.typed_pool::<C>()?;
        let id = self.create_component_dyn(entity, C::KIND)?;
        let arena = self.arena;
        self.pool_mut::<C>()
            .and_then(|pool| pool.get_mut(arena, id))
            .ok_or(EcsError::Memory(MemoryError::Borrowed))
    }

    /// Creates a component of `kind` on the entity through the kind's
    /// registered pool.
    ///
    /// # Errors
    ///
    /// [`EcsError::StaleEntity`], [`EcsError::UnregisteredKind`],
    /// [`EcsError::PoolFull`] or [`EcsError::Memory`].
    pub fn create_component_dyn(
        &mut self,
        entity: EntityId,
        kind: ComponentKind,
    ) -> EcsResult<ComponentId> {
        let (index, mut record) = self.live(entity).ok_or(EcsError::StaleEntity {
            index: entity.index(),
            generation: entity.generation(),
        })?;
        let arena = self.arena;
        let pool = self.pools[kind.index()]
            .as_mut()
            .ok_or(EcsError::UnregisteredKind(kind))?;

        let id = pool.create(arena)?;
        let previous = record.attach(kind, id.index());
        if !arena.write(self.entities, index, record) {
            pool.remove(arena, id);
            return Err(MemoryError::Borrowed.into());
        }
        if let Some(old) = previous.and_then(|slot| pool.id_at(arena, slot)) {
            pool.remove(arena, old);
        }
        self.touch_views(kind.bit());

        Ok(id)
    }

    /// Removes the entity's component of `kind`.
    ///
    /// Returns `false` if the entity is stale or has no such component.
    pub fn remove_component(&mut self, entity: EntityId, kind: ComponentKind) -> bool {
        let Some((index, mut record)) = self.live(entity) else {
            return false;
        };
        let Some(slot) = record.detach(kind) else {
            return false;
        };
        if self.store(index, record).is_err() {
            return false;
        }
        if let Some(pool) = self.pools[kind.index()].as_mut() {
            if let Some(id) = pool.id_at(self.arena, slot) {
                pool.remove(self.arena, id);
            }
        }
        self.touch_views(kind.bit());
        true
    }

    /// The entity's `C`, if it has one.
    #[must_use]
    pub fn get_component<C: Component>(&self, entity: EntityId) -> Option<Ref<'_, C>> {
        let id = self.component_id(entity, C::KIND)?;
        self.pool::<C>()?.get(self.arena, id)
    }

    /// The entity's `C`, mutably.
    pub fn get_component_mut<C: Component>(&mut self, entity: EntityId) -> Option<RefMut<'_, C>> {
        let id = self.component_id(entity, C::KIND)?;
        let arena = self.arena;
        self.pool_mut::<C>()?.get_mut(arena, id)
    }

    /// Id of the entity's component of `kind`.
    #[must_use]
    pub fn component_id(&self, entity: EntityId, kind: ComponentKind) -> Option<ComponentId> {
        let (_, record) = self.live(entity)?;
        let slot = record.slot(kind)?;
        self.pools[kind.index()].as_ref()?.id_at(self.arena, slot)
    }

    /// Returns `true` if the entity is alive and has a component of `kind`.
    #[must_use]
    pub fn has_component(&self, entity: EntityId, kind: ComponentKind) -> bool {
        self.component_id(entity, kind).is_some()
    }

    /// Typed access to the pool registered for `C::KIND`.
    #[must_use]
    pub fn pool<C: Component>(&self) -> Option<&Pool<C>> {
        self.pools[C::KIND.index()]
            .as_ref()?
            .as_any()
            .downcast_ref::<Pool<C>>()
    }

    /// Typed mutable access to the pool registered for `C::KIND`.
    pub fn pool_mut<C: Component>(&mut self) -> Option<&mut Pool<C>> {
        self.pools[C::KIND.index()]
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<Pool<C>>()
    }

    /// Type-erased access to the pool registered for `kind`.
    #[must_use]
    pub fn pool_dyn(&self, kind: ComponentKind) -> Option<&dyn ComponentPool> {
        self.pools[kind.index()].as_deref()
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Declares a view over entities that have every kind in `kinds`.
    ///
    /// The view's list is sized for every entity slot here, so later
    /// queries never allocate. Register views outside scratch scopes; a
    /// view registered inside one loses its list when the scope ends.
    ///
    /// # Errors
    ///
    /// [`EcsError::Memory`] if the arena cannot hold the view's list.
    pub fn register_view(&mut self, kinds: &[ComponentKind]) -> EcsResult<ViewId> {
        let id = ViewId(self.views.len() as u32);
        self.views.push(View::new(self.arena, kinds, self.capacity)?);
        Ok(id)
    }

    /// Entities currently matching the view, in entity-table order.
    ///
    /// The cached list is rebuilt first if a relevant change happened since
    /// the last query.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownView`].
    pub fn query(&mut self, view: ViewId) -> EcsResult<ViewIter<'_, 'a>> {
        let entities = self.entities;
        let capacity = self.capacity;
        let entry = self
            .views
            .get_mut(view.index())
            .ok_or(EcsError::UnknownView(view.0))?;
        entry.refresh(entities, capacity)?;
        Ok(entry.iter(entities))
    }

    /// Number of entities matching the view.
    ///
    /// # Errors
    ///
    /// Same as [`World::query`].
    pub fn view_len(&mut self, view: ViewId) -> EcsResult<usize> {
        let entities = self.entities;
        let capacity = self.capacity;
        let entry = self
            .views
            .get_mut(view.index())
            .ok_or(EcsError::UnknownView(view.0))?;
        entry.refresh(entities, capacity)?;
        Ok(entry.len())
    }

    /// Kinds mask a view was declared with.
    #[must_use]
    pub fn view_mask(&self, view: ViewId) -> Option<u32> {
        self.views.get(view.index()).map(View::mask)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn record(&self, index: usize) -> Option<Entity> {
        self.arena.read::<Entity>(self.entities, index)
    }

    fn store(&self, index: usize, entity: Entity) -> EcsResult<()> {
        if self.arena.write(self.entities, index, entity) {
            Ok(())
        } else {
            Err(MemoryError::Borrowed.into())
        }
    }

    fn live(&self, id: EntityId) -> Option<(usize, Entity)> {
        if id.is_null() {
            return None;
        }
        let index = id.index() as usize;
        let entity = self.record(index)?;
        (entity.is_alive() && entity.id.generation() == id.generation()).then_some((index, entity))
    }

    fn typed_pool<C: Component>(&self) -> EcsResult<()> {
        match self.pools[C::KIND.index()].as_ref() {
            None => Err(EcsError::UnregisteredKind(C::KIND)),
            Some(pool) if pool.as_any().is::<Pool<C>>() => Ok(()),
            Some(_) => Err(EcsError::PoolTypeMismatch(C::KIND)),
        }
    }

    fn touch_views(&mut self, changed: u32) {
        for view in &mut self.views {
            view.touch(changed);
        }
    }
}

impl Drop for World<'_> {
    fn drop(&mut self) {
        tracing::debug!(
            used = self.arena.used(),
            capacity = self.arena.capacity(),
            "cleaning ECS arena"
        );
    }
}

impl std::fmt::Debug for World<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("capacity", &self.capacity)
            .field("alive", &self.alive_count)
            .field(
                "registered",
                &self.pools.iter().flatten().map(|p| p.kind()).collect::<Vec<_>>(),
            )
            .field("views", &self.views.len())
            .finish_non_exhaustive()
    }
}
