//! # Prison Core
//!
//! Memory and object storage for the Prison Apocalypse prototype:
//! - A bump arena per subsystem, sized once at startup
//! - Arena-backed containers: a handle list and a string table
//! - A fixed-capacity ECS with generational ids and cached views
//!
//! ## Architecture Rules
//!
//! 1. **Sized at startup** - Arenas, entity tables and pools never grow
//! 2. **Bulk release** - Memory comes back by reset or checkpoint rollback
//! 3. **No stale aliasing** - Every id carries a generation that is checked
//!    on lookup
//! 4. **Arena-resident ECS** - The entity table, every pool and every view
//!    list live in the world's arena
//!
//! ## Example
//!
//! ```rust,ignore
//! use prison_core::{Arena, CoreConfig, Transform, World};
//!
//! let config = CoreConfig::default();
//! let arena = Arena::new(config.arena.capacity_bytes);
//! let mut world = World::with_default_pools(&arena, &config.ecs)?;
//!
//! let player = world.create_entity()?;
//! world.create_component::<Transform>(player)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collections;
pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;

pub use collections::{fnv1a, HandleList, StrTable};
pub use config::{ArenaConfig, CoreConfig, EcsConfig, PoolCapacities};
pub use ecs::{
    AnimRender, Camera, Component, ComponentId, ComponentKind, ComponentPool, Entity, EntityId,
    MapRender, Pool, SpriteRender, Transform, Vec2, ViewId, World,
};
pub use error::{ConfigError, EcsError, MemoryError};
pub use memory::{kilobytes, megabytes, Allocation, Arena, Checkpoint, SharedArena, TempArena};
