//! # Entity Component System
//!
//! A fixed-capacity ECS for game objects.
//!
//! ## Design Philosophy
//!
//! - The entity table and every component pool are sized at world creation
//! - Entity and component ids carry a generation, so stale ids never alias
//! - Pools are registered per component kind behind [`ComponentPool`]
//! - Views cache their matching entities in an arena-backed list

mod component;
mod entity;
mod pool;
mod view;
mod world;

pub use component::{
    AnimRender, Camera, Component, ComponentId, ComponentKind, MapRender, SpriteRender,
    Transform, Vec2, MAX_COMPONENT_KINDS,
};
pub use entity::{Entity, EntityId};
pub use pool::{ComponentPool, Pool};
pub use view::{ViewId, ViewIter};
pub use world::World;
