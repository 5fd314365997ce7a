//! # Prison Assets
//!
//! Name-indexed registry for textures, sprites, animations, tiles and maps.
//!
//! ## Architecture Rules
//!
//! 1. **Bounded pools** - Every asset kind has a fixed capacity from
//!    [`AssetConfig`]; overruns are errors, never reallocations
//! 2. **Names in the arena** - Name tables are [`prison_core::StrTable`]s
//!    backed by the asset arena
//! 3. **Indices, not pointers** - Records refer to each other by pool index
//!
//! File formats and GPU uploads belong to an [`AssetSource`]. The registry
//! resolves names and stores records.
//!
//! ## Example
//!
//! ```rust,ignore
//! use prison_assets::{AssetConfig, AssetRegistry, LoaderKind};
//! use prison_core::Arena;
//!
//! let config = AssetConfig::default();
//! let arena = Arena::new(config.arena_bytes);
//! let mut assets = AssetRegistry::new(&arena, config)?;
//!
//! assets.enqueue(LoaderKind::SpriteSheet, "characters")?;
//! assets.enqueue(LoaderKind::Animation, "characters")?;
//! assets.enqueue(LoaderKind::Map, "prison")?;
//! assets.load_sync(&mut source)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod loader;
pub mod records;
pub mod registry;

pub use config::AssetConfig;
pub use error::{AssetError, AssetResult};
pub use loader::{AssetSource, LoadEntry, LoadQueue, LoaderKind};
pub use records::{
    Animation, AnimationDef, AssetKind, MapDef, Rect, Sprite, SpriteSheetDef, Texture, Tile,
    TileMap,
};
pub use registry::AssetRegistry;
