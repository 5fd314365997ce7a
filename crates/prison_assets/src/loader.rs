//! # Load Queue
//!
//! Assets are requested by `(loader, name)` during startup and loaded in
//! request order by [`AssetRegistry::load_sync`](crate::AssetRegistry::load_sync).
//! Reading and parsing files is the [`AssetSource`]'s job; the registry
//! only resolves names and stores records.

use crate::error::{AssetError, AssetResult};
use crate::records::{AnimationDef, MapDef, SpriteSheetDef};

/// Which loader handles a queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoaderKind {
    /// A texture and its sprite metadata.
    SpriteSheet,
    /// A set of animation definitions.
    Animation,
    /// A tile map with its tileset.
    Map,
}

/// Produces structured records for queued asset names.
pub trait AssetSource {
    /// Loads the sprite sheet `name`.
    ///
    /// # Errors
    ///
    /// Any failure, typically [`AssetError::Source`].
    fn sprite_sheet(&mut self, name: &str) -> AssetResult<SpriteSheetDef>;

    /// Loads the animation definitions in `name`.
    ///
    /// # Errors
    ///
    /// Any failure, typically [`AssetError::Source`].
    fn animations(&mut self, name: &str) -> AssetResult<Vec<AnimationDef>>;

    /// Loads the map `name`.
    ///
    /// # Errors
    ///
    /// Any failure, typically [`AssetError::Source`].
    fn map(&mut self, name: &str) -> AssetResult<MapDef>;
}

/// A pending load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadEntry {
    /// Loader to run.
    pub loader: LoaderKind,
    /// Name passed to the source.
    pub name: String,
}

/// Bounded FIFO of pending loads.
#[derive(Clone, Debug)]
pub struct LoadQueue {
    entries: Vec<LoadEntry>,
    capacity: usize,
}

impl LoadQueue {
    /// Creates an empty queue holding up to `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a request.
    ///
    /// # Errors
    ///
    /// [`AssetError::QueueFull`] at capacity.
    pub fn push(&mut self, loader: LoaderKind, name: &str) -> AssetResult<()> {
        if self.entries.len() >= self.capacity {
            return Err(AssetError::QueueFull {
                capacity: self.capacity,
            });
        }
        self.entries.push(LoadEntry {
            loader,
            name: name.to_owned(),
        });
        Ok(())
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending entries in request order.
    #[must_use]
    pub fn entries(&self) -> &[LoadEntry] {
        &self.entries
    }

    /// Removes and returns every pending entry.
    pub fn take(&mut self) -> Vec<LoadEntry> {
        std::mem::replace(&mut self.entries, Vec::with_capacity(self.capacity))
    }
}
