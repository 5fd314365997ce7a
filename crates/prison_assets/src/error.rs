//! # Asset Error Types

use prison_core::{ConfigError, MemoryError};
use thiserror::Error;

use crate::records::AssetKind;

/// Errors raised while registering or loading assets.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The pool for this kind of asset is full.
    #[error("{kind} pool full: capacity {capacity}")]
    CapacityExceeded {
        /// Kind of asset being added.
        kind: AssetKind,
        /// Size of the pool.
        capacity: usize,
    },

    /// An animation has more frames than a record can hold.
    #[error("animation {name} has {frames} frames, at most {max} allowed")]
    TooManyFrames {
        /// Animation name.
        name: String,
        /// Frames requested.
        frames: usize,
        /// Frame limit.
        max: usize,
    },

    /// A sprite references a texture index that was never added.
    #[error("unknown texture index {0}")]
    UnknownTexture(u32),

    /// A sprite name that was never added.
    #[error("unknown sprite {0}")]
    UnknownSprite(String),

    /// A map cell names a tileset entry the map does not have.
    #[error("map {map} layer {layer}: cell {cell} outside tileset of {tileset_len}")]
    UnknownTile {
        /// Map name.
        map: String,
        /// Layer holding the cell.
        layer: usize,
        /// Offending tileset index.
        cell: u32,
        /// Entries in the map's tileset.
        tileset_len: usize,
    },

    /// A map layer does not have one cell per tile of the map.
    #[error("map {map} layer {layer} has {len} cells, expected {expected}")]
    LayerSize {
        /// Map name.
        map: String,
        /// Layer index.
        layer: usize,
        /// Cells in the layer.
        len: usize,
        /// `width * height`.
        expected: u64,
    },

    /// Every load queue entry is taken.
    #[error("load queue full: capacity {capacity}")]
    QueueFull {
        /// Size of the queue.
        capacity: usize,
    },

    /// The asset source failed to produce an asset.
    #[error("failed to load {name}: {reason}")]
    Source {
        /// Queue entry name.
        name: String,
        /// Source-specific description.
        reason: String,
    },

    /// The asset arena is exhausted.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// The asset configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
