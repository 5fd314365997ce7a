//! # Asset Configuration
//!
//! Pool sizes for the asset registry. Defaults are the shipped limits.

use std::path::Path;

use prison_core::{kilobytes, ConfigError};
use serde::{Deserialize, Serialize};

use crate::error::AssetResult;

/// Asset registry sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Size of the asset arena in bytes.
    pub arena_bytes: usize,
    /// Texture pool size.
    pub textures: usize,
    /// Sprite pool size.
    pub sprites: usize,
    /// Animation pool size.
    pub animations: usize,
    /// Tile pool size.
    pub tiles: usize,
    /// Map pool size.
    pub maps: usize,
    /// Frames per animation.
    pub max_anim_frames: usize,
    /// Pending load queue entries.
    pub queue_len: usize,
    /// Initial slots of the sprite name table.
    pub name_slots: usize,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            arena_bytes: kilobytes(500),
            textures: 8,
            sprites: 256,
            animations: 16,
            tiles: 128,
            maps: 1,
            max_anim_frames: 4,
            queue_len: 16,
            name_slots: 1024,
        }
    }
}

impl AssetConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`AssetError::Config`](crate::AssetError::Config) for malformed TOML
    /// or a zero capacity.
    pub fn from_toml_str(source: &str) -> AssetResult<Self> {
        let config: Self = toml::from_str(source).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// As [`AssetConfig::from_toml_str`], plus I/O failures.
    pub fn from_toml_file(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), arena_bytes = config.arena_bytes, "loaded asset config");
        Ok(config)
    }

    /// Checks that every capacity is non-zero.
    ///
    /// # Errors
    ///
    /// [`AssetError::Config`](crate::AssetError::Config) naming the first
    /// bad value.
    pub fn validate(&self) -> AssetResult<()> {
        let fields = [
            ("arena_bytes", self.arena_bytes),
            ("textures", self.textures),
            ("sprites", self.sprites),
            ("animations", self.animations),
            ("tiles", self.tiles),
            ("maps", self.maps),
            ("max_anim_frames", self.max_anim_frames),
            ("queue_len", self.queue_len),
            ("name_slots", self.name_slots),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::Invalid(format!("assets.{name} must be > 0")).into()),
            None => Ok(()),
        }
    }
}
