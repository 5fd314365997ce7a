//! # Core Configuration
//!
//! Arena and ECS sizing, loaded once at startup. Every field has a default,
//! so a config file only needs the values it changes:
//!
//! ```toml
//! [arena]
//! capacity_bytes = 524288
//!
//! [ecs]
//! max_entities = 512
//!
//! [ecs.pools]
//! anim_render = 128
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::memory::kilobytes;

/// Default ECS arena size.
pub const DEFAULT_ECS_ARENA_BYTES: usize = kilobytes(256);

/// Default entity table size.
pub const DEFAULT_MAX_ENTITIES: usize = 1024;

/// Top-level configuration for the core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Arena backing the ECS.
    pub arena: ArenaConfig,
    /// Entity table and pool sizes.
    pub ecs: EcsConfig,
}

/// Arena sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Size of the backing buffer in bytes.
    pub capacity_bytes: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_ECS_ARENA_BYTES,
        }
    }
}

/// Entity table and component pool sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Number of entity slots.
    pub max_entities: usize,
    /// Slots per built-in component pool.
    pub pools: PoolCapacities,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_entities: DEFAULT_MAX_ENTITIES,
            pools: PoolCapacities::default(),
        }
    }
}

/// Slots per built-in component kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolCapacities {
    /// Transform pool.
    pub transform: usize,
    /// Sprite render pool.
    pub sprite_render: usize,
    /// Animation render pool.
    pub anim_render: usize,
    /// Map render pool.
    pub map_render: usize,
    /// Camera pool.
    pub camera: usize,
}

impl Default for PoolCapacities {
    fn default() -> Self {
        Self {
            transform: 1024,
            sprite_render: 1024,
            anim_render: 256,
            map_render: 4,
            camera: 4,
        }
    }
}

impl PoolCapacities {
    fn named(&self) -> [(&'static str, usize); 5] {
        [
            ("transform", self.transform),
            ("sprite_render", self.sprite_render),
            ("anim_render", self.anim_render),
            ("map_render", self.map_render),
            ("camera", self.camera),
        ]
    }
}

impl CoreConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// if a value fails [`CoreConfig::validate`].
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`CoreConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(
            path = %path.display(),
            arena_bytes = config.arena.capacity_bytes,
            max_entities = config.ecs.max_entities,
            "loaded core config"
        );
        Ok(config)
    }

    /// Checks that every capacity is usable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.arena.capacity_bytes == 0 {
            return Err(ConfigError::Invalid("arena.capacity_bytes must be > 0".into()));
        }
        self.ecs.validate()
    }
}

impl EcsConfig {
    /// Checks the entity table and pool sizes.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_entities == 0 || self.max_entities > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "ecs.max_entities must be in 1..={}, got {}",
                u32::MAX,
                self.max_entities
            )));
        }
        for (name, capacity) in self.pools.named() {
            if capacity == 0 {
                return Err(ConfigError::Invalid(format!(
                    "ecs.pools.{name} must be > 0"
                )));
            }
        }
        Ok(())
    }
}
