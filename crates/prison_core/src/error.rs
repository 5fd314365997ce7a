//! # Core Error Types
//!
//! Every failure the arena, the containers and the ECS can report.
//!
//! Capacity errors are sizing bugs: arenas, entity tables and pools are
//! dimensioned at startup, so hitting a limit means the configuration is
//! wrong, not that the caller should retry.

use std::path::PathBuf;

use thiserror::Error;

use crate::ecs::ComponentKind;

/// Errors raised by the arena allocator and the containers built on it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The arena has no room left for the request.
    #[error("arena out of memory: requested {requested} bytes, {remaining} remaining")]
    OutOfMemory {
        /// Bytes requested.
        requested: usize,
        /// Bytes still free past the current offset.
        remaining: usize,
    },

    /// Alignment is zero or not a power of two.
    #[error("alignment {align} is not a power of two")]
    InvalidAlignment {
        /// The rejected alignment.
        align: usize,
    },

    /// An allocation that does not lie inside this arena's buffer.
    #[error("allocation {offset}+{len} lies outside the arena ({capacity} bytes)")]
    ForeignAllocation {
        /// Start of the rejected range.
        offset: usize,
        /// Length of the rejected range.
        len: usize,
        /// Capacity of the arena it was handed to.
        capacity: usize,
    },

    /// A range that cannot be viewed as the requested element type
    /// (misaligned, or not a whole number of elements).
    #[error("allocation {offset}+{len} cannot be viewed as {type_size}-byte elements")]
    Misaligned {
        /// Start of the range.
        offset: usize,
        /// Length of the range.
        len: usize,
        /// Size of the element type.
        type_size: usize,
    },

    /// The arena buffer is borrowed by an access that is still running,
    /// e.g. a call made from inside a `with_*` closure or while a component
    /// guard is alive.
    #[error("arena buffer is already borrowed")]
    Borrowed,
}

/// Errors raised by the entity component store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// Every entity slot is enabled.
    #[error("entity table full: capacity {capacity}")]
    EntityTableFull {
        /// Size of the entity table.
        capacity: usize,
    },

    /// Every slot in a component pool is enabled.
    #[error("component pool {kind} full: capacity {capacity}")]
    PoolFull {
        /// Kind whose pool is exhausted.
        kind: ComponentKind,
        /// Size of the pool.
        capacity: usize,
    },

    /// The entity id is out of range, disabled, or from an older generation.
    #[error("stale or unknown entity (index {index}, generation {generation})")]
    StaleEntity {
        /// Index encoded in the id.
        index: u32,
        /// Generation encoded in the id.
        generation: u32,
    },

    /// No pool has been registered for the kind.
    #[error("no pool registered for component kind {0}")]
    UnregisteredKind(ComponentKind),

    /// A pool is already registered for the kind.
    #[error("component kind {0} is already registered")]
    KindAlreadyRegistered(ComponentKind),

    /// The registered pool stores a different record type than requested.
    #[error("pool registered for component kind {0} stores a different type")]
    PoolTypeMismatch(ComponentKind),

    /// The view id was not issued by this world.
    #[error("unknown view {0}")]
    UnknownView(u32),

    /// Arena failure while maintaining the entity table, pools or views.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the expected schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but violate a constraint.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for arena and container operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
