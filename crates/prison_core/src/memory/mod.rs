//! # Memory Management
//!
//! Arena allocation for subsystems that size their memory once at startup.
//!
//! ## Design Philosophy
//!
//! Each subsystem owns one arena. During gameplay:
//! - No general heap allocations
//! - No per-object free
//! - Scratch work is released by checkpoint rollback, everything else by reset

mod arena;
mod shared;
mod temp;

pub use arena::{align_for, Allocation, Arena, Checkpoint, DEFAULT_ALIGNMENT};
pub(crate) use arena::{cast_range, cast_range_mut};
pub use shared::SharedArena;
pub use temp::TempArena;

/// Converts kibibytes to bytes.
#[inline]
#[must_use]
pub const fn kilobytes(k: usize) -> usize {
    k * 1024
}

/// Converts mebibytes to bytes.
#[inline]
#[must_use]
pub const fn megabytes(m: usize) -> usize {
    m * 1024 * 1024
}
