//! # Scratch Scopes
//!
//! [`TempArena`] takes a checkpoint when it is created and rolls the arena
//! back when it goes out of scope, so early returns cannot leak scratch
//! memory.

use std::ops::Deref;

use super::arena::{Arena, Checkpoint};

/// A scratch scope over an [`Arena`].
///
/// Everything allocated through the guard (or through the arena directly
/// while the guard is alive) is released when the guard drops. Nested
/// guards must be dropped in reverse order of creation.
///
/// # Example
///
/// ```rust,ignore
/// let arena = Arena::new(4096);
/// {
///     let scratch = arena.temp();
///     let tmp = scratch.alloc(512)?;
///     // ... use tmp ...
/// } // rolled back here
/// assert_eq!(arena.used(), 0);
/// ```
#[derive(Debug)]
pub struct TempArena<'a> {
    arena: &'a Arena,
    checkpoint: Checkpoint,
}

impl<'a> TempArena<'a> {
    /// Opens a scope at the arena's current offsets.
    #[must_use]
    pub fn begin(arena: &'a Arena) -> Self {
        Self {
            arena,
            checkpoint: arena.checkpoint(),
        }
    }

    /// The checkpoint this scope will restore.
    #[inline]
    #[must_use]
    pub const fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// Closes the scope now instead of at end of block.
    pub fn end(self) {
        drop(self);
    }
}

impl Deref for TempArena<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        self.arena
    }
}

impl Drop for TempArena<'_> {
    fn drop(&mut self) {
        tracing::trace!(
            released = self.arena.used().saturating_sub(self.checkpoint.offset()),
            "closing scratch scope"
        );
        self.arena.restore(self.checkpoint);
    }
}
