//! # Shared Arena
//!
//! One mutex per arena, for the rare owner that hands an arena to more than
//! one thread. Single-threaded subsystems use [`Arena`] directly.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::arena::Arena;

/// A reference-counted, mutex-guarded [`Arena`].
///
/// Cloning shares the same arena. Every operation locks for its duration;
/// hold the guard from [`SharedArena::lock`] to batch several operations.
#[derive(Clone)]
pub struct SharedArena {
    inner: Arc<Mutex<Arena>>,
}

impl SharedArena {
    /// Creates a shared arena with a fresh buffer of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::from_arena(Arena::new(capacity))
    }

    /// Wraps an existing arena.
    #[must_use]
    pub fn from_arena(arena: Arena) -> Self {
        Self {
            inner: Arc::new(Mutex::new(arena)),
        }
    }

    /// Locks the arena.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Arena> {
        self.inner.lock()
    }

    /// Runs `f` with the arena locked.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&Arena) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Bytes used, sampled under the lock.
    #[must_use]
    pub fn used(&self) -> usize {
        self.inner.lock().used()
    }

    /// Total capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}

impl std::fmt::Debug for SharedArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedArena")
            .field("arena", &*self.inner.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn threads_share_one_bump_pointer() {
        let shared = SharedArena::new(64 * 1024);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let arena = shared.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        arena.with(|a| a.alloc_aligned(16, 16).unwrap());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(shared.used() >= 4 * 100 * 16);
    }

    #[test]
    fn guard_batches_operations() {
        let shared = SharedArena::new(1024);
        {
            let arena = shared.lock();
            let checkpoint = arena.checkpoint();
            let _ = arena.alloc(128).unwrap();
            arena.restore(checkpoint);
        }
        assert_eq!(shared.used(), 0);
        assert_eq!(shared.capacity(), 1024);
    }
}
