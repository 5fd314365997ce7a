//! # Handle List
//!
//! A growable list of `i32` handles stored in an arena.
//!
//! The element type is fixed on purpose: every user stores opaque integer
//! handles (entity indices, asset indices), so there is no generic payload.

use crate::error::MemoryResult;
use crate::memory::{align_for, Allocation, Arena};

const SLOT_SIZE: usize = std::mem::size_of::<i32>();

/// An arena-backed list of `i32` handles.
///
/// Growth doubles capacity through [`Arena::realloc_aligned`]: in place when
/// the list's buffer is the arena's most recent allocation, copied
/// otherwise. Lists that share an arena with other growing structures
/// should expect the occasional copy.
///
/// # Example
///
/// ```rust,ignore
/// let arena = Arena::new(kilobytes(10));
/// let mut list = HandleList::new(&arena)?;
/// list.push(42)?;
/// assert_eq!(list.get(0), Some(42));
/// ```
#[derive(Debug)]
pub struct HandleList<'a> {
    arena: &'a Arena,
    slots: Allocation,
    len: usize,
    capacity: usize,
}

impl<'a> HandleList<'a> {
    /// Slots allocated by [`HandleList::new`].
    pub const INITIAL_CAPACITY: usize = 16;

    /// Creates an empty list with [`Self::INITIAL_CAPACITY`] slots.
    ///
    /// # Errors
    ///
    /// Fails if the arena cannot hold the initial buffer.
    pub fn new(arena: &'a Arena) -> MemoryResult<Self> {
        Self::with_capacity(arena, Self::INITIAL_CAPACITY)
    }

    /// Creates an empty list with room for `capacity` handles (at least one).
    ///
    /// # Errors
    ///
    /// Fails if the arena cannot hold the buffer.
    pub fn with_capacity(arena: &'a Arena, capacity: usize) -> MemoryResult<Self> {
        let capacity = capacity.max(1);
        let slots = arena.alloc_slice::<i32>(capacity)?;
        Ok(Self {
            arena,
            slots,
            len: 0,
            capacity,
        })
    }

    /// Number of handles stored.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no handles.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of handles that fit before the next growth.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a handle, doubling the buffer when full.
    ///
    /// # Errors
    ///
    /// Fails if the arena cannot hold the grown buffer. The list is left
    /// unchanged in that case.
    pub fn push(&mut self, value: i32) -> MemoryResult<()> {
        if self.len >= self.capacity {
            self.grow(self.capacity * 2)?;
        }
        let index = self.len;
        self.arena.with_slice_mut::<i32, _>(self.slots, |slots| {
            slots[index] = value;
        })?;
        self.len += 1;
        Ok(())
    }

    /// Returns the handle at `index`, or `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<i32> {
        if index >= self.len {
            return None;
        }
        self.arena
            .with_slice::<i32, _>(self.slots, |slots| slots[index])
            .ok()
    }

    /// Overwrites the handle at `index`.
    ///
    /// Returns `false` if `index` is past the end.
    pub fn set(&mut self, index: usize, value: i32) -> bool {
        if index >= self.len {
            return false;
        }
        self.arena
            .with_slice_mut::<i32, _>(self.slots, |slots| slots[index] = value)
            .is_ok()
    }

    /// Removes the handle at `index`, shifting the tail down one slot.
    pub fn remove(&mut self, index: usize) -> Option<i32> {
        if index >= self.len {
            return None;
        }
        let len = self.len;
        let removed = self
            .arena
            .with_slice_mut::<i32, _>(self.slots, |slots| {
                let removed = slots[index];
                slots.copy_within(index + 1..len, index);
                removed
            })
            .ok()?;
        self.len -= 1;
        Some(removed)
    }

    /// Removes the handle at `index` by moving the last handle into its slot.
    ///
    /// O(1), does not preserve order.
    pub fn swap_remove(&mut self, index: usize) -> Option<i32> {
        if index >= self.len {
            return None;
        }
        let last = self.len - 1;
        let removed = self
            .arena
            .with_slice_mut::<i32, _>(self.slots, |slots| {
                let removed = slots[index];
                slots[index] = slots[last];
                removed
            })
            .ok()?;
        self.len -= 1;
        Some(removed)
    }

    /// Returns `true` if `value` is in the list.
    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        let len = self.len;
        self.arena
            .with_slice::<i32, _>(self.slots, |slots| slots[..len].contains(&value))
            .unwrap_or(false)
    }

    /// Empties the list. The buffer is kept for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Iterates over the stored handles in order.
    #[must_use]
    pub fn iter(&self) -> HandleIter<'_, 'a> {
        HandleIter {
            list: self,
            next: 0,
        }
    }

    /// Copies the handles out to a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<i32> {
        self.iter().collect()
    }

    fn grow(&mut self, new_capacity: usize) -> MemoryResult<()> {
        let slots = self.arena.realloc_aligned(
            Some(self.slots),
            new_capacity * SLOT_SIZE,
            align_for::<i32>(),
        )?;
        tracing::trace!(
            from = self.capacity,
            to = new_capacity,
            moved = slots.offset() != self.slots.offset(),
            "growing handle list"
        );
        self.slots = slots;
        self.capacity = new_capacity;
        Ok(())
    }
}

/// Iterator over a [`HandleList`].
#[derive(Debug)]
pub struct HandleIter<'l, 'a> {
    list: &'l HandleList<'a>,
    next: usize,
}

impl Iterator for HandleIter<'_, '_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let value = self.list.get(self.next)?;
        self.next += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.list.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HandleIter<'_, '_> {}

impl<'l, 'a> IntoIterator for &'l HandleList<'a> {
    type Item = i32;
    type IntoIter = HandleIter<'l, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
