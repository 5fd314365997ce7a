//! # Arena Allocator
//!
//! A bump allocator over one fixed backing buffer. Memory is handed out as
//! [`Allocation`] ranges and released all at once, either by [`Arena::reset`]
//! or by rolling back to a [`Checkpoint`].

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::ops::Range;

use bytemuck::Pod;

use crate::error::{MemoryError, MemoryResult};

/// Default alignment: two pointer widths.
pub const DEFAULT_ALIGNMENT: usize = 2 * std::mem::size_of::<usize>();

/// Alignment used for a slice of `T` inside an arena.
#[inline]
#[must_use]
pub const fn align_for<T>() -> usize {
    let align = std::mem::align_of::<T>();
    if align > DEFAULT_ALIGNMENT {
        align
    } else {
        DEFAULT_ALIGNMENT
    }
}

/// A byte range handed out by an [`Arena`].
///
/// The range stays readable until the arena is reset or rolled back past
/// it; after that it aliases whatever is allocated next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Allocation {
    offset: usize,
    len: usize,
}

impl Allocation {
    /// Offset of the first byte inside the arena buffer.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Returns `true` for a zero-length allocation.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// One past the last byte.
    #[inline]
    #[must_use]
    pub const fn end(self) -> usize {
        self.offset + self.len
    }

    /// The byte range inside the arena buffer.
    #[inline]
    #[must_use]
    pub const fn range(self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Saved arena offsets, restored by [`Arena::restore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    previous: usize,
    current: usize,
    epoch: u64,
}

impl Checkpoint {
    /// The arena's `current` offset when the checkpoint was taken.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> usize {
        self.current
    }
}

/// A bump-pointer arena allocator.
///
/// Allocations are zeroed and aligned by real address. Only the most recent
/// allocation can grow in place; anything else is copied on growth and the
/// old range stays as garbage until the next reset.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread, or wrap it in a
/// [`SharedArena`](super::SharedArena).
///
/// # Example
///
/// ```rust,ignore
/// let arena = Arena::new(kilobytes(10));
/// let block = arena.alloc_slice::<i32>(16)?;
/// arena.with_slice_mut::<i32, _>(block, |ints| ints[0] = 7)?;
/// arena.reset();
/// ```
pub struct Arena {
    /// The backing storage.
    storage: RefCell<Box<[u8]>>,
    /// Buffer length, fixed at creation.
    capacity: usize,
    /// Address of the first byte. The boxed buffer never moves.
    base: usize,
    /// Start of the most recent allocation.
    previous: Cell<usize>,
    /// Next free byte.
    current: Cell<usize>,
    /// Bumped on every reset.
    epoch: Cell<u64>,
}

impl Arena {
    /// Creates a new arena with a zeroed buffer of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::from_buffer(vec![0u8; capacity].into_boxed_slice())
    }

    /// Binds an arena to a caller-provided buffer.
    ///
    /// The buffer is not cleared; every allocation zeroes its own range.
    #[must_use]
    pub fn from_buffer(buffer: Box<[u8]>) -> Self {
        Self {
            capacity: buffer.len(),
            base: buffer.as_ptr() as usize,
            storage: RefCell::new(buffer),
            previous: Cell::new(0),
            current: Cell::new(0),
            epoch: Cell::new(0),
        }
    }

    /// Tears the arena down and hands the backing buffer back.
    #[must_use]
    pub fn into_buffer(self) -> Box<[u8]> {
        tracing::debug!(
            used = self.used(),
            capacity = self.capacity(),
            "releasing arena"
        );
        self.storage.into_inner()
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current used space in bytes.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.current.get()
    }

    /// Returns the remaining free space in bytes.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Start offset of the most recent allocation.
    #[inline]
    #[must_use]
    pub fn previous_offset(&self) -> usize {
        self.previous.get()
    }

    /// Number of resets so far.
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.get()
    }

    /// Allocates `size` zeroed bytes aligned to `align`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::InvalidAlignment`] if `align` is not a power of two,
    /// [`MemoryError::OutOfMemory`] if the aligned request does not fit.
    pub fn alloc_aligned(&self, size: usize, align: usize) -> MemoryResult<Allocation> {
        check_alignment(align)?;

        let mut storage = self.storage_mut()?;
        let offset = align_forward(self.base + self.current.get(), align) - self.base;

        let Some(end) = offset.checked_add(size).filter(|&end| end <= self.capacity) else {
            let remaining = self.capacity - self.current.get();
            tracing::warn!(requested = size, remaining, "arena out of memory");
            return Err(MemoryError::OutOfMemory {
                requested: size,
                remaining,
            });
        };

        storage[offset..end].fill(0);
        self.previous.set(offset);
        self.current.set(end);

        Ok(Allocation { offset, len: size })
    }

    /// Allocates `size` zeroed bytes with [`DEFAULT_ALIGNMENT`].
    ///
    /// # Errors
    ///
    /// See [`Arena::alloc_aligned`].
    #[inline]
    pub fn alloc(&self, size: usize) -> MemoryResult<Allocation> {
        self.alloc_aligned(size, DEFAULT_ALIGNMENT)
    }

    /// Allocates room for `count` zeroed values of `T`.
    ///
    /// # Errors
    ///
    /// See [`Arena::alloc_aligned`].
    pub fn alloc_slice<T: Pod>(&self, count: usize) -> MemoryResult<Allocation> {
        let size = std::mem::size_of::<T>()
            .checked_mul(count)
            .ok_or(MemoryError::OutOfMemory {
                requested: usize::MAX,
                remaining: self.remaining(),
            })?;
        self.alloc_aligned(size, align_for::<T>())
    }

    /// Resizes an allocation.
    ///
    /// `None` or an empty `old` behaves like [`Arena::alloc_aligned`]. When
    /// `old` is the most recent allocation it is resized in place and the
    /// grown tail is zeroed. Otherwise a fresh range is allocated and the
    /// first `min(old.len(), new_size)` bytes are copied over.
    ///
    /// # Errors
    ///
    /// [`MemoryError::ForeignAllocation`] if `old` is not inside this arena,
    /// plus everything [`Arena::alloc_aligned`] can return.
    pub fn realloc_aligned(
        &self,
        old: Option<Allocation>,
        new_size: usize,
        align: usize,
    ) -> MemoryResult<Allocation> {
        check_alignment(align)?;

        let old = match old {
            Some(old) if !old.is_empty() => old,
            _ => return self.alloc_aligned(new_size, align),
        };

        let capacity = self.capacity();
        if old.end() > capacity {
            return Err(MemoryError::ForeignAllocation {
                offset: old.offset,
                len: old.len,
                capacity,
            });
        }

        if self.is_last(old, align) {
            let Some(end) = old.offset.checked_add(new_size).filter(|&end| end <= capacity)
            else {
                let remaining = capacity - self.current.get();
                tracing::warn!(
                    requested = new_size - old.len,
                    remaining,
                    "arena out of memory growing in place"
                );
                return Err(MemoryError::OutOfMemory {
                    requested: new_size - old.len,
                    remaining,
                });
            };
            if new_size > old.len {
                self.storage_mut()?[old.end()..end].fill(0);
            }
            self.current.set(end);
            return Ok(Allocation {
                offset: old.offset,
                len: new_size,
            });
        }

        let fresh = self.alloc_aligned(new_size, align)?;
        let copied = old.len.min(new_size);
        self.storage_mut()?
            .copy_within(old.offset..old.offset + copied, fresh.offset);

        Ok(fresh)
    }

    /// Resizes an allocation with [`DEFAULT_ALIGNMENT`].
    ///
    /// # Errors
    ///
    /// See [`Arena::realloc_aligned`].
    #[inline]
    pub fn realloc(&self, old: Option<Allocation>, new_size: usize) -> MemoryResult<Allocation> {
        self.realloc_aligned(old, new_size, DEFAULT_ALIGNMENT)
    }

    /// Resets the arena, invalidating all previous allocations.
    ///
    /// No memory is freed or cleared. Ranges handed out before the reset
    /// alias whatever gets allocated next.
    pub fn reset(&self) {
        tracing::debug!(
            used = self.used(),
            capacity = self.capacity(),
            epoch = self.epoch.get(),
            "resetting arena"
        );
        self.previous.set(0);
        self.current.set(0);
        self.epoch.set(self.epoch.get().wrapping_add(1));
    }

    /// Captures the current offsets.
    #[inline]
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            previous: self.previous.get(),
            current: self.current.get(),
            epoch: self.epoch.get(),
        }
    }

    /// Rolls the arena back to `checkpoint`, releasing everything allocated
    /// after it was taken.
    pub fn restore(&self, checkpoint: Checkpoint) {
        if checkpoint.epoch != self.epoch.get() {
            tracing::debug!(
                checkpoint_epoch = checkpoint.epoch,
                epoch = self.epoch.get(),
                "restoring checkpoint taken before a reset"
            );
        }
        let capacity = self.capacity();
        self.previous.set(checkpoint.previous.min(capacity));
        self.current.set(checkpoint.current.min(capacity));
    }

    /// Starts a scratch scope that rolls back when dropped.
    #[inline]
    #[must_use]
    pub fn temp(&self) -> super::TempArena<'_> {
        super::TempArena::begin(self)
    }

    /// Runs `f` over the bytes of `alloc`.
    ///
    /// The buffer stays borrowed while `f` runs: arena calls made from `f`
    /// that need to write fail with [`MemoryError::Borrowed`].
    ///
    /// # Errors
    ///
    /// [`MemoryError::ForeignAllocation`] if the range is out of bounds,
    /// [`MemoryError::Borrowed`] if the buffer is mutably borrowed.
    pub fn with_bytes<R>(&self, alloc: Allocation, f: impl FnOnce(&[u8]) -> R) -> MemoryResult<R> {
        let storage = self.storage()?;
        let bytes = bytes_of(&storage, alloc)?;
        Ok(f(bytes))
    }

    /// Runs `f` over the bytes of `alloc`, mutably.
    ///
    /// Arena calls made from `f` fail with [`MemoryError::Borrowed`].
    ///
    /// # Errors
    ///
    /// [`MemoryError::ForeignAllocation`] if the range is out of bounds,
    /// [`MemoryError::Borrowed`] if the buffer is already borrowed.
    pub fn with_bytes_mut<R>(
        &self,
        alloc: Allocation,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> MemoryResult<R> {
        let mut storage = self.storage_mut()?;
        let bytes = bytes_of_mut(&mut storage, alloc)?;
        Ok(f(bytes))
    }

    /// Runs `f` over `alloc` viewed as a slice of `T`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::ForeignAllocation`], [`MemoryError::Misaligned`] or
    /// [`MemoryError::Borrowed`].
    pub fn with_slice<T: Pod, R>(
        &self,
        alloc: Allocation,
        f: impl FnOnce(&[T]) -> R,
    ) -> MemoryResult<R> {
        let storage = self.storage()?;
        let slice = cast_range::<T>(&storage, alloc)?;
        Ok(f(slice))
    }

    /// Runs `f` over `alloc` viewed as a mutable slice of `T`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::ForeignAllocation`], [`MemoryError::Misaligned`] or
    /// [`MemoryError::Borrowed`].
    pub fn with_slice_mut<T: Pod, R>(
        &self,
        alloc: Allocation,
        f: impl FnOnce(&mut [T]) -> R,
    ) -> MemoryResult<R> {
        let mut storage = self.storage_mut()?;
        let slice = cast_range_mut::<T>(&mut storage, alloc)?;
        Ok(f(slice))
    }

    /// Reads element `index` of `alloc` viewed as `[T]`.
    ///
    /// Returns `None` if the range is not a valid `[T]`, `index` is past
    /// its end, or the buffer is mutably borrowed.
    #[must_use]
    pub fn read<T: Pod>(&self, alloc: Allocation, index: usize) -> Option<T> {
        let storage = self.storage().ok()?;
        cast_range::<T>(&storage, alloc).ok()?.get(index).copied()
    }

    /// Writes element `index` of `alloc` viewed as `[T]`.
    ///
    /// Returns `false` if the range is not a valid `[T]`, `index` is past
    /// its end, or the buffer is borrowed.
    pub fn write<T: Pod>(&self, alloc: Allocation, index: usize, value: T) -> bool {
        let Ok(mut storage) = self.storage_mut() else {
            return false;
        };
        match cast_range_mut::<T>(&mut storage, alloc) {
            Ok(slice) => slice.get_mut(index).map(|slot| *slot = value).is_some(),
            Err(_) => false,
        }
    }

    /// Shared borrow of the whole buffer, for containers that read several
    /// ranges at once.
    pub(crate) fn storage(&self) -> MemoryResult<Ref<'_, Box<[u8]>>> {
        self.storage.try_borrow().map_err(|_| MemoryError::Borrowed)
    }

    /// Exclusive borrow of the whole buffer.
    pub(crate) fn storage_mut(&self) -> MemoryResult<RefMut<'_, Box<[u8]>>> {
        self.storage.try_borrow_mut().map_err(|_| {
            tracing::warn!("arena buffer already borrowed");
            MemoryError::Borrowed
        })
    }

    /// Shared view of element `index` of `alloc` viewed as `[T]`, held until
    /// the guard drops.
    pub(crate) fn element<T: Pod>(&self, alloc: Allocation, index: usize) -> Option<Ref<'_, T>> {
        let storage = self.storage().ok()?;
        Ref::filter_map(storage, |bytes| cast_range::<T>(bytes, alloc).ok()?.get(index)).ok()
    }

    /// Exclusive view of element `index` of `alloc` viewed as `[T]`.
    pub(crate) fn element_mut<T: Pod>(
        &self,
        alloc: Allocation,
        index: usize,
    ) -> Option<RefMut<'_, T>> {
        let storage = self.storage_mut().ok()?;
        RefMut::filter_map(storage, |bytes| {
            cast_range_mut::<T>(bytes, alloc).ok()?.get_mut(index)
        })
        .ok()
    }

    fn is_last(&self, alloc: Allocation, align: usize) -> bool {
        alloc.offset == self.previous.get()
            && alloc.end() == self.current.get()
            && (self.base + alloc.offset) & (align - 1) == 0
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("previous", &self.previous.get())
            .field("current", &self.current.get())
            .field("epoch", &self.epoch.get())
            .finish()
    }
}

#[inline]
const fn is_power_of_two(x: usize) -> bool {
    x != 0 && (x & (x - 1)) == 0
}

#[inline]
const fn align_forward(ptr: usize, align: usize) -> usize {
    (ptr + align - 1) & !(align - 1)
}

fn check_alignment(align: usize) -> MemoryResult<()> {
    if is_power_of_two(align) {
        Ok(())
    } else {
        tracing::warn!(align, "rejecting non power-of-two alignment");
        Err(MemoryError::InvalidAlignment { align })
    }
}

fn bytes_of(storage: &[u8], alloc: Allocation) -> MemoryResult<&[u8]> {
    storage
        .get(alloc.range())
        .ok_or(MemoryError::ForeignAllocation {
            offset: alloc.offset,
            len: alloc.len,
            capacity: storage.len(),
        })
}

fn bytes_of_mut(storage: &mut [u8], alloc: Allocation) -> MemoryResult<&mut [u8]> {
    let capacity = storage.len();
    storage
        .get_mut(alloc.range())
        .ok_or(MemoryError::ForeignAllocation {
            offset: alloc.offset,
            len: alloc.len,
            capacity,
        })
}

/// Views `alloc` inside `storage` as a slice of `T`.
pub(crate) fn cast_range<T: Pod>(storage: &[u8], alloc: Allocation) -> MemoryResult<&[T]> {
    let bytes = bytes_of(storage, alloc)?;
    bytemuck::try_cast_slice(bytes).map_err(|_| MemoryError::Misaligned {
        offset: alloc.offset,
        len: alloc.len,
        type_size: std::mem::size_of::<T>(),
    })
}

/// Views `alloc` inside `storage` as a mutable slice of `T`.
pub(crate) fn cast_range_mut<T: Pod>(
    storage: &mut [u8],
    alloc: Allocation,
) -> MemoryResult<&mut [T]> {
    let bytes = bytes_of_mut(storage, alloc)?;
    bytemuck::try_cast_slice_mut(bytes).map_err(|_| MemoryError::Misaligned {
        offset: alloc.offset,
        len: alloc.len,
        type_size: std::mem::size_of::<T>(),
    })
}
