//! # String Table
//!
//! Open-addressing hash table from strings to `i32`, stored in an arena.
//!
//! - FNV-1a hashing, linear probing over `hash & (capacity - 1)`
//! - Capacity is always a power of two
//! - Doubles before an insert would push the load past 50%
//! - Keys are copied into the arena, so callers may drop their buffers
//! - No deletion: entries are written once or overwritten by the same key

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use super::hash::fnv1a;
use crate::error::MemoryResult;
use crate::memory::{cast_range, cast_range_mut, Allocation, Arena};

/// One bucket. `occupied == 0` marks an empty slot.
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
#[repr(C)]
struct Slot {
    key_offset: u64,
    key_len: u64,
    value: i32,
    occupied: u32,
}

impl Slot {
    #[inline]
    fn is_occupied(self) -> bool {
        self.occupied != 0
    }

    #[inline]
    fn key_range(self) -> Range<usize> {
        let start = self.key_offset as usize;
        start..start + self.key_len as usize
    }
}

enum Probe {
    Found(usize),
    Vacant(usize),
}

#[inline]
fn bucket(hash: u64, capacity: usize) -> usize {
    (hash & (capacity as u64 - 1)) as usize
}

/// A string-keyed, `i32`-valued table living in an arena.
///
/// # Example
///
/// ```rust,ignore
/// let arena = Arena::new(kilobytes(10));
/// let mut table = StrTable::new(&arena)?;
/// table.set("rifle_53", 530)?;
/// assert_eq!(table.get("rifle_53"), Some(530));
/// assert_eq!(table.get("shotgun"), None);
/// ```
#[derive(Debug)]
pub struct StrTable<'a> {
    arena: &'a Arena,
    slots: Allocation,
    capacity: usize,
    len: usize,
}

impl<'a> StrTable<'a> {
    /// Buckets allocated by [`StrTable::new`].
    pub const INITIAL_CAPACITY: usize = 16;

    /// Creates an empty table with [`Self::INITIAL_CAPACITY`] buckets.
    ///
    /// # Errors
    ///
    /// Fails if the arena cannot hold the bucket array.
    pub fn new(arena: &'a Arena) -> MemoryResult<Self> {
        Self::with_capacity(arena, Self::INITIAL_CAPACITY)
    }

    /// Creates an empty table with at least `capacity` buckets, rounded up
    /// to a power of two.
    ///
    /// Pre-sizing avoids rehashing (and the garbage it leaves in the arena)
    /// when the number of keys is known up front.
    ///
    /// # Errors
    ///
    /// Fails if the arena cannot hold the bucket array.
    pub fn with_capacity(arena: &'a Arena, capacity: usize) -> MemoryResult<Self> {
        let capacity = capacity.max(2).next_power_of_two();
        let slots = arena.alloc_slice::<Slot>(capacity)?;
        Ok(Self {
            arena,
            slots,
            capacity,
            len: 0,
        })
    }

    /// Number of keys stored.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no key is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets. Always a power of two.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts or overwrites `key`.
    ///
    /// Overwriting keeps `len` unchanged and never resizes. A new key that
    /// would take the load above one half doubles the table first.
    ///
    /// # Errors
    ///
    /// Fails if the arena cannot hold the key copy or a grown bucket array.
    /// A failed insert leaves the table's contents unchanged.
    pub fn set(&mut self, key: &str, value: i32) -> MemoryResult<()> {
        let key = key.as_bytes();

        let index = match self.probe(key)? {
            Probe::Found(index) => {
                return self.write_value(index, value);
            }
            Probe::Vacant(_) if (self.len + 1) * 2 > self.capacity => {
                self.resize(self.capacity * 2)?;
                match self.probe(key)? {
                    Probe::Vacant(index) | Probe::Found(index) => index,
                }
            }
            Probe::Vacant(index) => index,
        };

        let key_copy = self.arena.alloc_aligned(key.len(), 1)?;
        let slots = self.slots;
        let mut storage = self.arena.storage_mut()?;
        storage[key_copy.range()].copy_from_slice(key);
        cast_range_mut::<Slot>(&mut storage[..], slots)?[index] = Slot {
            key_offset: key_copy.offset() as u64,
            key_len: key_copy.len() as u64,
            value,
            occupied: 1,
        };
        self.len += 1;

        Ok(())
    }

    /// Looks `key` up.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i32> {
        match self.probe(key.as_bytes()).ok()? {
            Probe::Found(index) => self
                .arena
                .with_slice::<Slot, _>(self.slots, |slots| slots[index].value)
                .ok(),
            Probe::Vacant(_) => None,
        }
    }

    /// Returns `true` if `key` has been set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self.probe(key.as_bytes()), Ok(Probe::Found(_)))
    }

    /// Empties every bucket. Key copies stay in the arena until it resets.
    pub fn clear(&mut self) {
        if self
            .arena
            .with_bytes_mut(self.slots, |bytes| bytes.fill(0))
            .is_ok()
        {
            self.len = 0;
        }
    }

    /// Iterates over `(key, value)` pairs in bucket order.
    #[must_use]
    pub fn iter(&self) -> StrTableIter<'_, 'a> {
        StrTableIter {
            table: self,
            next: 0,
        }
    }

    fn probe(&self, key: &[u8]) -> MemoryResult<Probe> {
        let storage = self.arena.storage()?;
        let slots = cast_range::<Slot>(&storage[..], self.slots)?;
        let mask = self.capacity - 1;
        let mut index = bucket(fnv1a(key), self.capacity);

        // The load factor keeps at least half the buckets empty, so the
        // probe always terminates.
        loop {
            let slot = slots[index];
            if !slot.is_occupied() {
                return Ok(Probe::Vacant(index));
            }
            if storage.get(slot.key_range()) == Some(key) {
                return Ok(Probe::Found(index));
            }
            index = (index + 1) & mask;
        }
    }

    fn write_value(&mut self, index: usize, value: i32) -> MemoryResult<()> {
        self.arena
            .with_slice_mut::<Slot, _>(self.slots, |slots| slots[index].value = value)
    }

    fn resize(&mut self, new_capacity: usize) -> MemoryResult<()> {
        let fresh = self.arena.alloc_slice::<Slot>(new_capacity)?;
        let old = self.slots;
        let mask = new_capacity - 1;

        let mut storage = self.arena.storage_mut()?;
        for i in 0..self.capacity {
            let slot = cast_range::<Slot>(&storage[..], old)?[i];
            if !slot.is_occupied() {
                continue;
            }
            let hash = fnv1a(storage.get(slot.key_range()).unwrap_or(&[]));
            let buckets = cast_range_mut::<Slot>(&mut storage[..], fresh)?;
            let mut index = bucket(hash, new_capacity);
            while buckets[index].is_occupied() {
                index = (index + 1) & mask;
            }
            buckets[index] = slot;
        }
        drop(storage);

        tracing::trace!(
            from = self.capacity,
            to = new_capacity,
            len = self.len,
            "rehashed string table"
        );
        self.slots = fresh;
        self.capacity = new_capacity;
        Ok(())
    }
}

/// Iterator over the entries of a [`StrTable`].
#[derive(Debug)]
pub struct StrTableIter<'t, 'a> {
    table: &'t StrTable<'a>,
    next: usize,
}

impl Iterator for StrTableIter<'_, '_> {
    type Item = (String, i32);

    fn next(&mut self) -> Option<(String, i32)> {
        let storage = self.table.arena.storage().ok()?;
        let slots = cast_range::<Slot>(&storage[..], self.table.slots).ok()?;
        while self.next < self.table.capacity {
            let slot = slots[self.next];
            self.next += 1;
            if slot.is_occupied() {
                let key = storage.get(slot.key_range()).unwrap_or(&[]);
                return Some((String::from_utf8_lossy(key).into_owned(), slot.value));
            }
        }
        None
    }
}
