//! # Handle Allocator
//!
//! Free-list allocator that issues and recycles generational handles.
//!
//! Sparse sets and maps never touch generations; this is where they change.
//! A released index goes on a LIFO free list, and the next allocation that
//! reuses it bumps the generation so every handle issued for the old
//! occupant compares unequal to the new one.

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

use super::{HandleLike, HandleStorage};

/// Per-index bookkeeping.
#[derive(Clone, Copy, Debug)]
struct Slot<S> {
    /// Generation of the handle most recently issued for this index.
    generation: S,
    /// Whether that handle is still live.
    alive: bool,
}

/// Issues handles, recycling released indices with a bumped generation.
///
/// # Thread Safety
///
/// This allocator is NOT thread-safe. Use one allocator per thread or wrap
/// it in a mutex.
///
/// # Example
///
/// ```rust
/// use strata_core::{Handle32, HandleAllocator};
///
/// let mut allocator: HandleAllocator<Handle32> = HandleAllocator::new();
///
/// let first = allocator.allocate()?;
/// allocator.release(first)?;
///
/// // Same index, next generation.
/// let second = allocator.allocate()?;
/// assert_eq!(first.index(), second.index());
/// assert_ne!(first, second);
/// # Ok::<(), strata_core::StorageError>(())
/// ```
#[derive(Debug)]
pub struct HandleAllocator<H: HandleLike> {
    /// One slot per index ever issued.
    slots: Vec<Slot<H::Storage>>,
    /// Released indices, reused most-recent first.
    free_list: Vec<usize>,
    /// Number of live handles.
    alive_count: usize,
    /// Maximum number of distinct indices.
    capacity: usize,
}

impl<H: HandleLike> HandleAllocator<H> {
    /// Creates an allocator spanning the handle's whole index space.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::index_space())
    }

    /// Creates an allocator that issues at most `capacity` distinct indices.
    ///
    /// The capacity is clamped to the handle's index space.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            alive_count: 0,
            capacity: capacity.min(Self::index_space()),
        }
    }

    /// Creates an allocator from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        match config.allocator_capacity {
            Some(capacity) if capacity > 0 => Self::with_capacity(capacity),
            _ => Self::new(),
        }
    }

    fn index_space() -> usize {
        1usize
            .checked_shl(H::INDEX_BITS)
            .unwrap_or(usize::MAX)
    }

    fn generation_mask(generation: H::Storage) -> H::Storage {
        generation.low_bits(<H::Storage as HandleStorage>::BITS - H::INDEX_BITS)
    }

    /// Returns the maximum number of distinct indices.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of live handles.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the number of distinct indices issued so far.
    #[inline]
    #[must_use]
    pub fn issued(&self) -> usize {
        self.slots.len()
    }

    /// Issues a handle.
    ///
    /// The most recently released index is reused first, with its
    /// generation incremented (wrapping within the generation field).
    /// Otherwise a fresh index is issued at generation 0.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Exhausted`] when every index is live.
    pub fn allocate(&mut self) -> StorageResult<H> {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index];
            slot.generation = Self::generation_mask(slot.generation.wrapping_increment());
            slot.alive = true;
            self.alive_count += 1;
            return Ok(H::from_parts(H::Storage::from_usize(index), slot.generation));
        }

        let index = self.slots.len();
        if index >= self.capacity {
            tracing::warn!(capacity = self.capacity, "handle allocator exhausted");
            return Err(StorageError::Exhausted {
                capacity: self.capacity,
            });
        }

        self.slots.push(Slot {
            generation: H::Storage::ZERO,
            alive: true,
        });
        self.alive_count += 1;
        Ok(H::from_parts(H::Storage::from_usize(index), H::Storage::ZERO))
    }

    /// Releases a live handle, making its index available for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::StaleHandle`] if the handle was never issued,
    /// was already released, or belongs to an older generation.
    pub fn release(&mut self, handle: H) -> StorageResult<()> {
        if !self.is_alive(handle) {
            tracing::warn!(
                index = handle.index().to_u64(),
                generation = handle.generation().to_u64(),
                "release of a stale handle"
            );
            return Err(StorageError::StaleHandle {
                index: handle.index().to_u64(),
                generation: handle.generation().to_u64(),
            });
        }

        let index = handle.slot();
        self.slots[index].alive = false;
        self.free_list.push(index);
        self.alive_count -= 1;
        Ok(())
    }

    /// Checks whether `handle` is the live handle for its index.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, handle: H) -> bool {
        self.slots
            .get(handle.slot())
            .is_some_and(|slot| slot.alive && slot.generation == handle.generation())
    }

    /// Releases every live handle at once.
    ///
    /// Generations are kept, so handles issued before the clear stay stale
    /// after their index is reissued. Indices are reused lowest first.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            slot.alive = false;
            self.free_list.push(index);
        }
        self.alive_count = 0;
    }
}

impl<H: HandleLike> Default for HandleAllocator<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{Handle32, Handle64};

    #[test]
    fn test_allocate_fresh_indices() {
        let mut allocator: HandleAllocator<Handle32> = HandleAllocator::new();

        let h0 = allocator.allocate().unwrap();
        let h1 = allocator.allocate().unwrap();
        assert_eq!(h0, Handle32::new(0, 0));
        assert_eq!(h1, Handle32::new(1, 0));
        assert_eq!(allocator.alive_count(), 2);
        assert_eq!(allocator.issued(), 2);
    }

    #[test]
    fn test_release_bumps_generation_on_reuse() {
        let mut allocator: HandleAllocator<Handle32> = HandleAllocator::new();

        let h0 = allocator.allocate().unwrap();
        let h1 = allocator.allocate().unwrap();
        allocator.release(h0).unwrap();
        allocator.release(h1).unwrap();

        // Most recently released first
        let reused = allocator.allocate().unwrap();
        assert_eq!(reused, Handle32::new(1, 1));
        assert!(!allocator.is_alive(h1));
        assert!(allocator.is_alive(reused));

        let reused = allocator.allocate().unwrap();
        assert_eq!(reused, Handle32::new(0, 1));
        assert_eq!(allocator.issued(), 2);
    }

    #[test]
    fn test_release_stale_handle() {
        let mut allocator: HandleAllocator<Handle32> = HandleAllocator::new();

        let handle = allocator.allocate().unwrap();
        allocator.release(handle).unwrap();
        assert_eq!(
            allocator.release(handle),
            Err(StorageError::StaleHandle {
                index: 0,
                generation: 0,
            })
        );
        assert!(allocator.release(Handle32::new(99, 0)).is_err());
        assert_eq!(allocator.alive_count(), 0);
    }

    #[test]
    fn test_allocator_exhaustion() {
        let mut allocator: HandleAllocator<Handle32> = HandleAllocator::with_capacity(2);

        let h0 = allocator.allocate().unwrap();
        let _ = allocator.allocate().unwrap();
        assert_eq!(
            allocator.allocate(),
            Err(StorageError::Exhausted { capacity: 2 })
        );

        allocator.release(h0).unwrap();
        assert!(allocator.allocate().is_ok());
    }

    #[test]
    fn test_generation_wraps_within_field() {
        let mut allocator: HandleAllocator<Handle32> = HandleAllocator::with_capacity(1);

        let mut handle = allocator.allocate().unwrap();
        for _ in 0..Handle32::MAX_GENERATION {
            allocator.release(handle).unwrap();
            handle = allocator.allocate().unwrap();
        }
        assert_eq!(u64::from(handle.generation()), Handle32::MAX_GENERATION);

        allocator.release(handle).unwrap();
        let wrapped = allocator.allocate().unwrap();
        assert_eq!(wrapped, Handle32::new(0, 0));
    }

    #[test]
    fn test_capacity_clamped_to_index_space() {
        let allocator: HandleAllocator<Handle32> = HandleAllocator::with_capacity(usize::MAX);
        assert_eq!(allocator.capacity(), 1 << 20);

        let wide: HandleAllocator<Handle64> = HandleAllocator::new();
        assert!(wide.capacity() >= 1 << 20);
    }

    #[test]
    fn test_from_config() {
        let config = StorageConfig {
            allocator_capacity: Some(8),
            ..StorageConfig::default()
        };
        let allocator: HandleAllocator<Handle32> = HandleAllocator::from_config(&config);
        assert_eq!(allocator.capacity(), 8);
    }

    #[test]
    fn test_clear_keeps_old_handles_stale() {
        let mut allocator: HandleAllocator<Handle32> = HandleAllocator::new();
        let released = allocator.allocate().unwrap();
        let live = allocator.allocate().unwrap();
        allocator.release(released).unwrap();
        allocator.clear();

        assert_eq!(allocator.alive_count(), 0);
        assert!(!allocator.is_alive(live));
        assert!(allocator.release(live).is_err());

        let first = allocator.allocate().unwrap();
        let second = allocator.allocate().unwrap();
        assert_eq!(first, Handle32::new(0, 1));
        assert_eq!(second, Handle32::new(1, 1));
        assert!(!allocator.is_alive(released));
        assert!(!allocator.is_alive(live));
        assert_eq!(allocator.issued(), 2);
    }
}
