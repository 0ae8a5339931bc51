//! # Sparse Set
//!
//! O(1) membership over generational handles.
//!
//! The set uses a dense/sparse strategy:
//! - `dense` packs the live handles contiguously (iteration never skips)
//! - A paged reverse lookup maps `handle.index()` to its dense position
//! - Removal swap-removes, so only the erased and the last handle move

use std::fmt;

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::handle::{HandleLike, HandleStorage};

use super::page::{SparsePages, PAGE_SHIFT};

/// Set of live handles with O(1) insert, erase, and lookup.
///
/// # Type Parameters
///
/// * `H` - The handle type, whose `INDEX_BITS` must exceed [`PAGE_SHIFT`]
///
/// # Example
///
/// ```rust
/// use strata_core::{Handle32, SparseSet};
///
/// let mut set: SparseSet<Handle32> = SparseSet::new();
/// set.insert(Handle32::new(0, 0));
/// set.insert(Handle32::new(1, 0));
///
/// set.erase(Handle32::new(0, 0));
/// assert_eq!(set.index_of(Handle32::new(1, 0)), 0);
/// ```
pub struct SparseSet<H: HandleLike> {
    /// Live handles, packed.
    dense: Vec<H>,
    /// `index -> position in dense`.
    sparse: SparsePages,
}

impl<H: HandleLike> SparseSet<H> {
    const PAGING_OK: () = assert!(
        H::INDEX_BITS > PAGE_SHIFT,
        "handle index width must exceed PAGE_SHIFT"
    );

    /// Creates an empty set. Nothing is allocated until the first insert.
    #[must_use]
    pub fn new() -> Self {
        let () = Self::PAGING_OK;
        Self {
            dense: Vec::new(),
            sparse: SparsePages::new(),
        }
    }

    /// Creates an empty set with dense storage for `capacity` handles.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut set = Self::new();
        set.dense.reserve_exact(capacity);
        set
    }

    /// Creates an empty set sized from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::with_capacity(config.dense_capacity)
    }

    /// Returns `true` if the set holds no handles.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Returns the number of handles in the set.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns the dense storage capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    /// Ensures the dense storage can hold at least `capacity` handles in
    /// total. A request at or below the current capacity does nothing.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.dense.capacity() {
            self.dense.reserve(capacity - self.dense.len());
            tracing::debug!(
                requested = capacity,
                capacity = self.dense.capacity(),
                "sparse set dense storage grown"
            );
        }
    }

    /// Returns the number of reverse-lookup pages allocated.
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.sparse.page_count()
    }

    /// Adds a handle to the set.
    ///
    /// O(1) amortized. The handle's page is allocated on first touch.
    ///
    /// The handle must not be a member, and no other generation of its index
    /// may be a member either. This is checked in debug builds only.
    #[inline]
    pub fn insert(&mut self, handle: H) {
        debug_assert!(
            self.sparse.get(handle.slot()).is_none(),
            "insert of {handle:?}: index already occupied"
        );
        self.sparse.set(handle.slot(), self.dense.len());
        self.dense.push(handle);
    }

    /// Removes a handle from the set.
    ///
    /// O(1): the last handle moves into the vacated position, so order is
    /// not preserved.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not a member.
    #[inline]
    pub fn erase(&mut self, handle: H) {
        let from = self.index_of(handle);
        let last = self.dense.len() - 1;

        if from != last {
            let moved = self.dense[last];
            self.dense[from] = moved;
            self.sparse.set(moved.slot(), from);
        }
        self.sparse.clear(handle.slot());
        self.dense.pop();
    }

    /// Checked [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyPresent`] if the handle's index is
    /// already occupied, by this handle or by another generation.
    pub fn try_insert(&mut self, handle: H) -> StorageResult<()> {
        if self.sparse.get(handle.slot()).is_some() {
            return Err(StorageError::AlreadyPresent {
                index: handle.index().to_u64(),
                generation: handle.generation().to_u64(),
            });
        }
        self.insert(handle);
        Ok(())
    }

    /// Checked [`erase`](Self::erase).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotPresent`] if the handle is not a member.
    pub fn try_erase(&mut self, handle: H) -> StorageResult<()> {
        if !self.contains(handle) {
            return Err(StorageError::NotPresent {
                index: handle.index().to_u64(),
                generation: handle.generation().to_u64(),
            });
        }
        self.erase(handle);
        Ok(())
    }

    /// Returns `true` if this exact handle (index and generation) is a
    /// member.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: H) -> bool {
        self.find(handle).is_some()
    }

    /// Returns the dense position of `handle`, or `None` if it is not a
    /// member.
    #[inline]
    #[must_use]
    pub fn find(&self, handle: H) -> Option<usize> {
        self.sparse
            .get(handle.slot())
            .filter(|&position| self.dense.get(position) == Some(&handle))
    }

    /// Returns the dense position of `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not a member.
    #[inline]
    #[must_use]
    pub fn index_of(&self, handle: H) -> usize {
        match self.find(handle) {
            Some(position) => position,
            None => panic!("{handle:?} is not a member of this set"),
        }
    }

    /// Returns the packed handles. `entities()[index_of(h)] == h`.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[H] {
        &self.dense
    }

    /// Iterates over the handles in dense order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, H> {
        self.dense.iter()
    }

    /// Removes every handle. Pages and dense capacity are kept.
    ///
    /// O(len): only the members' reverse entries are touched.
    pub fn clear(&mut self) {
        for handle in &self.dense {
            self.sparse.clear(handle.slot());
        }
        self.dense.clear();
    }
}

impl<H: HandleLike> Default for SparseSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HandleLike> fmt::Debug for SparseSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.dense.iter()).finish()
    }
}

impl<'a, H: HandleLike> IntoIterator for &'a SparseSet<H> {
    type Item = &'a H;
    type IntoIter = std::slice::Iter<'a, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<H: HandleLike> Extend<H> for SparseSet<H> {
    fn extend<I: IntoIterator<Item = H>>(&mut self, iter: I) {
        for handle in iter {
            self.insert(handle);
        }
    }
}

impl<H: HandleLike> FromIterator<H> for SparseSet<H> {
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
