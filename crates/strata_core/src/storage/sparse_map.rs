//! # Sparse Map
//!
//! Per-handle data packed in lock-step with a [`SparseSet`].
//!
//! ```text
//! entities: [ h7 , h2 , h9 ]
//! data:     [ v7 , v2 , v9 ]    data[i] belongs to entities[i]
//! ```
//!
//! Every mutation touches both arrays in the same order, so position `i`
//! always correlates 1:1.

use std::fmt;
use std::iter::FusedIterator;
use std::ops::{Index, IndexMut};
use std::slice;

use crate::config::StorageConfig;
use crate::error::StorageResult;
use crate::handle::HandleLike;

use super::sparse_set::SparseSet;

/// Map from handles to values with O(1) insert, erase, and lookup.
///
/// Values are stored contiguously in dense order, so iteration is a linear
/// walk with no indirection through the reverse lookup.
///
/// # Example
///
/// ```rust
/// use strata_core::{Handle32, SparseMap};
///
/// let mut map: SparseMap<Handle32, f32> = SparseMap::new();
/// let handle = Handle32::new(42, 0);
///
/// map.insert(handle, 0.75);
/// *map.get_mut(handle) = 2.0;
/// assert_eq!(map.try_get(handle), Some(&2.0));
/// assert_eq!(map.try_get(Handle32::new(0, 0)), None);
/// ```
pub struct SparseMap<H: HandleLike, T> {
    /// Membership and positions.
    set: SparseSet<H>,
    /// `data[i]` is owned by `set.entities()[i]`.
    data: Vec<T>,
}

impl<H: HandleLike, T> SparseMap<H, T> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            set: SparseSet::new(),
            data: Vec::new(),
        }
    }

    /// Creates an empty map with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            set: SparseSet::with_capacity(capacity),
            data: Vec::with_capacity(capacity),
        }
    }

    /// Creates an empty map sized from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::with_capacity(config.dense_capacity)
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of entries the map can hold without reallocating.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.set.capacity().min(self.data.capacity())
    }

    /// Ensures both dense arrays can hold at least `capacity` entries in
    /// total. A smaller request does nothing.
    pub fn reserve(&mut self, capacity: usize) {
        self.set.reserve(capacity);
        if capacity > self.data.capacity() {
            self.data.reserve(capacity - self.data.len());
        }
    }

    /// Returns the number of reverse-lookup pages allocated.
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.set.page_count()
    }

    /// Associates `value` with `handle`.
    ///
    /// The handle must not already be a member (checked in debug builds).
    #[inline]
    pub fn insert(&mut self, handle: H, value: T) {
        self.set.insert(handle);
        self.data.push(value);
    }

    /// Checked [`insert`](Self::insert). On error `value` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyPresent`](crate::StorageError::AlreadyPresent) if the handle's index is
    /// already occupied.
    pub fn try_insert(&mut self, handle: H, value: T) -> StorageResult<()> {
        self.set.try_insert(handle)?;
        self.data.push(value);
        Ok(())
    }

    /// Removes `handle` and drops its value.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not a member.
    #[inline]
    pub fn erase(&mut self, handle: H) {
        drop(self.remove(handle));
    }

    /// Removes `handle` and returns its value.
    ///
    /// The value's position is captured before the set is touched: the data
    /// swap-remove mirrors the one the set performs on its handles.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not a member.
    #[inline]
    pub fn remove(&mut self, handle: H) -> T {
        let position = self.set.index_of(handle);
        let value = self.data.swap_remove(position);
        self.set.erase(handle);
        value
    }

    /// Removes `handle` if present, returning its value.
    pub fn try_remove(&mut self, handle: H) -> Option<T> {
        let position = self.set.find(handle)?;
        let value = self.data.swap_remove(position);
        self.set.erase(handle);
        Some(value)
    }

    /// Returns `true` if this exact handle is a member.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: H) -> bool {
        self.set.contains(handle)
    }

    /// Returns the dense position of `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not a member.
    #[inline]
    #[must_use]
    pub fn index_of(&self, handle: H) -> usize {
        self.set.index_of(handle)
    }

    /// Returns the value for `handle`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not a member.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: H) -> &T {
        &self.data[self.set.index_of(handle)]
    }

    /// Returns the value for `handle` mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not a member.
    #[inline]
    pub fn get_mut(&mut self, handle: H) -> &mut T {
        let position = self.set.index_of(handle);
        &mut self.data[position]
    }

    /// Returns the value for `handle`, or `None` if it is not a member.
    #[inline]
    #[must_use]
    pub fn try_get(&self, handle: H) -> Option<&T> {
        self.set.find(handle).map(|position| &self.data[position])
    }

    /// Returns the value for `handle` mutably, or `None` if it is not a
    /// member.
    #[inline]
    pub fn try_get_mut(&mut self, handle: H) -> Option<&mut T> {
        let position = self.set.find(handle)?;
        self.data.get_mut(position)
    }

    /// Returns the packed handles, parallel to [`data`](Self::data).
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[H] {
        self.set.entities()
    }

    /// Returns the packed values, parallel to [`entities`](Self::entities).
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the packed values mutably. Mutate in place only: reordering
    /// the slice breaks the correlation with `entities()`.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterates over `(handle, &value)` pairs in dense order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, H, T> {
        Iter {
            entities: self.set.entities().iter(),
            data: self.data.iter(),
        }
    }

    /// Iterates over `(handle, &mut value)` pairs in dense order.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, H, T> {
        IterMut {
            entities: self.set.entities().iter(),
            data: self.data.iter_mut(),
        }
    }

    /// Iterates over the values in dense order.
    #[inline]
    pub fn values(&self) -> slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterates mutably over the values in dense order.
    #[inline]
    pub fn values_mut(&mut self) -> slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Removes every entry, dropping the values. Pages are kept.
    pub fn clear(&mut self) {
        self.set.clear();
        self.data.clear();
    }
}

impl<H: HandleLike, T> Default for SparseMap<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HandleLike, T: fmt::Debug> fmt::Debug for SparseMap<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<H: HandleLike, T> Index<H> for SparseMap<H, T> {
    type Output = T;

    fn index(&self, handle: H) -> &T {
        self.get(handle)
    }
}

impl<H: HandleLike, T> IndexMut<H> for SparseMap<H, T> {
    fn index_mut(&mut self, handle: H) -> &mut T {
        self.get_mut(handle)
    }
}

impl<H: HandleLike, T> Extend<(H, T)> for SparseMap<H, T> {
    fn extend<I: IntoIterator<Item = (H, T)>>(&mut self, iter: I) {
        for (handle, value) in iter {
            self.insert(handle, value);
        }
    }
}

impl<H: HandleLike, T> FromIterator<(H, T)> for SparseMap<H, T> {
    fn from_iter<I: IntoIterator<Item = (H, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, H: HandleLike, T> IntoIterator for &'a SparseMap<H, T> {
    type Item = (H, &'a T);
    type IntoIter = Iter<'a, H, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, H: HandleLike, T> IntoIterator for &'a mut SparseMap<H, T> {
    type Item = (H, &'a mut T);
    type IntoIter = IterMut<'a, H, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

// ============================================================================
// ITERATORS
// ============================================================================

/// Iterator over `(handle, &value)` pairs of a [`SparseMap`].
///
/// Random access: `nth` advances both halves in O(1) and `len` gives the
/// remaining distance. Both halves are always advanced together, even past
/// the end.
pub struct Iter<'a, H, T> {
    entities: slice::Iter<'a, H>,
    data: slice::Iter<'a, T>,
}

impl<'a, H: Copy, T> Iterator for Iter<'a, H, T> {
    type Item = (H, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some((*self.entities.next()?, self.data.next()?))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let handle = self.entities.nth(n);
        let value = self.data.nth(n);
        Some((*handle?, value?))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.data.size_hint()
    }
}

impl<H: Copy, T> DoubleEndedIterator for Iter<'_, H, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        Some((*self.entities.next_back()?, self.data.next_back()?))
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        let handle = self.entities.nth_back(n);
        let value = self.data.nth_back(n);
        Some((*handle?, value?))
    }
}

impl<H: Copy, T> ExactSizeIterator for Iter<'_, H, T> {}

impl<H: Copy, T> FusedIterator for Iter<'_, H, T> {}

impl<H, T> Clone for Iter<'_, H, T> {
    fn clone(&self) -> Self {
        Self {
            entities: self.entities.clone(),
            data: self.data.clone(),
        }
    }
}

/// Iterator over `(handle, &mut value)` pairs of a [`SparseMap`].
pub struct IterMut<'a, H, T> {
    entities: slice::Iter<'a, H>,
    data: slice::IterMut<'a, T>,
}

impl<'a, H: Copy, T> Iterator for IterMut<'a, H, T> {
    type Item = (H, &'a mut T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some((*self.entities.next()?, self.data.next()?))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let handle = self.entities.nth(n);
        let value = self.data.nth(n);
        Some((*handle?, value?))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.data.size_hint()
    }
}

impl<H: Copy, T> DoubleEndedIterator for IterMut<'_, H, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        Some((*self.entities.next_back()?, self.data.next_back()?))
    }

    #[inline]
    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        let handle = self.entities.nth_back(n);
        let value = self.data.nth_back(n);
        Some((*handle?, value?))
    }
}

impl<H: Copy, T> ExactSizeIterator for IterMut<'_, H, T> {}

impl<H: Copy, T> FusedIterator for IterMut<'_, H, T> {}
