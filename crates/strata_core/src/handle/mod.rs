//! # Generational Handles
//!
//! Handles are lightweight identifiers consisting of:
//! - An index (low bits) into sparse storage
//! - A generation counter (high bits) for detecting stale references
//!
//! Both parts live in one unsigned integer. Two handles with the same index
//! but different generations compare unequal, which is what lets a recycled
//! index be told apart from the handle that previously owned it.

mod allocator;

use std::fmt;
use std::hash::Hash;

use crate::error::{StorageError, StorageResult};
use crate::storage::PAGE_SHIFT;

pub use allocator::HandleAllocator;

/// Unsigned integer a handle is packed into.
///
/// Implemented for `u16`, `u32` and `u64`.
pub trait HandleStorage:
    Copy + Eq + Ord + Hash + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Width of the integer in bits.
    const BITS: u32;
    /// The value `0`.
    const ZERO: Self;
    /// All bits set.
    const MAX: Self;

    /// Keeps only the low `bits` bits.
    fn low_bits(self, bits: u32) -> Self;

    /// Logical shift right.
    fn shift_right(self, bits: u32) -> Self;

    /// Builds `index + (generation << shift)`, wrapping on overflow.
    fn pack(index: Self, generation: Self, shift: u32) -> Self;

    /// Adds one, wrapping at the full integer width.
    fn wrapping_increment(self) -> Self;

    /// Widens to `u64`.
    fn to_u64(self) -> u64;

    /// Converts to `usize`.
    fn to_usize(self) -> usize;

    /// Converts from `usize`, truncating high bits.
    fn from_usize(value: usize) -> Self;
}

macro_rules! impl_handle_storage {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HandleStorage for $ty {
                const BITS: u32 = <$ty>::BITS;
                const ZERO: Self = 0;
                const MAX: Self = <$ty>::MAX;

                #[inline]
                fn low_bits(self, bits: u32) -> Self {
                    if bits >= Self::BITS {
                        self
                    } else {
                        let one: Self = 1;
                        self & ((one << bits) - 1)
                    }
                }

                #[inline]
                fn shift_right(self, bits: u32) -> Self {
                    self.checked_shr(bits).unwrap_or(0)
                }

                #[inline]
                fn pack(index: Self, generation: Self, shift: u32) -> Self {
                    index.wrapping_add(generation.checked_shl(shift).unwrap_or(0))
                }

                #[inline]
                fn wrapping_increment(self) -> Self {
                    self.wrapping_add(1)
                }

                #[inline]
                fn to_u64(self) -> u64 {
                    u64::from(self)
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn to_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn from_usize(value: usize) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_handle_storage!(u16, u32, u64);

/// Capability every handle stored in a [`SparseSet`](crate::SparseSet) or
/// [`SparseMap`](crate::SparseMap) must provide.
///
/// `INDEX_BITS` must be greater than [`PAGE_SHIFT`]; the storage types check
/// this at compile time.
pub trait HandleLike: Copy + Eq + Hash + fmt::Debug {
    /// Integer the handle is packed into.
    type Storage: HandleStorage;

    /// Width of the index field (the shift applied to the generation).
    const INDEX_BITS: u32;

    /// Builds a handle from its parts.
    fn from_parts(index: Self::Storage, generation: Self::Storage) -> Self;

    /// The index field.
    fn index(self) -> Self::Storage;

    /// The generation field.
    fn generation(self) -> Self::Storage;

    /// The index as a `usize`, ready for page math.
    #[inline]
    fn slot(self) -> usize {
        self.index().to_usize()
    }
}

/// Bit-packed generational index.
///
/// The low `INDEX_BITS` bits hold the index, the remaining high bits hold the
/// generation.
///
/// # Example
///
/// ```rust
/// use strata_core::Handle32;
///
/// let handle = Handle32::new(42, 3);
/// assert_eq!(handle.index(), 42);
/// assert_eq!(handle.generation(), 3);
/// assert_ne!(handle, Handle32::new(42, 4));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle<S: HandleStorage, const INDEX_BITS: u32> {
    raw: S,
}

/// 20 index bits (~1M indices), 12 generation bits.
pub type Handle32 = Handle<u32, 20>;

/// 32 index bits, 32 generation bits.
pub type Handle64 = Handle<u64, 32>;

impl<S: HandleStorage, const INDEX_BITS: u32> Handle<S, INDEX_BITS> {
    const LAYOUT_OK: () = assert!(
        INDEX_BITS > PAGE_SHIFT && INDEX_BITS < S::BITS,
        "handle index width must exceed PAGE_SHIFT and leave room for a generation"
    );

    /// Width of the index field.
    pub const INDEX_BITS: u32 = INDEX_BITS;

    /// Width of the generation field.
    pub const GENERATION_BITS: u32 = S::BITS - INDEX_BITS;

    /// Largest representable index.
    pub const MAX_INDEX: u64 = (1 << INDEX_BITS) - 1;

    /// Largest representable generation.
    pub const MAX_GENERATION: u64 = u64::MAX >> (64 - (S::BITS - INDEX_BITS));

    /// Null/invalid handle (all bits set).
    pub const NULL: Self = Self { raw: S::MAX };

    /// Creates a handle from index and generation.
    ///
    /// No bounds validation is performed: an index wider than
    /// `INDEX_BITS` bleeds into the generation. Use [`Self::is_overflow`] or
    /// [`Self::try_new`] when the index is untrusted.
    #[inline]
    #[must_use]
    pub fn new(index: S, generation: S) -> Self {
        let () = Self::LAYOUT_OK;
        Self {
            raw: S::pack(index, generation, INDEX_BITS),
        }
    }

    /// Creates a generation-0 handle.
    #[inline]
    #[must_use]
    pub fn from_index(index: S) -> Self {
        Self::new(index, S::ZERO)
    }

    /// Checked constructor.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::IndexOverflow`] if `index` does not fit in
    /// `INDEX_BITS` bits.
    #[inline]
    pub fn try_new(index: S, generation: S) -> StorageResult<Self> {
        if Self::is_overflow(index) {
            return Err(StorageError::IndexOverflow {
                index: index.to_u64(),
                index_bits: INDEX_BITS,
            });
        }
        Ok(Self::new(index, generation))
    }

    /// Returns `true` if `index` does not fit in the index field.
    #[inline]
    #[must_use]
    pub fn is_overflow(index: S) -> bool {
        index.shift_right(INDEX_BITS) != S::ZERO
    }

    /// Returns the index portion of the handle.
    #[inline]
    #[must_use]
    pub fn index(self) -> S {
        self.raw.low_bits(INDEX_BITS)
    }

    /// Returns the generation portion of the handle.
    #[inline]
    #[must_use]
    pub fn generation(self) -> S {
        self.raw.shift_right(INDEX_BITS)
    }

    /// Rebuilds a handle from its packed value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: S) -> Self {
        Self { raw }
    }

    /// Returns the packed value.
    #[inline]
    #[must_use]
    pub fn to_raw(self) -> S {
        self.raw
    }

    /// Checks if this handle is the null handle.
    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        self.raw == S::MAX
    }
}

impl<S: HandleStorage, const INDEX_BITS: u32> HandleLike for Handle<S, INDEX_BITS> {
    type Storage = S;
    const INDEX_BITS: u32 = INDEX_BITS;

    #[inline]
    fn from_parts(index: S, generation: S) -> Self {
        Self::new(index, generation)
    }

    #[inline]
    fn index(self) -> S {
        Handle::index(self)
    }

    #[inline]
    fn generation(self) -> S {
        Handle::generation(self)
    }
}

impl<S: HandleStorage, const INDEX_BITS: u32> Default for Handle<S, INDEX_BITS> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<S: HandleStorage, const INDEX_BITS: u32> fmt::Debug for Handle<S, INDEX_BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Handle(null)")
        } else {
            write!(f, "Handle({}v{})", self.index(), self.generation())
        }
    }
}

impl<S: HandleStorage, const INDEX_BITS: u32> fmt::Display for Handle<S, INDEX_BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_roundtrip() {
        let handle = Handle32::new(12345, 678);
        assert_eq!(handle.index(), 12345);
        assert_eq!(handle.generation(), 678);

        let wide = Handle64::new(4_000_000_000, 67890);
        assert_eq!(wide.index(), 4_000_000_000);
        assert_eq!(wide.generation(), 67890);
    }

    #[test]
    fn test_handle_packing_layout() {
        let handle = Handle32::new(1, 1);
        assert_eq!(handle.to_raw(), 1 + (1 << 20));
        assert_eq!(Handle32::from_raw(handle.to_raw()), handle);
    }

    #[test]
    fn test_handle_bit_widths() {
        assert_eq!(Handle32::INDEX_BITS, 20);
        assert_eq!(Handle32::GENERATION_BITS, 12);
        assert_eq!(Handle32::MAX_INDEX, (1 << 20) - 1);
        assert_eq!(Handle32::MAX_GENERATION, (1 << 12) - 1);
        assert_eq!(Handle64::MAX_GENERATION, u64::from(u32::MAX));
    }

    #[test]
    fn test_generation_distinctness() {
        let a = Handle32::new(42, 0);
        let b = Handle32::new(42, 1);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
    }

    #[test]
    fn test_generation_wraps_within_its_field() {
        let handle = Handle32::new(7, (1 << 12) + 5);
        assert_eq!(handle.index(), 7);
        assert_eq!(handle.generation(), 5);
    }

    #[test]
    fn test_overflow_predicate() {
        assert!(!Handle32::is_overflow((1 << 20) - 1));
        assert!(Handle32::is_overflow(1 << 20));
        assert_eq!(
            Handle32::try_new(1 << 20, 0),
            Err(StorageError::IndexOverflow {
                index: 1 << 20,
                index_bits: 20,
            })
        );
        assert!(Handle32::try_new(5, 2).is_ok());
    }

    #[test]
    fn test_null_handle() {
        assert!(Handle32::default().is_null());
        assert!(!Handle32::from_index(0).is_null());
        assert_eq!(format!("{:?}", Handle32::NULL), "Handle(null)");
    }

    #[test]
    fn test_handle_formatting() {
        let handle = Handle32::new(42, 3);
        assert_eq!(handle.to_string(), "42v3");
        assert_eq!(format!("{handle:?}"), "Handle(42v3)");
    }

    #[test]
    fn test_handle_like_slot() {
        fn slot_of<H: HandleLike>(handle: H) -> usize {
            handle.slot()
        }
        assert_eq!(slot_of(Handle64::new(9000, 2)), 9000);
    }
}
