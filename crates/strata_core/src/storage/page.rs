//! # Paged Reverse Lookup
//!
//! Maps a handle index to its position in a dense array.
//!
//! ```text
//! index:  [ page number | offset ]
//!           high bits     low PAGE_SHIFT bits
//!
//! pages:  [ None | Some(page) | None | ... ]
//!                   │
//!                   └─► [ None, Some(3), None, ..., Some(0) ]  (PAGE_SIZE slots)
//! ```
//!
//! A page is allocated the first time an index in its range is touched and
//! is never freed before the owner is dropped. Memory is bounded by the
//! number of pages touched, not by the width of the index space.

/// log2 of the number of entries per page.
pub const PAGE_SHIFT: u32 = 12;

/// Number of entries per page.
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

const OFFSET_MASK: usize = PAGE_SIZE - 1;

/// One page: `PAGE_SIZE` optional dense positions.
type Page = Box<[Option<u32>]>;

#[inline]
const fn locate(index: usize) -> (usize, usize) {
    (index >> PAGE_SHIFT, index & OFFSET_MASK)
}

/// Lazily paged `index -> dense position` table.
pub(crate) struct SparsePages {
    /// Page slots indexed by page number; grows on demand.
    pages: Vec<Option<Page>>,
    /// Number of `Some` entries in `pages`.
    allocated: usize,
}

impl SparsePages {
    pub(crate) const fn new() -> Self {
        Self {
            pages: Vec::new(),
            allocated: 0,
        }
    }

    /// Returns the recorded position for `index`, if any.
    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<usize> {
        let (page, offset) = locate(index);
        match self.pages.get(page) {
            Some(Some(entries)) => entries[offset].map(|position| position as usize),
            _ => None,
        }
    }

    /// Records `position` for `index`, allocating its page if needed.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn set(&mut self, index: usize, position: usize) {
        debug_assert!(
            u32::try_from(position).is_ok(),
            "dense position {position} exceeds u32"
        );
        let (page, offset) = locate(index);
        self.page_mut(page)[offset] = Some(position as u32);
    }

    /// Marks `index` absent. The page, if any, stays allocated.
    #[inline]
    pub(crate) fn clear(&mut self, index: usize) {
        let (page, offset) = locate(index);
        if let Some(Some(entries)) = self.pages.get_mut(page) {
            entries[offset] = None;
        }
    }

    /// Number of pages allocated so far.
    #[inline]
    pub(crate) const fn page_count(&self) -> usize {
        self.allocated
    }

    fn page_mut(&mut self, page: usize) -> &mut Page {
        if self.pages.len() <= page {
            self.pages.resize_with(page + 1, || None);
        }

        let slot = &mut self.pages[page];
        if slot.is_none() {
            self.allocated += 1;
            tracing::trace!(page, allocated = self.allocated, "sparse page allocated");
        }
        slot.get_or_insert_with(|| vec![None; PAGE_SIZE].into_boxed_slice())
    }
}
