//! # Sparse Storage
//!
//! Dense/sparse containers keyed by generational handles.
//!
//! ## Design Philosophy
//!
//! - Live elements are packed in dense arrays for cache efficiency
//! - A paged reverse lookup gives O(1) membership without reserving memory
//!   for the whole index space
//! - Removal swap-removes and never deallocates
//! - No internal synchronization; wrap in a lock to share across threads

mod page;
mod sparse_map;
mod sparse_set;

pub use page::{PAGE_SHIFT, PAGE_SIZE};
pub use sparse_map::{Iter, IterMut, SparseMap};
pub use sparse_set::SparseSet;
