//! # STRATA Core
//!
//! Entity storage engine built from three pieces:
//! - [`Handle`]: a bit-packed index + generation identifier
//! - [`SparseSet`]: O(1) membership over handles, with a lazily paged
//!   reverse lookup
//! - [`SparseMap`]: per-handle data packed in lock-step with a set
//!
//! Handles are issued by a [`HandleAllocator`], the only component that
//! changes generations.
//!
//! ## Architecture Rules
//!
//! 1. **O(1) hot path** - insert, erase, lookup never scan
//! 2. **Memory follows usage** - reverse-lookup pages exist only for index
//!    ranges actually touched
//! 3. **Cache-friendly iteration** - live data is packed with no gaps
//! 4. **Contracts, not errors** - the unchecked API asserts its
//!    preconditions in debug builds; `try_*` variants return
//!    [`StorageError`]
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{Handle32, HandleAllocator, SparseMap};
//!
//! let mut allocator: HandleAllocator<Handle32> = HandleAllocator::new();
//! let mut positions: SparseMap<Handle32, [f32; 3]> = SparseMap::new();
//!
//! let entity = allocator.allocate()?;
//! positions.insert(entity, [1.0, 2.0, 3.0]);
//! assert_eq!(positions.get(entity), &[1.0, 2.0, 3.0]);
//! # Ok::<(), strata_core::StorageError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod handle;
pub mod storage;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use handle::{Handle, Handle32, Handle64, HandleAllocator, HandleLike, HandleStorage};
pub use storage::{SparseMap, SparseSet, PAGE_SHIFT, PAGE_SIZE};
