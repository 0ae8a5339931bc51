//! # Storage Error Types
//!
//! Errors returned by the checked API surface. The unchecked hot-path
//! operations (`insert`, `erase`, `get`, ...) never produce these; they treat
//! a violated precondition as a contract violation and assert in debug builds.

use thiserror::Error;

/// Errors that can occur in the storage engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// An index does not fit in the handle's index field.
    #[error("index {index} overflows a {index_bits}-bit index field")]
    IndexOverflow {
        /// The offending index.
        index: u64,
        /// Width of the handle's index field.
        index_bits: u32,
    },

    /// The handle is already a member of the collection.
    #[error("handle {index}v{generation} is already present")]
    AlreadyPresent {
        /// Index of the handle.
        index: u64,
        /// Generation of the handle.
        generation: u64,
    },

    /// The handle is not a member of the collection.
    #[error("handle {index}v{generation} is not present")]
    NotPresent {
        /// Index of the handle.
        index: u64,
        /// Generation of the handle.
        generation: u64,
    },

    /// The handle was released, or its generation no longer matches the slot.
    #[error("stale handle {index}v{generation}")]
    StaleHandle {
        /// Index of the handle.
        index: u64,
        /// Generation of the handle.
        generation: u64,
    },

    /// The allocator has no free index left.
    #[error("handle allocator exhausted: capacity {capacity}")]
    Exhausted {
        /// Maximum number of live handles.
        capacity: usize,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for checked storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
