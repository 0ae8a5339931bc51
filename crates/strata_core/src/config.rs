//! # Storage Configuration
//!
//! Capacity hints loaded once at startup from TOML.
//!
//! ```toml
//! # Reserve dense storage for this many handles up front.
//! dense_capacity = 4096
//! # Cap on distinct indices an allocator may issue.
//! allocator_capacity = 100000
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{StorageError, StorageResult};

/// Capacity configuration for sets, maps and allocators.
///
/// Every field is optional; a missing field takes its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Number of handles to reserve dense storage for. Pages are still
    /// allocated lazily.
    pub dense_capacity: usize,
    /// Maximum distinct indices a [`HandleAllocator`](crate::HandleAllocator)
    /// may issue. `None` spans the handle's whole index space.
    pub allocator_capacity: Option<usize>,
}

impl StorageConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] on malformed TOML, a wrongly
    /// typed value, or an unknown key.
    pub fn from_toml_str(text: &str) -> StorageResult<Self> {
        toml::from_str(text).map_err(|e| StorageError::InvalidConfig(e.to_string()))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StorageError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "storage config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = StorageConfig::from_toml_str("").unwrap();
        assert_eq!(config, StorageConfig::default());
        assert_eq!(config.dense_capacity, 0);
        assert!(config.allocator_capacity.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = StorageConfig::from_toml_str(
            "dense_capacity = 4096\nallocator_capacity = 100000\n",
        )
        .unwrap();
        assert_eq!(config.dense_capacity, 4096);
        assert_eq!(config.allocator_capacity, Some(100_000));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = StorageConfig::from_toml_str("page_shift = 10\n");
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result = StorageConfig::from_toml_str("dense_capacity = \"lots\"\n");
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = StorageConfig::load("/nonexistent/strata/storage.toml");
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }
}
