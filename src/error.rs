// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for lazy mapping operations

use std::fmt;
use thiserror::Error;

/// Result type for lazy mapping operations
pub type LazyMappingResult<T> = Result<T, LazyMappingError>;

/// Errors surfaced to callers of a [`LazyMapping`](crate::LazyMapping)
///
/// Provider failures are never returned here; they are reported to the
/// mapping's diagnostic sink instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LazyMappingError {
    /// Key is neither materialized nor obtainable from its providers
    #[error("Key {key} not found")]
    KeyNotFound {
        /// Debug rendering of the missing key
        key: String,
    },
}

impl LazyMappingError {
    /// Create a `KeyNotFound` error for the given key
    pub fn key_not_found<Q: fmt::Debug + ?Sized>(key: &Q) -> Self {
        Self::KeyNotFound {
            key: format!("{key:?}"),
        }
    }

    /// Check whether this is a missing key error
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_message() {
        let err = LazyMappingError::key_not_found("rank");
        assert_eq!(err.to_string(), "Key \"rank\" not found");
        assert!(err.is_key_not_found());
    }

    #[test]
    fn test_key_not_found_with_numeric_key() {
        let err = LazyMappingError::key_not_found(&42u32);
        assert_eq!(
            err,
            LazyMappingError::KeyNotFound {
                key: "42".to_string()
            }
        );
    }
}
