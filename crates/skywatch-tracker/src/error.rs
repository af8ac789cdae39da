// Copyright (C) 2026 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for skywatch-tracker.
//!
//! Every error is scoped to one operation; nothing here is fatal to the
//! process. Callers distinguish `InvalidInput` (fix the request) from
//! `StoreUnavailable` (retry the whole operation).

use thiserror::Error;

/// Tracker errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A request field failed validation. Rejected before any state change.
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// The offending field.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The transactional store failed or is unreachable. The enclosing
    /// atomic unit was rolled back; the caller may retry the entire
    /// operation.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// Zone reference data is missing or corrupt. Callers degrade to an
    /// empty zone set rather than failing ingest.
    #[error("zone reference data unavailable: {0}")]
    ZoneLookup(String),

    /// Configuration loading failed.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type using the tracker [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the caller should retry the same operation unchanged.
    ///
    /// True only for transient store failures; invalid input never becomes
    /// valid by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_not_retryable() {
        let err = Error::InvalidInput {
            field: "speed_mps",
            message: "must be non-negative".to_string(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "invalid speed_mps: must be non-negative");
    }

    #[test]
    fn test_store_unavailable_is_retryable() {
        let err = Error::StoreUnavailable(sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
    }
}
