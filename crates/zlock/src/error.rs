//! Error types for the lock protocol and its configuration.

use std::path::PathBuf;

use snafu::Snafu;
use zlock_store::StoreError;

/// Errors surfaced by [`LockClient::lock`](crate::LockClient::lock) and
/// [`LockSession::unlock`](crate::LockSession::unlock).
///
/// Every variant produced after node creation is reported only once the
/// attempt's node has been removed (best effort).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LockError {
    /// The request was rejected before any store call.
    #[snafu(display("invalid lock request: {reason}"))]
    InvalidRequest {
        /// What was wrong with the request.
        reason: String,
    },

    /// The store refused to create the lock node (e.g. parent missing).
    #[snafu(display("failed to create lock node '{path}': {source}"))]
    CreateFailed {
        /// Path prefix passed to create.
        path: String,
        /// The underlying store error.
        source: StoreError,
    },

    /// Listing the resource's children failed after the node was created.
    #[snafu(display("failed to list children of '{path}': {source}"))]
    ListFailed {
        /// The resource path.
        path: String,
        /// The underlying store error.
        source: StoreError,
    },

    /// Checking the predecessor's existence failed.
    #[snafu(display("failed to check existence of '{path}': {source}"))]
    ExistsFailed {
        /// The predecessor path.
        path: String,
        /// The underlying store error.
        source: StoreError,
    },

    /// The attempt's own node disappeared from the resource's children.
    #[snafu(display("lock node '{path}' vanished before acquisition"))]
    NodeVanished {
        /// Full path of the vanished node.
        path: String,
    },

    /// Polling mode used up its retries while the predecessor was still present.
    #[snafu(display("retry limit exceeded for '{path}' after {attempts} retries"))]
    RetryLimitExceeded {
        /// The resource path.
        path: String,
        /// Number of backoff retries performed.
        attempts: u32,
    },

    /// Removing the held node failed; the lock may still be held.
    #[snafu(display("failed to release lock '{path}': {source}"))]
    UnlockFailed {
        /// Path of the held node.
        path: String,
        /// The underlying store error.
        source: StoreError,
    },
}

impl LockError {
    /// The store error behind this failure, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            LockError::CreateFailed { source, .. }
            | LockError::ListFailed { source, .. }
            | LockError::ExistsFailed { source, .. }
            | LockError::UnlockFailed { source, .. } => Some(source),
            LockError::InvalidRequest { .. }
            | LockError::NodeVanished { .. }
            | LockError::RetryLimitExceeded { .. } => None,
        }
    }
}

/// Errors from loading or validating [`LockClientConfig`](crate::LockClientConfig).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// The config file could not be read.
    #[snafu(display("failed to read config file '{}': {source}", path.display()))]
    ReadFile {
        /// File that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[snafu(display("failed to parse config file '{}': {source}", path.display()))]
    ParseFile {
        /// File that was parsed.
        path: PathBuf,
        /// The underlying parse error.
        source: toml::de::Error,
    },

    /// A configuration value is out of range or unparseable.
    #[snafu(display("invalid configuration for {key}: '{value}' ({reason})"))]
    InvalidValue {
        /// Setting or environment variable name.
        key: String,
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_failed_names_the_path() {
        let err = LockError::UnlockFailed {
            path: "/locks/a/x0000000001".to_string(),
            source: StoreError::ConnectionLoss {
                reason: "reset".to_string(),
            },
        };
        assert_eq!(err.to_string(), "failed to release lock '/locks/a/x0000000001': connection lost: reset");
        assert!(err.store_error().is_some());
    }

    #[test]
    fn retry_limit_display() {
        let err = LockError::RetryLimitExceeded {
            path: "/locks/a".to_string(),
            attempts: 3,
        };
        assert_eq!(err.to_string(), "retry limit exceeded for '/locks/a' after 3 retries");
        assert!(err.store_error().is_none());
    }

    #[test]
    fn config_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            key: "ZLOCK_SIBLING_ORDER".to_string(),
            value: "random".to_string(),
            reason: "expected 'sequence' or 'lexicographic'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration for ZLOCK_SIBLING_ORDER: 'random' (expected 'sequence' or 'lexicographic')"
        );
    }
}
