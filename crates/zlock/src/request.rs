//! Caller-supplied lock request.

use serde::Deserialize;
use serde::Serialize;
use zlock_store::path;

use crate::constants::DEFAULT_INITIAL_RETRY_WAIT_MS;
use crate::constants::MAX_RETRY_COUNT;
use crate::constants::MAX_TTL_MS;
use crate::error::LockError;

/// Parameters of one lock acquisition.
///
/// A request is immutable once handed to [`LockClient::lock`](crate::LockClient::lock).
///
/// # Example
///
/// ```ignore
/// let request = LockRequest::new("/locks/orders", "worker-1")
///     .with_ttl_ms(30_000)
///     .with_polling(5, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
    /// Path of the lockable resource. Must already exist in the store.
    pub resource_name: String,
    /// Prefix of the node created under `resource_name`; need not be unique.
    pub resource_id: String,
    /// Maximum hold duration. `None` holds until explicitly released.
    pub ttl_ms: Option<u64>,
    /// Enables polling mode and bounds the number of backoff retries.
    pub max_retry_count: Option<u32>,
    /// Backoff base unit in polling mode.
    pub initial_retry_wait_ms: u64,
}

impl LockRequest {
    /// Create a watch-mode request with no TTL.
    pub fn new(resource_name: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            resource_id: resource_id.into(),
            ttl_ms: None,
            max_retry_count: None,
            initial_retry_wait_ms: DEFAULT_INITIAL_RETRY_WAIT_MS,
        }
    }

    /// Force-release the lock `ttl_ms` after acquisition.
    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }

    /// Use polling with backoff instead of watches.
    pub fn with_polling(mut self, max_retry_count: u32, initial_retry_wait_ms: u64) -> Self {
        self.max_retry_count = Some(max_retry_count);
        self.initial_retry_wait_ms = initial_retry_wait_ms;
        self
    }

    /// Use polling with the current backoff base.
    pub fn with_max_retry_count(mut self, max_retry_count: u32) -> Self {
        self.max_retry_count = Some(max_retry_count);
        self
    }

    /// Path passed to the store's sequential create.
    pub fn node_prefix(&self) -> String {
        path::join(&self.resource_name, &self.resource_id)
    }

    /// Whether this request waits by polling rather than watching.
    pub fn is_polling(&self) -> bool {
        self.max_retry_count.is_some()
    }

    /// Reject requests the protocol cannot run.
    pub fn validate(&self) -> Result<(), LockError> {
        let invalid = |reason: String| Err(LockError::InvalidRequest { reason });

        if let Err(err) = path::validate_path(&self.resource_name) {
            return invalid(format!("resource_name: {err}"));
        }
        if self.resource_id.is_empty() {
            return invalid("resource_id must not be empty".to_string());
        }
        if self.resource_id.contains('/') {
            return invalid(format!("resource_id '{}' must not contain '/'", self.resource_id));
        }
        match self.ttl_ms {
            Some(0) => return invalid("ttl_ms must be positive".to_string()),
            Some(ttl) if ttl > MAX_TTL_MS => {
                return invalid(format!("ttl_ms {ttl} exceeds maximum {MAX_TTL_MS}"));
            }
            _ => {}
        }
        if let Some(max) = self.max_retry_count {
            if max > MAX_RETRY_COUNT {
                return invalid(format!("max_retry_count {max} exceeds maximum {MAX_RETRY_COUNT}"));
            }
            if self.initial_retry_wait_ms == 0 {
                return invalid("initial_retry_wait_ms must be positive in polling mode".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = LockRequest::new("/locks/a", "x");
        assert_eq!(request.node_prefix(), "/locks/a/x");
        assert!(!request.is_polling());
        assert_eq!(request.ttl_ms, None);
        assert_eq!(request.initial_retry_wait_ms, DEFAULT_INITIAL_RETRY_WAIT_MS);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_polling_builder() {
        let request = LockRequest::new("/locks/a", "x").with_polling(3, 50).with_ttl_ms(1_000);
        assert!(request.is_polling());
        assert_eq!(request.max_retry_count, Some(3));
        assert_eq!(request.initial_retry_wait_ms, 50);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_root_resource_prefix() {
        assert_eq!(LockRequest::new("/", "x").node_prefix(), "/x");
    }

    #[test]
    fn test_rejects_bad_requests() {
        let bad = [
            LockRequest::new("locks/a", "x"),
            LockRequest::new("/locks/a/", "x"),
            LockRequest::new("/locks/a", ""),
            LockRequest::new("/locks/a", "x/y"),
            LockRequest::new("/locks/a", "x").with_ttl_ms(0),
            LockRequest::new("/locks/a", "x").with_ttl_ms(MAX_TTL_MS + 1),
            LockRequest::new("/locks/a", "x").with_polling(MAX_RETRY_COUNT + 1, 10),
            LockRequest::new("/locks/a", "x").with_polling(3, 0),
        ];
        for request in bad {
            assert!(
                matches!(request.validate(), Err(LockError::InvalidRequest { .. })),
                "expected rejection: {request:?}"
            );
        }
    }

    #[test]
    fn test_zero_retries_is_valid() {
        let request = LockRequest::new("/locks/a", "x").with_polling(0, 10);
        assert!(request.validate().is_ok());
    }
}
