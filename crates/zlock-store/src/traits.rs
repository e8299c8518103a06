//! The coordination store interface consumed by the lock protocol.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::CreateMode;
use crate::types::ExistsWatch;

/// Hierarchical coordination store with ZooKeeper-style primitives.
///
/// Implementations own connection and session management. Every call is a
/// suspension point for the lock protocol; none of them may block a worker
/// thread.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Create a node at `path`.
    ///
    /// Returns the full path actually created. For
    /// [`CreateMode::EphemeralSequential`] the store appends a zero-padded,
    /// per-parent monotonically increasing suffix to the last segment.
    async fn create(&self, path: &str, mode: CreateMode) -> Result<String, StoreError>;

    /// List the names (not full paths) of the children of `path`, in no particular order.
    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Check whether `path` exists without registering a watch.
    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Check whether `path` exists and register a one-shot watch on it.
    ///
    /// The watch is registered whether or not the node exists and fires on
    /// the next creation or removal of `path`, or when the session ends.
    async fn exists_watch(&self, path: &str) -> Result<ExistsWatch, StoreError>;

    /// Remove the node at `path` if its version matches (`-1` matches any version).
    async fn remove(&self, path: &str, version: i32) -> Result<(), StoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: CoordinationStore + ?Sized> CoordinationStore for std::sync::Arc<T> {
    async fn create(&self, path: &str, mode: CreateMode) -> Result<String, StoreError> {
        (**self).create(path, mode).await
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_children(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        (**self).exists(path).await
    }

    async fn exists_watch(&self, path: &str) -> Result<ExistsWatch, StoreError> {
        (**self).exists_watch(path).await
    }

    async fn remove(&self, path: &str, version: i32) -> Result<(), StoreError> {
        (**self).remove(path, version).await
    }
}
