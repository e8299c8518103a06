//! Error types for coordination store operations.

use thiserror::Error;

/// Errors returned by a [`CoordinationStore`](crate::CoordinationStore).
///
/// Variants mirror the failure classes of a ZooKeeper-style service. The lock
/// protocol treats every variant as terminal for the current attempt, except
/// [`StoreError::NoNode`] on removal, which means the node is already gone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The node (or, for create, its parent) does not exist.
    #[error("no node at '{path}'")]
    NoNode {
        /// Path that was not found.
        path: String,
    },

    /// A non-sequential create targeted a path that already exists.
    #[error("node already exists at '{path}'")]
    NodeExists {
        /// Path that already exists.
        path: String,
    },

    /// Ephemeral nodes cannot have children.
    #[error("ephemeral node '{path}' cannot have children")]
    NoChildrenForEphemerals {
        /// The ephemeral parent path.
        path: String,
    },

    /// A node with children cannot be removed.
    #[error("node '{path}' has children")]
    NotEmpty {
        /// Path of the non-empty node.
        path: String,
    },

    /// The expected version did not match the node's current version.
    #[error("version mismatch at '{path}': expected {expected}, actual {actual}")]
    BadVersion {
        /// Path of the node.
        path: String,
        /// Version supplied by the caller.
        expected: i32,
        /// Version held by the store.
        actual: i32,
    },

    /// The path is malformed (empty, relative, trailing slash, empty segment).
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// The client session has expired; its ephemeral nodes are gone.
    #[error("session {session_id} expired")]
    SessionExpired {
        /// Identifier of the expired session.
        session_id: u64,
    },

    /// The connection to the store was lost mid-request.
    #[error("connection lost: {reason}")]
    ConnectionLoss {
        /// Human-readable description of the loss.
        reason: String,
    },

    /// Any other backend failure.
    #[error("operation failed: {reason}")]
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl StoreError {
    /// Returns true if this error means the target node does not exist.
    pub fn is_no_node(&self) -> bool {
        matches!(self, StoreError::NoNode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_node_display() {
        let err = StoreError::NoNode {
            path: "/locks/a".to_string(),
        };
        assert_eq!(err.to_string(), "no node at '/locks/a'");
        assert!(err.is_no_node());
    }

    #[test]
    fn bad_version_display() {
        let err = StoreError::BadVersion {
            path: "/locks/a/x0000000001".to_string(),
            expected: 3,
            actual: 0,
        };
        assert_eq!(err.to_string(), "version mismatch at '/locks/a/x0000000001': expected 3, actual 0");
        assert!(!err.is_no_node());
    }

    #[test]
    fn session_expired_display() {
        let err = StoreError::SessionExpired { session_id: 7 };
        assert_eq!(err.to_string(), "session 7 expired");
    }

    #[test]
    fn errors_compare_by_value() {
        let a = StoreError::ConnectionLoss {
            reason: "reset".to_string(),
        };
        assert_eq!(a.clone(), a);
        assert_ne!(a, StoreError::Failed {
            reason: "reset".to_string()
        });
    }
}
