//! Request and event types shared by store implementations.

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::oneshot;

/// How a node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreateMode {
    /// Node outlives the creating session.
    Persistent,
    /// Node is removed when the creating session ends.
    Ephemeral,
    /// Ephemeral node whose name gets a store-assigned, zero-padded sequence suffix.
    EphemeralSequential,
}

impl CreateMode {
    /// Returns true if nodes created with this mode die with their session.
    pub fn is_ephemeral(self) -> bool {
        matches!(self, CreateMode::Ephemeral | CreateMode::EphemeralSequential)
    }

    /// Returns true if the store appends a sequence suffix.
    pub fn is_sequential(self) -> bool {
        matches!(self, CreateMode::EphemeralSequential)
    }
}

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatchEventKind {
    /// The node was created.
    NodeCreated,
    /// The node was removed.
    NodeDeleted,
    /// The watching session changed state (closed or expired).
    SessionChanged,
}

/// A one-shot notification delivered to an existence watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedEvent {
    /// Kind of change observed.
    pub kind: WatchEventKind,
    /// Path the watch was registered on.
    pub path: String,
}

/// Receiving half of a one-shot watch.
///
/// A watch fires at most once. If the store drops the sender without firing
/// (for example because the connection went away) the receiver resolves to an
/// error, which callers should treat like [`WatchEventKind::SessionChanged`].
pub type WatchReceiver = oneshot::Receiver<WatchedEvent>;

/// Sending half of a one-shot watch, held by store implementations.
pub type WatchSender = oneshot::Sender<WatchedEvent>;

/// Result of an existence check that registered a watch.
#[derive(Debug)]
pub struct ExistsWatch {
    /// Whether the node existed when the check ran.
    pub exists: bool,
    /// Fires once on the next change to the path.
    pub watch: WatchReceiver,
}

/// Store operations, used for call accounting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreOp {
    /// `create`
    Create,
    /// `list_children`
    ListChildren,
    /// `exists` and `exists_watch`
    Exists,
    /// `remove`
    Remove,
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreOp::Create => "create",
            StoreOp::ListChildren => "list_children",
            StoreOp::Exists => "exists",
            StoreOp::Remove => "remove",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_mode_flags() {
        assert!(!CreateMode::Persistent.is_ephemeral());
        assert!(CreateMode::Ephemeral.is_ephemeral());
        assert!(!CreateMode::Ephemeral.is_sequential());
        assert!(CreateMode::EphemeralSequential.is_ephemeral());
        assert!(CreateMode::EphemeralSequential.is_sequential());
    }

    #[test]
    fn store_op_display() {
        assert_eq!(StoreOp::ListChildren.to_string(), "list_children");
        assert_eq!(StoreOp::Remove.to_string(), "remove");
    }
}
