//! In-memory deterministic coordination store for testing.
//!
//! Provides a non-persistent implementation of [`CoordinationStore`] that
//! mirrors the ZooKeeper semantics the lock protocol depends on:
//!
//! - per-parent sequence counters with zero-padded suffixes
//! - ephemeral nodes owned by a connected session and removed when it closes
//! - one-shot existence watches fired on create, remove and session close
//!
//! Several sessions can be connected to the same store, which is how tests
//! model independent clients competing for one lock.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::constants::MAX_NODES;
use crate::error::StoreError;
use crate::path;
use crate::traits::CoordinationStore;
use crate::types::CreateMode;
use crate::types::ExistsWatch;
use crate::types::WatchEventKind;
use crate::types::WatchSender;
use crate::types::WatchedEvent;

#[derive(Debug)]
struct Node {
    version: i32,
    ephemeral_owner: Option<u64>,
    next_sequence: u64,
}

impl Node {
    fn new(ephemeral_owner: Option<u64>) -> Self {
        Self {
            version: 0,
            ephemeral_owner,
            next_sequence: 0,
        }
    }
}

#[derive(Debug)]
struct WatchEntry {
    session_id: u64,
    sender: WatchSender,
}

#[derive(Debug)]
struct Tree {
    nodes: BTreeMap<String, Node>,
    watches: HashMap<String, Vec<WatchEntry>>,
    next_session_id: u64,
    closed_sessions: HashSet<u64>,
}

impl Default for Tree {
    fn default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::new(None));
        Self {
            nodes,
            watches: HashMap::new(),
            next_session_id: 1,
            closed_sessions: HashSet::new(),
        }
    }
}

impl Tree {
    fn check_session(&self, session_id: u64) -> Result<(), StoreError> {
        if self.closed_sessions.contains(&session_id) {
            return Err(StoreError::SessionExpired { session_id });
        }
        Ok(())
    }

    fn fire(&mut self, target: &str, kind: WatchEventKind) {
        if let Some(entries) = self.watches.remove(target) {
            debug!(path = target, ?kind, watchers = entries.len(), "firing watches");
            for entry in entries {
                // Receiver may already be gone; a watch is fire-and-forget.
                let _ = entry.sender.send(WatchedEvent {
                    kind,
                    path: target.to_string(),
                });
            }
        }
    }

    fn has_children(&self, target: &str) -> bool {
        self.nodes.keys().any(|candidate| path::parent(candidate) == Some(target))
    }

    fn children(&self, parent: &str) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|candidate| path::parent(candidate) == Some(parent))
            .map(|candidate| path::node_name(candidate).to_string())
            .collect()
    }

    fn create(&mut self, owner: Option<u64>, requested: &str, mode: CreateMode) -> Result<String, StoreError> {
        path::validate_path(requested)?;
        if requested == "/" {
            return Err(StoreError::NodeExists {
                path: requested.to_string(),
            });
        }
        if self.nodes.len() >= MAX_NODES {
            return Err(StoreError::Failed {
                reason: format!("node limit of {MAX_NODES} reached"),
            });
        }

        let parent_path = path::parent(requested).unwrap_or("/");
        let parent = self.nodes.get_mut(parent_path).ok_or_else(|| StoreError::NoNode {
            path: parent_path.to_string(),
        })?;
        if parent.ephemeral_owner.is_some() {
            return Err(StoreError::NoChildrenForEphemerals {
                path: parent_path.to_string(),
            });
        }

        // The parent counter advances on every child creation, sequential or not.
        let sequence = parent.next_sequence;
        parent.next_sequence = parent.next_sequence.saturating_add(1);

        let created = if mode.is_sequential() {
            path::with_sequence(requested, sequence)
        } else {
            requested.to_string()
        };
        if self.nodes.contains_key(&created) {
            return Err(StoreError::NodeExists { path: created });
        }

        let ephemeral_owner = if mode.is_ephemeral() { owner } else { None };
        self.nodes.insert(created.clone(), Node::new(ephemeral_owner));
        self.fire(&created, WatchEventKind::NodeCreated);
        Ok(created)
    }

    fn remove(&mut self, target: &str, version: i32) -> Result<(), StoreError> {
        path::validate_path(target)?;
        let node = self.nodes.get(target).ok_or_else(|| StoreError::NoNode {
            path: target.to_string(),
        })?;
        if version != crate::constants::ANY_VERSION && version != node.version {
            return Err(StoreError::BadVersion {
                path: target.to_string(),
                expected: version,
                actual: node.version,
            });
        }
        if target == "/" || self.has_children(target) {
            return Err(StoreError::NotEmpty {
                path: target.to_string(),
            });
        }
        self.nodes.remove(target);
        self.fire(target, WatchEventKind::NodeDeleted);
        Ok(())
    }

    fn register_watch(&mut self, session_id: u64, target: &str) -> oneshot::Receiver<WatchedEvent> {
        // Watches on paths that never change again would otherwise pile up.
        self.watches.retain(|_, entries| {
            entries.retain(|entry| !entry.sender.is_closed());
            !entries.is_empty()
        });
        let (sender, receiver) = oneshot::channel();
        self.watches.entry(target.to_string()).or_default().push(WatchEntry { session_id, sender });
        receiver
    }

    fn close_session(&mut self, session_id: u64) -> usize {
        if !self.closed_sessions.insert(session_id) {
            return 0;
        }

        // Ephemerals never have children, so removal order does not matter.
        let owned: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.ephemeral_owner == Some(session_id))
            .map(|(node_path, _)| node_path.clone())
            .collect();
        for node_path in &owned {
            self.nodes.remove(node_path);
            self.fire(node_path, WatchEventKind::NodeDeleted);
        }

        // Watches registered by the closed session learn about it once.
        for (watched_path, entries) in self.watches.iter_mut() {
            let (mine, others): (Vec<_>, Vec<_>) = entries.drain(..).partition(|e| e.session_id == session_id);
            *entries = others;
            for entry in mine {
                let _ = entry.sender.send(WatchedEvent {
                    kind: WatchEventKind::SessionChanged,
                    path: watched_path.clone(),
                });
            }
        }
        self.watches.retain(|_, entries| !entries.is_empty());

        owned.len()
    }
}

/// In-memory deterministic implementation of a coordination store.
///
/// The store itself only holds the shared tree. Clients talk to it through
/// [`DeterministicSession`] handles obtained from [`connect`](Self::connect);
/// each handle owns the ephemeral nodes it creates.
///
/// # Limitations
///
/// - No node data (versions stay at 0)
/// - No child watches, only existence watches
/// - No persistence across restarts
///
/// # Example
///
/// ```ignore
/// let store = DeterministicCoordinationStore::new();
/// store.ensure_path("/locks/a")?;
/// let client = store.connect();
/// let created = client.create("/locks/a/x", CreateMode::EphemeralSequential).await?;
/// assert_eq!(created, "/locks/a/x0000000000");
/// ```
#[derive(Clone, Default)]
pub struct DeterministicCoordinationStore {
    tree: Arc<Mutex<Tree>>,
}

impl DeterministicCoordinationStore {
    /// Create an empty store containing only the root node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new client session against this store.
    pub fn connect(&self) -> Arc<DeterministicSession> {
        let mut tree = self.tree.lock();
        let session_id = tree.next_session_id;
        tree.next_session_id = tree.next_session_id.saturating_add(1);
        debug!(session_id, "session connected");
        Arc::new(DeterministicSession {
            session_id,
            tree: self.tree.clone(),
        })
    }

    /// Create `path` and any missing ancestors as persistent nodes.
    pub fn ensure_path(&self, target: &str) -> Result<(), StoreError> {
        path::validate_path(target)?;
        let mut tree = self.tree.lock();
        let mut prefix = String::new();
        for segment in target.split('/').filter(|s| !s.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            if !tree.nodes.contains_key(&prefix) {
                tree.create(None, &prefix, CreateMode::Persistent)?;
            }
        }
        Ok(())
    }

    /// Sorted child names of `parent`, or empty if it does not exist.
    pub fn children(&self, parent: &str) -> Vec<String> {
        let mut names = self.tree.lock().children(parent);
        names.sort();
        names
    }

    /// Returns true if a node exists at `target`.
    pub fn node_exists(&self, target: &str) -> bool {
        self.tree.lock().nodes.contains_key(target)
    }

    /// Number of pending watches on `target` whose receiver is still alive.
    pub fn watch_count(&self, target: &str) -> usize {
        self.tree
            .lock()
            .watches
            .get(target)
            .map(|entries| entries.iter().filter(|e| !e.sender.is_closed()).count())
            .unwrap_or(0)
    }

    /// Number of nodes in the tree, including the root.
    pub fn node_count(&self) -> usize {
        self.tree.lock().nodes.len()
    }
}

/// A client session connected to a [`DeterministicCoordinationStore`].
pub struct DeterministicSession {
    session_id: u64,
    tree: Arc<Mutex<Tree>>,
}

impl DeterministicSession {
    /// Identifier assigned at connect time.
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Returns true once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.tree.lock().closed_sessions.contains(&self.session_id)
    }

    /// End the session: its ephemeral nodes are removed (firing their watches)
    /// and its own pending watches receive [`WatchEventKind::SessionChanged`].
    ///
    /// Returns the number of ephemeral nodes removed. Closing twice is a no-op.
    pub fn close(&self) -> usize {
        let removed = self.tree.lock().close_session(self.session_id);
        debug!(session_id = self.session_id, removed, "session closed");
        removed
    }
}

#[async_trait]
impl CoordinationStore for DeterministicSession {
    async fn create(&self, target: &str, mode: CreateMode) -> Result<String, StoreError> {
        let mut tree = self.tree.lock();
        tree.check_session(self.session_id)?;
        tree.create(Some(self.session_id), target, mode)
    }

    async fn list_children(&self, parent: &str) -> Result<Vec<String>, StoreError> {
        path::validate_path(parent)?;
        let tree = self.tree.lock();
        tree.check_session(self.session_id)?;
        if !tree.nodes.contains_key(parent) {
            return Err(StoreError::NoNode {
                path: parent.to_string(),
            });
        }
        Ok(tree.children(parent))
    }

    async fn exists(&self, target: &str) -> Result<bool, StoreError> {
        path::validate_path(target)?;
        let tree = self.tree.lock();
        tree.check_session(self.session_id)?;
        Ok(tree.nodes.contains_key(target))
    }

    async fn exists_watch(&self, target: &str) -> Result<ExistsWatch, StoreError> {
        path::validate_path(target)?;
        let mut tree = self.tree.lock();
        tree.check_session(self.session_id)?;
        let exists = tree.nodes.contains_key(target);
        let watch = tree.register_watch(self.session_id, target);
        Ok(ExistsWatch { exists, watch })
    }

    async fn remove(&self, target: &str, version: i32) -> Result<(), StoreError> {
        let mut tree = self.tree.lock();
        tree.check_session(self.session_id)?;
        tree.remove(target, version)
    }
}
