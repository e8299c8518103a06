//! Lock session: state of one acquisition attempt and, once acquired, the lock handle.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::broadcast;
use tracing::info;
use zlock_store::CoordinationStore;
use zlock_store::path;

use crate::error::LockError;
use crate::release::HeldState;
use crate::release::release_held;
use crate::request::LockRequest;
use crate::ttl::TtlHandle;
use crate::ttl::spawn_ttl_enforcer;
use crate::types::FencingToken;
use crate::types::ForcedRelease;

/// One lock attempt, and the handle to the lock once acquired.
///
/// A session is created by [`LockClient::lock`](crate::LockClient::lock) and
/// owned by a single caller. Dropping a held session does not release the
/// lock: the TTL enforcer (if armed) or the end of the store session does.
pub struct LockSession {
    pub(crate) store: Arc<dyn CoordinationStore>,
    pub(crate) request: LockRequest,
    /// Name of the node this attempt created.
    pub(crate) seq_node: Option<String>,
    /// Sibling this attempt last waited on.
    pub(crate) last_watched_node: Option<String>,
    /// Backoff retries consumed (polling mode).
    pub(crate) collision_count: u32,
    pub(crate) fencing_token: Option<FencingToken>,
    held: Arc<Mutex<HeldState>>,
    ttl: Option<TtlHandle>,
}

impl LockSession {
    pub(crate) fn new(store: Arc<dyn CoordinationStore>, request: LockRequest) -> Self {
        Self {
            store,
            request,
            seq_node: None,
            last_watched_node: None,
            collision_count: 0,
            fencing_token: None,
            held: Arc::new(Mutex::new(HeldState::default())),
            ttl: None,
        }
    }

    /// The request this session was created for.
    pub fn request(&self) -> &LockRequest {
        &self.request
    }

    /// The locked resource path.
    pub fn resource_name(&self) -> &str {
        &self.request.resource_name
    }

    /// Store-assigned name of this session's node.
    pub fn seq_node(&self) -> Option<&str> {
        self.seq_node.as_deref()
    }

    /// The predecessor this session last waited on, if it ever waited.
    pub fn last_watched_node(&self) -> Option<&str> {
        self.last_watched_node.as_deref()
    }

    /// Backoff retries consumed during acquisition.
    pub fn collision_count(&self) -> u32 {
        self.collision_count
    }

    /// Fencing token of the acquired node.
    ///
    /// Stays set after release so callers can still attribute earlier writes.
    pub fn fencing_token(&self) -> Option<FencingToken> {
        self.fencing_token
    }

    /// Full path of the held node, or `None` once released.
    pub async fn acquired_path(&self) -> Option<String> {
        self.held.lock().await.acquired_path.clone()
    }

    /// Whether this session currently holds the lock.
    pub async fn is_held(&self) -> bool {
        self.held.lock().await.acquired_path.is_some()
    }

    /// Whether a forced release is still scheduled.
    pub fn is_ttl_armed(&self) -> bool {
        self.ttl.as_ref().is_some_and(TtlHandle::is_pending)
    }

    /// Release the lock.
    ///
    /// Idempotent: succeeds as a no-op when nothing is held, including after
    /// a forced release. On failure the hold is kept and the error names the
    /// node that could not be removed.
    pub async fn unlock(&self) -> Result<(), LockError> {
        if let Some(ttl) = &self.ttl {
            ttl.disarm();
        }
        let mut held = self.held.lock().await;
        release_held(self.store.as_ref(), &mut held).await?;
        Ok(())
    }

    /// Record the acquisition and arm the TTL enforcer if requested.
    pub(crate) async fn mark_acquired(&mut self, node: &str, notifier: &broadcast::Sender<ForcedRelease>) {
        let acquired_path = path::join(&self.request.resource_name, node);
        self.fencing_token = path::sequence_suffix(node).map(FencingToken::new);
        self.held.lock().await.acquired_path = Some(acquired_path.clone());

        info!(
            resource = %self.request.resource_name,
            path = %acquired_path,
            fencing_token = ?self.fencing_token.map(|t| t.value()),
            collisions = self.collision_count,
            "lock acquired"
        );

        if let Some(ttl_ms) = self.request.ttl_ms {
            let notice = ForcedRelease {
                resource_name: self.request.resource_name.clone(),
                resource_id: self.request.resource_id.clone(),
                path: acquired_path,
                ttl_ms,
                fencing_token: self.fencing_token,
            };
            let handle = spawn_ttl_enforcer(self.store.clone(), self.held.clone(), notice, notifier.clone());
            if let Some(previous) = self.ttl.replace(handle) {
                previous.disarm();
            }
        }
    }
}

impl fmt::Debug for LockSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockSession")
            .field("request", &self.request)
            .field("seq_node", &self.seq_node)
            .field("last_watched_node", &self.last_watched_node)
            .field("collision_count", &self.collision_count)
            .field("fencing_token", &self.fencing_token)
            .field("ttl_armed", &self.is_ttl_armed())
            .finish_non_exhaustive()
    }
}
