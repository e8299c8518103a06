//! Lock client: entry point for acquiring locks against one store session.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;
use tracing::instrument;
use zlock_store::CoordinationStore;

use crate::acquire::Acquisition;
use crate::config::LockClientConfig;
use crate::error::LockError;
use crate::request::LockRequest;
use crate::session::LockSession;
use crate::types::ForcedRelease;

/// Acquires and releases locks through a [`CoordinationStore`].
///
/// Cloning is cheap; clones share the store handle and the forced-release
/// channel. Locks on different resources, or on the same resource from the
/// same process, proceed independently.
///
/// # Example
///
/// ```ignore
/// let client = LockClient::with_defaults(store);
/// let session = client.lock(LockRequest::new("/locks/a", "worker-1")).await?;
/// // ... critical section ...
/// client.unlock(&session).await?;
/// ```
#[derive(Clone)]
pub struct LockClient {
    store: Arc<dyn CoordinationStore>,
    config: LockClientConfig,
    forced_releases: broadcast::Sender<ForcedRelease>,
}

impl LockClient {
    /// Create a client with the given configuration.
    pub fn new(store: Arc<dyn CoordinationStore>, config: LockClientConfig) -> Self {
        let (forced_releases, _) = broadcast::channel(config.forced_release_channel_capacity.max(1));
        Self {
            store,
            config,
            forced_releases,
        }
    }

    /// Create a client with [`LockClientConfig::default`].
    pub fn with_defaults(store: Arc<dyn CoordinationStore>) -> Self {
        Self::new(store, LockClientConfig::default())
    }

    /// The client's configuration.
    pub fn config(&self) -> &LockClientConfig {
        &self.config
    }

    /// Build a watch-mode request using this client's default backoff base.
    pub fn request(&self, resource_name: impl Into<String>, resource_id: impl Into<String>) -> LockRequest {
        let mut request = LockRequest::new(resource_name, resource_id);
        request.initial_retry_wait_ms = self.config.default_initial_retry_wait_ms;
        request
    }

    /// Subscribe to forced-release notifications emitted by TTL expiry.
    pub fn subscribe_forced_releases(&self) -> broadcast::Receiver<ForcedRelease> {
        self.forced_releases.subscribe()
    }

    /// Acquire the lock described by `request`.
    ///
    /// Suspends until the lock is held or the attempt fails. On failure the
    /// attempt's node has been removed (best effort) before the error is
    /// returned. Dropping the returned future mid-wait leaves the node in
    /// place until the store session ends.
    #[instrument(skip(self, request), fields(resource = %request.resource_name, resource_id = %request.resource_id))]
    pub async fn lock(&self, request: LockRequest) -> Result<LockSession, LockError> {
        request.validate()?;
        debug!(polling = request.is_polling(), ttl_ms = ?request.ttl_ms, "acquiring lock");

        let mut session = LockSession::new(self.store.clone(), request);
        Acquisition::new(&mut session, self.config.sibling_order, &self.forced_releases).run().await?;
        Ok(session)
    }

    /// Release `session`'s lock. Same as [`LockSession::unlock`].
    pub async fn unlock(&self, session: &LockSession) -> Result<(), LockError> {
        session.unlock().await
    }
}

impl std::fmt::Debug for LockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockClient").field("config", &self.config).finish_non_exhaustive()
    }
}
