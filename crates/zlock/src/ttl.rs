//! TTL enforcer: force-releases a held lock after its maximum hold duration.
//!
//! Armed once per successful acquisition. The enforcer and an explicit unlock
//! both release under the session's hold mutex, so whichever runs second
//! observes an empty hold and does nothing.
//!
//! # Tiger Style
//!
//! - Uses CancellationToken so unlock can disarm a pending release
//! - Release happens at most once per hold

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;
use zlock_store::CoordinationStore;

use crate::release::HeldState;
use crate::release::release_held;
use crate::types::ForcedRelease;

/// Handle to a pending forced release.
#[derive(Debug)]
pub(crate) struct TtlHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TtlHandle {
    /// Cancel the pending release. No-op if it already fired.
    pub(crate) fn disarm(&self) {
        self.cancel.cancel();
    }

    /// Whether the enforcer task is still running.
    pub(crate) fn is_pending(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Spawn the enforcer for the hold described by `notice`.
pub(crate) fn spawn_ttl_enforcer(
    store: Arc<dyn CoordinationStore>,
    held: Arc<Mutex<HeldState>>,
    notice: ForcedRelease,
    notifier: broadcast::Sender<ForcedRelease>,
) -> TtlHandle {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let ttl = Duration::from_millis(notice.ttl_ms);

    let task = tokio::spawn(async move {
        tokio::select! {
            _ = cancel_clone.cancelled() => {
                debug!(path = %notice.path, "TTL enforcer disarmed");
            }
            _ = tokio::time::sleep(ttl) => {
                force_release(store.as_ref(), &held, notice, &notifier).await;
            }
        }
    });

    TtlHandle { cancel, task }
}

async fn force_release(
    store: &dyn CoordinationStore,
    held: &Mutex<HeldState>,
    notice: ForcedRelease,
    notifier: &broadcast::Sender<ForcedRelease>,
) {
    let mut guard = held.lock().await;
    if guard.acquired_path.as_deref() != Some(notice.path.as_str()) {
        debug!(path = %notice.path, "TTL expired after release");
        return;
    }

    warn!(
        resource = %notice.resource_name,
        resource_id = %notice.resource_id,
        path = %notice.path,
        ttl_ms = notice.ttl_ms,
        "TTL expired, force-releasing lock"
    );
    // No subscribers is fine.
    let _ = notifier.send(notice.clone());

    if let Err(e) = release_held(store, &mut guard).await {
        warn!(path = %notice.path, error = %e, "forced release failed; relying on session expiry");
    }
}
