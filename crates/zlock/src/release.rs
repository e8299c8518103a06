//! Release path shared by explicit unlock, TTL expiry and failed attempts.

use tracing::debug;
use tracing::info;
use tracing::warn;
use zlock_store::ANY_VERSION;
use zlock_store::CoordinationStore;

use crate::error::LockError;

/// Hold state of a session, guarded by a mutex shared with the TTL enforcer.
///
/// `acquired_path` is `Some` exactly while the session holds the lock.
#[derive(Debug, Default)]
pub(crate) struct HeldState {
    pub(crate) acquired_path: Option<String>,
}

/// Remove the held node and clear the hold.
///
/// Returns `Ok(false)` when nothing was held. A node that is already gone
/// counts as released. Any other store error keeps `acquired_path` set so
/// the caller can tell the lock may still be held.
pub(crate) async fn release_held(store: &dyn CoordinationStore, held: &mut HeldState) -> Result<bool, LockError> {
    let Some(path) = held.acquired_path.clone() else {
        debug!("unlock on session without a held lock");
        return Ok(false);
    };

    match store.remove(&path, ANY_VERSION).await {
        Ok(()) => {
            held.acquired_path = None;
            info!(path = %path, "lock released");
            Ok(true)
        }
        Err(e) if e.is_no_node() => {
            held.acquired_path = None;
            debug!(path = %path, "lock node already gone, treating as released");
            Ok(true)
        }
        Err(source) => {
            warn!(path = %path, error = %source, "lock release failed");
            Err(LockError::UnlockFailed { path, source })
        }
    }
}

/// Best-effort removal of a failed attempt's node.
///
/// Errors are logged and swallowed; the caller reports the original failure.
pub(crate) async fn remove_attempt_node(store: &dyn CoordinationStore, path: &str) {
    match store.remove(path, ANY_VERSION).await {
        Ok(()) => debug!(path = %path, "removed node of failed attempt"),
        Err(e) if e.is_no_node() => debug!(path = %path, "node of failed attempt already gone"),
        Err(e) => warn!(path = %path, error = %e, "failed to remove node of failed attempt"),
    }
}
