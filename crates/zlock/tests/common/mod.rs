//! Shared helpers for lock integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use zlock::LockClient;
use zlock_store::DeterministicCoordinationStore;
use zlock_store::DeterministicSession;
use zlock_store::FaultInjectingStore;

pub const RESOURCE: &str = "/locks/a";

/// A store with `/locks/a` already created.
pub fn store_with_resource() -> DeterministicCoordinationStore {
    let store = DeterministicCoordinationStore::new();
    store.ensure_path(RESOURCE).unwrap();
    store
}

/// A client on its own session, plus the session for crash simulation.
pub fn connect_client(store: &DeterministicCoordinationStore) -> (LockClient, Arc<DeterministicSession>) {
    let session = store.connect();
    (LockClient::with_defaults(session.clone()), session)
}

/// A client whose session is wrapped for call accounting and fault injection.
pub fn faulty_client(
    store: &DeterministicCoordinationStore,
) -> (LockClient, Arc<FaultInjectingStore<Arc<DeterministicSession>>>) {
    let faulty = Arc::new(FaultInjectingStore::new(store.connect()));
    (LockClient::with_defaults(faulty.clone()), faulty)
}

/// Yield to other tasks until `cond` holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
