//! Fault injection wrapper for coordination stores.
//!
//! [`FaultInjectingStore`] forwards every call to an inner store while:
//!
//! - counting calls per [`StoreOp`]
//! - recording the paths passed to `remove`
//! - failing selected operations with an injected [`StoreError`]
//! - optionally handing out watches the store dropped without firing
//!
//! Faults are either one-shot (consumed by the next matching call) or
//! persistent until [`clear_faults`](FaultInjectingStore::clear_faults).
//! Failed calls never reach the inner store.
//!
//! # Example
//!
//! ```ignore
//! let store = DeterministicCoordinationStore::new();
//! let faulty = FaultInjectingStore::new(store.connect());
//! faulty.fail_next(StoreOp::ListChildren, StoreError::ConnectionLoss { reason: "reset".into() });
//! // ... drive the lock protocol, then:
//! assert_eq!(faulty.calls(StoreOp::Remove), 1);
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::CoordinationStore;
use crate::types::CreateMode;
use crate::types::ExistsWatch;
use crate::types::StoreOp;

#[derive(Debug, Clone)]
struct Fault {
    error: StoreError,
    /// `None` means the fault never runs out.
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct FaultState {
    faults: HashMap<StoreOp, Fault>,
    calls: HashMap<StoreOp, u64>,
    removed: Vec<String>,
    /// Successful `exists_watch` calls whose watch is dropped unfired.
    dropped_watches: u32,
}

/// A store wrapper that counts calls and injects failures.
pub struct FaultInjectingStore<S> {
    inner: S,
    state: Mutex<FaultState>,
}

impl<S: CoordinationStore> FaultInjectingStore<S> {
    /// Wrap `inner` with no faults armed.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: Mutex::new(FaultState::default()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail the next call of `op` with `error`.
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.fail_times(op, 1, error);
    }

    /// Fail the next `times` calls of `op` with `error`. `times == 0` arms nothing.
    pub fn fail_times(&self, op: StoreOp, times: u32, error: StoreError) {
        if times == 0 {
            return;
        }
        self.state.lock().faults.insert(op, Fault {
            error,
            remaining: Some(times),
        });
    }

    /// Fail every call of `op` until the fault is cleared.
    pub fn fail_always(&self, op: StoreOp, error: StoreError) {
        self.state.lock().faults.insert(op, Fault { error, remaining: None });
    }

    /// Disarm all faults. Call counters are kept.
    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Hand out closed watches from the next `times` successful `exists_watch`
    /// calls, as a store does when it loses a watch without firing it.
    pub fn drop_next_watches(&self, times: u32) {
        self.state.lock().dropped_watches = times;
    }

    /// Number of calls made for `op`, including failed ones.
    pub fn calls(&self, op: StoreOp) -> u64 {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Paths passed to `remove`, in call order, including failed ones.
    pub fn removed_paths(&self) -> Vec<String> {
        self.state.lock().removed.clone()
    }

    fn take_dropped_watch(&self) -> bool {
        let mut state = self.state.lock();
        if state.dropped_watches == 0 {
            return false;
        }
        state.dropped_watches -= 1;
        true
    }

    fn record(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_insert(0) += 1;

        let Some(fault) = state.faults.get_mut(&op) else {
            return Ok(());
        };
        fault.remaining = fault.remaining.map(|n| n.saturating_sub(1));
        let error = fault.error.clone();
        if fault.remaining == Some(0) {
            state.faults.remove(&op);
        }
        debug!(%op, %error, "injecting store fault");
        Err(error)
    }
}

#[async_trait]
impl<S: CoordinationStore> CoordinationStore for FaultInjectingStore<S> {
    async fn create(&self, path: &str, mode: CreateMode) -> Result<String, StoreError> {
        self.record(StoreOp::Create)?;
        self.inner.create(path, mode).await
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.record(StoreOp::ListChildren)?;
        self.inner.list_children(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        self.record(StoreOp::Exists)?;
        self.inner.exists(path).await
    }

    async fn exists_watch(&self, path: &str) -> Result<ExistsWatch, StoreError> {
        self.record(StoreOp::Exists)?;
        let mut exists_watch = self.inner.exists_watch(path).await?;
        if self.take_dropped_watch() {
            debug!(path, "dropping watch without firing");
            let (sender, receiver) = oneshot::channel();
            drop(sender);
            exists_watch.watch = receiver;
        }
        Ok(exists_watch)
    }

    async fn remove(&self, path: &str, version: i32) -> Result<(), StoreError> {
        self.state.lock().removed.push(path.to_string());
        self.record(StoreOp::Remove)?;
        self.inner.remove(path, version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::DeterministicCoordinationStore;
    use crate::types::WatchEventKind;

    fn loss() -> StoreError {
        StoreError::ConnectionLoss {
            reason: "injected".to_string(),
        }
    }

    #[tokio::test]
    async fn one_shot_fault_is_consumed() {
        let store = DeterministicCoordinationStore::new();
        store.ensure_path("/locks").unwrap();
        let faulty = FaultInjectingStore::new(store.connect());

        faulty.fail_next(StoreOp::ListChildren, loss());
        assert_eq!(faulty.list_children("/locks").await.unwrap_err(), loss());
        assert!(faulty.list_children("/locks").await.unwrap().is_empty());
        assert_eq!(faulty.calls(StoreOp::ListChildren), 2);
    }

    #[tokio::test]
    async fn counted_faults_run_out() {
        let store = DeterministicCoordinationStore::new();
        let faulty = FaultInjectingStore::new(store.connect());

        faulty.fail_times(StoreOp::Exists, 2, loss());
        assert!(faulty.exists("/").await.is_err());
        assert!(faulty.exists_watch("/").await.is_err());
        assert!(faulty.exists("/").await.unwrap());
        assert_eq!(faulty.calls(StoreOp::Exists), 3);
    }

    #[tokio::test]
    async fn zero_count_fault_arms_nothing() {
        let store = DeterministicCoordinationStore::new();
        let faulty = FaultInjectingStore::new(store.connect());

        faulty.fail_times(StoreOp::Exists, 0, loss());
        assert!(faulty.exists("/").await.unwrap());
        assert_eq!(faulty.calls(StoreOp::Exists), 1);
    }

    #[tokio::test]
    async fn dropped_watch_resolves_to_error() {
        let store = DeterministicCoordinationStore::new();
        store.ensure_path("/locks").unwrap();
        let faulty = FaultInjectingStore::new(store.connect());

        faulty.drop_next_watches(1);
        let dropped = faulty.exists_watch("/locks").await.unwrap();
        assert!(dropped.exists);
        assert!(dropped.watch.await.is_err());

        let kept = faulty.exists_watch("/locks").await.unwrap();
        assert_eq!(store.watch_count("/locks"), 1);
        faulty.inner().remove("/locks", -1).await.unwrap();
        assert_eq!(kept.watch.await.unwrap().kind, WatchEventKind::NodeDeleted);
    }

    #[tokio::test]
    async fn persistent_fault_until_cleared() {
        let store = DeterministicCoordinationStore::new();
        store.ensure_path("/locks").unwrap();
        let faulty = FaultInjectingStore::new(store.connect());
        let node = faulty.create("/locks/x", CreateMode::EphemeralSequential).await.unwrap();

        faulty.fail_always(StoreOp::Remove, loss());
        assert!(faulty.remove(&node, -1).await.is_err());
        assert!(faulty.remove(&node, -1).await.is_err());
        assert!(store.node_exists(&node));

        faulty.clear_faults();
        faulty.remove(&node, -1).await.unwrap();
        assert!(!store.node_exists(&node));
        assert_eq!(faulty.removed_paths(), vec![node.clone(), node.clone(), node]);
    }
}
