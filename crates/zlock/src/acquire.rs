//! Acquisition state machine.
//!
//! ```text
//! CreatingNode -> ListingChildren -> Acquired
//!                   ^      |
//!                   |      v
//!                   +-- Waiting
//! (any store error after creation) -> Failed (node removed first)
//! ```
//!
//! Every wake from `Waiting` re-lists the children instead of assuming the
//! lock was granted: other waiters may have joined or left in the meantime,
//! and only the authoritative sorted list says who ranks first.

use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;
use tracing::debug;
use zlock_store::CreateMode;
use zlock_store::path;

use crate::error::LockError;
use crate::pure::RankCheck;
use crate::pure::check_rank;
use crate::pure::compute_backoff_delay_ms;
use crate::pure::is_retry_exhausted;
use crate::pure::sort_siblings;
use crate::release::remove_attempt_node;
use crate::session::LockSession;
use crate::types::ForcedRelease;
use crate::types::SiblingOrder;

#[derive(Debug)]
enum AcquireState {
    CreatingNode,
    ListingChildren,
    Waiting { predecessor: String },
    Acquired { node: String },
    Failed(LockError),
}

/// Drives one [`LockSession`] from creation to `Acquired` or `Failed`.
pub(crate) struct Acquisition<'a> {
    session: &'a mut LockSession,
    sibling_order: SiblingOrder,
    notifier: &'a broadcast::Sender<ForcedRelease>,
}

impl<'a> Acquisition<'a> {
    pub(crate) fn new(
        session: &'a mut LockSession,
        sibling_order: SiblingOrder,
        notifier: &'a broadcast::Sender<ForcedRelease>,
    ) -> Self {
        Self {
            session,
            sibling_order,
            notifier,
        }
    }

    pub(crate) async fn run(mut self) -> Result<(), LockError> {
        let mut state = AcquireState::CreatingNode;
        loop {
            state = match state {
                AcquireState::CreatingNode => self.create_node().await,
                AcquireState::ListingChildren => self.list_children().await,
                AcquireState::Waiting { predecessor } => self.wait_for(predecessor).await,
                AcquireState::Acquired { node } => {
                    self.session.mark_acquired(&node, self.notifier).await;
                    return Ok(());
                }
                AcquireState::Failed(err) => {
                    self.cleanup().await;
                    return Err(err);
                }
            };
        }
    }

    fn resource(&self) -> &str {
        &self.session.request.resource_name
    }

    async fn create_node(&mut self) -> AcquireState {
        let prefix = self.session.request.node_prefix();
        match self.session.store.create(&prefix, CreateMode::EphemeralSequential).await {
            Ok(created) => {
                let node = path::node_name(&created).to_string();
                debug!(resource = %self.resource(), node = %node, "lock node created");
                self.session.seq_node = Some(node);
                AcquireState::ListingChildren
            }
            Err(source) => AcquireState::Failed(LockError::CreateFailed { path: prefix, source }),
        }
    }

    async fn list_children(&mut self) -> AcquireState {
        let resource = self.resource().to_string();
        let mut children = match self.session.store.list_children(&resource).await {
            Ok(children) => children,
            Err(source) => return AcquireState::Failed(LockError::ListFailed { path: resource, source }),
        };
        sort_siblings(&mut children, self.sibling_order);

        let Some(own) = self.session.seq_node.clone() else {
            return AcquireState::CreatingNode;
        };
        match check_rank(&children, &own) {
            RankCheck::Lowest => AcquireState::Acquired { node: own },
            RankCheck::Behind { predecessor } => {
                debug!(
                    resource = %resource,
                    node = %own,
                    predecessor = %predecessor,
                    waiters_ahead = children.iter().position(|c| *c == own).unwrap_or(0),
                    "waiting on predecessor"
                );
                self.session.last_watched_node = Some(predecessor.clone());
                AcquireState::Waiting { predecessor }
            }
            RankCheck::Missing => AcquireState::Failed(LockError::NodeVanished {
                path: path::join(&resource, &own),
            }),
        }
    }

    async fn wait_for(&mut self, predecessor: String) -> AcquireState {
        let predecessor_path = path::join(self.resource(), &predecessor);
        match self.session.request.max_retry_count {
            Some(max_retry_count) => self.poll(predecessor_path, max_retry_count).await,
            None => self.watch(predecessor_path).await,
        }
    }

    async fn watch(&mut self, predecessor_path: String) -> AcquireState {
        let exists_watch = match self.session.store.exists_watch(&predecessor_path).await {
            Ok(exists_watch) => exists_watch,
            Err(source) => {
                return AcquireState::Failed(LockError::ExistsFailed {
                    path: predecessor_path,
                    source,
                });
            }
        };
        if !exists_watch.exists {
            return AcquireState::ListingChildren;
        }

        match exists_watch.watch.await {
            Ok(event) => debug!(path = %predecessor_path, kind = ?event.kind, "predecessor watch fired"),
            Err(_) => debug!(path = %predecessor_path, "predecessor watch dropped by store"),
        }
        AcquireState::ListingChildren
    }

    async fn poll(&mut self, predecessor_path: String, max_retry_count: u32) -> AcquireState {
        let exists = match self.session.store.exists(&predecessor_path).await {
            Ok(exists) => exists,
            Err(source) => {
                return AcquireState::Failed(LockError::ExistsFailed {
                    path: predecessor_path,
                    source,
                });
            }
        };
        if !exists {
            return AcquireState::ListingChildren;
        }

        let collisions = self.session.collision_count;
        if is_retry_exhausted(collisions, max_retry_count) {
            return AcquireState::Failed(LockError::RetryLimitExceeded {
                path: self.resource().to_string(),
                attempts: collisions,
            });
        }

        let jitter_seed: u64 = rand::rng().random();
        let delay_ms = compute_backoff_delay_ms(collisions, self.session.request.initial_retry_wait_ms, jitter_seed);
        self.session.collision_count = collisions.saturating_add(1);
        debug!(
            path = %predecessor_path,
            collisions = self.session.collision_count,
            max_retry_count,
            backoff_ms = delay_ms,
            "predecessor still present, backing off"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        AcquireState::ListingChildren
    }

    async fn cleanup(&mut self) {
        if let Some(node) = self.session.seq_node.clone() {
            let node_path = path::join(self.resource(), &node);
            remove_attempt_node(self.session.store.as_ref(), &node_path).await;
        }
    }
}
