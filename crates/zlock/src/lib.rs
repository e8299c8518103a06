//! Distributed mutual exclusion over a ZooKeeper-style coordination store.
//!
//! A lock on a resource path is a queue of ephemeral-sequential child nodes.
//! The lowest-ranked child holds the lock; every other contender waits on the
//! sibling immediately ahead of it, either with a one-shot existence watch or,
//! in polling mode, with capped exponential backoff. Ordering and failure
//! detection come from the store: a crashed holder's node disappears with its
//! session.
//!
//! # Key Components
//!
//! - [`LockClient`]: acquires locks and publishes forced-release notifications
//! - [`LockRequest`]: resource, holder id, optional TTL and polling settings
//! - [`LockSession`]: the attempt's state and, once acquired, the lock handle
//! - [`LockClientConfig`]: sibling ordering, defaults, channel sizing
//! - [`pure`]: deterministic backoff and ranking functions
//!
//! ## Example
//!
//! ```ignore
//! use zlock::{LockClient, LockRequest};
//!
//! let client = LockClient::with_defaults(store);
//! let session = client
//!     .lock(LockRequest::new("/locks/orders", "worker-1").with_ttl_ms(30_000))
//!     .await?;
//!
//! // Protected critical section
//! // Fencing token can be passed to external services
//! let token = session.fencing_token();
//!
//! session.unlock().await?;
//! ```

mod acquire;
mod client;
mod config;
pub mod constants;
mod error;
pub mod pure;
mod release;
mod request;
mod session;
mod ttl;
mod types;

pub use client::LockClient;
pub use config::ENV_DEFAULT_RETRY_WAIT_MS;
pub use config::ENV_FORCED_RELEASE_CAPACITY;
pub use config::ENV_SIBLING_ORDER;
pub use config::LockClientConfig;
pub use error::ConfigError;
pub use error::LockError;
pub use request::LockRequest;
pub use session::LockSession;
pub use types::FencingToken;
pub use types::ForcedRelease;
pub use types::SiblingOrder;
