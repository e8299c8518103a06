//! Coordination store interface for zlock.
//!
//! This crate defines the boundary between the lock protocol and a
//! ZooKeeper-style hierarchical store. It is deliberately small so that real
//! store clients can implement it without pulling in the lock crate.
//!
//! # Key Components
//!
//! - **Trait**: [`CoordinationStore`] with `create`, `list_children`, `exists`,
//!   `exists_watch` and `remove`
//! - **Types**: [`CreateMode`], [`WatchedEvent`], [`ExistsWatch`], [`StoreOp`]
//! - **Errors**: [`StoreError`]
//! - **Testing**: [`DeterministicCoordinationStore`] (in-memory tree with
//!   sessions and watches) and [`FaultInjectingStore`] (call accounting and
//!   injected failures)

pub mod constants;
pub mod error;
pub mod fault_injection;
pub mod inmemory;
pub mod path;
pub mod traits;
pub mod types;

pub use constants::ANY_VERSION;
pub use constants::SEQUENCE_SUFFIX_WIDTH;
pub use error::StoreError;
pub use fault_injection::FaultInjectingStore;
pub use inmemory::DeterministicCoordinationStore;
pub use inmemory::DeterministicSession;
pub use traits::CoordinationStore;
pub use types::CreateMode;
pub use types::ExistsWatch;
pub use types::StoreOp;
pub use types::WatchEventKind;
pub use types::WatchReceiver;
pub use types::WatchSender;
pub use types::WatchedEvent;
