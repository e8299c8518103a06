//! Store-level constants.
//!
//! Tiger Style: fixed limits keep the in-memory store bounded and make
//! sequence formatting explicit.

/// Width of the zero-padded sequence suffix appended to sequential nodes.
///
/// Ten digits keeps lexicographic and numeric order identical for nodes
/// sharing a prefix, the same format ZooKeeper uses.
pub const SEQUENCE_SUFFIX_WIDTH: usize = 10;

/// Version argument that matches any node version on removal.
pub const ANY_VERSION: i32 = -1;

/// Maximum path length in bytes accepted by the in-memory store.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Maximum number of live nodes held by one in-memory store.
///
/// Tiger Style: bounded tree prevents runaway growth in long tests.
pub const MAX_NODES: usize = 100_000;
