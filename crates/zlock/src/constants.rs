//! Lock protocol constants.
//!
//! Tiger Style: every caller-supplied bound has an explicit upper limit.

/// Default backoff base when a request enables polling without choosing one.
pub const DEFAULT_INITIAL_RETRY_WAIT_MS: u64 = 100;

/// Backoff ceiling as a multiple of the base wait.
pub const BACKOFF_CAP_MULTIPLIER: u64 = 10;

/// Upper bound on `max_retry_count`.
pub const MAX_RETRY_COUNT: u32 = 10_000;

/// Upper bound on a lock TTL (24 hours).
pub const MAX_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// Default buffer of the forced-release broadcast channel.
pub const DEFAULT_FORCED_RELEASE_CAPACITY: usize = 64;

/// Upper bound on the forced-release broadcast buffer.
pub const MAX_FORCED_RELEASE_CAPACITY: usize = 65_536;

/// Environment variable naming a TOML config file.
pub const CONFIG_FILE_ENV: &str = "ZLOCK_CONFIG";
