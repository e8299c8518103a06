//! Pure functions extracted from the lock protocol for testability.
//!
//! This module implements the "Functional Core, Imperative Shell" pattern:
//! the decisions the acquisition state machine makes (who ranks first, how
//! long to back off, when to give up) live here as deterministic,
//! side-effect-free functions. The async acquisition state machine only
//! performs store calls and timers around them.
//!
//! # Module Organization
//!
//! - [`backoff`]: backoff ceiling, jittered delay, retry exhaustion
//! - [`ordering`]: sibling comparison, sorting and rank checks
//!
//! # Tiger Style
//!
//! - Saturating arithmetic, no panics
//! - Randomness passed in as an explicit seed

pub mod backoff;
pub mod ordering;

pub use backoff::compute_backoff_ceiling_ms;
pub use backoff::compute_backoff_delay_ms;
pub use backoff::is_retry_exhausted;
pub use ordering::RankCheck;
pub use ordering::check_rank;
pub use ordering::compare_siblings;
pub use ordering::sort_siblings;
