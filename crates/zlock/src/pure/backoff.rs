//! Pure backoff computation for polling mode.
//!
//! Capped binary-exponential backoff with full jitter:
//!
//! ```text
//! ceiling = min(2^collision_count * base, base * 10)
//! delay   = uniform in [0, ceiling]   (both ends inclusive)
//! ```
//!
//! # Tiger Style
//!
//! - Saturating arithmetic throughout; the cap always applies
//! - Randomness enters as an explicit `jitter_seed`

use crate::constants::BACKOFF_CAP_MULTIPLIER;

/// Upper bound of the backoff delay after `collision_count` collisions.
///
/// # Example
///
/// ```ignore
/// assert_eq!(compute_backoff_ceiling_ms(0, 100), 100);
/// assert_eq!(compute_backoff_ceiling_ms(3, 100), 800);
/// assert_eq!(compute_backoff_ceiling_ms(4, 100), 1000); // capped at 10x
/// ```
#[inline]
pub fn compute_backoff_ceiling_ms(collision_count: u32, initial_retry_wait_ms: u64) -> u64 {
    let cap = initial_retry_wait_ms.saturating_mul(BACKOFF_CAP_MULTIPLIER);
    let factor = 1u64.checked_shl(collision_count).unwrap_or(u64::MAX);
    factor.saturating_mul(initial_retry_wait_ms).min(cap)
}

/// Backoff delay for `collision_count`, drawn from `[0, ceiling]` by `jitter_seed`.
///
/// Any `u64` seed is valid; the seed is reduced modulo `ceiling + 1`.
#[inline]
pub fn compute_backoff_delay_ms(collision_count: u32, initial_retry_wait_ms: u64, jitter_seed: u64) -> u64 {
    let ceiling = compute_backoff_ceiling_ms(collision_count, initial_retry_wait_ms);
    match ceiling.checked_add(1) {
        Some(span) => jitter_seed % span,
        None => jitter_seed,
    }
}

/// Whether polling mode must give up instead of scheduling another retry.
///
/// `max_retry_count = n` allows exactly `n` retries: the check fails once
/// `n` collisions have been consumed.
#[inline]
pub fn is_retry_exhausted(collision_count: u32, max_retry_count: u32) -> bool {
    collision_count >= max_retry_count
}
