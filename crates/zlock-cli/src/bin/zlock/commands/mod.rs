//! Command implementations.

pub mod backoff;
pub mod contend;
