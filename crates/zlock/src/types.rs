//! Shared types for the lock protocol.

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Fencing token of an acquired lock.
///
/// The value is the store-assigned sequence number of the held node. Sequence
/// numbers grow monotonically per resource, so a later holder always presents
/// a larger token. External services should reject operations with stale tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FencingToken(pub u64);

impl FencingToken {
    /// Create a new fencing token.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw token value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FencingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FencingToken({})", self.0)
    }
}

/// How sibling nodes are ranked when deciding who holds the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingOrder {
    /// Rank by the numeric sequence suffix, then by name.
    ///
    /// Matches creation order even when resource ids differ in prefix or the
    /// store does not zero-pad suffixes. With unpadded suffixes, resource ids
    /// must not end in a digit.
    #[default]
    Sequence,
    /// Plain byte-wise name order. Only correct when every sibling shares a
    /// prefix and the store zero-pads suffixes.
    Lexicographic,
}

impl FromStr for SiblingOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequence" => Ok(SiblingOrder::Sequence),
            "lexicographic" => Ok(SiblingOrder::Lexicographic),
            _ => Err("expected 'sequence' or 'lexicographic'".to_string()),
        }
    }
}

/// Notification emitted when the TTL enforcer force-releases a lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedRelease {
    /// The locked resource path.
    pub resource_name: String,
    /// The caller-chosen id of the holder.
    pub resource_id: String,
    /// Full path of the node that was released.
    pub path: String,
    /// The TTL that expired, in milliseconds.
    pub ttl_ms: u64,
    /// Fencing token of the revoked hold.
    pub fencing_token: Option<FencingToken>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fencing_token_ordering() {
        let t1 = FencingToken::new(1);
        let t2 = FencingToken::new(2);
        assert!(t1 < t2);
        assert_eq!(t2.value(), 2);
        assert_eq!(t2.to_string(), "FencingToken(2)");
    }

    #[test]
    fn test_sibling_order_parsing() {
        assert_eq!("sequence".parse::<SiblingOrder>(), Ok(SiblingOrder::Sequence));
        assert_eq!(" Lexicographic ".parse::<SiblingOrder>(), Ok(SiblingOrder::Lexicographic));
        assert!("numeric".parse::<SiblingOrder>().is_err());
        assert_eq!(SiblingOrder::default(), SiblingOrder::Sequence);
    }
}
