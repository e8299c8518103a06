//! Path helpers for the hierarchical namespace.
//!
//! Paths are absolute, slash-separated, without a trailing slash (except the
//! root `/`) and without empty segments.

use crate::constants::MAX_PATH_LENGTH;
use crate::constants::SEQUENCE_SUFFIX_WIDTH;
use crate::error::StoreError;

/// Validate an absolute store path.
pub fn validate_path(path: &str) -> Result<(), StoreError> {
    let reason = if path.is_empty() {
        Some("path is empty")
    } else if !path.starts_with('/') {
        Some("path must be absolute")
    } else if path.len() > MAX_PATH_LENGTH {
        Some("path exceeds maximum length")
    } else if path.len() > 1 && path.ends_with('/') {
        Some("path must not end with '/'")
    } else if path.len() > 1 && path[1..].split('/').any(str::is_empty) {
        Some("path contains an empty segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Join a parent path and a child name.
pub fn join(parent: &str, child: &str) -> String {
    if parent == "/" {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// Parent of `path`, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last segment of `path` (the node name).
pub fn node_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Append a zero-padded sequence suffix to `path`.
pub fn with_sequence(path: &str, sequence: u64) -> String {
    format!("{path}{sequence:0width$}", width = SEQUENCE_SUFFIX_WIDTH)
}

/// Parse the trailing sequence suffix of a node name.
///
/// A padded suffix is the last [`SEQUENCE_SUFFIX_WIDTH`] digits; a resource
/// id ending in digits must not leak into it. Stores that do not pad leave a
/// shorter run, which is parsed whole. Returns `None` if the name does not
/// end in a digit.
pub fn sequence_suffix(name: &str) -> Option<u64> {
    let digits = name.bytes().rev().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let width = digits.min(SEQUENCE_SUFFIX_WIDTH);
    name[name.len() - width..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_well_formed_paths() {
        assert!(validate_path("/").is_ok());
        assert!(validate_path("/locks").is_ok());
        assert!(validate_path("/locks/a/x0000000001").is_ok());
    }

    #[test]
    fn validate_rejects_malformed_paths() {
        for bad in ["", "locks", "/locks/", "/locks//a"] {
            let err = validate_path(bad).unwrap_err();
            assert!(matches!(err, StoreError::InvalidPath { .. }), "{bad:?} accepted");
        }
    }

    #[test]
    fn join_and_split() {
        assert_eq!(join("/", "locks"), "/locks");
        assert_eq!(join("/locks/a", "x"), "/locks/a/x");
        assert_eq!(parent("/locks/a/x"), Some("/locks/a"));
        assert_eq!(parent("/locks"), Some("/"));
        assert_eq!(parent("/"), None);
        assert_eq!(node_name("/locks/a/x0000000003"), "x0000000003");
        assert_eq!(node_name("x"), "x");
    }

    #[test]
    fn sequence_formatting_is_fixed_width() {
        assert_eq!(with_sequence("/locks/a/x", 7), "/locks/a/x0000000007");
        assert_eq!(sequence_suffix("x0000000007"), Some(7));
        assert_eq!(sequence_suffix("client-420000000012"), Some(12));
        assert_eq!(sequence_suffix("plain"), None);
    }

    #[test]
    fn unpadded_suffix_is_parsed_whole() {
        assert_eq!(sequence_suffix("x12"), Some(12));
        assert_eq!(sequence_suffix("x0"), Some(0));
        assert_eq!(sequence_suffix("lock-7"), Some(7));
    }
}
