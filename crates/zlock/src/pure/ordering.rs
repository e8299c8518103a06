//! Pure sibling ranking.
//!
//! The holder of a lock is the first child of the resource in creation order.
//! Every other waiter watches exactly the sibling ranked immediately before
//! it, which keeps a release from waking more than one waiter.

use std::cmp::Ordering;

use zlock_store::path::sequence_suffix;

use crate::types::SiblingOrder;

/// Where a node stands among its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankCheck {
    /// The node is first: the lock is acquired.
    Lowest,
    /// The node must wait for `predecessor` to go away.
    Behind {
        /// Name of the sibling ranked immediately before the node.
        predecessor: String,
    },
    /// The node is not among the siblings at all.
    Missing,
}

/// Compare two sibling names under `order`.
pub fn compare_siblings(a: &str, b: &str, order: SiblingOrder) -> Ordering {
    match order {
        SiblingOrder::Lexicographic => a.cmp(b),
        // Names without a suffix rank after every sequenced node.
        SiblingOrder::Sequence => {
            let key = |name: &str| {
                let suffix = sequence_suffix(name);
                (suffix.is_none(), suffix)
            };
            key(a).cmp(&key(b)).then_with(|| a.cmp(b))
        }
    }
}

/// Sort sibling names in rank order.
pub fn sort_siblings(children: &mut [String], order: SiblingOrder) {
    children.sort_by(|a, b| compare_siblings(a, b, order));
}

/// Rank `own` within `sorted`, which must already be in rank order.
pub fn check_rank(sorted: &[String], own: &str) -> RankCheck {
    match sorted.iter().position(|name| name == own) {
        Some(0) => RankCheck::Lowest,
        Some(idx) => RankCheck::Behind {
            predecessor: sorted[idx - 1].clone(),
        },
        None => RankCheck::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sequence_order_ignores_prefix() {
        let mut children = names(&["z0000000001", "a0000000002", "m0000000000"]);
        sort_siblings(&mut children, SiblingOrder::Sequence);
        assert_eq!(children, names(&["m0000000000", "z0000000001", "a0000000002"]));
    }

    #[test]
    fn test_lexicographic_order_uses_names() {
        let mut children = names(&["z0000000001", "a0000000002", "m0000000000"]);
        sort_siblings(&mut children, SiblingOrder::Lexicographic);
        assert_eq!(children, names(&["a0000000002", "m0000000000", "z0000000001"]));
    }

    #[test]
    fn test_orders_agree_for_shared_prefix() {
        let mut by_sequence = names(&["x0000000010", "x0000000002", "x0000000007"]);
        let mut by_name = by_sequence.clone();
        sort_siblings(&mut by_sequence, SiblingOrder::Sequence);
        sort_siblings(&mut by_name, SiblingOrder::Lexicographic);
        assert_eq!(by_sequence, by_name);
    }

    #[test]
    fn test_unsequenced_names_rank_last() {
        let mut children = names(&["readme", "x0000000003"]);
        sort_siblings(&mut children, SiblingOrder::Sequence);
        assert_eq!(children, names(&["x0000000003", "readme"]));
    }

    #[test]
    fn test_unpadded_suffixes_sort_numerically() {
        let mut children = names(&["x10", "x2", "x1"]);
        sort_siblings(&mut children, SiblingOrder::Sequence);
        assert_eq!(children, names(&["x1", "x2", "x10"]));
        assert_eq!(check_rank(&children, "x10"), RankCheck::Behind {
            predecessor: "x2".to_string()
        });
        assert_eq!(check_rank(&children, "x2"), RankCheck::Behind {
            predecessor: "x1".to_string()
        });
    }

    #[test]
    fn test_check_rank() {
        let sorted = names(&["x0000000000", "y0000000001", "z0000000002"]);
        assert_eq!(check_rank(&sorted, "x0000000000"), RankCheck::Lowest);
        assert_eq!(check_rank(&sorted, "z0000000002"), RankCheck::Behind {
            predecessor: "y0000000001".to_string()
        });
        assert_eq!(check_rank(&sorted, "w0000000009"), RankCheck::Missing);
        assert_eq!(check_rank(&[], "x0000000000"), RankCheck::Missing);
    }
}
