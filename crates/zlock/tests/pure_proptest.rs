//! Property-based tests for the pure backoff and ranking functions.
//!
//! - Backoff delay never exceeds the capped exponential ceiling
//! - Sequence ordering matches creation order regardless of name prefix
//! - The rank check names the immediately preceding sibling

use std::collections::BTreeSet;

use proptest::prelude::*;
use zlock::SiblingOrder;
use zlock::pure::RankCheck;
use zlock::pure::check_rank;
use zlock::pure::compute_backoff_ceiling_ms;
use zlock::pure::compute_backoff_delay_ms;
use zlock::pure::is_retry_exhausted;
use zlock::pure::sort_siblings;
use zlock_store::path::with_sequence;

// Reference ceiling in wide arithmetic.
fn reference_ceiling(collisions: u32, base: u64) -> u128 {
    let exponential = if collisions >= 64 {
        u128::MAX
    } else {
        (1u128 << collisions).saturating_mul(base as u128)
    };
    exponential.min(base as u128 * 10)
}

// Siblings with distinct sequence numbers and arbitrary prefixes.
fn arbitrary_siblings() -> impl Strategy<Value = Vec<(String, u64)>> {
    prop::collection::btree_set(0u64..10_000_000_000, 1..20).prop_flat_map(|sequences: BTreeSet<u64>| {
        let count = sequences.len();
        (Just(sequences), prop::collection::vec("[a-z]{1,6}", count)).prop_map(|(sequences, prefixes)| {
            prefixes.into_iter().zip(sequences).collect::<Vec<_>>()
        })
    })
}

proptest! {
    #[test]
    fn test_backoff_delay_within_ceiling(
        collisions in 0u32..100,
        base in 1u64..1_000_000,
        seed in any::<u64>(),
    ) {
        let ceiling = compute_backoff_ceiling_ms(collisions, base);
        prop_assert_eq!(ceiling as u128, reference_ceiling(collisions, base));

        let delay = compute_backoff_delay_ms(collisions, base, seed);
        prop_assert!(delay <= ceiling);
    }

    #[test]
    fn test_backoff_ceiling_is_monotonic(collisions in 0u32..100, base in 1u64..1_000_000) {
        prop_assert!(compute_backoff_ceiling_ms(collisions, base) <= compute_backoff_ceiling_ms(collisions + 1, base));
    }

    #[test]
    fn test_retry_exhaustion_matches_limit(collisions in 0u32..1_000, max in 0u32..1_000) {
        prop_assert_eq!(is_retry_exhausted(collisions, max), collisions >= max);
    }

    #[test]
    fn test_sequence_order_is_creation_order(siblings in arbitrary_siblings()) {
        let mut names: Vec<String> = siblings.iter().rev().map(|(prefix, seq)| with_sequence(prefix, *seq)).collect();
        sort_siblings(&mut names, SiblingOrder::Sequence);

        let expected: Vec<String> = siblings.iter().map(|(prefix, seq)| with_sequence(prefix, *seq)).collect();
        prop_assert_eq!(names, expected);
    }

    #[test]
    fn test_rank_check_names_predecessor(siblings in arbitrary_siblings(), pick in any::<prop::sample::Index>()) {
        let mut names: Vec<String> = siblings.iter().map(|(prefix, seq)| with_sequence(prefix, *seq)).collect();
        sort_siblings(&mut names, SiblingOrder::Sequence);

        let idx = pick.index(names.len());
        let own = names[idx].clone();
        match check_rank(&names, &own) {
            RankCheck::Lowest => prop_assert_eq!(idx, 0),
            RankCheck::Behind { predecessor } => prop_assert_eq!(&predecessor, &names[idx - 1]),
            RankCheck::Missing => prop_assert!(false, "own node must be found"),
        }
    }
}
