//! # Property-Based Tests
//!
//! Ordering invariants of the version comparator and the status lookup.

use momentum_core::{ReleaseStatus, Version, compare_versions};
use proptest::collection::vec;
use proptest::prelude::*;
use std::cmp::Ordering;

fn render(segments: &[u64]) -> String {
    segments
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Numeric segment-wise comparison with missing segments read as zero.
fn reference_order(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let left = a.get(i).copied().unwrap_or(0);
        let right = b.get(i).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// The comparator agrees with numeric tuple ordering.
    #[test]
    fn comparator_matches_numeric_order(
        a in vec(0u64..2000, 1..5),
        b in vec(0u64..2000, 1..5),
    ) {
        let ordering = compare_versions(&render(&a), &render(&b)).expect("compare");
        prop_assert_eq!(ordering, reference_order(&a, &b));
    }

    /// Swapping the operands reverses the result.
    #[test]
    fn comparator_is_antisymmetric(
        a in vec(0u64..2000, 1..5),
        b in vec(0u64..2000, 1..5),
    ) {
        let forward = compare_versions(&render(&a), &render(&b)).expect("compare");
        let backward = compare_versions(&render(&b), &render(&a)).expect("compare");
        prop_assert_eq!(forward, backward.reverse());
    }

    /// Parsing then rendering yields the original text.
    #[test]
    fn parsed_version_displays_unchanged(a in vec(0u64..100_000, 1..6)) {
        let text = render(&a);
        let version = Version::parse(&text).expect("parse");
        prop_assert_eq!(version.to_string(), text);
        prop_assert_eq!(version.segments(), a.as_slice());
    }

    /// Text containing anything but digits and dots never parses.
    #[test]
    fn non_numeric_versions_rejected(prefix in "[0-9]{1,3}", junk in "[a-z-]{1,4}") {
        let text = format!("{}.{}", prefix, junk);
        prop_assert!(Version::parse(&text).is_err());
    }

    /// Only exact canonical names map to a status.
    #[test]
    fn status_lookup_is_exact(name in "[A-Za-z]{1,12}") {
        let found = ReleaseStatus::from_name(&name);
        let canonical = ReleaseStatus::ALL.iter().any(|s| s.name() == name);
        prop_assert_eq!(found.is_some(), canonical);
    }
}
