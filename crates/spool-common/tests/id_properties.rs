//! Property tests for batch id parsing and ordering.

use proptest::prelude::*;
use spool_common::BatchId;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Only pure decimal names are batches, whatever else lands in the directory.
    #[test]
    fn parse_rejects_non_digit_names(name in ".*") {
        let parsed = BatchId::parse(&name);
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            prop_assert!(parsed.is_none());
        }
    }

    /// Sorting ids numerically matches sorting their creation timestamps.
    #[test]
    fn id_order_matches_timestamp_order(mut stamps in proptest::collection::vec(0u64..4_000_000_000_000, 1..50)) {
        let mut ids: Vec<BatchId> = stamps.iter().copied().map(BatchId::from_millis).collect();
        ids.sort();
        stamps.sort_unstable();
        let from_ids: Vec<u64> = ids.iter().map(|id| id.created_at_ms()).collect();
        prop_assert_eq!(from_ids, stamps);
    }
}
