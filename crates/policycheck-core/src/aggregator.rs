//! Aggregator: folds raw block verdicts into canonical per-item coverage.
//!
//! The fold applies one fixed rule: any single block that explicitly mentions
//! a requirement is sufficient for the whole document. Coverage per item is
//! the maximum over all contributing verdicts, so it can only move up as more
//! blocks are folded. Missing verdicts never add evidence.
//!
//! Aggregation runs after all oracle calls of a run have completed, over the
//! collected verdicts in request order. No shared state is mutated while
//! calls are in flight.

use std::collections::BTreeMap;

use crate::types::{CanonicalEntry, RawVerdict};

/// Fold a verdict sequence into a fresh map keyed by checklist id.
///
/// Only Explicit and Partial verdicts create or extend entries. Folding the
/// same input twice yields identical maps.
pub fn fold<'a, I>(verdicts: I) -> BTreeMap<String, CanonicalEntry>
where
    I: IntoIterator<Item = &'a RawVerdict>,
{
    let mut compiled = BTreeMap::new();
    for verdict in verdicts {
        merge(&mut compiled, verdict);
    }
    compiled
}

/// Merge one verdict into an existing map.
pub fn merge(compiled: &mut BTreeMap<String, CanonicalEntry>, verdict: &RawVerdict) {
    if !verdict.status.is_mentioned() {
        return;
    }

    let entry = compiled
        .entry(verdict.checklist_id.clone())
        .or_insert_with(|| CanonicalEntry::missing(verdict.checklist_id.clone()));

    entry.coverage = entry.coverage.max(verdict.status);
    entry.confidence_score = entry.coverage.confidence_score();
    entry.supporting_matches.push(verdict.formatted_match());
}

/// Produce one entry per requested id, in the requested order.
///
/// Ids with no contributing verdict come out Missing with score 0.0. Map
/// entries whose id was not requested are ignored.
pub fn finalize<S>(compiled: &BTreeMap<String, CanonicalEntry>, checklist_ids: &[S]) -> Vec<CanonicalEntry>
where
    S: AsRef<str>,
{
    checklist_ids
        .iter()
        .map(|id| {
            let id = id.as_ref();
            compiled
                .get(id)
                .cloned()
                .unwrap_or_else(|| CanonicalEntry::missing(id))
        })
        .collect()
}

/// Fold then finalize in one step, dropping verdicts for ids outside
/// `checklist_ids`.
pub fn summarize<S>(verdicts: &[RawVerdict], checklist_ids: &[S]) -> Vec<CanonicalEntry>
where
    S: AsRef<str>,
{
    let known = |id: &str| checklist_ids.iter().any(|c| c.as_ref() == id);

    let relevant = verdicts.iter().filter(|v| {
        let keep = known(&v.checklist_id);
        if !keep {
            tracing::debug!(checklist_id = %v.checklist_id, "Dropping verdict for unknown checklist id");
        }
        keep
    });

    finalize(&fold(relevant), checklist_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coverage;
    use proptest::prelude::*;

    fn verdict(id: &str, status: Coverage) -> RawVerdict {
        RawVerdict::new(id, status, format!("quote for {}", id), "reason")
    }

    #[test]
    fn test_missing_verdicts_create_no_entries() {
        let verdicts = vec![verdict("6.1", Coverage::Missing)];
        assert!(fold(&verdicts).is_empty());
    }

    #[test]
    fn test_explicit_wins_over_partial() {
        let verdicts = vec![
            verdict("6.1", Coverage::Partial),
            verdict("6.1", Coverage::Explicit),
            verdict("6.1", Coverage::Missing),
        ];
        let compiled = fold(&verdicts);
        let entry = &compiled["6.1"];

        assert_eq!(entry.coverage, Coverage::Explicit);
        assert_eq!(entry.confidence_score, 1.0);
        assert_eq!(entry.supporting_matches.len(), 2);
        assert!(entry.supporting_matches[0].ends_with("(Partially Mentioned)"));
        assert!(entry.supporting_matches[1].ends_with("(Explicitly Mentioned)"));
    }

    #[test]
    fn test_finalize_covers_every_requested_id_in_order() {
        let verdicts = vec![verdict("4.3", Coverage::Partial)];
        let ids = ["4.1", "4.2", "4.3", "4.4", "4.5"];
        let entries = finalize(&fold(&verdicts), &ids);

        assert_eq!(entries.len(), 5);
        let order: Vec<&str> = entries.iter().map(|e| e.checklist_id.as_str()).collect();
        assert_eq!(order, ids.to_vec());
        assert_eq!(entries[2].coverage, Coverage::Partial);
        assert_eq!(entries[2].confidence_score, 0.5);
        assert_eq!(entries[0], CanonicalEntry::missing("4.1"));
    }

    #[test]
    fn test_summarize_drops_unknown_ids() {
        let verdicts = vec![
            verdict("9.9", Coverage::Explicit),
            verdict("4.1", Coverage::Explicit),
        ];
        let entries = summarize(&verdicts, &["4.1", "4.2"]);

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.checklist_id != "9.9"));
        assert_eq!(entries[0].coverage, Coverage::Explicit);
    }

    #[test]
    fn test_empty_run_is_all_missing() {
        let entries = summarize(&[], &["5.1", "5.2"]);
        assert!(entries.iter().all(|e| e.coverage == Coverage::Missing));
        assert!(entries.iter().all(|e| e.supporting_matches.is_empty()));
    }

    fn coverage_strategy() -> impl Strategy<Value = Coverage> {
        prop_oneof![
            Just(Coverage::Missing),
            Just(Coverage::Partial),
            Just(Coverage::Explicit),
        ]
    }

    fn verdicts_strategy() -> impl Strategy<Value = Vec<RawVerdict>> {
        prop::collection::vec(
            (0usize..6, coverage_strategy()).prop_map(|(i, c)| verdict(&format!("6.{}", i + 1), c)),
            0..40,
        )
    }

    const IDS: [&str; 5] = ["6.1", "6.2", "6.3", "6.4", "6.5"];

    proptest! {
        #[test]
        fn prop_finalize_length_matches_checklist(verdicts in verdicts_strategy()) {
            let entries = summarize(&verdicts, &IDS);
            prop_assert_eq!(entries.len(), IDS.len());
        }

        #[test]
        fn prop_confidence_matches_coverage(verdicts in verdicts_strategy()) {
            for entry in summarize(&verdicts, &IDS) {
                prop_assert!([0.0, 0.5, 1.0].contains(&entry.confidence_score));
                prop_assert_eq!(entry.confidence_score, entry.coverage.confidence_score());
            }
        }

        #[test]
        fn prop_coverage_never_decreases(verdicts in verdicts_strategy()) {
            let mut compiled = BTreeMap::new();
            let mut previous = finalize(&compiled, &IDS);
            for v in &verdicts {
                merge(&mut compiled, v);
                let current = finalize(&compiled, &IDS);
                for (before, after) in previous.iter().zip(current.iter()) {
                    prop_assert!(after.coverage >= before.coverage);
                }
                previous = current;
            }
        }

        #[test]
        fn prop_refold_is_idempotent(verdicts in verdicts_strategy()) {
            let first = summarize(&verdicts, &IDS);
            let second = summarize(&verdicts, &IDS);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_matches_count_non_missing_verdicts(verdicts in verdicts_strategy()) {
            let entries = summarize(&verdicts, &IDS);
            let matches: usize = entries.iter().map(|e| e.supporting_matches.len()).sum();
            let expected = verdicts
                .iter()
                .filter(|v| v.status.is_mentioned() && IDS.contains(&v.checklist_id.as_str()))
                .count();
            prop_assert_eq!(matches, expected);
        }
    }
}
