//! Id-based deduplication, first occurrence wins.

use std::collections::HashSet;

use crate::model::CanonicalTransaction;

/// Single pass; keeps the first row per id and the relative order of survivors.
pub fn dedupe(transactions: Vec<CanonicalTransaction>) -> Vec<CanonicalTransaction> {
    let mut seen: HashSet<String> = HashSet::with_capacity(transactions.len());
    transactions
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

/// Rows of `incoming` whose ids are not in `existing`, deduplicated among themselves.
pub fn new_rows(
    existing: &[CanonicalTransaction],
    incoming: Vec<CanonicalTransaction>,
) -> Vec<CanonicalTransaction> {
    let mut seen: HashSet<String> = existing.iter().map(|t| t.id.clone()).collect();
    incoming
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Batch, RawTransaction};
    use crate::normalize::normalize_batch;
    use chrono::NaiveDate;

    fn rows(ids: &[&str]) -> Vec<CanonicalTransaction> {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let raws = ids
            .iter()
            .map(|id| RawTransaction::new(date, format!("row {id}"), 1.0).with_correlation_id(*id))
            .collect();
        let mut out = normalize_batch(&Batch::new("b", raws), 0);
        // Pin ids so tests control collisions directly.
        for (t, id) in out.iter_mut().zip(ids) {
            t.id = id.to_string();
        }
        out
    }

    fn ids(txs: &[CanonicalTransaction]) -> Vec<&str> {
        txs.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn keeps_first_occurrence_in_order() {
        let mut input = rows(&["a", "b", "a", "c", "b"]);
        input[2].description = "second a".into();
        let out = dedupe(input);
        assert_eq!(ids(&out), vec!["a", "b", "c"]);
        assert_eq!(out[0].description, "row a");
    }

    #[test]
    fn new_rows_filters_existing_and_internal_duplicates() {
        let existing = rows(&["a", "b"]);
        let out = new_rows(&existing, rows(&["b", "c", "c", "d", "a"]));
        assert_eq!(ids(&out), vec!["c", "d"]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(dedupe(vec![]).is_empty());
        assert!(new_rows(&rows(&["a"]), vec![]).is_empty());
    }
}
