//! Deduplication and index-record merging.
//!
//! Pages get revisited, so aggregation must be deterministic: [`dedupe_by_key`]
//! keeps the first-encountered record per natural key, and [`merge_fight`]
//! folds a freshly parsed fight-details page into its index record under the
//! field-ownership policy: the index record owns `fight_id`, `event_id` and
//! `fight_order`, and a page is never authoritative for fields the index
//! already established.

use crate::models::{Fight, FightIndexEntry};
use itertools::Itertools;
use std::hash::Hash;

/// Drop duplicate records, keeping the first one seen for each distinct key.
pub fn dedupe_by_key<T, K, F>(records: Vec<T>, key_fn: F) -> Vec<T>
where
    K: Hash + Eq,
    F: FnMut(&T) -> K,
{
    records.into_iter().unique_by(key_fn).collect()
}

/// Merge a parsed fight-details record into its index entry.
///
/// All freshly parsed fields are taken as-is; the protected identity fields
/// (`fight_id`, `event_id`, `fight_order`) always come from the index, even
/// when the page produced different values.
pub fn merge_fight(index: &FightIndexEntry, parsed: Fight) -> Fight {
    Fight {
        event_id: index.event_id.clone(),
        fight_id: index.fight_id.clone(),
        fight_order: Some(index.fight_order),
        ..parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_seen() {
        let records = vec![
            ("f1", "from event A"),
            ("f2", "from event B"),
            ("f1", "from revisit"),
        ];
        let unique = dedupe_by_key(records, |r| r.0);
        assert_eq!(
            unique,
            vec![("f1", "from event A"), ("f2", "from event B")]
        );
    }

    #[test]
    fn test_merge_protects_index_fields() {
        let index = FightIndexEntry {
            event_id: "evt1".to_string(),
            fight_id: "fight1".to_string(),
            fight_order: 3,
        };
        // The page disagrees on every protected field.
        let parsed = Fight {
            event_id: "evt-from-page".to_string(),
            fight_id: "fight-from-page".to_string(),
            fight_order: Some(99),
            method: Some("Decision - Unanimous".to_string()),
            ..Fight::default()
        };

        let merged = merge_fight(&index, parsed);
        assert_eq!(merged.event_id, "evt1");
        assert_eq!(merged.fight_id, "fight1");
        assert_eq!(merged.fight_order, Some(3));
        // Non-protected fields come from the page.
        assert_eq!(merged.method.as_deref(), Some("Decision - Unanimous"));
    }
}
