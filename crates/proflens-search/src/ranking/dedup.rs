//! Collapse matches that point at the same instructor.

use crate::semantic::Match;
use std::collections::HashMap;
use tracing::debug;

/// Keep one match per entity id: the one with the highest similarity.
///
/// Output order is the order in which each id first appeared. Matches with
/// no entity id cannot be attributed to anyone and are dropped.
#[must_use]
pub fn dedupe(matches: Vec<Match<'_>>) -> Vec<Match<'_>> {
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(matches.len());
    let mut kept: Vec<Match<'_>> = Vec::with_capacity(matches.len());
    let mut unattributed = 0_usize;

    for candidate in matches {
        let Some(entity_id) = candidate.entity_id() else {
            debug!(
                "dropping match {} with no entity id",
                candidate.entry.id
            );
            unattributed += 1;
            continue;
        };

        match slots.get(entity_id) {
            Some(&slot) => {
                if candidate.similarity > kept[slot].similarity {
                    kept[slot] = candidate;
                }
            }
            None => {
                slots.insert(entity_id, kept.len());
                kept.push(candidate);
            }
        }
    }

    if unattributed > 0 {
        debug!("dropped {unattributed} matches without an entity id");
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proflens_core::model::{CorpusEntry, ProfileMetadata};

    fn entry(row: &str, entity: Option<&str>) -> CorpusEntry {
        CorpusEntry {
            id: row.to_string(),
            vector: vec![1.0],
            metadata: ProfileMetadata {
                entity_id: entity.map(String::from),
                ..ProfileMetadata::default()
            },
        }
    }

    fn summary<'a>(matches: &[Match<'a>]) -> Vec<(&'a str, f64)> {
        matches
            .iter()
            .map(|m| (m.entity_id().unwrap_or("-"), m.similarity))
            .collect()
    }

    #[test]
    fn keeps_highest_similarity_per_entity() {
        let a_low = entry("a-1", Some("A"));
        let a_high = entry("a-2", Some("A"));
        let b = entry("b-1", Some("B"));

        let out = dedupe(vec![
            Match::new(&a_low, 0.3),
            Match::new(&a_high, 0.9),
            Match::new(&b, 0.5),
        ]);

        assert_eq!(summary(&out), [("A", 0.9), ("B", 0.5)]);
        assert_eq!(out[0].entry.id, "a-2");
    }

    #[test]
    fn preserves_first_occurrence_order() {
        let b = entry("b", Some("B"));
        let a1 = entry("a1", Some("A"));
        let a2 = entry("a2", Some("A"));

        let out = dedupe(vec![
            Match::new(&b, 0.2),
            Match::new(&a1, 0.4),
            Match::new(&a2, 0.8),
        ]);

        assert_eq!(summary(&out), [("B", 0.2), ("A", 0.8)]);
    }

    #[test]
    fn equal_similarity_keeps_first_seen() {
        let first = entry("first", Some("A"));
        let second = entry("second", Some("A"));

        let out = dedupe(vec![Match::new(&first, 0.5), Match::new(&second, 0.5)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entry.id, "first");
    }

    #[test]
    fn drops_matches_without_entity_id() {
        let orphan = entry("orphan", None);
        let blank = entry("blank", Some("  "));
        let a = entry("a", Some("A"));

        let out = dedupe(vec![
            Match::new(&orphan, 0.99),
            Match::new(&blank, 0.95),
            Match::new(&a, 0.1),
        ]);
        assert_eq!(summary(&out), [("A", 0.1)]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}
