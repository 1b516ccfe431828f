//! Corpus records as they appear in an index snapshot.
//!
//! A snapshot is an ordered JSON array of `{id, vector, metadata}` objects.
//! Metadata keys written by older seeding tools (`professor_id`, `full_text`,
//! `chunk_text`) are accepted as aliases.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Highest rating a review site hands out.
pub const MAX_RATING: f64 = 5.0;

/// One indexed instructor profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Snapshot row id. Not necessarily the entity id.
    pub id: String,
    /// Embedding of the profile text.
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: ProfileMetadata,
}

/// Structured metadata attached to a corpus entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    /// Logical instructor id. Several rows may share one.
    #[serde(default, alias = "professor_id")]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub department: String,
    /// Average rating in `[0, 5]`. Absent ratings score as zero.
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub num_reviews: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, alias = "full_text", alias = "chunk_text")]
    pub text_snippet: String,
    #[serde(default)]
    pub profile_url: Option<String>,
}

impl ProfileMetadata {
    /// The entity id, treating blank strings as missing.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Rating clamped into `[0, 5]`; missing or non-finite ratings are `0`.
    #[must_use]
    pub fn rating(&self) -> f64 {
        match self.avg_rating {
            Some(rating) if rating.is_finite() => rating.clamp(0.0, MAX_RATING),
            _ => 0.0,
        }
    }

    /// Profile URL, treating blank strings as missing.
    #[must_use]
    pub fn profile_url(&self) -> Option<&str> {
        self.profile_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_seed_script_aliases() {
        let raw = r#"{
            "id": "prof_1",
            "vector": [0.1, 0.2],
            "metadata": {
                "professor_id": "prof_1",
                "name": "Dr. Ada Byron",
                "subject": "Calculus",
                "department": "Mathematics",
                "avg_rating": 4.5,
                "num_reviews": 42,
                "tags": ["clear lectures", "tough grader"],
                "bio": "ignored",
                "full_text": "Professor Ada Byron teaches Calculus.",
                "profile_url": ""
            }
        }"#;

        let entry: CorpusEntry = serde_json::from_str(raw).expect("entry should parse");
        assert_eq!(entry.metadata.entity_id(), Some("prof_1"));
        assert_eq!(entry.metadata.text_snippet, "Professor Ada Byron teaches Calculus.");
        assert_eq!(entry.metadata.tags.len(), 2);
        assert_eq!(entry.metadata.profile_url(), None);
    }

    #[test]
    fn missing_metadata_defaults() {
        let entry: CorpusEntry =
            serde_json::from_str(r#"{"id": "x", "vector": []}"#).expect("entry should parse");
        assert_eq!(entry.metadata.entity_id(), None);
        assert!(entry.metadata.rating().abs() < f64::EPSILON);
        assert_eq!(entry.metadata.num_reviews, 0);
    }

    #[test]
    fn blank_entity_id_is_missing() {
        let meta = ProfileMetadata {
            entity_id: Some("   ".into()),
            ..ProfileMetadata::default()
        };
        assert_eq!(meta.entity_id(), None);
    }

    #[test]
    fn rating_is_clamped_and_sanitized() {
        let mut meta = ProfileMetadata {
            avg_rating: Some(7.5),
            ..ProfileMetadata::default()
        };
        assert!((meta.rating() - 5.0).abs() < f64::EPSILON);

        meta.avg_rating = Some(f64::NAN);
        assert!(meta.rating().abs() < f64::EPSILON);

        meta.avg_rating = Some(-1.0);
        assert!(meta.rating().abs() < f64::EPSILON);
    }
}
