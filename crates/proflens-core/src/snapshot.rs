//! Reading corpus snapshots from disk.

use crate::model::CorpusEntry;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Load a snapshot, returning `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not a JSON
/// array of corpus entries.
pub fn try_load_snapshot(path: &Path) -> Result<Option<Vec<CorpusEntry>>> {
    if !path.exists() {
        debug!("snapshot {} not found", path.display());
        return Ok(None);
    }

    load_snapshot(path).map(Some)
}

/// Load a snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<Vec<CorpusEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;

    let entries: Vec<CorpusEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

    info!(
        "loaded {} corpus entries from {}",
        entries.len(),
        path.display()
    );
    Ok(entries)
}

/// Count entries per `subject` metadata value, sorted by subject.
#[must_use]
pub fn subject_counts(entries: &[CorpusEntry]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        let subject = entry.metadata.subject.trim();
        let key = if subject.is_empty() {
            "Unknown Subject".to_string()
        } else {
            subject.to_string()
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"id": "a", "vector": [1.0, 0.0], "metadata": {"professor_id": "a", "subject": "Calculus"}},
        {"id": "b", "vector": [0.0, 1.0], "metadata": {"professor_id": "b", "subject": "Calculus"}},
        {"id": "c", "vector": [0.5, 0.5], "metadata": {"professor_id": "c", "subject": ""}}
    ]"#;

    #[test]
    fn missing_snapshot_is_none() {
        let tmp = tempfile::tempdir().expect("tempdir must be created");
        let result = try_load_snapshot(&tmp.path().join("nope.json")).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn loads_entries_in_file_order() {
        let tmp = tempfile::tempdir().expect("tempdir must be created");
        let path = tmp.path().join("index.json");
        fs::write(&path, SAMPLE).expect("write snapshot");

        let entries = load_snapshot(&path).expect("snapshot should load");
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn malformed_snapshot_reports_path() {
        let tmp = tempfile::tempdir().expect("tempdir must be created");
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{not json").expect("write snapshot");

        let err = try_load_snapshot(&path).expect_err("parse should fail");
        assert!(err.to_string().contains("broken.json"), "got: {err}");
    }

    #[test]
    fn subject_counts_group_blank_subjects() {
        let entries: Vec<CorpusEntry> = serde_json::from_str(SAMPLE).expect("parse sample");
        let counts = subject_counts(&entries);
        assert_eq!(counts.get("Calculus"), Some(&2));
        assert_eq!(counts.get("Unknown Subject"), Some(&1));
    }
}
