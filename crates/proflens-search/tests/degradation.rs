//! Graceful degradation of the pipeline.
//!
//! # Scenarios covered
//!
//! 1. **Missing snapshot**: empty index, no-results answer, no panic.
//! 2. **Corrupt snapshot**: same as missing.
//! 3. **Failing embedder**: zero vector substituted; search still answers.
//! 4. **Wrong-dimension embedder**: no matches instead of an error.
//! 5. **Mixed-dimension snapshot**: mismatched rows skipped on load.
//! 6. **Config-built pipeline**: reads a snapshot from the project root.

use anyhow::{Result, bail};
use proflens_core::config::{AnswerConfig, ProjectConfig};
use proflens_core::model::{CorpusEntry, ProfileMetadata};
use proflens_search::answer::NO_RESULTS_ANSWER;
use proflens_search::semantic::{Embedder, HashEmbedder};
use proflens_search::{AnswerSynthesizer, CorpusCache, Pipeline};
use std::fs;
use std::path::Path;
use std::sync::Arc;

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn dimension(&self) -> usize {
        3
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("embedding service unreachable")
    }
}

struct WrongLengthEmbedder;

impl Embedder for WrongLengthEmbedder {
    fn dimension(&self) -> usize {
        5
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; 5])
    }
}

fn profile(id: &str, vector: Vec<f32>) -> CorpusEntry {
    CorpusEntry {
        id: id.to_string(),
        vector,
        metadata: ProfileMetadata {
            entity_id: Some(id.to_string()),
            name: format!("Prof {id}"),
            subject: "Physics".to_string(),
            avg_rating: Some(4.0),
            num_reviews: 12,
            ..ProfileMetadata::default()
        },
    }
}

fn write_snapshot(path: &Path, entries: &[CorpusEntry]) {
    fs::write(
        path,
        serde_json::to_string(entries).expect("serialize snapshot"),
    )
    .expect("write snapshot");
}

fn pipeline_at(embedder: Arc<dyn Embedder>, snapshot: &Path) -> Pipeline {
    Pipeline::new(
        embedder,
        CorpusCache::new(snapshot),
        AnswerSynthesizer::offline(AnswerConfig::default()),
    )
}

#[test]
fn missing_snapshot_yields_no_results() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = pipeline_at(Arc::new(HashEmbedder::new(3)), &dir.path().join("absent.json"));

    let response = pipeline.search("quantum mechanics", 5).expect("search");
    assert!(response.ranked_matches.is_empty());
    assert_eq!(response.answer, NO_RESULTS_ANSWER);
    assert!(pipeline.corpus().is_loaded());
    assert!(pipeline.corpus().get().is_empty());
}

#[test]
fn corrupt_snapshot_yields_no_results() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    fs::write(&path, "{ this is not a snapshot").expect("write");

    let response = pipeline_at(Arc::new(HashEmbedder::new(3)), &path)
        .search("physics", 5)
        .expect("search");
    assert!(response.ranked_matches.is_empty());
    assert_eq!(response.total_found, 0);
}

#[test]
fn failing_embedder_still_answers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    write_snapshot(
        &path,
        &[
            profile("p1", vec![1.0, 0.0, 0.0]),
            profile("p2", vec![0.0, 1.0, 0.0]),
        ],
    );

    let response = pipeline_at(Arc::new(BrokenEmbedder), &path)
        .search("thermodynamics", 5)
        .expect("search");

    assert_eq!(response.ranked_matches.len(), 2);
    for row in &response.ranked_matches {
        assert!(row.similarity_score.abs() < 1e-12);
    }
    assert_eq!(response.sources.len(), 2);
}

#[test]
fn wrong_dimension_embedder_finds_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    write_snapshot(&path, &[profile("p1", vec![1.0, 0.0, 0.0])]);

    let response = pipeline_at(Arc::new(WrongLengthEmbedder), &path)
        .search("physics", 5)
        .expect("search");
    assert!(response.ranked_matches.is_empty());
    assert_eq!(response.answer, NO_RESULTS_ANSWER);
}

#[test]
fn mismatched_rows_are_skipped_on_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    write_snapshot(
        &path,
        &[
            profile("p1", vec![3.0, 4.0, 0.0]),
            profile("short", vec![1.0, 0.0]),
            profile("p2", vec![0.0, 0.0, 2.0]),
        ],
    );

    let cache = CorpusCache::new(&path);
    let index = cache.get();
    assert_eq!(index.len(), 2);
    assert_eq!(index.dimension(), Some(3));

    let first = &index.entries()[0].vector;
    assert!((first[0] - 0.6).abs() < 1e-6);
    assert!((first[1] - 0.8).abs() < 1e-6);
}

#[test]
fn config_built_pipeline_reads_project_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("data");
    fs::create_dir_all(&data).expect("mkdir");
    write_snapshot(
        &data.join("local_index.json"),
        &[profile("p1", vec![1.0, 0.0, 0.0])],
    );

    let mut config = ProjectConfig::default();
    config.corpus.dimension = 3;
    config.llm.enabled = false;
    config.embedder.endpoint = None;

    let pipeline = Pipeline::from_config(&config, dir.path());
    let response = pipeline.search("physics", 5).expect("search");
    assert_eq!(response.ranked_matches.len(), 1);
    assert_eq!(response.sources, ["p1"]);
    assert_eq!(
        response.answer,
        "I recommend Prof p1 who teaches Physics (4.0★)."
    );
}
