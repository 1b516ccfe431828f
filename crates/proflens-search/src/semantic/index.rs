//! Brute-force cosine index over unit-normalized corpus vectors.
//!
//! Every vector is normalized once at load, so query-time similarity is a
//! plain dot product. Search is an O(n·D) scan; ties keep corpus order.

use anyhow::Result;
use proflens_core::model::CorpusEntry;
use proflens_core::snapshot::try_load_snapshot;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Norms at or below this are treated as zero and left untouched.
const NORM_EPSILON: f64 = 1e-12;

/// Per-signal scores that feed the composite rerank score.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct ComponentScores {
    pub similarity: f64,
    /// `avg_rating / 5`.
    pub rating: f64,
    /// Review count relative to the busiest match in the batch.
    pub review_count: f64,
}

/// A corpus entry scored against one query.
///
/// Straight out of [`VectorIndex::search`], `final_score` equals
/// `similarity`; [`crate::ranking::rerank`] fills in the composite.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub entry: &'a CorpusEntry,
    /// Cosine similarity in `[-1, 1]`.
    pub similarity: f64,
    pub final_score: f64,
    pub component_scores: ComponentScores,
}

impl<'a> Match<'a> {
    #[must_use]
    pub fn new(entry: &'a CorpusEntry, similarity: f64) -> Self {
        Self {
            entry,
            similarity,
            final_score: similarity,
            component_scores: ComponentScores {
                similarity,
                ..ComponentScores::default()
            },
        }
    }

    /// Entity id of the underlying profile, if it has one.
    #[must_use]
    pub fn entity_id(&self) -> Option<&'a str> {
        let entry: &'a CorpusEntry = self.entry;
        entry.metadata.entity_id()
    }
}

/// Euclidean length of `vector`.
#[must_use]
pub fn l2_norm(vector: &[f32]) -> f64 {
    vector
        .iter()
        .map(|v| f64::from(*v) * f64::from(*v))
        .sum::<f64>()
        .sqrt()
}

/// Scale `vector` to unit length in place.
///
/// Returns `false` (leaving the vector unchanged) when the norm is too small
/// to divide by.
#[allow(clippy::cast_possible_truncation)]
pub fn normalize(vector: &mut [f32]) -> bool {
    let norm = l2_norm(vector);
    if !norm.is_finite() || norm <= NORM_EPSILON {
        return false;
    }

    for value in vector.iter_mut() {
        *value = (f64::from(*value) / norm) as f32;
    }
    true
}

/// Immutable in-memory index of corpus entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    entries: Vec<CorpusEntry>,
    dimension: Option<usize>,
}

impl VectorIndex {
    /// An index with no entries. Every search returns nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index, normalizing every vector.
    ///
    /// The first entry with a non-empty vector fixes the dimension; entries
    /// whose vector length differs are skipped.
    #[must_use]
    pub fn load(entries: Vec<CorpusEntry>) -> Self {
        let dimension = entries
            .iter()
            .map(|entry| entry.vector.len())
            .find(|len| *len > 0);

        let Some(dimension) = dimension else {
            if !entries.is_empty() {
                warn!(
                    "all {} corpus entries have empty vectors; index is empty",
                    entries.len()
                );
            }
            return Self::empty();
        };

        let total = entries.len();
        let mut kept = Vec::with_capacity(total);
        let mut zero_vectors = 0_usize;

        for mut entry in entries {
            if entry.vector.len() != dimension {
                debug!(
                    "skipping corpus entry {} due to dimension {} (expected {dimension})",
                    entry.id,
                    entry.vector.len()
                );
                continue;
            }
            if !normalize(&mut entry.vector) {
                zero_vectors += 1;
            }
            kept.push(entry);
        }

        if kept.len() < total {
            warn!(
                "dropped {} of {total} corpus entries with mismatched dimensions",
                total - kept.len()
            );
        }
        if zero_vectors > 0 {
            debug!("{zero_vectors} corpus entries have zero-norm vectors");
        }

        Self {
            entries: kept,
            dimension: Some(dimension),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimension, or `None` for an empty index.
    #[must_use]
    pub const fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Entries in insertion order, with normalized vectors.
    #[must_use]
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Top-`k` entries by cosine similarity to `query`, best first.
    ///
    /// Never fails: an empty index, `k == 0`, or a query of the wrong
    /// dimension all yield an empty list.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize) -> Vec<Match<'_>> {
        if k == 0 || self.entries.is_empty() {
            return Vec::new();
        }

        if Some(query.len()) != self.dimension {
            warn!(
                "query dimension {} does not match index dimension {:?}",
                query.len(),
                self.dimension
            );
            return Vec::new();
        }

        let mut query = query.to_vec();
        normalize(&mut query);

        let mut scored: Vec<Match<'_>> = self
            .entries
            .iter()
            .map(|entry| Match::new(entry, dot(&query, &entry.vector).clamp(-1.0, 1.0)))
            .collect();

        // `sort_by` is stable, so equal similarities keep insertion order.
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);
        scored
    }
}

fn dot(left: &[f32], right: &[f32]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(a, b)| f64::from(*a) * f64::from(*b))
        .sum()
}

/// Lazily loaded, process-lifetime corpus index.
///
/// The snapshot is read on first access. Concurrent first callers block on
/// the same initialization and all observe the fully built index; later
/// reads are lock-free. A missing or unreadable snapshot yields an empty
/// index.
#[derive(Debug)]
pub struct CorpusCache {
    path: PathBuf,
    index: OnceLock<VectorIndex>,
}

impl CorpusCache {
    /// Cache that will load `path` on first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index: OnceLock::new(),
        }
    }

    /// Cache that is already initialized with `index`.
    #[must_use]
    pub fn preloaded(index: VectorIndex) -> Self {
        Self {
            path: PathBuf::new(),
            index: OnceLock::from(index),
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    /// The index, loading it if this is the first access.
    pub fn get(&self) -> &VectorIndex {
        self.index.get_or_init(|| match load_index(&self.path) {
            Ok(Some(index)) => index,
            Ok(None) => {
                warn!(
                    "corpus snapshot {} not found; searches will return no matches",
                    self.path.display()
                );
                VectorIndex::empty()
            }
            Err(err) => {
                warn!("failed to load corpus snapshot: {err:#}");
                VectorIndex::empty()
            }
        })
    }
}

fn load_index(path: &Path) -> Result<Option<VectorIndex>> {
    let Some(entries) = try_load_snapshot(path)? else {
        return Ok(None);
    };

    let index = VectorIndex::load(entries);
    info!(
        "corpus index ready: {} entries, dimension {:?}",
        index.len(),
        index.dimension()
    );
    Ok(Some(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proflens_core::model::ProfileMetadata;
    use proptest::prelude::*;

    fn entry(id: &str, vector: Vec<f32>) -> CorpusEntry {
        CorpusEntry {
            id: id.to_string(),
            vector,
            metadata: ProfileMetadata {
                entity_id: Some(id.to_string()),
                ..ProfileMetadata::default()
            },
        }
    }

    fn ids<'a>(matches: &[Match<'a>]) -> Vec<&'a str> {
        matches.iter().map(|m| m.entry.id.as_str()).collect()
    }

    #[test]
    fn load_normalizes_vectors() {
        let index = VectorIndex::load(vec![entry("a", vec![3.0, 4.0]), entry("b", vec![0.0, 2.0])]);
        assert_eq!(index.entries()[0].vector, vec![0.6, 0.8]);
        assert_eq!(index.entries()[1].vector, vec![0.0, 1.0]);
    }

    #[test]
    fn load_keeps_zero_vectors_as_zero() {
        let index = VectorIndex::load(vec![entry("z", vec![0.0, 0.0])]);
        assert_eq!(index.entries()[0].vector, vec![0.0, 0.0]);
        assert!(index.entries()[0].vector.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn load_skips_mismatched_dimensions() {
        let index = VectorIndex::load(vec![
            entry("a", vec![1.0, 0.0]),
            entry("b", vec![1.0, 0.0, 0.0]),
            entry("c", vec![0.0, 1.0]),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), Some(2));
    }

    #[test]
    fn empty_index_search_returns_nothing() {
        let index = VectorIndex::empty();
        assert!(index.search(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn zero_k_returns_nothing() {
        let index = VectorIndex::load(vec![entry("a", vec![1.0, 0.0])]);
        assert!(index.search(&[1.0, 0.0], 0).is_empty());
    }

    #[test]
    fn wrong_query_dimension_returns_nothing() {
        let index = VectorIndex::load(vec![entry("a", vec![1.0, 0.0])]);
        assert!(index.search(&[1.0, 0.0, 0.0], 3).is_empty());
    }

    #[test]
    fn search_ranks_by_cosine() {
        let index = VectorIndex::load(vec![
            entry("far", vec![-1.0, 0.0]),
            entry("mid", vec![1.0, 1.0]),
            entry("near", vec![1.0, 0.0]),
        ]);

        let results = index.search(&[10.0, 0.0], 10);
        assert_eq!(ids(&results), ["near", "mid", "far"]);
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert!((results[2].similarity + 1.0).abs() < 1e-6);
        assert!((results[0].final_score - results[0].similarity).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = VectorIndex::load(vec![
            entry("first", vec![0.0, 1.0]),
            entry("second", vec![0.0, 2.0]),
            entry("third", vec![0.0, 3.0]),
        ]);
        let results = index.search(&[0.0, 1.0], 3);
        assert_eq!(ids(&results), ["first", "second", "third"]);
    }

    #[test]
    fn zero_query_scores_everything_zero() {
        let index = VectorIndex::load(vec![entry("a", vec![1.0, 0.0]), entry("b", vec![0.0, 1.0])]);
        let results = index.search(&[0.0, 0.0], 2);
        assert_eq!(ids(&results), ["a", "b"]);
        assert!(results.iter().all(|m| m.similarity.abs() < f64::EPSILON));
    }

    #[test]
    fn preloaded_cache_never_touches_disk() {
        let cache = CorpusCache::preloaded(VectorIndex::load(vec![entry("a", vec![1.0])]));
        assert!(cache.is_loaded());
        assert_eq!(cache.get().len(), 1);
    }

    #[test]
    fn missing_snapshot_loads_empty_once() {
        let tmp = tempfile::tempdir().expect("tempdir must be created");
        let cache = CorpusCache::new(tmp.path().join("absent.json"));
        assert!(!cache.is_loaded());
        assert!(cache.get().is_empty());
        assert!(cache.is_loaded());

        // Writing the file afterwards does not trigger a second load.
        std::fs::write(
            tmp.path().join("absent.json"),
            r#"[{"id": "a", "vector": [1.0]}]"#,
        )
        .expect("write snapshot");
        assert!(cache.get().is_empty());
    }

    #[test]
    fn concurrent_first_access_sees_one_index() {
        let tmp = tempfile::tempdir().expect("tempdir must be created");
        let path = tmp.path().join("index.json");
        std::fs::write(
            &path,
            r#"[{"id": "a", "vector": [3.0, 4.0]}, {"id": "b", "vector": [1.0, 0.0]}]"#,
        )
        .expect("write snapshot");

        let cache = CorpusCache::new(&path);
        let addresses: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| std::ptr::from_ref(cache.get()) as usize))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("reader thread panicked"))
                .collect()
        });

        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.get().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_loaded_vectors_are_unit_or_zero(
            vectors in prop::collection::vec(prop::collection::vec(-100.0_f32..100.0, 8), 1..20)
        ) {
            let entries = vectors
                .into_iter()
                .enumerate()
                .map(|(i, v)| entry(&format!("e{i}"), v))
                .collect();
            let index = VectorIndex::load(entries);
            for e in index.entries() {
                let norm = l2_norm(&e.vector);
                prop_assert!(norm.abs() < 1e-9 || (norm - 1.0).abs() < 1e-5, "norm {}", norm);
            }
        }

        #[test]
        fn prop_search_is_bounded_and_sorted(
            vectors in prop::collection::vec(prop::collection::vec(-1.0_f32..1.0, 4), 0..30),
            query in prop::collection::vec(-1.0_f32..1.0, 4),
            k in 0_usize..40,
        ) {
            let entries = vectors
                .into_iter()
                .enumerate()
                .map(|(i, v)| entry(&format!("e{i}"), v))
                .collect();
            let index = VectorIndex::load(entries);
            let results = index.search(&query, k);

            prop_assert!(results.len() <= k);
            prop_assert!(results.len() <= index.len());
            for pair in results.windows(2) {
                prop_assert!(pair[0].similarity >= pair[1].similarity);
            }
            for m in &results {
                prop_assert!((-1.0..=1.0).contains(&m.similarity));
            }
        }
    }
}
