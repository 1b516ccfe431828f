//! End-to-end query pipeline.
//!
//! ```text
//! query -> embed -> index.search(pool) -> dedupe -> rerank -> top_k
//!       -> subject filter -> synthesize -> SearchResponse
//! ```

use crate::answer::{AnswerSynthesizer, truncate_chars};
use crate::ranking::{dedupe, rerank};
use crate::semantic::{
    ComponentScores, CorpusCache, Embedder, HashEmbedder, HttpEmbedder, Match, embed_or_zero,
};
use crate::subject::{Subject, classify, filter_by_subject};
use proflens_core::config::{ProjectConfig, RerankWeights, SearchConfig};
use proflens_core::error::ErrorCode;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Caller-visible search failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("query must not be empty")]
    InvalidQuery,
}

impl SearchError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidQuery => ErrorCode::EmptyQuery,
        }
    }
}

/// One professor row in a search response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProfessor {
    /// Entity id, or the snapshot row id when the row carries none.
    pub id: String,
    pub name: String,
    pub subject: String,
    pub department: String,
    pub rating: f64,
    pub num_reviews: u32,
    pub tags: Vec<String>,
    pub similarity_score: f64,
    pub final_score: f64,
    pub component_scores: ComponentScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    pub chunk_preview: String,
}

impl RankedProfessor {
    fn from_match(m: &Match<'_>, preview_chars: usize) -> Self {
        let metadata = &m.entry.metadata;
        Self {
            id: m.entity_id().unwrap_or(&m.entry.id).to_string(),
            name: metadata.name.clone(),
            subject: metadata.subject.clone(),
            department: metadata.department.clone(),
            rating: metadata.rating(),
            num_reviews: metadata.num_reviews,
            tags: metadata.tags.iter().cloned().collect(),
            similarity_score: round4(m.similarity),
            final_score: round4(m.final_score),
            component_scores: m.component_scores,
            profile_url: metadata.profile_url().map(str::to_string),
            chunk_preview: preview(&metadata.text_snippet, preview_chars),
        }
    }
}

/// Result of [`Pipeline::search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    pub answer: String,
    pub sources: Vec<String>,
    #[serde(rename = "professors")]
    pub ranked_matches: Vec<RankedProfessor>,
    /// Raw index matches before dedup and filtering.
    pub total_found: usize,
}

/// Retrieval, ranking and answer synthesis over one corpus.
pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    corpus: CorpusCache,
    synthesizer: AnswerSynthesizer,
    search: SearchConfig,
    weights: RerankWeights,
    preview_chars: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("embedding_dim", &self.embedder.dimension())
            .field("corpus", &self.corpus)
            .field("synthesizer", &self.synthesizer)
            .field("search", &self.search)
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline with default search settings and weights.
    #[must_use]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        corpus: CorpusCache,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            embedder,
            corpus,
            synthesizer,
            search: SearchConfig::default(),
            weights: RerankWeights::default(),
            preview_chars: 200,
        }
    }

    #[must_use]
    pub fn with_search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    #[must_use]
    pub const fn with_weights(mut self, weights: RerankWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub const fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    /// Build the pipeline described by `config`.
    ///
    /// The HTTP embedder is used when an endpoint and key are configured,
    /// the hash embedder otherwise. The corpus is not read until the first
    /// search.
    #[must_use]
    pub fn from_config(config: &ProjectConfig, project_root: &Path) -> Self {
        let dimension = config.corpus.dimension;
        let embedder: Arc<dyn Embedder> = match (&config.embedder.endpoint, config.embedder.api_key())
        {
            (Some(endpoint), Some(api_key)) => {
                info!("using embedding endpoint {endpoint}");
                Arc::new(HttpEmbedder::new(
                    endpoint.clone(),
                    api_key,
                    dimension,
                    Duration::from_millis(config.embedder.timeout_ms),
                ))
            }
            (Some(endpoint), None) => {
                info!(
                    "{} not set; using hash embeddings instead of {endpoint}",
                    config.embedder.api_key_env
                );
                Arc::new(HashEmbedder::new(dimension))
            }
            (None, _) => Arc::new(HashEmbedder::new(dimension)),
        };

        let synthesizer = AnswerSynthesizer::from_config(config.answer.clone(), &config.llm);
        debug!(llm = synthesizer.has_model(), dimension, "pipeline configured");

        Self::new(
            embedder,
            CorpusCache::new(config.corpus_path(project_root)),
            synthesizer,
        )
        .with_search_config(config.search.clone())
        .with_weights(config.rerank)
        .with_preview_chars(config.answer.preview_chars)
    }

    #[must_use]
    pub const fn corpus(&self) -> &CorpusCache {
        &self.corpus
    }

    /// Run a query end to end.
    ///
    /// Up to `max(candidate_pool, top_k)` neighbours are retrieved, collapsed
    /// to one per entity, reranked and cut to `top_k`, then narrowed to the
    /// query's subject when one is detected.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] for an empty or whitespace-only
    /// query, before the corpus is touched. Every other failure degrades.
    pub fn search(&self, query: &str, top_k: usize) -> Result<SearchResponse, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery);
        }

        let index = self.corpus.get();
        let vector = embed_or_zero(self.embedder.as_ref(), query);
        let raw = index.search(&vector, self.search.candidate_pool.max(top_k));
        let total_found = raw.len();

        let mut ranked = rerank(dedupe(raw), &self.weights);
        ranked.truncate(top_k);

        let subject = classify(query);
        let ranked = if self.search.subject_filter {
            filter_by_subject(ranked, subject)
        } else {
            ranked
        };
        debug!(
            total_found,
            kept = ranked.len(),
            subject = subject.map(Subject::as_str),
            "ranked matches"
        );

        let answer = self.synthesizer.synthesize(query, &ranked);
        let ranked_matches = ranked
            .iter()
            .map(|m| RankedProfessor::from_match(m, self.preview_chars))
            .collect();

        Ok(SearchResponse {
            query: query.to_string(),
            subject,
            answer: answer.answer,
            sources: answer.sources,
            ranked_matches,
            total_found,
        })
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn preview(snippet: &str, max_chars: usize) -> String {
    let head = truncate_chars(snippet, max_chars);
    if head.len() < snippet.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}
