use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const PROJECT_CONFIG: &str = ".proflens/config.toml";
const CORPUS_ENV: &str = "PROFLENS_CORPUS";
const LLM_DISABLED_ENV: &str = "PROFLENS_LLM_DISABLED";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub rerank: RerankWeights,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
}

impl ProjectConfig {
    /// Corpus snapshot path, resolved against `project_root` when relative.
    #[must_use]
    pub fn corpus_path(&self, project_root: &Path) -> PathBuf {
        if self.corpus.path.is_absolute() {
            self.corpus.path.clone()
        } else {
            project_root.join(&self.corpus.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
            dimension: default_dimension(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// How many raw neighbours to pull from the index before dedup/rerank.
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_true")]
    pub subject_filter: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_pool: default_candidate_pool(),
            top_k: default_top_k(),
            subject_filter: default_true(),
        }
    }
}

/// Weights for the composite rerank score:
///
/// `final = similarity*sim + rating*(avg_rating/5) + reviews*(reviews/max_reviews)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankWeights {
    #[serde(default = "default_similarity_weight")]
    pub similarity: f64,
    #[serde(default = "default_rating_weight")]
    pub rating: f64,
    #[serde(default = "default_reviews_weight")]
    pub reviews: f64,
}

impl Default for RerankWeights {
    fn default() -> Self {
        Self {
            similarity: default_similarity_weight(),
            rating: default_rating_weight(),
            reviews: default_reviews_weight(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Maximum matches rendered into the LLM context.
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
    /// Maximum snippet characters per context line.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    /// Matches named by the template answer.
    #[serde(default = "default_fallback_count")]
    pub fallback_count: usize,
    /// Characters of snippet shown in result previews.
    #[serde(default = "default_snippet_chars")]
    pub preview_chars: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            context_limit: default_context_limit(),
            snippet_chars: default_snippet_chars(),
            fallback_count: default_fallback_count(),
            preview_chars: default_snippet_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            timeout_ms: default_llm_timeout_ms(),
            api_key_env: default_llm_key_env(),
        }
    }
}

impl LlmConfig {
    /// API key read from the configured environment variable, if set.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        non_blank_env(&self.api_key_env)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Feature-extraction endpoint. The offline hash embedder is used when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_embedder_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_embedder_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: default_embedder_key_env(),
            timeout_ms: default_embedder_timeout_ms(),
        }
    }
}

impl EmbedderConfig {
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        non_blank_env(&self.api_key_env)
    }
}

fn default_true() -> bool {
    true
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/local_index.json")
}

const fn default_dimension() -> usize {
    384
}

const fn default_candidate_pool() -> usize {
    10
}

const fn default_top_k() -> usize {
    5
}

const fn default_similarity_weight() -> f64 {
    0.7
}

const fn default_rating_weight() -> f64 {
    0.25
}

const fn default_reviews_weight() -> f64 {
    0.05
}

const fn default_context_limit() -> usize {
    5
}

const fn default_snippet_chars() -> usize {
    200
}

const fn default_fallback_count() -> usize {
    3
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_llm_timeout_ms() -> u64 {
    8_000
}

fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_embedder_key_env() -> String {
    "HUGGINGFACE_API_KEY".to_string()
}

const fn default_embedder_timeout_ms() -> u64 {
    5_000
}

fn non_blank_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Load `<project_root>/.proflens/config.toml`, or defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_CONFIG);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    read_config(&path)
}

/// Load the per-user config (`<config_dir>/proflens/config.toml`), if any.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<Option<ProjectConfig>> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(None);
    };

    let path = config_dir.join("proflens/config.toml");
    if !path.exists() {
        return Ok(None);
    }

    read_config(&path).map(Some)
}

fn read_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective config: project file, else user file, else
/// defaults, then environment overrides.
///
/// # Errors
///
/// Returns an error if a config file exists but is malformed.
pub fn resolve_config(project_root: &Path) -> Result<ProjectConfig> {
    let config = if project_root.join(PROJECT_CONFIG).exists() {
        load_project_config(project_root)?
    } else {
        load_user_config()?.unwrap_or_default()
    };

    Ok(apply_env_overrides(config, |name| env::var(name).ok()))
}

/// Apply `PROFLENS_CORPUS` and `PROFLENS_LLM_DISABLED` using `lookup`.
#[must_use]
pub fn apply_env_overrides(
    mut config: ProjectConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ProjectConfig {
    if let Some(path) = lookup(CORPUS_ENV).filter(|p| !p.trim().is_empty()) {
        config.corpus.path = PathBuf::from(path.trim());
    }

    if matches!(
        lookup(LLM_DISABLED_ENV)
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref(),
        Some("1" | "true" | "yes" | "on")
    ) {
        config.llm.enabled = false;
    }

    config
}
