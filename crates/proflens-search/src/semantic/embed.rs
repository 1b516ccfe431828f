use anyhow::{Context, Result, anyhow, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::warn;

/// Default embedding dimensionality (MiniLM-L6-v2 sized).
pub const EMBEDDING_DIM: usize = 384;

/// Text embedded in place of empty or whitespace-only input.
pub const PLACEHOLDER_TEXT: &str = "empty query";

/// Text to vector collaborator.
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the backing model or service fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embed `text`, degrading to a zero vector on any failure.
///
/// Blank input is replaced with [`PLACEHOLDER_TEXT`]. Output with the wrong
/// dimension or non-finite components counts as a failure.
pub fn embed_or_zero(embedder: &dyn Embedder, text: &str) -> Vec<f32> {
    let text = if text.trim().is_empty() {
        PLACEHOLDER_TEXT
    } else {
        text
    };
    let dimension = embedder.dimension();

    match embedder.embed(text) {
        Ok(vector) if vector.len() == dimension && vector.iter().all(|v| v.is_finite()) => vector,
        Ok(vector) => {
            warn!(
                "embedder returned malformed vector (len {}, expected {dimension}); using zero vector",
                vector.len()
            );
            vec![0.0; dimension]
        }
        Err(err) => {
            warn!("embedding failed, using zero vector: {err:#}");
            vec![0.0; dimension]
        }
    }
}

/// Offline embedder: seeds a PRNG from the SHA-256 of the text and draws
/// standard-normal components, normalized to unit length.
///
/// Identical text always yields an identical vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed = [0_u8; 32];
        seed.copy_from_slice(&digest);
        let mut rng = StdRng::from_seed(seed);

        let mut vector: Vec<f32> = (0..self.dimension)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();
        super::normalize(&mut vector);
        Ok(vector)
    }
}

/// Embedder backed by a feature-extraction HTTP endpoint.
///
/// Sends `{"inputs": text}` with a bearer token and accepts either a flat
/// vector or a matrix of token vectors (mean-pooled).
pub struct HttpEmbedder {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
    dimension: usize,
}

impl HttpEmbedder {
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            dimension,
        }
    }
}

impl Embedder for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("User-Agent", "proflens")
            .send_json(serde_json::json!({ "inputs": text }))
            .map_err(|err| anyhow!("embedding request to {} failed: {err}", self.endpoint))?;

        let body: Value = response
            .into_json()
            .context("failed to decode embedding response JSON")?;

        parse_embedding(&body)
    }
}

fn parse_embedding(body: &Value) -> Result<Vec<f32>> {
    let Some(rows) = body.as_array() else {
        bail!("embedding response is not a JSON array");
    };

    if rows.iter().all(Value::is_number) {
        return rows.iter().map(as_f32).collect();
    }

    let matrix = rows
        .iter()
        .map(|row| {
            row.as_array()
                .context("embedding response mixes numbers and rows")?
                .iter()
                .map(as_f32)
                .collect::<Result<Vec<f32>>>()
        })
        .collect::<Result<Vec<Vec<f32>>>>()?;

    mean_pool(&matrix)
}

#[allow(clippy::cast_possible_truncation)]
fn as_f32(value: &Value) -> Result<f32> {
    value
        .as_f64()
        .map(|v| v as f32)
        .with_context(|| format!("embedding component is not a number: {value}"))
}

fn mean_pool(rows: &[Vec<f32>]) -> Result<Vec<f32>> {
    let Some(first) = rows.first() else {
        bail!("embedding response has no rows");
    };
    let width = first.len();
    if rows.iter().any(|row| row.len() != width) {
        bail!("embedding response rows have inconsistent widths");
    }

    let mut pooled = vec![0.0_f32; width];
    for row in rows {
        for (acc, value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
    }
    let count = rows.len() as f32;
    for value in &mut pooled {
        *value /= count;
    }
    Ok(pooled)
}
