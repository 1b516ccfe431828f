//! Answer synthesis: a grounded model answer when possible, a template
//! answer otherwise. [`AnswerSynthesizer::synthesize`] never fails.

pub mod context;
pub mod fallback;
pub mod llm;
pub mod parse;

pub use context::{ContextLine, build_context, format_rating, render_context, truncate_chars};
pub use fallback::{NO_RESULTS_ANSWER, fallback_answer};
pub use llm::{ChatCompletionsClient, LanguageModel, LlmError, complete_with_deadline};
pub use parse::{SynthesisFailure, parse_answer};

use crate::semantic::Match;
use proflens_core::config::{AnswerConfig, LlmConfig};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Natural-language answer plus the entity ids it cites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<String>,
}

pub const SYSTEM_PROMPT: &str = "You help students choose professors. \
Answer only from the context lines you are given; never invent professors. \
Cite professors by the id shown in square brackets. \
Reply with a JSON object: {\"answer\": string, \"sources\": [id, ...]}.";

pub struct AnswerSynthesizer {
    model: Option<Arc<dyn LanguageModel>>,
    timeout: Duration,
    config: AnswerConfig,
}

impl std::fmt::Debug for AnswerSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerSynthesizer")
            .field("model", &self.model.is_some())
            .field("timeout", &self.timeout)
            .field("config", &self.config)
            .finish()
    }
}

impl AnswerSynthesizer {
    /// Synthesizer that always uses the template answer.
    #[must_use]
    pub const fn offline(config: AnswerConfig) -> Self {
        Self {
            model: None,
            timeout: Duration::ZERO,
            config,
        }
    }

    #[must_use]
    pub fn with_model(
        config: AnswerConfig,
        model: Arc<dyn LanguageModel>,
        timeout: Duration,
    ) -> Self {
        Self {
            model: Some(model),
            timeout,
            config,
        }
    }

    /// Use the chat-completions client when `llm` is enabled and keyed,
    /// otherwise run offline.
    #[must_use]
    pub fn from_config(config: AnswerConfig, llm: &LlmConfig) -> Self {
        match ChatCompletionsClient::from_config(llm) {
            Ok(client) => Self::with_model(
                config,
                Arc::new(client),
                Duration::from_millis(llm.timeout_ms),
            ),
            Err(err) => {
                info!("answers will use the template: {err}");
                Self::offline(config)
            }
        }
    }

    #[must_use]
    pub const fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Ask the model, under the deadline, for an answer grounded in the top
    /// `context_limit` matches.
    ///
    /// # Errors
    ///
    /// Returns a [`SynthesisFailure`] when no model is configured, the call
    /// fails or times out, or the reply does not validate.
    pub fn try_model(
        &self,
        query: &str,
        matches: &[Match<'_>],
    ) -> Result<AnswerResult, SynthesisFailure> {
        let Some(model) = &self.model else {
            return Err(SynthesisFailure::Unavailable("no model configured".to_string()));
        };

        let lines = build_context(matches, self.config.context_limit, self.config.snippet_chars);
        let context_ids: Vec<&str> = lines.iter().map(|line| line.entity_id).collect();
        let user_prompt = format!(
            "Question: {query}\n\nContext:\n{}\n\nRespond with JSON only.",
            render_context(&lines)
        );

        let raw = complete_with_deadline(
            Arc::clone(model),
            SYSTEM_PROMPT.to_string(),
            user_prompt,
            self.timeout,
        )?;
        parse_answer(&raw, &context_ids)
    }

    /// Answer `query` from `matches`. Falls back to the template on any model
    /// failure; an empty `matches` skips the model entirely.
    #[must_use]
    pub fn synthesize(&self, query: &str, matches: &[Match<'_>]) -> AnswerResult {
        if matches.is_empty() {
            return fallback_answer(query, matches, self.config.fallback_count);
        }

        match self.try_model(query, matches) {
            Ok(result) => {
                debug!(sources = result.sources.len(), "model answer accepted");
                result
            }
            Err(SynthesisFailure::Unavailable(reason)) => {
                debug!("template answer: {reason}");
                fallback_answer(query, matches, self.config.fallback_count)
            }
            Err(failure) => {
                warn!("model answer rejected, using template: {failure}");
                fallback_answer(query, matches, self.config.fallback_count)
            }
        }
    }
}
