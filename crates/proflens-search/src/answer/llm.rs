//! Language-model collaborator and its chat-completions client.

use proflens_core::config::LlmConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Failure talking to a language model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Disabled, or no API key available.
    #[error("language model not configured: {0}")]
    Unconfigured(String),
    #[error("language model timed out after {0:?}")]
    Timeout(Duration),
    #[error("language model transport error: {0}")]
    Transport(String),
    #[error("language model returned HTTP {0}")]
    Status(u16),
    #[error("language model returned no completion")]
    EmptyCompletion,
}

/// Prompt to text collaborator.
pub trait LanguageModel: Send + Sync {
    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] for transport, status, or empty-reply failures.
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

/// Run `model.complete` on a worker thread and wait at most `timeout`.
///
/// On deadline the worker is abandoned: it keeps running detached and its
/// result is dropped when it finishes.
///
/// # Errors
///
/// Returns [`LlmError::Timeout`] on deadline, or whatever the model returned.
pub fn complete_with_deadline(
    model: Arc<dyn LanguageModel>,
    system_prompt: String,
    user_prompt: String,
    timeout: Duration,
) -> Result<String, LlmError> {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("proflens-llm".to_string())
        .spawn(move || {
            let result = model.complete(&system_prompt, &user_prompt);
            if tx.send(result).is_err() {
                debug!("language model reply arrived after the deadline; discarded");
            }
        })
        .map_err(|err| LlmError::Transport(format!("failed to spawn LLM worker: {err}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(LlmError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(LlmError::Transport(
            "LLM worker exited without a reply".to_string(),
        )),
    }
}

/// OpenAI-compatible `chat/completions` client.
pub struct ChatCompletionsClient {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client from config.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Unconfigured`] when the model is disabled or the
    /// API key variable is unset.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if !config.enabled {
            return Err(LlmError::Unconfigured("disabled in config".to_string()));
        }
        let Some(api_key) = config.api_key() else {
            return Err(LlmError::Unconfigured(format!(
                "{} is not set",
                config.api_key_env
            )));
        };

        Ok(Self::new(
            config.endpoint.clone(),
            config.model.clone(),
            api_key,
            Duration::from_millis(config.timeout_ms),
        ))
    }
}

impl LanguageModel for ChatCompletionsClient {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let request = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("User-Agent", "proflens")
            .send_json(request)
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => LlmError::Status(code),
                ureq::Error::Transport(transport) => LlmError::Transport(transport.to_string()),
            })?;

        let body: ChatResponse = response
            .into_json()
            .map_err(|err| LlmError::Transport(format!("failed to decode completion: {err}")))?;

        body.choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyCompletion)
    }
}
