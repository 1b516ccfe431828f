//! Validation of the model's `{"answer", "sources"}` reply.

use super::AnswerResult;
use super::llm::LlmError;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// Why a model answer could not be used. Every variant routes to the
/// template fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisFailure {
    #[error("language model unavailable: {0}")]
    Unavailable(String),
    #[error("language model timed out after {0:?}")]
    Timeout(Duration),
    #[error("language model call failed: {0}")]
    Transport(String),
    #[error("reply is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("reply is missing `{0}`")]
    MissingField(&'static str),
    #[error("reply field `{0}` has the wrong type")]
    WrongShape(&'static str),
    #[error("reply has an empty answer")]
    EmptyAnswer,
}

impl From<LlmError> for SynthesisFailure {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unconfigured(reason) => Self::Unavailable(reason),
            LlmError::Timeout(after) => Self::Timeout(after),
            LlmError::Status(code) => Self::Transport(format!("HTTP {code}")),
            LlmError::Transport(reason) => Self::Transport(reason),
            LlmError::EmptyCompletion => Self::EmptyAnswer,
        }
    }
}

/// Parse a model reply into an [`AnswerResult`].
///
/// The JSON object is taken from the first `{` to the last `}`, so stray
/// prose or code fences around it are tolerated. `sources` must be a list of
/// ids or a single id string; ids that were not in the context are dropped,
/// as are repeats.
///
/// # Errors
///
/// Returns a [`SynthesisFailure`] when no object is found, it does not parse,
/// `answer` is missing, not a string, or blank, or `sources` is missing or
/// not a list of ids.
pub fn parse_answer(raw: &str, context_ids: &[&str]) -> Result<AnswerResult, SynthesisFailure> {
    let object = extract_object(raw)
        .ok_or_else(|| SynthesisFailure::MalformedJson("no JSON object in reply".to_string()))?;
    let value: Value = serde_json::from_str(object)
        .map_err(|err| SynthesisFailure::MalformedJson(err.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(SynthesisFailure::WrongShape("root"));
    };

    let answer = match fields.get("answer") {
        None | Some(Value::Null) => return Err(SynthesisFailure::MissingField("answer")),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(_) => return Err(SynthesisFailure::WrongShape("answer")),
    };
    if answer.is_empty() {
        return Err(SynthesisFailure::EmptyAnswer);
    }

    let cited: Vec<String> = match fields.get("sources") {
        None | Some(Value::Null) => return Err(SynthesisFailure::MissingField("sources")),
        Some(Value::Array(items)) => items
            .iter()
            .map(source_id)
            .collect::<Option<Vec<_>>>()
            .ok_or(SynthesisFailure::WrongShape("sources"))?,
        Some(single @ Value::String(_)) => source_id(single).into_iter().collect(),
        Some(_) => return Err(SynthesisFailure::WrongShape("sources")),
    };

    let allowed: HashSet<&str> = context_ids.iter().copied().collect();
    let mut seen = HashSet::new();
    let sources = cited
        .into_iter()
        .filter(|id| allowed.contains(id.as_str()) && seen.insert(id.clone()))
        .collect();

    Ok(AnswerResult { answer, sources })
}

fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// `None` for values that cannot name an entity. Blank strings map to an
/// empty id, which never matches the context and is dropped.
fn source_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
