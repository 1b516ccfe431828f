//! Deterministic template answer used whenever the model is unavailable or
//! its reply cannot be used.

use super::AnswerResult;
use super::context::format_rating;
use crate::semantic::Match;
use crate::subject::{classify, matches_subject};
use std::collections::HashSet;

pub const NO_RESULTS_ANSWER: &str = "No professors found matching your query.";

const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_SUBJECT: &str = "Unknown Subject";

/// Name the first `count` distinct entities in `matches`.
///
/// When the query maps to a subject and any pick teaches it, only those picks
/// are named; otherwise every pick is, in ranked order. `sources` lists
/// exactly the named entities. Same inputs, same output.
#[must_use]
pub fn fallback_answer(query: &str, matches: &[Match<'_>], count: usize) -> AnswerResult {
    let mut seen = HashSet::new();
    let mut picks: Vec<&Match<'_>> = matches
        .iter()
        .filter(|m| m.entity_id().is_some_and(|id| seen.insert(id)))
        .take(count)
        .collect();

    if picks.is_empty() {
        return AnswerResult {
            answer: NO_RESULTS_ANSWER.to_string(),
            sources: Vec::new(),
        };
    }

    if let Some(subject) = classify(query)
        && picks.iter().any(|m| matches_subject(subject, &m.entry.metadata))
    {
        picks.retain(|m| matches_subject(subject, &m.entry.metadata));
    }

    let answer = match picks.as_slice() {
        [only] => {
            let (name, subject, rating) = describe(only);
            format!("I recommend {name} who teaches {subject} ({rating}★).")
        }
        several => {
            let listed: Vec<String> = several
                .iter()
                .map(|m| {
                    let (name, subject, rating) = describe(m);
                    format!("{name} ({subject}, {rating}★)")
                })
                .collect();
            format!(
                "Based on your query, I recommend {}.",
                listed.join(", ")
            )
        }
    };

    let sources = picks
        .iter()
        .filter_map(|m| m.entity_id().map(str::to_string))
        .collect();

    AnswerResult { answer, sources }
}

fn describe<'m>(m: &'m Match<'_>) -> (&'m str, &'m str, String) {
    let metadata = &m.entry.metadata;
    let name = non_blank(&metadata.name).unwrap_or(UNKNOWN_NAME);
    let subject = non_blank(&metadata.subject).unwrap_or(UNKNOWN_SUBJECT);
    (name, subject, format_rating(metadata.rating()))
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
