//! Bounded, grounded context handed to the language model.

use crate::semantic::Match;
use std::collections::HashSet;

/// One context line and the entity it cites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLine<'a> {
    pub entity_id: &'a str,
    pub text: String,
}

/// Longest prefix of `text` with at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Rating as stored, e.g. `4.25`; whole numbers keep one decimal (`4.0`).
#[must_use]
pub fn format_rating(rating: f64) -> String {
    let shown = rating.to_string();
    if shown.contains('.') {
        shown
    } else {
        format!("{shown}.0")
    }
}

/// Render up to `limit` distinct entities as
/// `[id] name • subject • rating — snippet`.
#[must_use]
pub fn build_context<'a>(
    matches: &[Match<'a>],
    limit: usize,
    snippet_chars: usize,
) -> Vec<ContextLine<'a>> {
    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(limit.min(matches.len()));

    for m in matches {
        if lines.len() >= limit {
            break;
        }
        let Some(entity_id) = m.entity_id() else {
            continue;
        };
        if !seen.insert(entity_id) {
            continue;
        }

        let metadata = &m.entry.metadata;
        let snippet = collapse_whitespace(&metadata.text_snippet);
        let snippet = truncate_chars(&snippet, snippet_chars);
        lines.push(ContextLine {
            entity_id,
            text: format!(
                "[{entity_id}] {} • {} • {} — {}",
                metadata.name.trim(),
                metadata.subject.trim(),
                format_rating(metadata.rating()),
                snippet.trim_end()
            ),
        });
    }

    lines
}

/// Context lines joined with newlines.
#[must_use]
pub fn render_context(lines: &[ContextLine<'_>]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
