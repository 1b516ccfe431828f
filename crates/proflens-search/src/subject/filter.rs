use super::Subject;
use crate::semantic::Match;
use proflens_core::model::ProfileMetadata;
use tracing::debug;

/// Matches kept from the unfiltered input when nothing fits the subject.
pub const FALLBACK_KEEP: usize = 3;

/// Number of `subject` keywords found in the profile's subject or department.
#[must_use]
pub fn relevance(subject: Subject, metadata: &ProfileMetadata) -> usize {
    let haystack = format!("{} {}", metadata.subject, metadata.department).to_lowercase();
    subject
        .keywords()
        .iter()
        .filter(|kw| haystack.contains(**kw))
        .count()
}

/// Whether the profile's subject or department mentions `subject` at all.
#[must_use]
pub fn matches_subject(subject: Subject, metadata: &ProfileMetadata) -> bool {
    relevance(subject, metadata) > 0
}

/// Narrow `matches` to those relevant to `subject`.
///
/// - `None` returns the input unchanged.
/// - Relevant matches are ordered by `(relevance, final_score)` descending,
///   ties keeping input order.
/// - When nothing is relevant, the first [`FALLBACK_KEEP`] input matches are
///   returned as-is, so a non-empty input never filters down to nothing.
#[must_use]
pub fn filter_by_subject<'a>(matches: Vec<Match<'a>>, subject: Option<Subject>) -> Vec<Match<'a>> {
    let Some(subject) = subject else {
        return matches;
    };

    let mut relevant: Vec<(usize, Match<'a>)> = matches
        .iter()
        .filter_map(|m| {
            let score = relevance(subject, &m.entry.metadata);
            (score > 0).then(|| (score, m.clone()))
        })
        .collect();

    if relevant.is_empty() {
        debug!(
            "no matches relevant to {subject}; keeping top {FALLBACK_KEEP} of {}",
            matches.len()
        );
        return matches.into_iter().take(FALLBACK_KEEP).collect();
    }

    relevant.sort_by(|(rel_a, a), (rel_b, b)| {
        rel_b
            .cmp(rel_a)
            .then_with(|| b.final_score.total_cmp(&a.final_score))
    });
    relevant.into_iter().map(|(_, m)| m).collect()
}
