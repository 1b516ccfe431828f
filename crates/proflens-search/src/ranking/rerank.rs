//! Composite rerank score.
//!
//! ```text
//! final = w_sim * similarity + w_rating * (avg_rating / 5) + w_reviews * (reviews / max_reviews)
//! ```
//!
//! `max_reviews` is taken over the batch being reranked (floored at 1), so the
//! review term is relative to the other candidates rather than absolute.

use crate::semantic::{ComponentScores, Match};
use proflens_core::config::RerankWeights;
use proflens_core::model::{MAX_RATING, ProfileMetadata};

/// `avg_rating / 5`, in `[0, 1]`. Missing ratings contribute 0.
#[must_use]
pub fn rating_component(metadata: &ProfileMetadata) -> f64 {
    metadata.rating() / MAX_RATING
}

/// `min(num_reviews / max(batch_max, 1), 1)`.
#[must_use]
pub fn review_component(num_reviews: u32, batch_max: u32) -> f64 {
    let denominator = f64::from(batch_max.max(1));
    (f64::from(num_reviews) / denominator).min(1.0)
}

/// Weighted sum of the three components. Pure; no clamping.
#[must_use]
pub fn composite_score(components: &ComponentScores, weights: &RerankWeights) -> f64 {
    (weights.similarity * components.similarity)
        + (weights.rating * components.rating)
        + (weights.reviews * components.review_count)
}

/// Score every match and sort by `final_score` descending.
///
/// The sort is stable: equal scores keep their input order.
#[must_use]
pub fn rerank<'a>(mut matches: Vec<Match<'a>>, weights: &RerankWeights) -> Vec<Match<'a>> {
    let batch_max = matches
        .iter()
        .map(|m| m.entry.metadata.num_reviews)
        .max()
        .unwrap_or(0);

    for candidate in &mut matches {
        let metadata = &candidate.entry.metadata;
        let components = ComponentScores {
            similarity: candidate.similarity,
            rating: rating_component(metadata),
            review_count: review_component(metadata.num_reviews, batch_max),
        };
        candidate.final_score = composite_score(&components, weights);
        candidate.component_scores = components;
    }

    matches.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    matches
}
