//! Post-retrieval ranking: collapse duplicate profiles, then rescore with
//! rating and review-count signals.

pub mod dedup;
pub mod rerank;

pub use dedup::dedupe;
pub use rerank::{composite_score, rating_component, review_component, rerank};
