//! Subject-aware query handling.
//!
//! A query is mapped to at most one [`Subject`] by an ordered keyword table;
//! the same keywords then score how well each match's subject or department
//! fits that subject.

mod classify;
mod filter;

pub use classify::{Subject, classify};
pub use filter::{FALLBACK_KEEP, filter_by_subject, matches_subject, relevance};
