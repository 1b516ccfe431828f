#![forbid(unsafe_code)]
//! proflens-search library.
//!
//! Query text flows through [`semantic`] (embedding + brute-force cosine
//! index), [`ranking`] (dedup + composite rerank), [`subject`] (keyword
//! classification and filtering) and [`answer`] (LLM or template synthesis).
//! [`pipeline::Pipeline`] wires the stages together.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for I/O-bound return types; typed
//!   `thiserror` enums where callers branch on the failure.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod answer;
pub mod pipeline;
pub mod ranking;
pub mod semantic;
pub mod subject;

pub use answer::{AnswerResult, AnswerSynthesizer};
pub use pipeline::{Pipeline, RankedProfessor, SearchError, SearchResponse};
pub use semantic::{ComponentScores, CorpusCache, Match, VectorIndex};
pub use subject::Subject;
