//! Query embedding and in-memory similarity search.

mod embed;
mod index;

pub use embed::{
    EMBEDDING_DIM, Embedder, HashEmbedder, HttpEmbedder, PLACEHOLDER_TEXT, embed_or_zero,
};
pub use index::{ComponentScores, CorpusCache, Match, VectorIndex, l2_norm, normalize};
