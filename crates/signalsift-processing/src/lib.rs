//! Keyword relevance and classification engine for SignalSift.
//!
//! Turns a content item into matched keywords (literal and semantically
//! expanded), a category label, and a 0-100 relevance score. Semantic
//! expansion runs over a nearest-neighbour index of an embedding
//! vocabulary and degrades to exact matching when no model is loaded.

pub mod classifier;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod expander;
pub mod matcher;
pub mod scorer;
pub mod types;
pub mod vector_index;

mod persist;

pub use classifier::{
    category_display_name, category_package, classify, primary_categories, GENERAL_CATEGORY,
};
pub use embeddings::{EmbeddingProvider, NullEmbeddings, StaticEmbeddings};
pub use engine::RelevanceEngine;
pub use error::ProcessingError;
pub use expander::SemanticExpander;
pub use matcher::{calculate_keyword_score, match_stats, matched_terms, KeywordMatcher};
pub use scorer::{score_content, SourceWeights};
pub use types::{ExpandedTerm, MatchRecord, MatchStats, Neighbor, ProcessedItem, ScoreBreakdown};
pub use vector_index::{IndexKind, VectorIndex};
