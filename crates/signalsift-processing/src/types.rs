use serde::{Deserialize, Serialize};

/// A vocabulary term returned by a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub term: String,
    /// Cosine similarity to the query vector.
    pub similarity: f32,
}

/// A semantically related term derived from a configured keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedTerm {
    pub term: String,
    pub origin_keyword: String,
    pub category: String,
    pub similarity: f32,
    /// `origin weight * decay factor`, always below the origin's weight.
    pub derived_weight: f64,
}

/// One keyword or expanded term found in a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub term: String,
    pub category: String,
    pub weight: f64,
    /// Non-overlapping whole-word occurrences, always at least 1.
    pub occurrences: usize,
    pub is_semantic: bool,
    /// Keyword the term was expanded from; `None` for exact matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_keyword: Option<String>,
}

/// Counts over a match list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub total: usize,
    pub exact: usize,
    pub semantic: usize,
    pub categories: usize,
}

/// Per-component relevance score, each already capped. `total` is the
/// clamped sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub engagement: f64,
    pub keywords: f64,
    pub quality: f64,
    pub tier: f64,
    pub velocity: f64,
    pub total: f64,
}

/// Result of running one content item through the whole engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedItem {
    pub id: String,
    pub matches: Vec<MatchRecord>,
    pub matched_terms: Vec<String>,
    pub category: &'static str,
    pub score: f64,
}
