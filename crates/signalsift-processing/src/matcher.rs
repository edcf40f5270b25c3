//! Keyword matching over free text.
//!
//! Exact keywords are compiled into case-insensitive whole-word patterns.
//! When semantic expansion is available, expanded terms get patterns of
//! their own. Pattern sets are immutable snapshots replaced wholesale on
//! [`KeywordMatcher::refresh`].

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use signalsift_core::{Keyword, KeywordRepository};

use crate::expander::SemanticExpander;
use crate::types::{MatchRecord, MatchStats};

/// Occurrences beyond this count add nothing to the keyword score.
pub const MAX_COUNTED_OCCURRENCES: usize = 3;
pub const KEYWORD_POINTS_PER_OCCURRENCE: f64 = 5.0;
pub const MAX_KEYWORD_SCORE: f64 = 35.0;

struct ExactPattern {
    keyword: Keyword,
    lower: String,
    regex: Regex,
}

struct SemanticPattern {
    term: String,
    origin_keyword: String,
    category: String,
    weight: f64,
    regex: Regex,
}

#[derive(Default)]
struct PatternSet {
    keywords: Vec<Keyword>,
    exact: Vec<ExactPattern>,
    semantic: Vec<SemanticPattern>,
}

fn word_pattern(term: &str) -> Option<Regex> {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(term, error = %e, "skipping term with unusable pattern");
            None
        }
    }
}

impl PatternSet {
    fn build(keywords: Vec<Keyword>, expander: &mut SemanticExpander, semantic: bool) -> Self {
        let mut seen = HashSet::new();
        let mut exact = Vec::new();
        let mut usable = Vec::new();

        for kw in keywords {
            if !kw.enabled {
                continue;
            }
            if !kw.has_valid_weight() {
                tracing::warn!(keyword = %kw.text, weight = kw.weight, "skipping keyword with invalid weight");
                continue;
            }
            let lower = kw.text.to_lowercase();
            if !seen.insert(lower.clone()) {
                tracing::debug!(keyword = %kw.text, "keyword text already registered; first wins");
                continue;
            }
            let Some(regex) = word_pattern(&lower) else {
                continue;
            };
            usable.push(kw.clone());
            exact.push(ExactPattern {
                keyword: kw,
                lower,
                regex,
            });
        }

        let semantic = if semantic {
            expander
                .expand_all(&usable)
                .into_iter()
                .filter_map(|t| {
                    let term = t.term.to_lowercase();
                    word_pattern(&term).map(|regex| SemanticPattern {
                        term,
                        origin_keyword: t.origin_keyword,
                        category: t.category,
                        weight: t.derived_weight,
                        regex,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            keywords: usable,
            exact,
            semantic,
        }
    }
}

/// Matches text against the enabled keyword set and its expansions.
pub struct KeywordMatcher {
    repository: Arc<dyn KeywordRepository>,
    expander: SemanticExpander,
    semantic_requested: bool,
    patterns: Arc<PatternSet>,
}

impl KeywordMatcher {
    /// Create a matcher and compile patterns from the repository's current
    /// enabled keywords.
    #[must_use]
    pub fn new(
        repository: Arc<dyn KeywordRepository>,
        expander: SemanticExpander,
        enable_semantic: bool,
    ) -> Self {
        let mut matcher = Self {
            repository,
            expander,
            semantic_requested: enable_semantic,
            patterns: Arc::new(PatternSet::default()),
        };
        matcher.refresh();
        matcher
    }

    /// Re-read keywords and rebuild every pattern. Matches run after this
    /// call see only the new snapshot.
    pub fn refresh(&mut self) {
        let keywords = self.repository.list_enabled();
        let semantic = self.semantic_enabled();
        let patterns = PatternSet::build(keywords, &mut self.expander, semantic);
        tracing::info!(
            keywords = patterns.exact.len(),
            expansions = patterns.semantic.len(),
            semantic,
            "compiled keyword patterns"
        );
        self.patterns = Arc::new(patterns);
    }

    /// Semantic matching was requested and the expander can serve it.
    #[must_use]
    pub fn semantic_enabled(&self) -> bool {
        self.semantic_requested && self.expander.is_available()
    }

    /// Keywords in the current snapshot, in registration order.
    #[must_use]
    pub fn keywords(&self) -> &[Keyword] {
        &self.patterns.keywords
    }

    #[must_use]
    pub fn expansion_count(&self) -> usize {
        self.patterns.semantic.len()
    }

    #[must_use]
    pub fn expander(&self) -> &SemanticExpander {
        &self.expander
    }

    pub fn expander_mut(&mut self) -> &mut SemanticExpander {
        &mut self.expander
    }

    /// Every keyword and expanded term occurring in `text` as a whole word.
    ///
    /// Exact matches come first, in keyword order, then semantic ones. A
    /// surface string is reported at most once; a keyword's exact match
    /// suppresses any expansion with the same text.
    #[must_use]
    pub fn find_matches(&self, text: &str) -> Vec<MatchRecord> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let patterns = Arc::clone(&self.patterns);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut matches = Vec::new();

        for p in &patterns.exact {
            if seen.contains(p.lower.as_str()) {
                continue;
            }
            let occurrences = p.regex.find_iter(text).count();
            if occurrences > 0 {
                seen.insert(&p.lower);
                matches.push(MatchRecord {
                    term: p.keyword.text.clone(),
                    category: p.keyword.category.clone(),
                    weight: p.keyword.weight,
                    occurrences,
                    is_semantic: false,
                    origin_keyword: None,
                });
            }
        }

        for p in &patterns.semantic {
            if seen.contains(p.term.as_str()) {
                continue;
            }
            let occurrences = p.regex.find_iter(text).count();
            if occurrences > 0 {
                seen.insert(&p.term);
                matches.push(MatchRecord {
                    term: p.term.clone(),
                    category: p.category.clone(),
                    weight: p.weight,
                    occurrences,
                    is_semantic: true,
                    origin_keyword: Some(p.origin_keyword.clone()),
                });
            }
        }

        matches
    }
}

/// Score contribution of a match list: each match adds
/// `min(occurrences, 3) * weight * 5`, capped at 35. Matches whose weight
/// is not finite and positive contribute nothing.
#[must_use]
pub fn calculate_keyword_score(matches: &[MatchRecord]) -> f64 {
    let total: f64 = matches
        .iter()
        .filter(|m| m.weight.is_finite() && m.weight > 0.0)
        .map(|m| {
            #[allow(clippy::cast_precision_loss)]
            let counted = m.occurrences.min(MAX_COUNTED_OCCURRENCES) as f64;
            counted * m.weight * KEYWORD_POINTS_PER_OCCURRENCE
        })
        .sum();
    total.clamp(0.0, MAX_KEYWORD_SCORE)
}

/// Surface strings of all matches, in match order.
#[must_use]
pub fn matched_terms(matches: &[MatchRecord]) -> Vec<String> {
    matches.iter().map(|m| m.term.clone()).collect()
}

#[must_use]
pub fn group_by_category(matches: &[MatchRecord]) -> BTreeMap<String, Vec<MatchRecord>> {
    let mut groups: BTreeMap<String, Vec<MatchRecord>> = BTreeMap::new();
    for m in matches {
        groups.entry(m.category.clone()).or_default().push(m.clone());
    }
    groups
}

#[must_use]
pub fn semantic_only(matches: &[MatchRecord]) -> Vec<MatchRecord> {
    matches.iter().filter(|m| m.is_semantic).cloned().collect()
}

#[must_use]
pub fn exact_only(matches: &[MatchRecord]) -> Vec<MatchRecord> {
    matches.iter().filter(|m| !m.is_semantic).cloned().collect()
}

#[must_use]
pub fn match_stats(matches: &[MatchRecord]) -> MatchStats {
    let semantic = matches.iter().filter(|m| m.is_semantic).count();
    let categories: HashSet<&str> = matches.iter().map(|m| m.category.as_str()).collect();
    MatchStats {
        total: matches.len(),
        exact: matches.len() - semantic,
        semantic,
        categories: categories.len(),
    }
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
