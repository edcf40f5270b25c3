//! The owning context object wiring index, expander, matcher, classifier,
//! and scorer together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use signalsift_core::{ContentItem, EngineConfig, KeywordRepository, SourceKind, SourceTier};

use crate::classifier;
use crate::embeddings::EmbeddingProvider;
use crate::error::ProcessingError;
use crate::expander::SemanticExpander;
use crate::matcher::{self, KeywordMatcher};
use crate::scorer;
use crate::types::{ExpandedTerm, MatchRecord, ProcessedItem, ScoreBreakdown};
use crate::vector_index::VectorIndex;

/// Keyword relevance and classification engine.
///
/// Construct once per process with [`RelevanceEngine::new`] and call
/// [`RelevanceEngine::close`] on shutdown to persist the expansion cache.
/// Read operations take `&self`; anything that rebuilds state takes
/// `&mut self`.
pub struct RelevanceEngine {
    config: EngineConfig,
    matcher: KeywordMatcher,
}

impl RelevanceEngine {
    /// Validate `config`, load or build the vocabulary index, load the
    /// expansion cache, and compile keyword patterns.
    ///
    /// A missing or empty embedding model is not an error: the engine falls
    /// back to exact matching and says so once in the log.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::Config`] if `config` fails validation.
    pub fn new(
        config: EngineConfig,
        keywords: Arc<dyn KeywordRepository>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, ProcessingError> {
        config.validate()?;

        let index = if config.semantic.enabled {
            VectorIndex::load_or_build(config.cache_dir.as_deref(), embeddings.as_ref(), &config.index)
        } else {
            VectorIndex::unbuilt()
        };
        let expander = SemanticExpander::new(
            embeddings,
            index,
            config.semantic.clone(),
            config.cache_dir.as_deref(),
        );

        if config.semantic.enabled && !expander.is_available() {
            tracing::info!("semantic expansion unavailable, exact matching only");
        }

        let matcher = KeywordMatcher::new(keywords, expander, config.semantic.enabled);
        Ok(Self { config, matcher })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn matcher(&self) -> &KeywordMatcher {
        &self.matcher
    }

    #[must_use]
    pub fn semantic_available(&self) -> bool {
        self.matcher.semantic_enabled()
    }

    #[must_use]
    pub fn match_keywords(&self, text: &str) -> Vec<MatchRecord> {
        self.matcher.find_matches(text)
    }

    #[must_use]
    pub fn keyword_score(&self, matches: &[MatchRecord]) -> f64 {
        matcher::calculate_keyword_score(matches)
    }

    #[must_use]
    pub fn classify(&self, text: &str, matches: &[MatchRecord]) -> &'static str {
        classifier::classify(text, matches)
    }

    /// Relevance score as of now.
    #[must_use]
    pub fn score_content(
        &self,
        item: &ContentItem,
        matches: &[MatchRecord],
        kind: SourceKind,
        tier: SourceTier,
    ) -> f64 {
        self.score_content_at(item, matches, kind, tier, Utc::now())
    }

    #[must_use]
    pub fn score_content_at(
        &self,
        item: &ContentItem,
        matches: &[MatchRecord],
        kind: SourceKind,
        tier: SourceTier,
        now: DateTime<Utc>,
    ) -> f64 {
        scorer::score_content(item, matches, kind, tier, now)
    }

    #[must_use]
    pub fn score_breakdown_at(
        &self,
        item: &ContentItem,
        matches: &[MatchRecord],
        kind: SourceKind,
        tier: SourceTier,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        scorer::score_breakdown(item, matches, kind, tier, now)
    }

    /// Whether `score` clears the configured report threshold.
    #[must_use]
    pub fn is_relevant(&self, score: f64) -> bool {
        score >= self.config.min_relevance_score
    }

    /// Match, classify, and score one item.
    #[must_use]
    pub fn process_at(
        &self,
        item: &ContentItem,
        kind: SourceKind,
        tier: SourceTier,
        now: DateTime<Utc>,
    ) -> ProcessedItem {
        let text = item.full_text();
        let matches = self.match_keywords(&text);
        let category = self.classify(&text, &matches);
        let score = self.score_content_at(item, &matches, kind, tier, now);
        ProcessedItem {
            id: item.id.clone(),
            matched_terms: matcher::matched_terms(&matches),
            matches,
            category,
            score,
        }
    }

    #[must_use]
    pub fn process(&self, item: &ContentItem, kind: SourceKind, tier: SourceTier) -> ProcessedItem {
        self.process_at(item, kind, tier, Utc::now())
    }

    /// Expansions for one keyword. Does not change the compiled patterns.
    pub fn expand_keyword(&mut self, keyword: &str, category: &str, weight: f64) -> Vec<ExpandedTerm> {
        self.matcher.expander_mut().expand_keyword(keyword, category, weight)
    }

    /// Re-snapshot the keyword repository and recompile every pattern.
    pub fn refresh(&mut self) {
        self.matcher.refresh();
    }

    /// Drop the expansion cache and the persisted vocabulary index.
    ///
    /// The in-memory index stays usable; the next process start rebuilds
    /// the on-disk copy.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::CacheIo`] if a cache file cannot be
    /// removed.
    pub fn clear_caches(&mut self) -> Result<(), ProcessingError> {
        self.matcher.expander_mut().clear_cache()?;
        if let Some(dir) = &self.config.cache_dir {
            VectorIndex::clear_cache(dir)?;
        }
        Ok(())
    }

    /// Persist pending cache entries and release the engine.
    ///
    /// # Errors
    ///
    /// Returns the first error hit while writing the expansion cache.
    pub fn close(mut self) -> Result<(), ProcessingError> {
        self.matcher.expander_mut().save_cache()
    }
}
