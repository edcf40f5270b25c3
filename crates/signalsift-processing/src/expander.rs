//! Semantic expansion of keywords into related vocabulary terms.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use signalsift_core::{Keyword, SemanticSettings};

use crate::embeddings::{EmbeddingProvider, NullEmbeddings};
use crate::error::ProcessingError;
use crate::persist::{read_optional, remove_if_exists, write_atomic};
use crate::types::{ExpandedTerm, Neighbor};
use crate::vector_index::VectorIndex;

pub const EXPANSION_CACHE_FILE: &str = "semantic_expansions.json";

fn cache_key(keyword: &str, category: &str) -> String {
    format!("{category}:{}", keyword.to_lowercase())
}

/// Finds terms similar to a keyword and derives weighted expansions.
///
/// Neighbour lists are memoised per `category:keyword` and persisted to
/// [`EXPANSION_CACHE_FILE`]. Only similarities are cached; derived weights
/// are recomputed from the caller's current weight on every call, and the
/// current threshold and limit are applied to cached lists when they are read.
pub struct SemanticExpander {
    provider: Arc<dyn EmbeddingProvider>,
    index: VectorIndex,
    settings: SemanticSettings,
    cache: BTreeMap<String, Vec<Neighbor>>,
    cache_path: Option<PathBuf>,
    dirty: bool,
}

impl SemanticExpander {
    /// Create an expander, loading any persisted expansion cache from
    /// `cache_dir`. An unreadable cache is logged and ignored.
    #[must_use]
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        index: VectorIndex,
        settings: SemanticSettings,
        cache_dir: Option<&Path>,
    ) -> Self {
        let cache_path = cache_dir.map(|dir| dir.join(EXPANSION_CACHE_FILE));
        let cache = cache_path.as_deref().map(load_cache).unwrap_or_default();
        Self {
            provider,
            index,
            settings,
            cache,
            cache_path,
            dirty: false,
        }
    }

    /// An expander that never expands anything.
    #[must_use]
    pub fn disabled(settings: SemanticSettings) -> Self {
        Self::new(Arc::new(NullEmbeddings), VectorIndex::unbuilt(), settings, None)
    }

    /// Whether expansion can produce results: the embedding provider is
    /// loaded and the vocabulary index is built.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.provider.is_available() && self.index.is_built()
    }

    #[must_use]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[must_use]
    pub fn settings(&self) -> &SemanticSettings {
        &self.settings
    }

    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Up to `max_expansions` terms similar to `keyword`, most similar
    /// first, each weighted `base_weight * decay_factor`.
    ///
    /// The keyword itself is never returned. Returns nothing when expansion
    /// is unavailable or the keyword has no vector.
    pub fn expand_keyword(
        &mut self,
        keyword: &str,
        category: &str,
        base_weight: f64,
    ) -> Vec<ExpandedTerm> {
        if !self.is_available() {
            return Vec::new();
        }
        let key = cache_key(keyword, category);
        if !self.cache.contains_key(&key) {
            let neighbors = self.lookup(keyword, category);
            self.cache.insert(key.clone(), neighbors);
            self.dirty = true;
        }

        let decay = self.settings.decay_factor;
        let threshold = self.settings.threshold_for(category);
        let max = self.settings.max_expansions;
        self.cache
            .get(&key)
            .map(|neighbors| {
                // Entries may predate the current limits.
                neighbors
                    .iter()
                    .filter(|n| n.similarity >= threshold)
                    .take(max)
                    .map(|n| ExpandedTerm {
                        term: n.term.clone(),
                        origin_keyword: keyword.to_string(),
                        category: category.to_string(),
                        similarity: n.similarity,
                        derived_weight: base_weight * decay,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lookup(&self, keyword: &str, category: &str) -> Vec<Neighbor> {
        let lower = keyword.to_lowercase();
        let Some(vector) = self.provider.embed(&lower) else {
            tracing::debug!(keyword, "no embedding for keyword");
            return Vec::new();
        };
        let threshold = self.settings.threshold_for(category);
        let max = self.settings.max_expansions;

        let mut neighbors: Vec<Neighbor> = self
            .index
            .search(&vector, max + 1, threshold)
            .into_iter()
            .filter(|n| n.term.to_lowercase() != lower)
            .collect();
        neighbors.truncate(max);

        tracing::debug!(
            keyword,
            category,
            threshold,
            found = neighbors.len(),
            "expanded keyword"
        );
        neighbors
    }

    /// Expand every enabled keyword with a valid weight, then persist the
    /// cache. A failed save is logged.
    pub fn expand_all(&mut self, keywords: &[Keyword]) -> Vec<ExpandedTerm> {
        if !self.is_available() {
            return Vec::new();
        }
        let mut expansions = Vec::new();
        for kw in keywords.iter().filter(|k| k.enabled && k.has_valid_weight()) {
            expansions.extend(self.expand_keyword(&kw.text, &kw.category, kw.weight));
        }
        tracing::info!(
            keywords = keywords.len(),
            expansions = expansions.len(),
            "expanded keyword set"
        );
        if let Err(e) = self.save_cache() {
            tracing::warn!(error = %e, "failed to persist expansion cache");
        }
        expansions
    }

    /// Write the cache if it changed since the last save.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::CacheIo`] or
    /// [`ProcessingError::CacheSerialize`] if the file cannot be written.
    pub fn save_cache(&mut self) -> Result<(), ProcessingError> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        let bytes = serde_json::to_vec_pretty(&self.cache)?;
        write_atomic(path, &bytes)?;
        self.dirty = false;
        tracing::debug!(path = %path.display(), entries = self.cache.len(), "saved expansion cache");
        Ok(())
    }

    /// Drop all memoised expansions, in memory and on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::CacheIo`] if the cache file cannot be
    /// removed.
    pub fn clear_cache(&mut self) -> Result<(), ProcessingError> {
        self.cache.clear();
        self.dirty = false;
        if let Some(path) = &self.cache_path {
            remove_if_exists(path)?;
        }
        tracing::info!("cleared expansion cache");
        Ok(())
    }
}

fn load_cache(path: &Path) -> BTreeMap<String, Vec<Neighbor>> {
    let bytes = match read_optional(path) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read expansion cache");
            return BTreeMap::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable expansion cache");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
#[path = "expander_test.rs"]
mod tests;
