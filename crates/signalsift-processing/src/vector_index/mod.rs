//! Nearest-neighbour index over the embedding vocabulary.
//!
//! Small vocabularies are searched exhaustively. Above
//! [`IndexSettings::flat_cutoff`] terms the rows are clustered with
//! spherical k-means and a query only scans the `nprobe` closest clusters.
//! Either layout ranks by cosine similarity over unit-length vectors.

mod kmeans;
mod store;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use signalsift_core::IndexSettings;

use crate::embeddings::{dot, normalize, EmbeddingProvider};
use crate::error::ProcessingError;
use crate::persist::CacheLoad;
use crate::types::Neighbor;

const MIN_TERM_CHARS: usize = 3;
const MAX_TERM_CHARS: usize = 20;

/// Which search strategy a built index uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Flat,
    Ivf,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Flat => write!(f, "flat"),
            IndexKind::Ivf => write!(f, "ivf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Layout {
    Flat,
    Ivf {
        nprobe: usize,
        centroids: Vec<Vec<f32>>,
        lists: Vec<Vec<usize>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BuiltIndex {
    dimension: usize,
    terms: Vec<String>,
    /// Unit-length rows, `terms.len() * dimension` values.
    vectors: Vec<f32>,
    layout: Layout,
    /// [`vocabulary_fingerprint`] of the provider the index was built from.
    source: String,
}

impl BuiltIndex {
    fn row(&self, i: usize) -> &[f32] {
        &self.vectors[i * self.dimension..(i + 1) * self.dimension]
    }
}

/// Whether a vocabulary term is worth indexing: purely alphabetic and
/// between 3 and 20 characters.
#[must_use]
pub fn is_indexable_term(term: &str) -> bool {
    let len = term.chars().count();
    (MIN_TERM_CHARS..=MAX_TERM_CHARS).contains(&len) && term.chars().all(char::is_alphabetic)
}

/// SHA-256 over the provider's dimension and every vocabulary row, in
/// iteration order.
pub(crate) fn vocabulary_fingerprint(provider: &dyn EmbeddingProvider) -> String {
    let mut hasher = Sha256::new();
    hasher.update((provider.dimension() as u64).to_le_bytes());
    for (term, vector) in provider.vocabulary() {
        hasher.update(term.as_bytes());
        hasher.update([0_u8]);
        for v in vector {
            hasher.update(v.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Highest-scoring `k` entries, best first, ties broken by row order.
fn top_k(mut scored: Vec<(usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    let by_score = |a: &(usize, f32), b: &(usize, f32)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));
    if scored.len() > k {
        scored.select_nth_unstable_by(k, by_score);
        scored.truncate(k);
    }
    scored.sort_by(by_score);
    scored
}

/// Vocabulary index. An unbuilt index answers every query with nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    built: Option<BuiltIndex>,
}

impl VectorIndex {
    /// An index with nothing in it.
    #[must_use]
    pub fn unbuilt() -> Self {
        Self::default()
    }

    /// Build from the provider's vocabulary.
    ///
    /// Terms failing [`is_indexable_term`], rows of the wrong width, and
    /// zero vectors are skipped; duplicate lowercase terms keep their first
    /// row. Returns an unbuilt index if the provider is unavailable or no
    /// term survives.
    #[must_use]
    pub fn build(provider: &dyn EmbeddingProvider, settings: &IndexSettings) -> Self {
        if !provider.is_available() {
            return Self::unbuilt();
        }
        Self::build_from(provider, settings, vocabulary_fingerprint(provider))
    }

    fn build_from(
        provider: &dyn EmbeddingProvider,
        settings: &IndexSettings,
        source: String,
    ) -> Self {
        let dimension = provider.dimension();
        let mut seen = HashSet::new();
        let mut terms = Vec::new();
        let mut vectors = Vec::new();

        for (term, vector) in provider.vocabulary() {
            if !is_indexable_term(term) || vector.len() != dimension {
                continue;
            }
            let lower = term.to_lowercase();
            if seen.contains(&lower) {
                continue;
            }
            let mut row = vector.to_vec();
            if !normalize(&mut row) {
                continue;
            }
            seen.insert(lower.clone());
            terms.push(lower);
            vectors.extend(row);
        }

        if terms.is_empty() {
            tracing::warn!("no indexable terms in embedding vocabulary");
            return Self::unbuilt();
        }

        let n = terms.len();
        let layout = if n <= settings.flat_cutoff {
            Layout::Flat
        } else {
            let nlist = settings.nlist.min(n / 10).max(1);
            let clustering = kmeans::spherical_kmeans(
                &vectors,
                dimension,
                nlist,
                settings.kmeans_iterations,
                settings.seed,
            );
            Layout::Ivf {
                nprobe: settings.nprobe.min(clustering.centroids.len()),
                centroids: clustering.centroids,
                lists: clustering.lists,
            }
        };

        let kind = match layout {
            Layout::Flat => IndexKind::Flat,
            Layout::Ivf { .. } => IndexKind::Ivf,
        };
        tracing::info!(terms = n, dimension, kind = %kind, "built vocabulary index");

        Self {
            built: Some(BuiltIndex {
                dimension,
                terms,
                vectors,
                layout,
                source,
            }),
        }
    }

    /// Reuse the persisted index in `cache_dir` when it passes its checks,
    /// otherwise build and persist a fresh one.
    ///
    /// Cache problems are logged and never fatal: a corrupt cache is
    /// rebuilt and a failed write leaves the in-memory index usable.
    #[must_use]
    pub fn load_or_build(
        cache_dir: Option<&Path>,
        provider: &dyn EmbeddingProvider,
        settings: &IndexSettings,
    ) -> Self {
        if !provider.is_available() {
            return Self::unbuilt();
        }
        let Some(dir) = cache_dir else {
            return Self::build(provider, settings);
        };

        let source = vocabulary_fingerprint(provider);
        match store::load(dir, provider.dimension(), &source) {
            CacheLoad::Hit(built) => {
                tracing::info!(
                    dir = %dir.display(),
                    terms = built.terms.len(),
                    "loaded vocabulary index from cache"
                );
                return Self { built: Some(built) };
            }
            CacheLoad::Miss => {
                tracing::debug!(dir = %dir.display(), "no cached vocabulary index");
            }
            CacheLoad::Corrupt(reason) => {
                tracing::warn!(dir = %dir.display(), reason = %reason, "discarding cached vocabulary index");
            }
        }

        let index = Self::build_from(provider, settings, source);
        if let Err(e) = index.save(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to persist vocabulary index");
        }
        index
    }

    /// Persist to `dir`. An unbuilt index writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::CacheIo`] or
    /// [`ProcessingError::CacheSerialize`] if the files cannot be written.
    pub fn save(&self, dir: &Path) -> Result<(), ProcessingError> {
        match &self.built {
            Some(built) => store::save(built, dir),
            None => Ok(()),
        }
    }

    /// Delete the persisted index files in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::CacheIo`] if a file exists but cannot be
    /// removed.
    pub fn clear_cache(dir: &Path) -> Result<(), ProcessingError> {
        store::clear(dir)
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.terms.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector width; 0 when unbuilt.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.built.as_ref().map_or(0, |b| b.dimension)
    }

    #[must_use]
    pub fn layout_kind(&self) -> Option<IndexKind> {
        self.built.as_ref().map(|b| match b.layout {
            Layout::Flat => IndexKind::Flat,
            Layout::Ivf { .. } => IndexKind::Ivf,
        })
    }

    /// Up to `k` vocabulary terms with cosine similarity of at least
    /// `threshold` to `query`, most similar first.
    ///
    /// Returns nothing for an unbuilt index, a zero query, or a query of the
    /// wrong dimension.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize, threshold: f32) -> Vec<Neighbor> {
        let Some(built) = &self.built else {
            return Vec::new();
        };
        if k == 0 || query.len() != built.dimension {
            return Vec::new();
        }
        let mut q = query.to_vec();
        if !normalize(&mut q) {
            return Vec::new();
        }

        let scored: Vec<(usize, f32)> = match &built.layout {
            Layout::Flat => (0..built.terms.len())
                .map(|i| (i, dot(built.row(i), &q)))
                .collect(),
            Layout::Ivf {
                nprobe,
                centroids,
                lists,
            } => {
                let ranked = centroids
                    .iter()
                    .enumerate()
                    .map(|(c, centroid)| (c, dot(centroid, &q)))
                    .collect();
                top_k(ranked, *nprobe)
                    .into_iter()
                    .flat_map(|(c, _)| lists[c].iter())
                    .map(|&i| (i, dot(built.row(i), &q)))
                    .collect()
            }
        };

        let above: Vec<(usize, f32)> = scored
            .into_iter()
            .filter(|(_, sim)| *sim >= threshold)
            .collect();

        top_k(above, k)
            .into_iter()
            .map(|(i, sim)| Neighbor {
                term: built.terms[i].clone(),
                similarity: sim.min(1.0),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "vector_index_test.rs"]
mod tests;
