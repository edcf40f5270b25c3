//! Word-embedding providers.
//!
//! A provider maps a term to a dense vector and exposes the vocabulary the
//! vector index is built from. [`StaticEmbeddings`] keeps a pre-trained
//! table in memory, loaded from the plain-text `term v1 v2 ...` format used
//! by GloVe and fastText dumps. [`NullEmbeddings`] stands in when no model
//! is configured, which puts the engine in exact-match-only mode.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ProcessingError;

/// Source of word vectors.
pub trait EmbeddingProvider: Send + Sync {
    /// Whether vectors can be produced at all.
    fn is_available(&self) -> bool;

    fn dimension(&self) -> usize;

    /// Vector for a word or short phrase; `None` when no token is known.
    fn embed(&self, text: &str) -> Option<Vec<f32>>;

    /// Every vocabulary term with its vector, in a stable order.
    fn vocabulary(&self) -> Box<dyn Iterator<Item = (&str, &[f32])> + '_>;
}

/// Provider with no model behind it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEmbeddings;

impl EmbeddingProvider for NullEmbeddings {
    fn is_available(&self) -> bool {
        false
    }

    fn dimension(&self) -> usize {
        0
    }

    fn embed(&self, _text: &str) -> Option<Vec<f32>> {
        None
    }

    fn vocabulary(&self) -> Box<dyn Iterator<Item = (&str, &[f32])> + '_> {
        Box::new(std::iter::empty())
    }
}

/// In-memory embedding table.
///
/// Terms are stored lowercased; when two rows collapse to the same
/// lowercase term the first one wins.
#[derive(Debug, Clone)]
pub struct StaticEmbeddings {
    dimension: usize,
    terms: Vec<String>,
    vectors: Vec<f32>,
    lookup: HashMap<String, usize>,
}

impl StaticEmbeddings {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            terms: Vec::new(),
            vectors: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Add a term. Returns `Ok(false)` if the lowercase term was already
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::DimensionMismatch`] if `vector` has the
    /// wrong length, and [`ProcessingError::VectorsFileParse`] if it holds a
    /// non-finite value.
    pub fn insert(&mut self, term: &str, vector: &[f32]) -> Result<bool, ProcessingError> {
        if vector.len() != self.dimension {
            return Err(ProcessingError::DimensionMismatch {
                term: term.to_string(),
                expected: self.dimension,
                got: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(ProcessingError::VectorsFileParse {
                path: "<memory>".to_string(),
                reason: format!("non-finite component in vector for '{term}'"),
            });
        }
        let key = term.to_lowercase();
        if self.lookup.contains_key(&key) {
            return Ok(false);
        }
        self.lookup.insert(key.clone(), self.terms.len());
        self.terms.push(key);
        self.vectors.extend_from_slice(vector);
        Ok(true)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn row(&self, idx: usize) -> &[f32] {
        &self.vectors[idx * self.dimension..(idx + 1) * self.dimension]
    }

    /// Load a text-format vectors file.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::VectorsFileIo`] if the file cannot be read
    /// and [`ProcessingError::VectorsFileParse`] if no usable row is found.
    pub fn load_text(path: &Path) -> Result<Self, ProcessingError> {
        let shown = path.display().to_string();
        let file = File::open(path).map_err(|source| ProcessingError::VectorsFileIo {
            path: shown.clone(),
            source,
        })?;
        let table = Self::from_reader(BufReader::new(file), &shown)?;
        tracing::info!(
            path = %shown,
            terms = table.len(),
            dimension = table.dimension,
            "loaded word vectors"
        );
        Ok(table)
    }

    /// Parse the text format from any reader.
    ///
    /// An optional first line of two integers (`count dim`) is treated as a
    /// header. Without one, the dimension is taken from the first row. Rows
    /// with the wrong width or unparseable numbers are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::VectorsFileIo`] on read failure and
    /// [`ProcessingError::VectorsFileParse`] if the table ends up empty.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<Self, ProcessingError> {
        let mut table: Option<Self> = None;
        let mut skipped = 0_usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ProcessingError::VectorsFileIo {
                path: source.to_string(),
                source: e,
            })?;
            let mut fields = line.split_whitespace();
            let Some(term) = fields.next() else {
                continue;
            };
            let rest: Vec<&str> = fields.collect();

            if line_no == 0 && rest.len() == 1 {
                if let (Ok(_), Ok(dim)) = (term.parse::<usize>(), rest[0].parse::<usize>()) {
                    table = Some(Self::new(dim));
                    continue;
                }
            }

            let Ok(vector) = rest.iter().map(|v| v.parse::<f32>()).collect::<Result<Vec<_>, _>>()
            else {
                skipped += 1;
                continue;
            };
            if vector.is_empty() {
                skipped += 1;
                continue;
            }

            let table = table.get_or_insert_with(|| Self::new(vector.len()));
            if table.insert(term, &vector).is_err() {
                skipped += 1;
            }
        }

        if skipped > 0 {
            tracing::warn!(source, skipped, "skipped malformed vector rows");
        }

        match table {
            Some(table) if !table.is_empty() => Ok(table),
            _ => Err(ProcessingError::VectorsFileParse {
                path: source.to_string(),
                reason: "no usable vector rows".to_string(),
            }),
        }
    }
}

impl EmbeddingProvider for StaticEmbeddings {
    fn is_available(&self) -> bool {
        !self.terms.is_empty()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut sum = vec![0.0_f32; self.dimension];
        let mut known = 0_u32;

        for token in lower.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            if let Some(&idx) = self.lookup.get(token) {
                for (acc, v) in sum.iter_mut().zip(self.row(idx)) {
                    *acc += v;
                }
                known += 1;
            }
        }

        if known == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = known as f32;
        for v in &mut sum {
            *v /= n;
        }
        if norm(&sum) <= f32::EPSILON {
            return None;
        }
        Some(sum)
    }

    fn vocabulary(&self) -> Box<dyn Iterator<Item = (&str, &[f32])> + '_> {
        Box::new(
            self.terms
                .iter()
                .enumerate()
                .map(|(idx, term)| (term.as_str(), self.row(idx))),
        )
    }
}

pub(crate) fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place. Returns `false` for a zero vector,
/// which is left untouched.
pub(crate) fn normalize(v: &mut [f32]) -> bool {
    let n = norm(v);
    if n <= f32::EPSILON {
        return false;
    }
    for x in v.iter_mut() {
        *x /= n;
    }
    true
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn table() -> StaticEmbeddings {
        let text = "seo 1.0 0.0 0.0\nranking 0.9 0.1 0.0\ncooking 0.0 0.0 1.0\n";
        StaticEmbeddings::from_reader(Cursor::new(text), "test").unwrap()
    }

    #[test]
    fn null_provider_is_unavailable() {
        let provider = NullEmbeddings;
        assert!(!provider.is_available());
        assert!(provider.embed("seo").is_none());
        assert_eq!(provider.vocabulary().count(), 0);
    }

    #[test]
    fn parses_rows_without_header() {
        let t = table();
        assert_eq!(t.len(), 3);
        assert_eq!(t.dimension(), 3);
        assert!(t.is_available());
    }

    #[test]
    fn parses_header_line() {
        let text = "2 2\nalpha 1 0\nbeta 0 1\n";
        let t = StaticEmbeddings::from_reader(Cursor::new(text), "test").unwrap();
        assert_eq!(t.dimension(), 2);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn skips_rows_with_wrong_width() {
        let text = "alpha 1 0 0\nbeta 0 1\ngamma 0 0 1\ndelta x y z\n";
        let t = StaticEmbeddings::from_reader(Cursor::new(text), "test").unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn rejects_empty_input() {
        let err = StaticEmbeddings::from_reader(Cursor::new(""), "empty").unwrap_err();
        assert!(matches!(err, ProcessingError::VectorsFileParse { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = StaticEmbeddings::load_text(Path::new("/no/such/vectors.txt")).unwrap_err();
        assert!(matches!(err, ProcessingError::VectorsFileIo { .. }));
    }

    #[test]
    fn loads_vectors_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.txt");
        std::fs::write(&path, "2 2\nseo 1.0 0.0\nranking 0.6 0.8\n").unwrap();

        let t = StaticEmbeddings::load_text(&path).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.dimension(), 2);
        assert_eq!(t.embed("ranking").unwrap(), vec![0.6, 0.8]);
    }

    #[test]
    fn duplicate_terms_keep_first_row() {
        let mut t = StaticEmbeddings::new(2);
        assert!(t.insert("SEO", &[1.0, 0.0]).unwrap());
        assert!(!t.insert("seo", &[0.0, 1.0]).unwrap());
        assert_eq!(t.embed("seo").unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn insert_rejects_dimension_mismatch() {
        let mut t = StaticEmbeddings::new(2);
        let err = t.insert("seo", &[1.0]).unwrap_err();
        assert!(matches!(err, ProcessingError::DimensionMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn phrase_embeds_as_mean_of_known_tokens() {
        let t = table();
        let v = t.embed("SEO cooking unknownword").unwrap();
        assert!((v[0] - 0.5).abs() < 1e-6);
        assert!((v[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn out_of_vocabulary_phrase_has_no_vector() {
        assert!(table().embed("qwerty zxcvb").is_none());
    }

    #[test]
    fn vocabulary_preserves_insertion_order() {
        let t = table();
        let names: Vec<&str> = t.vocabulary().map(|(term, _)| term).collect();
        assert_eq!(names, vec!["seo", "ranking", "cooking"]);
    }

    #[test]
    fn normalize_handles_zero_vector() {
        let mut zero = vec![0.0, 0.0];
        assert!(!normalize(&mut zero));
        let mut v = vec![3.0, 4.0];
        assert!(normalize(&mut v));
        assert!((norm(&v) - 1.0).abs() < 1e-6);
    }
}
