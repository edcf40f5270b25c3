use thiserror::Error;

use signalsift_core::ConfigError;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cache I/O error at {path}: {source}")]
    CacheIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache serialization error: {0}")]
    CacheSerialize(#[from] serde_json::Error),

    #[error("failed to read vectors file {path}: {source}")]
    VectorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed vectors file {path}: {reason}")]
    VectorsFileParse { path: String, reason: String },

    #[error("embedding dimension mismatch for '{term}': expected {expected}, got {got}")]
    DimensionMismatch {
        term: String,
        expected: usize,
        got: usize,
    },
}
