//! Shared domain types and configuration for SignalSift.

pub mod app_config;
pub mod config;
pub mod content;
pub mod keywords;

pub use app_config::{EngineConfig, IndexSettings, SemanticSettings};
pub use config::{build_engine_config, load_engine_config, load_engine_config_from_env};
pub use content::{ContentItem, SourceKind, SourceTier, StoryType};
pub use keywords::{
    load_keywords, InMemoryKeywords, Keyword, KeywordRepository, KeywordsFile,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read keywords file {path}: {source}")]
    KeywordsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse keywords file: {0}")]
    KeywordsFileParse(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
