use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::ConfigError;

/// Semantic expansion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticSettings {
    pub enabled: bool,
    pub max_expansions: usize,
    /// Factor applied to a keyword's weight to derive an expansion's weight.
    pub decay_factor: f64,
    pub default_threshold: f32,
    /// Per-category threshold overrides.
    pub category_thresholds: BTreeMap<String, f32>,
}

impl SemanticSettings {
    /// Similarity threshold for `category`, falling back to the default.
    #[must_use]
    pub fn threshold_for(&self, category: &str) -> f32 {
        self.category_thresholds
            .get(category)
            .copied()
            .unwrap_or(self.default_threshold)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_expansions == 0 {
            return Err(ConfigError::Validation(
                "max_expansions must be at least 1".to_string(),
            ));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor < 1.0) {
            return Err(ConfigError::Validation(format!(
                "decay_factor {} must be in (0, 1)",
                self.decay_factor
            )));
        }
        check_threshold("default_threshold", self.default_threshold)?;
        for (category, threshold) in &self.category_thresholds {
            check_threshold(&format!("threshold for '{category}'"), *threshold)?;
        }
        Ok(())
    }
}

impl Default for SemanticSettings {
    fn default() -> Self {
        let mut category_thresholds = BTreeMap::new();
        category_thresholds.insert("tool_mentions".to_string(), 0.85);
        Self {
            enabled: true,
            max_expansions: 5,
            decay_factor: 0.8,
            default_threshold: 0.75,
            category_thresholds,
        }
    }
}

fn check_threshold(name: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} {value} must be in (0, 1]"
        )))
    }
}

/// Vector index build settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    /// Vocabulary size above which the clustered layout is used.
    pub flat_cutoff: usize,
    pub nlist: usize,
    pub nprobe: usize,
    pub kmeans_iterations: usize,
    pub seed: u64,
}

impl IndexSettings {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any count is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nlist == 0 || self.nprobe == 0 || self.kmeans_iterations == 0 {
            return Err(ConfigError::Validation(
                "nlist, nprobe, and kmeans_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            flat_cutoff: 10_000,
            nlist: 100,
            nprobe: 10,
            kmeans_iterations: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub log_level: String,
    pub keywords_path: PathBuf,
    pub vectors_path: Option<PathBuf>,
    /// Directory holding the expansion and vector-index caches. `None`
    /// disables persistence.
    pub cache_dir: Option<PathBuf>,
    pub semantic: SemanticSettings,
    pub index: IndexSettings,
    pub min_relevance_score: f64,
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.semantic.validate()?;
        self.index.validate()?;
        if !(0.0..=100.0).contains(&self.min_relevance_score) {
            return Err(ConfigError::Validation(format!(
                "min_relevance_score {} must be in [0, 100]",
                self.min_relevance_score
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            keywords_path: PathBuf::from("./config/keywords.yaml"),
            vectors_path: None,
            cache_dir: None,
            semantic: SemanticSettings::default(),
            index: IndexSettings::default(),
            min_relevance_score: 30.0,
        }
    }
}
