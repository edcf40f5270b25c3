use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A tracked keyword with its scoring weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    #[serde(rename = "keyword")]
    pub text: String,
    pub category: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_weight() -> f64 {
    1.0
}

fn default_enabled() -> bool {
    true
}

impl Keyword {
    /// Build an enabled keyword, rejecting empty text, empty category, or a
    /// non-positive weight.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first invalid field.
    pub fn new(
        text: impl Into<String>,
        category: impl Into<String>,
        weight: f64,
    ) -> Result<Self, ConfigError> {
        let keyword = Self {
            text: text.into(),
            category: category.into(),
            weight,
            enabled: true,
        };
        keyword.validate()?;
        Ok(keyword)
    }

    /// Returns `true` if the weight is finite and strictly positive.
    #[must_use]
    pub fn has_valid_weight(&self) -> bool {
        self.weight.is_finite() && self.weight > 0.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.text.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keyword text must be non-empty".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "keyword '{}' has an empty category",
                self.text
            )));
        }
        if !self.has_valid_weight() {
            return Err(ConfigError::Validation(format!(
                "keyword '{}' has invalid weight {}; must be finite and > 0",
                self.text, self.weight
            )));
        }
        Ok(())
    }
}

/// Keywords listed under a shared category and weight.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryGroup {
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub keywords: Vec<String>,
}

/// On-disk keyword file.
///
/// Accepts an explicit `keywords` list, a `categories` map of grouped
/// keywords, or both. Explicit entries come first in [`KeywordsFile::into_keywords`].
#[derive(Debug, Default, Deserialize)]
pub struct KeywordsFile {
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryGroup>,
}

impl KeywordsFile {
    /// Flatten explicit and grouped entries into one keyword list.
    #[must_use]
    pub fn into_keywords(self) -> Vec<Keyword> {
        let mut out = self.keywords;
        for (category, group) in self.categories {
            out.extend(group.keywords.into_iter().map(|text| Keyword {
                text,
                category: category.clone(),
                weight: group.weight,
                enabled: true,
            }));
        }
        out
    }
}

/// Load and validate a keyword file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_keywords(path: &Path) -> Result<Vec<Keyword>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: KeywordsFile = serde_yaml::from_str(&content)?;
    let keywords = file.into_keywords();
    validate_keywords(&keywords)?;

    Ok(keywords)
}

fn validate_keywords(keywords: &[Keyword]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for keyword in keywords {
        keyword.validate()?;

        let key = (keyword.category.clone(), keyword.text.to_lowercase());
        if !seen.insert(key) {
            return Err(ConfigError::Validation(format!(
                "duplicate keyword '{}' in category '{}'",
                keyword.text, keyword.category
            )));
        }
    }

    Ok(())
}

/// Source of the tracked keyword set.
///
/// Implementations own persistence. After any mutation the caller must
/// refresh every matcher built from an earlier snapshot.
pub trait KeywordRepository: Send + Sync {
    /// Snapshot of all enabled keywords, in a stable order.
    fn list_enabled(&self) -> Vec<Keyword>;
}

/// Keyword repository held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryKeywords {
    keywords: RwLock<Vec<Keyword>>,
}

impl InMemoryKeywords {
    #[must_use]
    pub fn new(keywords: Vec<Keyword>) -> Self {
        Self {
            keywords: RwLock::new(keywords),
        }
    }

    /// Add a keyword.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the keyword is invalid or the
    /// same text is already tracked in that category.
    pub fn add(&self, keyword: Keyword) -> Result<(), ConfigError> {
        keyword.validate()?;
        let mut guard = self.keywords.write().unwrap_or_else(PoisonError::into_inner);
        let lower = keyword.text.to_lowercase();
        if guard
            .iter()
            .any(|k| k.category == keyword.category && k.text.to_lowercase() == lower)
        {
            return Err(ConfigError::Validation(format!(
                "duplicate keyword '{}' in category '{}'",
                keyword.text, keyword.category
            )));
        }
        guard.push(keyword);
        Ok(())
    }

    /// Remove every keyword whose text matches case-insensitively.
    /// Returns the number removed.
    pub fn remove(&self, text: &str) -> usize {
        let mut guard = self.keywords.write().unwrap_or_else(PoisonError::into_inner);
        let lower = text.to_lowercase();
        let before = guard.len();
        guard.retain(|k| k.text.to_lowercase() != lower);
        before - guard.len()
    }

    /// Flip the enabled flag of the first keyword matching `text`.
    /// Returns the new state, or `None` if no keyword matched.
    pub fn toggle(&self, text: &str) -> Option<bool> {
        let mut guard = self.keywords.write().unwrap_or_else(PoisonError::into_inner);
        let lower = text.to_lowercase();
        let keyword = guard.iter_mut().find(|k| k.text.to_lowercase() == lower)?;
        keyword.enabled = !keyword.enabled;
        Some(keyword.enabled)
    }

    /// Every keyword, enabled or not.
    #[must_use]
    pub fn list_all(&self) -> Vec<Keyword> {
        self.keywords
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl KeywordRepository for InMemoryKeywords {
    fn list_enabled(&self) -> Vec<Keyword> {
        self.keywords
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|k| k.enabled)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "keywords_test.rs"]
mod tests;
