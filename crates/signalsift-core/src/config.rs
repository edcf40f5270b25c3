use std::path::PathBuf;

use crate::app_config::{EngineConfig, IndexSettings, SemanticSettings};
use crate::ConfigError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Load engine configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_engine_config() -> Result<EngineConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_engine_config_from_env()
}

/// Load engine configuration from variables already in the process.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_engine_config_from_env() -> Result<EngineConfig, ConfigError> {
    build_engine_config(|key| std::env::var(key))
}

/// Build engine configuration from the provided env-var lookup function.
///
/// Every variable is optional; absent variables take the defaults of
/// [`EngineConfig::default`]. The result is validated before it is returned.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for unparseable values and
/// [`ConfigError::Validation`] for out-of-range ones.
pub fn build_engine_config<F>(lookup: F) -> Result<EngineConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = EngineConfig::default();
    let semantic_defaults = SemanticSettings::default();
    let index_defaults = IndexSettings::default();

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_usize = |var: &str, default: usize| -> Result<usize, ConfigError> {
        optional(var).map_or(Ok(default), |raw| {
            raw.parse::<usize>().map_err(|e| invalid(var, e.to_string()))
        })
    };

    let parse_f64 = |var: &str, default: f64| -> Result<f64, ConfigError> {
        optional(var).map_or(Ok(default), |raw| {
            raw.parse::<f64>().map_err(|e| invalid(var, e.to_string()))
        })
    };

    let parse_f32 = |var: &str, default: f32| -> Result<f32, ConfigError> {
        optional(var).map_or(Ok(default), |raw| {
            raw.parse::<f32>().map_err(|e| invalid(var, e.to_string()))
        })
    };

    let log_level = optional("SIGNALSIFT_LOG_LEVEL")
        .map_or(defaults.log_level.clone(), |v| v.to_ascii_lowercase());
    if !LOG_LEVELS.contains(&log_level.as_str()) {
        return Err(invalid(
            "SIGNALSIFT_LOG_LEVEL",
            format!("must be one of {}", LOG_LEVELS.join(", ")),
        ));
    }

    let keywords_path =
        optional("SIGNALSIFT_KEYWORDS_PATH").map_or(defaults.keywords_path, PathBuf::from);
    let vectors_path = optional("SIGNALSIFT_VECTORS_PATH").map(PathBuf::from);
    let cache_dir = Some(
        optional("SIGNALSIFT_CACHE_DIR").map_or_else(|| PathBuf::from("./data/cache"), PathBuf::from),
    );

    let enabled = match optional("SIGNALSIFT_SEMANTIC_ENABLED") {
        None => semantic_defaults.enabled,
        Some(raw) => parse_bool(&raw).ok_or_else(|| {
            invalid(
                "SIGNALSIFT_SEMANTIC_ENABLED",
                format!("'{raw}' is not a boolean"),
            )
        })?,
    };

    let max_expansions = parse_usize("SIGNALSIFT_MAX_EXPANSIONS", semantic_defaults.max_expansions)?;
    let decay_factor = parse_f64("SIGNALSIFT_EXPANSION_DECAY", semantic_defaults.decay_factor)?;
    let default_threshold =
        parse_f32("SIGNALSIFT_DEFAULT_THRESHOLD", semantic_defaults.default_threshold)?;
    let strict_threshold = parse_f32("SIGNALSIFT_STRICT_THRESHOLD", 0.85)?;

    let strict_categories: Vec<String> = optional("SIGNALSIFT_STRICT_CATEGORIES").map_or_else(
        || semantic_defaults.category_thresholds.keys().cloned().collect(),
        |raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        },
    );
    let category_thresholds = strict_categories
        .into_iter()
        .map(|category| (category, strict_threshold))
        .collect();

    let index = IndexSettings {
        flat_cutoff: parse_usize("SIGNALSIFT_INDEX_FLAT_CUTOFF", index_defaults.flat_cutoff)?,
        nlist: parse_usize("SIGNALSIFT_INDEX_NLIST", index_defaults.nlist)?,
        nprobe: parse_usize("SIGNALSIFT_INDEX_NPROBE", index_defaults.nprobe)?,
        ..index_defaults
    };

    let min_relevance_score =
        parse_f64("SIGNALSIFT_MIN_RELEVANCE_SCORE", defaults.min_relevance_score)?;

    let config = EngineConfig {
        log_level,
        keywords_path,
        vectors_path,
        cache_dir,
        semantic: SemanticSettings {
            enabled,
            max_expansions,
            decay_factor,
            default_threshold,
            category_thresholds,
        },
        index,
        min_relevance_score,
    };

    config.validate()?;
    Ok(config)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
