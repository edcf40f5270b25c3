//! Subcommand handlers. Each builds an engine from configuration, runs one
//! operation, prints JSON to stdout, and closes the engine.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use signalsift_core::{
    load_keywords, ContentItem, EngineConfig, InMemoryKeywords, KeywordRepository, SourceKind,
    SourceTier,
};
use signalsift_processing::{
    category_display_name, match_stats, EmbeddingProvider, NullEmbeddings, RelevanceEngine,
    SemanticExpander, StaticEmbeddings, VectorIndex,
};

/// Embedding provider for `config`; a vectors file that fails to load
/// leaves the engine in exact-match mode.
fn load_embeddings(config: &EngineConfig) -> Arc<dyn EmbeddingProvider> {
    match &config.vectors_path {
        Some(path) if config.semantic.enabled => match StaticEmbeddings::load_text(path) {
            Ok(table) => Arc::new(table),
            Err(e) => {
                tracing::warn!(error = %e, "word vectors unavailable");
                Arc::new(NullEmbeddings)
            }
        },
        _ => Arc::new(NullEmbeddings),
    }
}

pub(crate) fn build_engine(config: &EngineConfig) -> anyhow::Result<RelevanceEngine> {
    let keywords = load_keywords(&config.keywords_path)
        .with_context(|| format!("loading {}", config.keywords_path.display()))?;
    let repository: Arc<dyn KeywordRepository> = Arc::new(InMemoryKeywords::new(keywords));
    let engine = RelevanceEngine::new(config.clone(), repository, load_embeddings(config))?;
    Ok(engine)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn run_match(config: &EngineConfig, text: &str) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let matches = engine.match_keywords(text);
    print_json(&serde_json::json!({
        "semantic": engine.semantic_available(),
        "keyword_score": engine.keyword_score(&matches),
        "stats": match_stats(&matches),
        "matches": matches,
    }))?;
    engine.close()?;
    Ok(())
}

pub(crate) fn run_classify(config: &EngineConfig, text: &str) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let matches = engine.match_keywords(text);
    let category = engine.classify(text, &matches);
    print_json(&serde_json::json!({
        "category": category,
        "name": category_display_name(category),
    }))?;
    engine.close()?;
    Ok(())
}

fn read_item(source: &str) -> anyhow::Result<ContentItem> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading item from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?
    };
    serde_json::from_str(&raw).context("parsing content item JSON")
}

pub(crate) fn run_score(
    config: &EngineConfig,
    kind: SourceKind,
    tier: u8,
    source: &str,
) -> anyhow::Result<()> {
    let tier = SourceTier::try_from(tier)?;
    let item = read_item(source)?;
    let engine = build_engine(config)?;

    let now = Utc::now();
    let processed = engine.process_at(&item, kind, tier, now);
    let breakdown = engine.score_breakdown_at(&item, &processed.matches, kind, tier, now);
    print_json(&serde_json::json!({
        "item": processed,
        "breakdown": breakdown,
        "relevant": engine.is_relevant(processed.score),
    }))?;
    engine.close()?;
    Ok(())
}

pub(crate) fn run_expand(
    config: &EngineConfig,
    keyword: &str,
    category: &str,
    weight: f64,
) -> anyhow::Result<()> {
    let mut engine = build_engine(config)?;
    if !engine.semantic_available() {
        tracing::warn!("semantic expansion unavailable; set SIGNALSIFT_VECTORS_PATH");
    }
    let terms = engine.expand_keyword(keyword, category, weight);
    print_json(&serde_json::to_value(&terms)?)?;
    engine.close()?;
    Ok(())
}

pub(crate) fn run_index(config: &EngineConfig) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let index = engine.matcher().expander().index();
    print_json(&serde_json::json!({
        "built": index.is_built(),
        "layout": index.layout_kind().map(|k| k.to_string()),
        "terms": index.len(),
        "dimension": index.dimension(),
        "keywords": engine.matcher().keywords().len(),
        "expansions": engine.matcher().expansion_count(),
    }))?;
    engine.close()?;
    Ok(())
}

pub(crate) fn run_cache_clear(config: &EngineConfig) -> anyhow::Result<()> {
    let Some(dir) = &config.cache_dir else {
        println!("no cache directory configured");
        return Ok(());
    };
    // No model is needed to delete files.
    let mut expander = SemanticExpander::new(
        Arc::new(NullEmbeddings),
        VectorIndex::unbuilt(),
        config.semantic.clone(),
        Some(dir),
    );
    expander.clear_cache()?;
    VectorIndex::clear_cache(dir)?;
    println!("cleared caches in {}", dir.display());
    Ok(())
}
