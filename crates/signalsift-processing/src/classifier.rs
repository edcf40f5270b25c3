//! Rule-based content classification.
//!
//! Each category has a list of signal phrases. A category scores one point
//! per signal found anywhere in the lowercased text (plain substring, so
//! "vs" also fires inside "devs"), plus `weight * 2` for every matched
//! keyword whose keyword category maps onto it. The highest score wins;
//! ties go to the category declared first, and an all-zero score yields
//! [`GENERAL_CATEGORY`].

use crate::types::MatchRecord;

pub const GENERAL_CATEGORY: &str = "general";

/// Score added per matched keyword, multiplied by the keyword's weight.
const KEYWORD_BOOST: f64 = 2.0;

/// Signal phrases per category, in tie-breaking order.
pub const CATEGORY_SIGNALS: &[(&str, &[&str])] = &[
    (
        "pain_point",
        &[
            "struggling",
            "frustrated",
            "can't",
            "cannot",
            "help",
            "wish",
            "problem",
            "issue",
            "bug",
            "broken",
            "doesn't work",
            "not working",
            "traffic dropped",
            "lost rankings",
        ],
    ),
    (
        "success_story",
        &[
            "increased",
            "results",
            "case study",
            "working",
            "success",
            "achieved",
            "finally",
            "breakthrough",
            "doubled",
            "tripled",
            "hit first page",
            "ranking #1",
        ],
    ),
    (
        "tool_comparison",
        &[
            "vs",
            "versus",
            "compared",
            "comparison",
            "switched",
            "better than",
            "alternative",
            "instead of",
        ],
    ),
    (
        "technique",
        &[
            "strategy",
            "method",
            "approach",
            "how to",
            "tutorial",
            "guide",
            "step by step",
            "walkthrough",
        ],
    ),
    (
        "industry_news",
        &[
            "update",
            "algorithm",
            "announcement",
            "change",
            "news",
            "released",
            "launched",
            "rollout",
        ],
    ),
    (
        "monetization",
        &[
            "affiliate",
            "commission",
            "rpm",
            "revenue",
            "income",
            "adsense",
            "mediavine",
            "profit",
            "earnings",
            "monetize",
            "cpc",
            "cpm",
        ],
    ),
    (
        "roi_analysis",
        &[
            "roi",
            "return on investment",
            "cost per",
            "investment",
            "payoff",
            "break even",
        ],
    ),
    (
        "ecommerce",
        &[
            "amazon affiliate",
            "dropshipping",
            "shopify",
            "woocommerce",
            "product reviews",
            "buyer guide",
            "amazon associates",
        ],
    ),
    (
        "ai_visibility",
        &[
            "chatgpt",
            "perplexity",
            "ai overview",
            "sge",
            "citation",
            "llm",
            "ai search",
            "gemini",
            "ai answers",
            "generative search",
        ],
    ),
    (
        "ai_content",
        &[
            "ai writer",
            "ai generated",
            "ai detection",
            "bulk content",
            "ai writing",
            "generated content",
            "gpt-4",
            "content at scale",
        ],
    ),
    (
        "image_generation",
        &[
            "dall-e",
            "midjourney",
            "stable diffusion",
            "ai images",
            "featured image",
            "ai art",
            "image generator",
        ],
    ),
    (
        "static_sites",
        &[
            "static site",
            "jamstack",
            "page speed",
            "core web vitals",
            "lighthouse",
            "schema markup",
            "structured data",
        ],
    ),
    (
        "competitor_analysis",
        &[
            "competitor",
            "outrank",
            "beat",
            "competition",
            "rival",
            "market leader",
            "content gap",
            "backlink gap",
        ],
    ),
    (
        "content_brief",
        &[
            "content brief",
            "outline",
            "structure",
            "format",
            "template",
            "framework",
        ],
    ),
    (
        "keyword_research",
        &[
            "keyword research",
            "keyword difficulty",
            "search volume",
            "long tail",
            "keyword gap",
            "seed keywords",
            "low competition",
            "people also ask",
        ],
    ),
    (
        "local_seo",
        &[
            "local seo",
            "google business",
            "local pack",
            "map pack",
            "local citations",
            "near me",
        ],
    ),
];

/// Keyword category to classification category.
pub const KEYWORD_CATEGORY_MAP: &[(&str, &str)] = &[
    ("success_signals", "success_story"),
    ("pain_points", "pain_point"),
    ("tool_mentions", "tool_comparison"),
    ("techniques", "technique"),
    ("keyword_research", "keyword_research"),
    ("monetization", "monetization"),
    ("ai_visibility", "ai_visibility"),
    ("content_generation", "ai_content"),
    ("image_generation", "image_generation"),
    ("static_sites", "static_sites"),
    ("competition", "competitor_analysis"),
    ("ecommerce", "ecommerce"),
    ("local_seo", "local_seo"),
];

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("pain_point", "Pain Point / Feature Opportunity"),
    ("success_story", "Success Story"),
    ("tool_comparison", "Tool Comparison"),
    ("technique", "Technique / Strategy"),
    ("industry_news", "Industry News"),
    ("monetization", "Monetization Intelligence"),
    ("roi_analysis", "ROI Analysis"),
    ("ecommerce", "E-commerce"),
    ("ai_visibility", "AI Visibility / GEO"),
    ("ai_content", "AI Content Generation"),
    ("image_generation", "Image Generation"),
    ("static_sites", "Static Sites / Technical"),
    ("competitor_analysis", "Competitor Analysis"),
    ("content_brief", "Content Brief / Structure"),
    ("keyword_research", "Keyword Research"),
    ("local_seo", "Local SEO"),
    (GENERAL_CATEGORY, "General"),
];

/// Product package most relevant to each category.
const CATEGORY_PACKAGES: &[(&str, &str)] = &[
    ("pain_point", "All"),
    ("success_story", "All"),
    ("tool_comparison", "All"),
    ("technique", "SniperForge"),
    ("industry_news", "GEOForge"),
    ("monetization", "ProfitForge"),
    ("roi_analysis", "ProfitForge"),
    ("ecommerce", "ProfitForge"),
    ("ai_visibility", "GEOForge"),
    ("ai_content", "KeyForge"),
    ("image_generation", "ImageForge"),
    ("static_sites", "StaticForge"),
    ("competitor_analysis", "SniperForge"),
    ("content_brief", "SniperForge"),
    ("keyword_research", "SeedForge/GapForge"),
    ("local_seo", "SeedForge/GapForge"),
];

fn mapped_category(keyword_category: &str) -> Option<&'static str> {
    KEYWORD_CATEGORY_MAP
        .iter()
        .find(|(from, _)| *from == keyword_category)
        .map(|(_, to)| *to)
}

/// Pick the best-fitting category for `text` given its keyword matches.
#[must_use]
pub fn classify(text: &str, matches: &[MatchRecord]) -> &'static str {
    let lower = text.to_lowercase();
    let mut scores: Vec<f64> = CATEGORY_SIGNALS
        .iter()
        .map(|(_, signals)| {
            #[allow(clippy::cast_precision_loss)]
            let hits = signals.iter().filter(|s| lower.contains(*s)).count() as f64;
            hits
        })
        .collect();

    for m in matches {
        let Some(target) = mapped_category(&m.category) else {
            continue;
        };
        if let Some(pos) = CATEGORY_SIGNALS.iter().position(|(c, _)| *c == target) {
            scores[pos] += m.weight * KEYWORD_BOOST;
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for (pos, &score) in scores.iter().enumerate() {
        if score > 0.0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((pos, score));
        }
    }

    best.map_or(GENERAL_CATEGORY, |(pos, _)| CATEGORY_SIGNALS[pos].0)
}

/// Human-readable name for a category id. Unknown ids are title-cased with
/// underscores turned into spaces.
#[must_use]
pub fn category_display_name(category: &str) -> String {
    if let Some((_, name)) = DISPLAY_NAMES.iter().find(|(id, _)| *id == category) {
        return (*name).to_string();
    }
    category
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Product package a category feeds, or `None` for the fallback and
/// unknown ids.
#[must_use]
pub fn category_package(category: &str) -> Option<&'static str> {
    CATEGORY_PACKAGES
        .iter()
        .find(|(id, _)| *id == category)
        .map(|(_, package)| *package)
}

/// Category ids in declaration order, excluding the fallback.
#[must_use]
pub fn primary_categories() -> Vec<&'static str> {
    CATEGORY_SIGNALS.iter().map(|(c, _)| *c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(category: &str, weight: f64) -> MatchRecord {
        MatchRecord {
            term: "x".to_string(),
            category: category.to_string(),
            weight,
            occurrences: 1,
            is_semantic: false,
            origin_keyword: None,
        }
    }

    #[test]
    fn no_signal_is_general() {
        assert_eq!(classify("The weather is nice today", &[]), GENERAL_CATEGORY);
        assert_eq!(classify("", &[]), GENERAL_CATEGORY);
    }

    #[test]
    fn signals_pick_category() {
        assert_eq!(
            classify("Step by step tutorial on my link strategy", &[]),
            "technique"
        );
        assert_eq!(classify("Our RPM and AdSense revenue", &[]), "monetization");
    }

    #[test]
    fn signals_match_as_substrings() {
        // "devs" contains "vs".
        assert_eq!(classify("devs", &[]), "tool_comparison");
    }

    #[test]
    fn ties_go_to_first_declared_category() {
        // One pain_point signal, one success_story signal.
        assert_eq!(classify("problem results", &[]), "pain_point");
    }

    #[test]
    fn keyword_matches_outweigh_signals() {
        let matches = [matched("monetization", 1.3)];
        assert_eq!(classify("this problem here", &matches), "monetization");
    }

    #[test]
    fn unmapped_keyword_categories_are_ignored() {
        let matches = [matched("trends", 5.0)];
        assert_eq!(classify("nothing relevant", &matches), GENERAL_CATEGORY);
    }

    #[test]
    fn display_names_cover_known_and_unknown_ids() {
        assert_eq!(category_display_name("local_seo"), "Local SEO");
        assert_eq!(category_display_name("general"), "General");
        assert_eq!(category_display_name("brand_new_thing"), "Brand New Thing");
    }

    #[test]
    fn primary_categories_in_declaration_order() {
        let categories = primary_categories();
        assert_eq!(categories.len(), 16);
        assert_eq!(categories[0], "pain_point");
        assert_eq!(categories[15], "local_seo");
        assert!(!categories.contains(&GENERAL_CATEGORY));
    }

    #[test]
    fn every_primary_category_has_a_package() {
        for category in primary_categories() {
            assert!(category_package(category).is_some(), "{category} has no package");
        }
        assert_eq!(category_package("technique"), Some("SniperForge"));
        assert_eq!(category_package("local_seo"), Some("SeedForge/GapForge"));
        assert_eq!(category_package(GENERAL_CATEGORY), None);
        assert_eq!(category_package("unknown"), None);
    }
}
