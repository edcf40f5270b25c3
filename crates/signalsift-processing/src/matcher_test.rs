use signalsift_core::{IndexSettings, InMemoryKeywords, SemanticSettings};

use super::*;
use crate::embeddings::StaticEmbeddings;
use crate::vector_index::VectorIndex;

fn kw(text: &str, category: &str, weight: f64) -> Keyword {
    Keyword::new(text, category, weight).unwrap()
}

fn exact_matcher(keywords: Vec<Keyword>) -> KeywordMatcher {
    let repo: Arc<dyn KeywordRepository> = Arc::new(InMemoryKeywords::new(keywords));
    KeywordMatcher::new(
        repo,
        SemanticExpander::disabled(SemanticSettings::default()),
        false,
    )
}

fn semantic_matcher(keywords: Vec<Keyword>) -> KeywordMatcher {
    let mut t = StaticEmbeddings::new(3);
    t.insert("migration", &[1.0, 0.0, 0.0]).unwrap();
    t.insert("migrating", &[0.95, 0.05, 0.0]).unwrap();
    t.insert("relocation", &[0.8, 0.4, 0.0]).unwrap();
    t.insert("semrush", &[0.0, 1.0, 0.0]).unwrap();
    t.insert("baking", &[0.0, 0.0, 1.0]).unwrap();
    let provider = Arc::new(t);
    let index = VectorIndex::build(provider.as_ref(), &IndexSettings::default());
    let expander = SemanticExpander::new(provider, index, SemanticSettings::default(), None);
    let repo: Arc<dyn KeywordRepository> = Arc::new(InMemoryKeywords::new(keywords));
    KeywordMatcher::new(repo, expander, true)
}

fn record(term: &str, category: &str, weight: f64, occurrences: usize) -> MatchRecord {
    MatchRecord {
        term: term.to_string(),
        category: category.to_string(),
        weight,
        occurrences,
        is_semantic: false,
        origin_keyword: None,
    }
}

#[test]
fn matches_whole_words_case_insensitively() {
    let matcher = exact_matcher(vec![kw("migration", "techniques", 1.0)]);

    let matches = matcher.find_matches("Our site MIGRATION went badly");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].term, "migration");
    assert_eq!(matches[0].occurrences, 1);
    assert!(!matches[0].is_semantic);

    assert!(matcher.find_matches("three migrations later").is_empty());
}

#[test]
fn multi_word_keywords_match_as_phrases() {
    let matcher = exact_matcher(vec![kw("traffic dropped", "pain_points", 1.5)]);
    assert_eq!(matcher.find_matches("Traffic dropped 40% overnight").len(), 1);
    assert!(matcher.find_matches("traffic has dropped").is_empty());
}

#[test]
fn counts_non_overlapping_occurrences() {
    let matcher = exact_matcher(vec![kw("seo", "techniques", 1.0)]);
    let matches = matcher.find_matches("SEO tips: seo, seo and more seo");
    assert_eq!(matches[0].occurrences, 4);
}

#[test]
fn empty_text_matches_nothing() {
    let matcher = exact_matcher(vec![kw("seo", "techniques", 1.0)]);
    assert!(matcher.find_matches("").is_empty());
    assert!(matcher.find_matches("   ").is_empty());
}

#[test]
fn skips_invalid_and_duplicate_keywords() {
    let invalid = Keyword {
        text: "broken".to_string(),
        category: "techniques".to_string(),
        weight: 0.0,
        enabled: true,
    };
    let matcher = exact_matcher(vec![
        kw("seo", "techniques", 1.0),
        kw("SEO", "tool_mentions", 1.2),
        invalid,
    ]);
    assert_eq!(matcher.keywords().len(), 1);

    let matches = matcher.find_matches("seo and broken things");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].category, "techniques");
}

#[test]
fn refresh_picks_up_repository_changes() {
    let repo = Arc::new(InMemoryKeywords::new(vec![kw("seo", "techniques", 1.0)]));
    let shared: Arc<dyn KeywordRepository> = repo.clone();
    let mut matcher = KeywordMatcher::new(
        shared,
        SemanticExpander::disabled(SemanticSettings::default()),
        false,
    );
    assert!(matcher.find_matches("backlinks matter").is_empty());

    repo.add(kw("backlinks", "techniques", 1.2)).unwrap();
    assert!(matcher.find_matches("backlinks matter").is_empty());

    matcher.refresh();
    assert_eq!(matcher.find_matches("backlinks matter").len(), 1);

    repo.toggle("seo");
    matcher.refresh();
    assert!(matcher.find_matches("seo").is_empty());
}

#[test]
fn semantic_requested_without_model_stays_exact() {
    let repo: Arc<dyn KeywordRepository> =
        Arc::new(InMemoryKeywords::new(vec![kw("seo", "techniques", 1.0)]));
    let matcher = KeywordMatcher::new(
        repo,
        SemanticExpander::disabled(SemanticSettings::default()),
        true,
    );
    assert!(!matcher.semantic_enabled());
    assert_eq!(matcher.expansion_count(), 0);
    assert_eq!(matcher.find_matches("seo").len(), 1);
}

#[test]
fn expanded_terms_match_with_decayed_weight() {
    let matcher = semantic_matcher(vec![kw("migration", "techniques", 1.0)]);
    assert!(matcher.semantic_enabled());

    let matches = matcher.find_matches("We are migrating the blog");
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(m.term, "migrating");
    assert!(m.is_semantic);
    assert_eq!(m.origin_keyword.as_deref(), Some("migration"));
    assert!((m.weight - 0.8).abs() < 1e-9);
}

#[test]
fn exact_matches_come_before_semantic_ones() {
    let matcher = semantic_matcher(vec![kw("migration", "techniques", 1.0)]);
    let matches = matcher.find_matches("migrating after the migration");
    assert_eq!(matches.len(), 2);
    assert!(!matches[0].is_semantic);
    assert!(matches[1].is_semantic);
}

#[test]
fn exact_match_suppresses_identical_expansion() {
    let matcher = semantic_matcher(vec![
        kw("migration", "techniques", 1.0),
        kw("relocation", "pain_points", 1.5),
    ]);
    let matches = matcher.find_matches("relocation");
    assert_eq!(matches.len(), 1);
    assert!(!matches[0].is_semantic);
    assert_eq!(matches[0].category, "pain_points");
}

#[test]
fn keyword_score_caps_occurrences_at_three() {
    let matches = vec![record("migration", "techniques", 1.0, 7)];
    assert!((calculate_keyword_score(&matches) - 15.0).abs() < 1e-9);
}

#[test]
fn keyword_score_caps_total_at_35() {
    let matches = vec![
        record("seo", "techniques", 1.5, 3),
        record("traffic dropped", "pain_points", 1.5, 3),
    ];
    assert!((calculate_keyword_score(&matches) - 35.0).abs() < 1e-9);
    assert!(calculate_keyword_score(&[]).abs() < 1e-9);
}

#[test]
fn keyword_score_ignores_unusable_weights() {
    let matches = vec![
        record("migration", "techniques", 1.0, 1),
        record("seo", "techniques", f64::NAN, 2),
        record("moz", "tool_mentions", f64::INFINITY, 1),
        record("ahrefs", "tool_mentions", -2.0, 1),
    ];
    let score = calculate_keyword_score(&matches);
    assert!((score - 5.0).abs() < 1e-9, "got {score}");
}

#[test]
fn helpers_partition_and_summarise() {
    let mut semantic = record("migrating", "techniques", 0.8, 1);
    semantic.is_semantic = true;
    semantic.origin_keyword = Some("migration".to_string());
    let matches = vec![
        record("seo", "techniques", 1.0, 1),
        record("adsense", "monetization", 1.3, 2),
        semantic,
    ];

    assert_eq!(matched_terms(&matches), vec!["seo", "adsense", "migrating"]);
    assert_eq!(exact_only(&matches).len(), 2);
    assert_eq!(semantic_only(&matches)[0].term, "migrating");

    let groups = group_by_category(&matches);
    assert_eq!(groups["techniques"].len(), 2);
    assert_eq!(groups["monetization"].len(), 1);

    assert_eq!(
        match_stats(&matches),
        MatchStats {
            total: 3,
            exact: 2,
            semantic: 1,
            categories: 2,
        }
    );
}
