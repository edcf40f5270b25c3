use std::fs;

use super::store::{META_FILE, VECTORS_FILE};
use super::*;
use crate::embeddings::{NullEmbeddings, StaticEmbeddings};

fn small_vocab() -> StaticEmbeddings {
    let mut t = StaticEmbeddings::new(3);
    t.insert("seo", &[1.0, 0.0, 0.0]).unwrap();
    t.insert("ranking", &[0.9, 0.1, 0.0]).unwrap();
    t.insert("rankings", &[0.8, 0.2, 0.0]).unwrap();
    t.insert("cooking", &[0.0, 0.0, 1.0]).unwrap();
    t.insert("recipes", &[0.0, 0.1, 0.9]).unwrap();
    t.insert("a1", &[1.0, 0.0, 0.0]).unwrap();
    t.insert("zero", &[0.0, 0.0, 0.0]).unwrap();
    t
}

fn small_source() -> String {
    vocabulary_fingerprint(&small_vocab())
}

fn word(i: usize) -> String {
    let letters = b"abcdefghijklmnopqrstuvwxyz";
    format!(
        "term{}{}",
        letters[i / 26] as char,
        letters[i % 26] as char
    )
}

fn large_vocab(n: usize) -> StaticEmbeddings {
    let mut t = StaticEmbeddings::new(3);
    for i in 0..n {
        #[allow(clippy::cast_precision_loss)]
        let angle = i as f32 * 0.3;
        #[allow(clippy::cast_precision_loss)]
        let lift = (i % 5) as f32 * 0.1;
        t.insert(&word(i), &[angle.cos(), angle.sin(), lift]).unwrap();
    }
    t
}

fn ivf_settings() -> IndexSettings {
    IndexSettings {
        flat_cutoff: 5,
        nlist: 4,
        nprobe: 4,
        ..IndexSettings::default()
    }
}

#[test]
fn indexable_terms_are_alphabetic_and_bounded() {
    assert!(is_indexable_term("seo"));
    assert!(is_indexable_term("optimization"));
    assert!(!is_indexable_term("ai"));
    assert!(!is_indexable_term("web3"));
    assert!(!is_indexable_term("link-building"));
    assert!(!is_indexable_term("abcdefghijklmnopqrstu"));
}

#[test]
fn unavailable_provider_gives_unbuilt_index() {
    let index = VectorIndex::build(&NullEmbeddings, &IndexSettings::default());
    assert!(!index.is_built());
    assert!(index.search(&[1.0, 0.0, 0.0], 5, 0.0).is_empty());
}

#[test]
fn build_filters_vocabulary() {
    let index = VectorIndex::build(&small_vocab(), &IndexSettings::default());
    assert_eq!(index.layout_kind(), Some(IndexKind::Flat));
    // "a1" is not alphabetic and "zero" has no direction.
    assert_eq!(index.len(), 5);
}

#[test]
fn flat_search_orders_by_similarity() {
    let index = VectorIndex::build(&small_vocab(), &IndexSettings::default());
    let hits = index.search(&[1.0, 0.0, 0.0], 3, 0.5);
    let terms: Vec<&str> = hits.iter().map(|n| n.term.as_str()).collect();
    assert_eq!(terms, vec!["seo", "ranking", "rankings"]);
    assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    assert!(hits.iter().all(|n| n.similarity <= 1.0));
}

#[test]
fn search_applies_threshold_and_k() {
    let index = VectorIndex::build(&small_vocab(), &IndexSettings::default());
    let hits = index.search(&[1.0, 0.0, 0.0], 10, 0.99);
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|n| n.similarity >= 0.99));

    assert_eq!(index.search(&[1.0, 0.0, 0.0], 1, 0.0).len(), 1);
    assert!(index.search(&[1.0, 0.0, 0.0], 0, 0.0).is_empty());
}

#[test]
fn search_rejects_bad_queries() {
    let index = VectorIndex::build(&small_vocab(), &IndexSettings::default());
    assert!(index.search(&[1.0, 0.0], 5, 0.0).is_empty());
    assert!(index.search(&[0.0, 0.0, 0.0], 5, 0.0).is_empty());
}

#[test]
fn large_vocabulary_uses_clustered_layout() {
    let index = VectorIndex::build(&large_vocab(60), &ivf_settings());
    assert_eq!(index.layout_kind(), Some(IndexKind::Ivf));
    assert_eq!(index.len(), 60);
}

#[test]
fn probing_every_cluster_matches_flat_search() {
    let vocab = large_vocab(60);
    let flat = VectorIndex::build(&vocab, &IndexSettings::default());
    let ivf = VectorIndex::build(&vocab, &ivf_settings());

    let query = [0.3_f32, 0.9, 0.1];
    assert_eq!(flat.search(&query, 5, 0.0), ivf.search(&query, 5, 0.0));
}

#[test]
fn load_or_build_persists_and_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let vocab = large_vocab(60);

    let first = VectorIndex::load_or_build(Some(dir.path()), &vocab, &ivf_settings());
    assert!(dir.path().join(META_FILE).exists());
    assert!(dir.path().join(VECTORS_FILE).exists());

    // Different settings would build a flat index; the cached one wins.
    let second = VectorIndex::load_or_build(Some(dir.path()), &vocab, &IndexSettings::default());
    assert_eq!(second.layout_kind(), Some(IndexKind::Ivf));
    assert_eq!(first.len(), second.len());

    let query = [0.7_f32, 0.7, 0.0];
    assert_eq!(first.search(&query, 5, 0.0), second.search(&query, 5, 0.0));
}

#[test]
fn corrupt_vectors_file_triggers_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let vocab = small_vocab();
    let built = VectorIndex::load_or_build(Some(dir.path()), &vocab, &IndexSettings::default());

    let vectors_path = dir.path().join(VECTORS_FILE);
    let mut bytes = fs::read(&vectors_path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&vectors_path, &bytes).unwrap();

    assert!(matches!(
        store::load(dir.path(), 3, &small_source()),
        CacheLoad::Corrupt(reason) if reason.contains("checksum")
    ));

    let rebuilt = VectorIndex::load_or_build(Some(dir.path()), &vocab, &IndexSettings::default());
    assert_eq!(built, rebuilt);
    assert!(matches!(store::load(dir.path(), 3, &small_source()), CacheLoad::Hit(_)));
}

#[test]
fn dimension_change_invalidates_cache() {
    let dir = tempfile::tempdir().unwrap();
    VectorIndex::build(&small_vocab(), &IndexSettings::default())
        .save(dir.path())
        .unwrap();
    assert!(matches!(store::load(dir.path(), 4, &small_source()), CacheLoad::Corrupt(_)));
}

#[test]
fn missing_half_of_cache_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(store::load(dir.path(), 3, &small_source()), CacheLoad::Miss));

    VectorIndex::build(&small_vocab(), &IndexSettings::default())
        .save(dir.path())
        .unwrap();
    fs::remove_file(dir.path().join(VECTORS_FILE)).unwrap();
    assert!(matches!(store::load(dir.path(), 3, &small_source()), CacheLoad::Corrupt(_)));
}

#[test]
fn clear_cache_removes_files() {
    let dir = tempfile::tempdir().unwrap();
    VectorIndex::build(&small_vocab(), &IndexSettings::default())
        .save(dir.path())
        .unwrap();
    VectorIndex::clear_cache(dir.path()).unwrap();
    assert!(!dir.path().join(META_FILE).exists());
    assert!(!dir.path().join(VECTORS_FILE).exists());
    VectorIndex::clear_cache(dir.path()).unwrap();
}

#[test]
fn swapped_vocabulary_of_same_width_invalidates_cache() {
    let dir = tempfile::tempdir().unwrap();
    let first = small_vocab();
    VectorIndex::load_or_build(Some(dir.path()), &first, &IndexSettings::default());

    let mut swapped = StaticEmbeddings::new(3);
    swapped.insert("backlinks", &[1.0, 0.0, 0.0]).unwrap();
    swapped.insert("outreach", &[0.9, 0.1, 0.0]).unwrap();
    let source = vocabulary_fingerprint(&swapped);
    assert_ne!(source, small_source());
    assert!(matches!(
        store::load(dir.path(), 3, &source),
        CacheLoad::Corrupt(reason) if reason.contains("vocabulary changed")
    ));

    let rebuilt = VectorIndex::load_or_build(Some(dir.path()), &swapped, &IndexSettings::default());
    assert_eq!(rebuilt.len(), 2);
    let hits = rebuilt.search(&[1.0, 0.0, 0.0], 1, 0.5);
    assert_eq!(hits[0].term, "backlinks");
    assert!(matches!(store::load(dir.path(), 3, &source), CacheLoad::Hit(_)));
}
