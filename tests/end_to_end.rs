use lexidex::config::{IndexConfig, TokenizerConfig};
use lexidex::engine::SearchEngine;
use lexidex::search::CancellationToken;
use tempfile::tempdir;

fn engine(min_length: i64) -> SearchEngine<u64> {
    let dir = tempdir().unwrap();
    let config = IndexConfig::default().with_data_path(dir.path().to_path_buf());
    let tokenizer = TokenizerConfig::default().with_min_length(min_length).unwrap();
    // leak the tempdir so the backing files survive for the engine's lifetime
    std::mem::forget(dir);
    SearchEngine::open(config, tokenizer).unwrap()
}

#[test]
fn facet_and_boolean_table() {
    let engine = engine(1);
    engine.add_record(1u64, "fox").unwrap();
    engine.add_record(2, "fox cow cat").unwrap();
    engine.add_record(3, "fox cat cow").unwrap();
    engine.add_facet(3, "category", "red").unwrap();
    let cancel = CancellationToken::new();

    let mut r = engine.search("(cat OR cow) AND NOT category:tear", 0, 0, &cancel).unwrap();
    r.sort();
    assert_eq!(r, vec![2, 3]);

    let mut r = engine.search("cat cow AND NOT category:red", 0, 0, &cancel).unwrap();
    r.sort();
    assert_eq!(r, vec![2]);

    let r = engine.search("'cat cow' AND NOT category:red", 0, 0, &cancel).unwrap();
    assert!(r.is_empty());

    let r = engine.search("'cat cow' AND NOT category:blue", 0, 0, &cancel).unwrap();
    assert_eq!(r, vec![3]);
}

#[test]
fn and_or_precedence_and_grouping() {
    let engine = engine(1);
    engine.add_record(1u64, "cat dog fox").unwrap();
    engine.add_record(2, "cat fox").unwrap();
    engine.add_record(3, "dog fox").unwrap();
    engine.add_record(4, "dog").unwrap();
    engine.add_record(5, "fox").unwrap();
    engine.add_record(6, "cat").unwrap();
    let cancel = CancellationToken::new();

    let mut r = engine.search("cat AND dog OR fox", 0, 0, &cancel).unwrap();
    r.sort();
    assert_eq!(r, vec![1, 2, 3, 5]);

    let mut r = engine.search("(cat OR dog) AND NOT (fox OR dog)", 0, 0, &cancel).unwrap();
    r.sort();
    assert_eq!(r, vec![6]);
}

#[test]
fn facet_in_list_matches_either_value() {
    let engine = engine(1);
    engine.add_record(1u64, "widget").unwrap();
    engine.add_record(2, "gadget").unwrap();
    engine.add_record(3, "gizmo").unwrap();
    engine.add_facet(1, "category", "books").unwrap();
    engine.add_facet(2, "category", "electronics").unwrap();
    engine.add_facet(3, "category", "garden").unwrap();
    let cancel = CancellationToken::new();

    let mut r = engine.search(r#"category IN ["books","electronics"]"#, 0, 0, &cancel).unwrap();
    r.sort();
    assert_eq!(r, vec![1, 2]);
}

#[test]
fn unicode_min_length_one() {
    let engine = engine(1);
    engine.add_record(1u64, "こんにちは 世界").unwrap();
    engine.add_record(3, "你好 世界").unwrap();
    let cancel = CancellationToken::new();

    let mut r = engine.simple_search("世界", &[], false, 0, 0, &cancel).unwrap();
    r.sort();
    assert_eq!(r, vec![1, 3]);

    let r = engine.simple_search("こんにちは", &[], false, 0, 0, &cancel).unwrap();
    assert_eq!(r, vec![1]);
}

#[test]
fn delete_record_removes_every_triple_with_or_without_secondary() {
    for use_secondary in [true, false] {
        let dir = tempdir().unwrap();
        let config = IndexConfig::default().with_data_path(dir.path().to_path_buf()).with_secondary_index(use_secondary);
        let engine: SearchEngine<u64> = SearchEngine::open(config, TokenizerConfig::default().with_min_length(1).unwrap()).unwrap();

        engine.add_record(1, "fox cow cat").unwrap();
        engine.add_record(2, "fox cow").unwrap();
        let deleted = engine.delete_record(1).unwrap();
        assert_eq!(deleted, 3);

        let cancel = CancellationToken::new();
        assert!(engine.simple_search("cat", &[], false, 0, 0, &cancel).unwrap().is_empty());
        assert_eq!(engine.simple_search("cow", &[], false, 0, 0, &cancel).unwrap(), vec![2]);
    }
}

#[test]
fn update_record_applies_symmetric_difference() {
    let engine = engine(1);
    engine.add_record(1u64, "fox cow cat").unwrap();
    engine.update_record(1, "fox cow cat", "fox cow dog").unwrap();
    let cancel = CancellationToken::new();

    assert!(engine.simple_search("cat", &[], false, 0, 0, &cancel).unwrap().is_empty());
    assert_eq!(engine.simple_search("dog", &[], false, 0, 0, &cancel).unwrap(), vec![1]);
    assert_eq!(engine.simple_search("fox", &[], false, 0, 0, &cancel).unwrap(), vec![1]);
}

#[test]
fn pagination_respects_skip_and_limit_without_duplicates() {
    let engine = engine(1);
    for id in 0..5u64 {
        engine.add_record(id, "fox").unwrap();
    }
    let cancel = CancellationToken::new();

    let page1 = engine.simple_search("fox", &[], false, 0, 2, &cancel).unwrap();
    let page2 = engine.simple_search("fox", &[], false, 2, 2, &cancel).unwrap();
    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 2);
    assert!(page1.iter().all(|r| !page2.contains(r)));
}

#[test]
fn cancellation_returns_a_prefix_of_the_full_result() {
    let engine = engine(1);
    for id in 0..50u64 {
        engine.add_record(id, "fox").unwrap();
    }

    let full = engine.simple_search("fox", &[], false, 0, 0, &CancellationToken::new()).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let partial = engine.simple_search("fox", &[], false, 0, 0, &cancel).unwrap();
    assert!(partial.len() <= full.len());
    assert!(full.iter().take(partial.len()).eq(partial.iter()));
}
