//! End-to-end tests: crawl, index, search


use std::fs;

use test_helpers::{Fixture, paths, write_file};
use triscan::cache::ShardedStore;
use triscan::cache::query_key;
use triscan::cache::wordlist::{CACHED_WORDLISTS_FOLDER, WORDLIST_SUFFIX};
use triscan::postings::{count_path, shard_path};
use triscan::{
    DocumentKey, DocumentKeyStrategy, IndexConfig, Indexer, Md5KeyStrategy, SearchEngine,
    SearchError, parse_query,
};

#[test]
fn test_document_keys_of_indexed_files() {
    let fixture = Fixture::with_files(
        &[("a/a.java", "class Alpha {}"), ("a/b.java", "class Beta {}")],
        IndexConfig::default(),
    );

    for (key, path) in [
        ("b299050fb1b506ef9ad13e6e55787a89", "a/a.java"),
        ("f4bda76da7d5e4eafa0e0c893c00262a", "a/b.java"),
    ] {
        let metadata = fixture
            .index
            .metadata_cache()
            .load(&DocumentKey::from_key_string(key))
            .unwrap()
            .unwrap();
        assert_eq!(metadata.document_key.as_str(), key);
        assert_eq!(metadata.relative_path, path);
    }

    let mut engine = SearchEngine::new(&fixture.index);
    let results = engine.search("alpha").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document_key.as_str(), "b299050fb1b506ef9ad13e6e55787a89");
}

#[test]
fn test_index_stats() {
    let fixture = Fixture::new();
    assert_eq!(fixture.stats.indexed_documents, 4);
    assert_eq!(fixture.stats.metadata_documents, 4);
    assert!(fixture.stats.failed.is_empty());
}

#[test]
fn test_search_whole_word() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    let results = engine.search("createKeyStore").unwrap();
    assert_eq!(
        paths(&results),
        vec!["src/main/KeyStoreFactory.java", "src/test/KeyStoreFactoryTest.java"]
    );
}

#[test]
fn test_search_substring_of_word() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    let results = engine.search("reatekeystor").unwrap();
    assert_eq!(
        paths(&results),
        vec!["src/main/KeyStoreFactory.java", "src/test/KeyStoreFactoryTest.java"]
    );
}

#[test]
fn test_search_unknown_term_is_empty() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    assert!(engine.search("nonexistingword").unwrap().is_empty());
    // Too short to produce a trigram
    assert!(engine.search("ke").unwrap().is_empty());
}

#[test]
fn test_search_verifies_candidates() {
    // Both documents hold every trigram of "abcde", only one the word
    let fixture = Fixture::with_files(
        &[("a.txt", "abcde"), ("b.txt", "abcxx bcdxx cdexx")],
        IndexConfig::default(),
    );
    let mut engine = SearchEngine::new(&fixture.index);

    assert_eq!(engine.search("abcde").unwrap().len(), 1);
    assert_eq!(engine.candidates_for_term("abcde").len(), 2);
}

#[test]
fn test_preview_lines() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    let results = engine.search("createKeyStore").unwrap();
    let main = results
        .iter()
        .find(|r| r.relative_path() == Some("src/main/KeyStoreFactory.java"))
        .unwrap();
    assert_eq!(
        main.preview.get(&4).map(String::as_str),
        Some("public KeyStore createKeyStore(String type) {")
    );
}

#[test]
fn test_query_exclusion() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    let results = engine.search_query(&parse_query("keystore -junit")).unwrap();
    assert_eq!(paths(&results), vec!["scripts/load.py", "src/main/KeyStoreFactory.java"]);
}

#[test]
fn test_query_excluded_metadata() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    let results = engine.search_query(&parse_query("keystore -filetype:java")).unwrap();
    assert_eq!(paths(&results), vec!["scripts/load.py"]);

    let results = engine.search_query(&parse_query("keystore -unit-test:true")).unwrap();
    assert_eq!(paths(&results), vec!["scripts/load.py", "src/main/KeyStoreFactory.java"]);
}

#[test]
fn test_query_excluded_phrase() {
    let fixture = Fixture::with_files(
        &[
            ("a.txt", "new api here"),
            ("b.txt", "old api here"),
            ("c.txt", "old code here"),
        ],
        IndexConfig::default(),
    );
    let mut engine = SearchEngine::new(&fixture.index);

    let results = engine.search_query(&parse_query("here -\"old api\"")).unwrap();
    assert_eq!(paths(&results), vec!["a.txt", "c.txt"]);
}

#[test]
fn test_query_metadata() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    let java = engine.search_query(&parse_query("filetype:java")).unwrap();
    assert_eq!(
        paths(&java),
        vec!["src/main/KeyStoreFactory.java", "src/test/KeyStoreFactoryTest.java"]
    );

    let tests = engine.search_query(&parse_query("unit-test:true")).unwrap();
    assert_eq!(paths(&tests), vec!["src/test/KeyStoreFactoryTest.java"]);

    let python = engine.search_query(&parse_query("keystore filetype:python")).unwrap();
    assert_eq!(paths(&python), vec!["scripts/load.py"]);
}

#[test]
fn test_or_query_is_unsupported() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    let err = engine.search_query(&parse_query("keystore OR copyright")).unwrap_err();
    assert!(matches!(err, SearchError::UnsupportedQuery(_)));
}

#[test]
fn test_query_cache_serves_repeated_search() {
    let fixture = Fixture::new();
    let mut engine = SearchEngine::new(&fixture.index);

    let first = engine.search("copyright").unwrap();
    assert_eq!(paths(&first), vec!["README.md"]);
    assert!(fixture
        .index
        .query_cache()
        .is_query_result_available(&query_key("copyright")));

    // Without postings only the cache can answer
    fs::remove_dir_all(fixture.index.content_index_path()).unwrap();
    let second = SearchEngine::new(&fixture.index).search("copyright").unwrap();
    assert_eq!(second, first);
}

#[test]
fn test_unreadable_wordlist_is_not_cached() {
    let fixture = Fixture::new();
    let key = Md5KeyStrategy.generate_key("README.md");
    let wordlists = ShardedStore::new(fixture.index.root().join(CACHED_WORDLISTS_FOLDER));
    let wordlist_path = wordlists.path_for(key.as_str(), WORDLIST_SUFFIX).unwrap();
    fs::write(&wordlist_path, "{ not a wordlist").unwrap();

    let mut engine = SearchEngine::new(&fixture.index);
    assert!(engine.search("copyright").unwrap().is_empty());
    assert!(!fixture
        .index
        .query_cache()
        .is_query_result_available(&query_key("copyright")));

    // Once readable again the document is found
    fixture
        .index
        .wordlist_cache()
        .save_wordlist(&key, &["copyright".to_string(), "notice".to_string()])
        .unwrap();
    let results = SearchEngine::new(&fixture.index).search("copyright").unwrap();
    assert_eq!(paths(&results), vec!["README.md"]);
    assert!(fixture
        .index
        .query_cache()
        .is_query_result_available(&query_key("copyright")));
}

#[test]
fn test_query_cache_disabled() {
    let config = IndexConfig {
        use_query_cache: false,
        ..Default::default()
    };
    let fixture = Fixture::with_files(&[("a.txt", "copyright")], config);
    let mut engine = SearchEngine::new(&fixture.index);

    assert_eq!(engine.search("copyright").unwrap().len(), 1);
    assert!(!fixture
        .index
        .query_cache()
        .is_query_result_available(&query_key("copyright")));
}

#[test]
fn test_shard_rollover() {
    let config = IndexConfig {
        flush_threshold: 2,
        ..Default::default()
    };
    let files: Vec<(String, &str)> = (0..5).map(|i| (format!("f{}.txt", i), "common word")).collect();
    let files: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), *c)).collect();
    let fixture = Fixture::with_files(&files, config);

    let base = fixture.index.content_index_path();
    assert!(shard_path(&base, "com", 0).exists());
    assert!(shard_path(&base, "com", 1).exists());
    assert!(shard_path(&base, "com", 2).exists());
    assert!(!shard_path(&base, "com", 3).exists());
    assert!(count_path(&base, "com").exists());

    let report = fixture.index.content_reader().check_consistency("com");
    assert!(report.is_consistent());
    assert_eq!(report.declared, Some(5));
    assert_eq!(report.shards, 3);

    let mut engine = SearchEngine::new(&fixture.index);
    assert_eq!(engine.search("common").unwrap().len(), 5);
}

#[test]
fn test_reindex_replaces_postings() {
    let fixture = Fixture::with_files(
        &[("a.txt", "alpha"), ("b.txt", "alpha")],
        IndexConfig::default(),
    );
    fs::remove_file(fixture.crawl.path().join("b.txt")).unwrap();
    write_file(fixture.crawl.path(), "c.txt", "gamma");

    let stats = Indexer::new(&fixture.index).index(fixture.crawl.path(), false).unwrap();
    assert_eq!(stats.indexed_documents, 2);

    let mut engine = SearchEngine::new(&fixture.index);
    assert_eq!(paths(&engine.search("alpha").unwrap()), vec!["a.txt"]);
    assert_eq!(paths(&engine.search("gamma").unwrap()), vec!["c.txt"]);

    let report = fixture.index.content_reader().check_consistency("alp");
    assert_eq!(report.declared, Some(1));
}

#[test]
fn test_unicode_content() {
    let fixture = Fixture::with_files(
        &[("de.txt", "Größenordnung"), ("ja.txt", "喫茶店 で")],
        IndexConfig::default(),
    );
    let mut engine = SearchEngine::new(&fixture.index);

    assert_eq!(paths(&engine.search("größen").unwrap()), vec!["de.txt"]);
    assert_eq!(paths(&engine.search("喫茶店").unwrap()), vec!["ja.txt"]);
}
