use std::fs;
use std::path::Path;

use tempfile::TempDir;

use corpus_index::index::files;
use corpus_index::{
    build_index, CorpusRecord, IndexerConfig, QueryMode, SearchOutcome, Searcher,
};

fn record(id: &str, content: &str, path: &str) -> corpus_index::Result<CorpusRecord> {
    Ok(CorpusRecord::new(id, Some(content.as_bytes().to_vec()), path))
}

fn cat_corpus() -> Vec<corpus_index::Result<CorpusRecord>> {
    vec![
        record("doc0", "The Cat Sat", "/corpus/doc0.txt"),
        record("doc1", "cat hat", "/corpus/doc1.txt"),
    ]
}

fn generated_corpus(n: usize) -> Vec<corpus_index::Result<CorpusRecord>> {
    const WORDS: [&str; 12] = [
        "alpha", "Beta", "gamma", "delta", "rust", "index", "merge", "heap", "42", "x9",
        "Posting", "lexicon",
    ];
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    (0..n)
        .map(|i| {
            let mut words = Vec::new();
            let len = 3 + i % 11;
            for _ in 0..len {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                words.push(WORDS[(state >> 33) as usize % WORDS.len()]);
            }
            record(
                &format!("id-{}", i),
                &words.join(if i % 2 == 0 { " " } else { ", " }),
                &format!("/gen/{}.txt", i),
            )
        })
        .collect()
}

fn build(dir: &Path, records: Vec<corpus_index::Result<CorpusRecord>>, chunk: usize) {
    let config = IndexerConfig::new(dir, "golden.db").with_chunk_limit(chunk);
    build_index(records, config).unwrap();
}

fn lines(outcome: &SearchOutcome) -> Vec<(String, String)> {
    outcome
        .hits()
        .iter()
        .map(|h| (h.external_id.clone(), h.path.clone()))
        .collect()
}

#[test]
fn golden_keyword_returns_both_cat_documents() {
    let tmp = TempDir::new().unwrap();
    build(tmp.path(), cat_corpus(), 1_000);

    let mut searcher = Searcher::open(tmp.path()).unwrap();
    let outcome = searcher.search("cat", QueryMode::Keyword, 10).unwrap();

    assert_eq!(
        lines(&outcome),
        vec![
            ("doc0".to_string(), "/corpus/doc0.txt".to_string()),
            ("doc1".to_string(), "/corpus/doc1.txt".to_string()),
        ]
    );
}

#[test]
fn golden_full_mode_is_conjunctive() {
    let tmp = TempDir::new().unwrap();
    build(tmp.path(), cat_corpus(), 1_000);

    let mut searcher = Searcher::open(tmp.path()).unwrap();
    let outcome = searcher.search("cat hat", QueryMode::Full, 10).unwrap();

    let hits = outcome.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].external_id, "doc1");
    assert!(hits[0].score.unwrap() > 0.0);
}

#[test]
fn golden_unknown_term_has_no_results() {
    let tmp = TempDir::new().unwrap();
    build(tmp.path(), cat_corpus(), 1_000);

    let mut searcher = Searcher::open(tmp.path()).unwrap();
    for mode in [QueryMode::Keyword, QueryMode::Full] {
        assert_eq!(
            searcher.search("zzz", mode, 10).unwrap(),
            SearchOutcome::NoResults
        );
    }
}

#[test]
fn golden_chunk_size_does_not_change_artifacts() {
    let small = TempDir::new().unwrap();
    let large = TempDir::new().unwrap();
    build(small.path(), generated_corpus(50), 1);
    build(large.path(), generated_corpus(50), 10_000);

    for name in files::ALL {
        let a = fs::read(small.path().join(name)).unwrap();
        let b = fs::read(large.path().join(name)).unwrap();
        assert_eq!(a, b, "{} differs between chunk sizes", name);
    }
}

#[test]
fn golden_rebuild_is_byte_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    build(first.path(), generated_corpus(30), 7);
    build(second.path(), generated_corpus(30), 7);

    for name in [files::LEXICON, files::POSTINGS] {
        assert_eq!(
            fs::read(first.path().join(name)).unwrap(),
            fs::read(second.path().join(name)).unwrap()
        );
    }
}

#[test]
fn golden_meta_file_contents() {
    let tmp = TempDir::new().unwrap();
    build(tmp.path(), cat_corpus(), 1_000);

    let text = fs::read_to_string(tmp.path().join(files::INDEX_META)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["document_count"], 2);
    assert_eq!(value["avg_doc_len"], 2.5);
    assert_eq!(value["source_db"], "golden.db");
}
