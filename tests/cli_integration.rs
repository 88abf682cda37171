use std::path::Path;
use std::process::{Command, Output};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tempfile::TempDir;

use corpus_index::index::{files, DocNo, Posting};
use corpus_index::{build_index, CorpusRecord, IndexerConfig, Searcher};

fn searcher(index: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_searcher"))
        .arg("--index")
        .arg(index)
        .args(args)
        .env_remove("CORPUS_INDEX_DIR")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn cat_index() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let records = vec![
        Ok(CorpusRecord::new("doc0", Some(b"The Cat Sat".to_vec()), "/p/0")),
        Ok(CorpusRecord::new("doc1", Some(b"cat hat".to_vec()), "/p/1")),
    ];
    build_index(records, IndexerConfig::new(tmp.path(), "cli.db")).unwrap();
    tmp
}

#[test]
fn test_keyword_output() {
    let index = cat_index();
    let out = searcher(index.path(), &["--mode", "keyword", "--limit", "10", "--query", "cat"]);

    assert!(out.status.success());
    assert_eq!(stdout(&out), "doc0\t/p/0\ndoc1\t/p/1\n");
}

#[test]
fn test_full_output() {
    let index = cat_index();
    let out = searcher(index.path(), &["--mode", "full", "--query", "cat hat"]);

    assert!(out.status.success());
    let text = stdout(&out);
    let fields: Vec<&str> = text.trim_end().split('\t').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(&fields[1..], &["doc1", "/p/1"]);

    let score: f64 = fields[0].parse().unwrap();
    assert!(score > 0.0);
    assert_eq!(fields[0].split('.').nth(1).map(str::len), Some(6));
}

#[test]
fn test_no_results_and_invalid_query_exit_zero() {
    let index = cat_index();

    let out = searcher(index.path(), &["--mode", "full", "--query", "zzz"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "No results.\n");

    let out = searcher(index.path(), &["--query", "!!!"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "Invalid query: no searchable terms.\n");
}

#[test]
fn test_argument_errors_exit_one() {
    let index = cat_index();

    for args in [
        &["--mode", "fuzzy", "--query", "cat"][..],
        &["--query", "   "][..],
        &["--limit", "0", "--query", "cat"][..],
        &[][..],
    ] {
        let out = searcher(index.path(), args);
        assert_eq!(out.status.code(), Some(1), "args {:?}", args);
        assert!(out.stdout.is_empty());
    }
}

#[test]
fn test_missing_index_exits_one() {
    let tmp = TempDir::new().unwrap();
    let out = searcher(&tmp.path().join("absent"), &["--query", "cat"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

async fn create_corpus(path: &Path) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await.unwrap();

    sqlx::query("CREATE TABLE documents_fts (id INTEGER, content TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("CREATE TABLE documents_meta (id INTEGER PRIMARY KEY, file_path TEXT)")
        .execute(&pool)
        .await
        .unwrap();

    let rows: [(i64, Option<&str>, &str); 3] = [
        (10, Some("The Cat Sat"), "/docs/10.txt"),
        (11, Some("cat hat"), "/docs/11.txt"),
        (12, None, "/docs/12.txt"),
    ];
    for (id, content, path) in rows {
        sqlx::query("INSERT INTO documents_fts (id, content) VALUES (?, ?)")
            .bind(id)
            .bind(content)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO documents_meta (id, file_path) VALUES (?, ?)")
            .bind(id)
            .bind(path)
            .execute(&pool)
            .await
            .unwrap();
    }

    // Latin-1 text and a BLOB: both must index rather than abort the build
    sqlx::query(
        "INSERT INTO documents_fts (id, content) VALUES \
         (13, CAST(X'636166E920686174' AS TEXT)), (14, X'ff00fe')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO documents_meta (id, file_path) VALUES (13, '/docs/13.txt'), (14, '/docs/14.bin')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
}

#[tokio::test]
async fn test_indexer_builds_from_sqlite() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("corpus.db");
    let out_dir = tmp.path().join("index");
    create_corpus(&db).await;

    let status = Command::new(env!("CARGO_BIN_EXE_indexer"))
        .arg("--db")
        .arg(&db)
        .arg("--out")
        .arg(&out_dir)
        .args(["--chunk", "2"])
        .status()
        .unwrap();
    assert!(status.success());

    for name in files::ALL {
        assert!(out_dir.join(name).exists(), "missing {}", name);
    }
    assert!(!out_dir.join(files::RUN_DIR).exists());

    let mut searcher = Searcher::open(&out_dir).unwrap();
    assert_eq!(searcher.document_count(), 5);

    // NULL content keeps its docno with zero length
    assert_eq!(searcher.document(DocNo(2)).unwrap().external_id, "12");
    assert_eq!(searcher.doc_length(DocNo(2)), Some(0));

    // Non-UTF-8 bytes are separators: "caf\xE9 hat" gives "caf" and "hat"
    assert_eq!(searcher.document(DocNo(3)).unwrap().external_id, "13");
    assert_eq!(searcher.doc_length(DocNo(3)), Some(2));
    assert_eq!(
        searcher.postings("hat").unwrap(),
        vec![Posting::new(DocNo(1), 1), Posting::new(DocNo(3), 1)]
    );

    // A BLOB without token bytes is an empty document
    assert_eq!(searcher.document(DocNo(4)).unwrap().path, "/docs/14.bin");
    assert_eq!(searcher.doc_length(DocNo(4)), Some(0));

    let out = Command::new(env!("CARGO_BIN_EXE_searcher"))
        .arg("--index")
        .arg(&out_dir)
        .args(["--query", "cat"])
        .output()
        .unwrap();
    assert_eq!(stdout(&out), "10\t/docs/10.txt\n11\t/docs/11.txt\n");
}

#[test]
fn test_indexer_rejects_missing_db_and_zero_chunk() {
    let tmp = TempDir::new().unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_indexer"))
        .arg("--db")
        .arg(tmp.path().join("absent.db"))
        .arg("--out")
        .arg(tmp.path().join("out"))
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    let status = Command::new(env!("CARGO_BIN_EXE_indexer"))
        .arg("--db")
        .arg(tmp.path().join("absent.db"))
        .args(["--chunk", "0"])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
