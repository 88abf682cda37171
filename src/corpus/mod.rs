//! Corpus source: `(id, content, path)` rows read from the sqlite database
//! produced by the document ingestion pipeline

use std::path::Path;

use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;

use crate::error::Result;

/// Rows in stable insertion order; ids are normalized to text
const CORPUS_QUERY: &str = "SELECT CAST(f.id AS TEXT), f.content, m.file_path \
     FROM documents_fts f JOIN documents_meta m ON f.id = m.id \
     ORDER BY f.rowid";

/// One document as delivered by a corpus source
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorpusRecord {
    pub id: String,
    /// Raw text bytes, not necessarily UTF-8; `None` when the source has no
    /// content for the document
    pub content: Option<Vec<u8>>,
    pub path: String,
}

impl CorpusRecord {
    pub fn new(id: impl Into<String>, content: Option<Vec<u8>>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content,
            path: path.into(),
        }
    }
}

/// Read-only handle on a corpus database
pub struct SqliteCorpus {
    pool: SqlitePool,
}

impl SqliteCorpus {
    /// Open an existing database; a missing file is an error
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        debug!(db = %path.display(), "Corpus database opened");
        Ok(Self { pool })
    }

    /// Stream every record in order, stopping at the first error from the
    /// database or from `f`
    ///
    /// Returns the number of records delivered.
    pub async fn for_each_record<F>(&self, mut f: F) -> Result<u64>
    where
        F: FnMut(CorpusRecord) -> Result<()>,
    {
        let mut rows = sqlx::query(CORPUS_QUERY).fetch(&self.pool);
        let mut delivered = 0u64;

        while let Some(row) = rows.try_next().await? {
            // Bytes decode from TEXT and BLOB alike, whatever their encoding
            let id: Option<Vec<u8>> = row.try_get(0)?;
            let content: Option<Vec<u8>> = row.try_get(1)?;
            let path: Option<Vec<u8>> = row.try_get(2)?;

            f(CorpusRecord {
                id: lossy_text(id),
                content,
                path: lossy_text(path),
            })?;
            delivered += 1;
        }

        Ok(delivered)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn lossy_text(bytes: Option<Vec<u8>>) -> String {
    match bytes {
        Some(bytes) => String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexError;
    use tempfile::TempDir;

    async fn create_corpus(path: &Path, rows: &[(i64, Option<&str>, Option<&str>)]) {
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

        for (id, content, file_path) in rows {
            sqlx::query("INSERT INTO documents_fts (id, content) VALUES (?, ?)")
                .bind(*id)
                .bind(*content)
                .execute(&pool)
                .await
                .unwrap();
            sqlx::query("INSERT INTO documents_meta (id, file_path) VALUES (?, ?)")
                .bind(*id)
                .bind(*file_path)
                .execute(&pool)
                .await
                .unwrap();
        }
        pool.close().await;
    }

    #[tokio::test]
    async fn test_reads_rows_in_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let db = tmp.path().join("corpus.db");
        create_corpus(
            &db,
            &[
                (42, Some("The Cat Sat"), Some("/docs/a.txt")),
                (7, None, Some("/docs/b.txt")),
                (9, Some("cat hat"), None),
            ],
        )
        .await;

        let corpus = SqliteCorpus::open(&db).await.unwrap();
        let mut records = Vec::new();
        let count = corpus
            .for_each_record(|r| {
                records.push(r);
                Ok(())
            })
            .await
            .unwrap();
        corpus.close().await;

        assert_eq!(count, 3);
        assert_eq!(
            records,
            vec![
                CorpusRecord::new("42", Some(b"The Cat Sat".to_vec()), "/docs/a.txt"),
                CorpusRecord::new("7", None, "/docs/b.txt"),
                CorpusRecord::new("9", Some(b"cat hat".to_vec()), ""),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_utf8_and_blob_content_is_delivered_as_bytes() {
        let tmp = TempDir::new().unwrap();
        let db = tmp.path().join("corpus.db");
        create_corpus(&db, &[(1, Some("cat"), Some("/a"))]).await;

        let options = SqliteConnectOptions::new().filename(&db);
        let pool = SqlitePool::connect_with(options).await.unwrap();
        // Latin-1 "café hat" stored as TEXT, then a BLOB, then a Latin-1 path
        sqlx::query(
            "INSERT INTO documents_fts (id, content) VALUES \
             (2, CAST(X'636166E920686174' AS TEXT)), (3, X'4361740068617421'), (4, 'dog')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO documents_meta (id, file_path) VALUES \
             (2, '/b'), (3, '/c'), (4, CAST(X'2F64E9' AS TEXT))",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;

        let corpus = SqliteCorpus::open(&db).await.unwrap();
        let mut records = Vec::new();
        corpus
            .for_each_record(|r| {
                records.push(r);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[1].content.as_deref(), Some(&b"caf\xE9 hat"[..]));
        assert_eq!(records[2].content.as_deref(), Some(&b"Cat\0hat!"[..]));
        assert_eq!(records[3].path, "/d\u{FFFD}");

        let tokenizer = crate::Tokenizer::new();
        let freq = tokenizer.compute_term_frequencies_bytes(records[1].content.as_deref().unwrap());
        assert_eq!(freq.get("caf"), Some(1));
        assert_eq!(freq.get("hat"), Some(1));
    }

    #[tokio::test]
    async fn test_callback_error_stops_iteration() {
        let tmp = TempDir::new().unwrap();
        let db = tmp.path().join("corpus.db");
        create_corpus(&db, &[(1, Some("a"), Some("/a")), (2, Some("b"), Some("/b"))]).await;

        let corpus = SqliteCorpus::open(&db).await.unwrap();
        let mut seen = 0;
        let err = corpus
            .for_each_record(|_| {
                seen += 1;
                Err(IndexError::InvalidArgument("stop".to_string()))
            })
            .await
            .unwrap_err();

        assert_eq!(seen, 1);
        assert!(matches!(err, IndexError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_missing_database_fails() {
        let tmp = TempDir::new().unwrap();
        let err = SqliteCorpus::open(&tmp.path().join("absent.db"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::Corpus(_)));
    }
}
