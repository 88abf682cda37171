//! Corpus statistics for BM25 scoring
//!
//! The index stores `document_count`, `avg_doc_len` and the source identifier
//! in `index_meta.json`; per-document lengths live in the docstore.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::Bm25Params;
use crate::error::Result;

/// Aggregate metadata written once per build
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    #[serde(alias = "doc_count")]
    pub document_count: u64,
    /// Total tokens / document count (0 for an empty corpus)
    pub avg_doc_len: f64,
    /// Identifier of the corpus the index was built from
    pub source_db: String,
}

impl IndexMeta {
    pub fn from_totals(document_count: u64, total_tokens: u64, source_db: impl Into<String>) -> Self {
        let avg_doc_len = if document_count > 0 {
            total_tokens as f64 / document_count as f64
        } else {
            0.0
        };

        Self {
            document_count,
            avg_doc_len,
            source_db: source_db.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }
}

/// BM25 scorer bound to one index's statistics
#[derive(Clone, Copy, Debug)]
pub struct Bm25Scorer {
    params: Bm25Params,
    total_docs: f64,
    avgdl: f64,
}

impl Bm25Scorer {
    pub fn new(meta: &IndexMeta, params: Bm25Params) -> Self {
        // An empty corpus has no average; any positive value keeps the norm finite
        let avgdl = if meta.avg_doc_len > 0.0 {
            meta.avg_doc_len
        } else {
            1.0
        };

        Self {
            params,
            total_docs: meta.document_count as f64,
            avgdl,
        }
    }

    pub fn params(&self) -> &Bm25Params {
        &self.params
    }

    pub fn avgdl(&self) -> f64 {
        self.avgdl
    }

    /// IDF with the Robertson-Sparck-Jones formula, shifted to stay positive
    pub fn idf(&self, df: u32) -> f64 {
        let n = self.total_docs;
        let df = df as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Contribution of one term to one document, given the term's IDF
    pub fn term_score(&self, idf: f64, tf: u32, doc_len: u32) -> f64 {
        let tf = tf as f64;
        let k1 = self.params.k1;
        let b = self.params.b;

        // Length normalization
        let norm = 1.0 - b + b * (doc_len as f64 / self.avgdl);

        idf * (tf * (k1 + 1.0)) / (tf + k1 * norm)
    }

    /// Compute BM25 score for a term occurrence
    pub fn score(&self, tf: u32, df: u32, doc_len: u32) -> f64 {
        self.term_score(self.idf(df), tf, doc_len)
    }
}
