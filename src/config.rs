use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{IndexError, Result};

/// Default number of (term, doc, count) entries buffered before a run is spilled
pub const DEFAULT_CHUNK_LIMIT: usize = 1_000_000;

/// BM25 parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation parameter
    pub k1: f64,
    /// Length normalization parameter
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Index build configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Directory receiving the finished artifacts
    pub out_dir: PathBuf,
    /// Identifier of the corpus source, recorded in the index metadata
    pub source_db: String,
    /// Entries buffered in memory before a sorted run is flushed
    pub chunk_limit: usize,
    /// Keep the intermediate run files after a successful merge
    pub keep_runs: bool,
}

impl IndexerConfig {
    /// Create a new build configuration with the default chunk limit
    pub fn new(out_dir: impl Into<PathBuf>, source_db: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            source_db: source_db.into(),
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            keep_runs: false,
        }
    }

    /// Set the number of buffered entries per run
    pub fn with_chunk_limit(mut self, chunk_limit: usize) -> Self {
        self.chunk_limit = chunk_limit;
        self
    }

    /// Keep or remove the run directory after the merge
    pub fn with_keep_runs(mut self, keep_runs: bool) -> Self {
        self.keep_runs = keep_runs;
        self
    }

    /// Directory holding the sorted runs while a build is in progress
    pub fn run_dir(&self) -> PathBuf {
        self.out_dir.join(crate::index::files::RUN_DIR)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_limit == 0 {
            return Err(IndexError::InvalidArgument(
                "chunk limit must be at least 1".to_string(),
            ));
        }
        if self.out_dir.as_os_str().is_empty() {
            return Err(IndexError::InvalidArgument(
                "output directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let params = Bm25Params::default();
        assert_eq!(params.k1, 1.2);
        assert_eq!(params.b, 0.75);

        let config = IndexerConfig::new("./index", "corpus.db");
        assert_eq!(config.chunk_limit, DEFAULT_CHUNK_LIMIT);
        assert!(!config.keep_runs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_indexer_config_builder() {
        let config = IndexerConfig::new("./index", "corpus.db")
            .with_chunk_limit(64)
            .with_keep_runs(true);

        assert_eq!(config.chunk_limit, 64);
        assert!(config.keep_runs);
        assert_eq!(config.run_dir(), PathBuf::from("./index/tmp"));
    }

    #[test]
    fn test_zero_chunk_limit_rejected() {
        let config = IndexerConfig::new("./index", "corpus.db").with_chunk_limit(0);
        assert!(matches!(
            config.validate(),
            Err(IndexError::InvalidArgument(_))
        ));
    }
}
