pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod search;
pub mod tokenizer;

pub use config::{Bm25Params, IndexerConfig, DEFAULT_CHUNK_LIMIT};
pub use corpus::{CorpusRecord, SqliteCorpus};
pub use error::{IndexError, Result};
pub use index::{build_index, BuildSummary, DocNo, IndexBuilder, IndexMeta};
pub use search::{QueryMode, SearchHit, SearchOutcome, Searcher};
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
