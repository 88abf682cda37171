//! Disk-resident inverted index
//!
//! The index is built once by an external sort-merge and then read-only.
//!
//! # Architecture
//!
//! - `IndexBuilder`: streams documents, spills sorted runs, merges them
//! - `RunWriter` / `RunReader`: sorted `(term, docno, tf)` spill files
//! - `merge_runs`: k-way heap merge producing postings and lexicon
//! - `Lexicon`: sorted term directory, fully resident at query time
//! - `PostingsReader`: delta-decodes one term's posting list
//! - `DocStoreReader`: external ids, paths and lengths by `DocNo`

mod codec;
mod docstore;
mod lexicon;
mod merge;
mod postings;
mod run;
mod statistics;
mod types;
mod writer;

pub use codec::{decode_varint, encode_varint, MAX_VARINT_LEN};
pub use docstore::{DocStoreReader, DocStoreSummary, DocStoreWriter};
pub use lexicon::{Lexicon, LexiconWriter};
pub use merge::{merge_runs, MergeSummary};
pub use postings::{PostingsReader, PostingsWriter};
pub use run::{write_run, RunReader, RunWriter, SortedRun, VecRun};
pub use statistics::{Bm25Scorer, IndexMeta};
pub use types::{DocNo, DocRecord, LexiconEntry, Posting, Triple};
pub use writer::{build_index, BuildSummary, IndexBuilder};

/// Artifact file names inside an index directory
pub mod files {
    pub const DOCSTORE_DATA: &str = "docstore_data.bin";
    pub const DOCSTORE_OFFSETS: &str = "docstore_offsets.bin";
    pub const DOCSTORE_DOCLEN: &str = "docstore_doclen.bin";
    pub const POSTINGS: &str = "postings.bin";
    pub const LEXICON: &str = "lexicon.bin";
    /// Written last; its presence marks a completed build
    pub const INDEX_META: &str = "index_meta.json";

    /// Run directory under the output directory
    pub const RUN_DIR: &str = "tmp";

    pub const ALL: [&str; 6] = [
        DOCSTORE_DATA,
        DOCSTORE_OFFSETS,
        DOCSTORE_DOCLEN,
        POSTINGS,
        LEXICON,
        INDEX_META,
    ];
}
