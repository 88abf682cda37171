//! Query side of the index
//!
//! `Searcher` loads the lexicon, docstore tables and metadata of a finished
//! index and answers boolean-AND queries, optionally ranked by BM25.

mod executor;
mod searcher;

pub use executor::{collect_top_k, intersect, score_candidates, TermPostings};
pub use searcher::{QueryMode, SearchHit, SearchOutcome, Searcher};
