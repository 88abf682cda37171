use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use super::executor::{collect_top_k, intersect, score_candidates, TermPostings};
use crate::config::Bm25Params;
use crate::error::{IndexError, Result};
use crate::index::{
    files, Bm25Scorer, DocNo, DocRecord, DocStoreReader, IndexMeta, Lexicon, Posting,
    PostingsReader,
};
use crate::tokenizer::Tokenizer;

/// How a query is answered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryMode {
    /// Boolean AND, ascending document order, unranked
    #[default]
    Keyword,
    /// Boolean AND candidates ranked by BM25
    Full,
}

impl FromStr for QueryMode {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keyword" => Ok(QueryMode::Keyword),
            "full" => Ok(QueryMode::Full),
            other => Err(IndexError::InvalidArgument(format!(
                "unknown mode '{}', expected 'keyword' or 'full'",
                other
            ))),
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::Keyword => f.write_str("keyword"),
            QueryMode::Full => f.write_str("full"),
        }
    }
}

/// One matching document
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub docno: DocNo,
    pub external_id: String,
    pub path: String,
    /// BM25 score, present in `full` mode only
    pub score: Option<f64>,
}

/// Result of a query
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// At least one hit, in result order
    Matches(Vec<SearchHit>),
    /// No document contains every query term
    NoResults,
    /// The query contains no searchable terms
    InvalidQuery,
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Matches(hits) => hits,
            _ => &[],
        }
    }
}

/// Read-only view over a finished index directory
pub struct Searcher {
    dir: PathBuf,
    meta: IndexMeta,
    lexicon: Lexicon,
    postings: PostingsReader<BufReader<File>>,
    docstore: DocStoreReader,
    scorer: Bm25Scorer,
    tokenizer: Tokenizer,
}

impl Searcher {
    /// Load an index with the default BM25 parameters
    pub fn open(dir: &Path) -> Result<Self> {
        Self::open_with_params(dir, Bm25Params::default())
    }

    pub fn open_with_params(dir: &Path, params: Bm25Params) -> Result<Self> {
        let meta = IndexMeta::load(&dir.join(files::INDEX_META))?;
        let lexicon = Lexicon::load(&dir.join(files::LEXICON))?;
        let docstore = DocStoreReader::open(dir)?;

        if docstore.len() as u64 != meta.document_count {
            return Err(IndexError::corrupt(format!(
                "metadata lists {} documents but the docstore holds {}",
                meta.document_count,
                docstore.len()
            )));
        }

        let postings_file = File::open(dir.join(files::POSTINGS))?;
        let postings_len = postings_file.metadata()?.len();
        if let Some(entry) = lexicon.iter().find(|e| e.offset > postings_len) {
            return Err(IndexError::corrupt(format!(
                "postings offset {} of '{}' is past the end of the postings file",
                entry.offset, entry.term
            )));
        }

        // Length was bounded by DocStoreReader::open
        let doc_count = docstore.len() as u32;
        let postings = PostingsReader::new(BufReader::new(postings_file), doc_count);
        let scorer = Bm25Scorer::new(&meta, params);

        debug!(
            dir = %dir.display(),
            docs = doc_count,
            terms = lexicon.len(),
            "Index loaded"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            meta,
            lexicon,
            postings,
            docstore,
            scorer,
            tokenizer: Tokenizer::new(),
        })
    }

    /// Answer a conjunctive query
    ///
    /// Every query term must occur in a document for it to match, in both
    /// modes. `full` mode only re-ranks that candidate set.
    pub fn search(&mut self, query: &str, mode: QueryMode, limit: usize) -> Result<SearchOutcome> {
        let terms = self.tokenizer.unique_terms(query);
        if terms.is_empty() {
            return Ok(SearchOutcome::InvalidQuery);
        }
        if limit == 0 {
            return Ok(SearchOutcome::NoResults);
        }

        let mut entries = Vec::with_capacity(terms.len());
        for term in &terms {
            match self.lexicon.get(term) {
                Some(entry) => entries.push(entry),
                None => {
                    debug!(term = %term, "Query term not in lexicon");
                    return Ok(SearchOutcome::NoResults);
                }
            }
        }

        let mut lists = Vec::with_capacity(entries.len());
        for entry in entries {
            lists.push(TermPostings {
                term: entry.term.clone(),
                df: entry.count,
                postings: self.postings.read_postings(entry)?,
            });
        }

        let candidates = intersect(&lists);
        debug!(
            mode = %mode,
            terms = lists.len(),
            candidates = candidates.len(),
            "Query matched"
        );
        if candidates.is_empty() {
            return Ok(SearchOutcome::NoResults);
        }

        let ranked: Vec<(DocNo, Option<f64>)> = match mode {
            QueryMode::Keyword => candidates.into_iter().take(limit).map(|d| (d, None)).collect(),
            QueryMode::Full => {
                let scored =
                    score_candidates(&candidates, &lists, &self.scorer, self.docstore.doc_lengths());
                collect_top_k(scored, limit)
                    .into_iter()
                    .map(|(d, s)| (d, Some(s)))
                    .collect()
            }
        };

        let mut hits = Vec::with_capacity(ranked.len());
        for (docno, score) in ranked {
            let DocRecord { external_id, path } = self.docstore.get(docno)?;
            hits.push(SearchHit {
                docno,
                external_id,
                path,
                score,
            });
        }
        Ok(SearchOutcome::Matches(hits))
    }

    /// Index directory this searcher reads
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Decoded postings of a term, empty if the term is unknown
    pub fn postings(&mut self, term: &str) -> Result<Vec<Posting>> {
        match self.lexicon.get(term) {
            Some(entry) => self.postings.read_postings(entry),
            None => Ok(Vec::new()),
        }
    }

    pub fn document(&mut self, docno: DocNo) -> Result<DocRecord> {
        self.docstore.get(docno)
    }

    pub fn doc_length(&self, docno: DocNo) -> Option<u32> {
        self.docstore.doc_length(docno)
    }

    pub fn document_count(&self) -> u64 {
        self.meta.document_count
    }
}
