//! Index builder
//!
//! Phase A streams the corpus: every document gets the next `DocNo`, its
//! record and token count go straight to the docstore, and one triple per
//! distinct term goes to the run writer. Phase B merges the spilled runs into
//! `postings.bin` and `lexicon.bin`. Metadata is written last, so a directory
//! with `index_meta.json` holds a finished build.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind};
use std::time::Instant;

use tracing::{debug, info};

use super::docstore::DocStoreWriter;
use super::files;
use super::lexicon::LexiconWriter;
use super::merge::merge_runs;
use super::postings::PostingsWriter;
use super::run::{RunReader, RunWriter};
use super::statistics::IndexMeta;
use super::types::{DocNo, Triple};
use crate::config::IndexerConfig;
use crate::corpus::CorpusRecord;
use crate::error::Result;
use crate::tokenizer::Tokenizer;

/// Documents between progress log lines
const PROGRESS_INTERVAL: u64 = 5_000;

/// Outcome of a completed build
#[derive(Clone, Debug, PartialEq)]
pub struct BuildSummary {
    pub document_count: u64,
    pub term_count: u64,
    pub posting_count: u64,
    pub run_count: usize,
    pub total_tokens: u64,
    pub avg_doc_len: f64,
}

/// Streaming index builder
pub struct IndexBuilder {
    config: IndexerConfig,
    tokenizer: Tokenizer,
    docstore: DocStoreWriter,
    runs: RunWriter,
    started: Instant,
}

impl IndexBuilder {
    /// Prepare the output and run directories and open the docstore
    ///
    /// Artifacts of an earlier build in `out_dir` are removed first, so a
    /// failed rebuild never leaves a loadable index behind.
    pub fn create(config: IndexerConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.out_dir)?;
        remove_previous_build(&config)?;
        let run_dir = config.run_dir();
        fs::create_dir_all(&run_dir)?;

        let docstore = DocStoreWriter::create(&config.out_dir)?;
        let runs = RunWriter::new(run_dir, config.chunk_limit);

        info!(
            out = %config.out_dir.display(),
            chunk_limit = config.chunk_limit,
            "Index build started"
        );

        Ok(Self {
            config,
            tokenizer: Tokenizer::new(),
            docstore,
            runs,
            started: Instant::now(),
        })
    }

    /// Index one document
    ///
    /// Absent content indexes as an empty document so numbering stays dense.
    pub fn add_document(&mut self, id: &str, content: Option<&[u8]>, path: &str) -> Result<DocNo> {
        let freq = content
            .map(|bytes| self.tokenizer.compute_term_frequencies_bytes(bytes))
            .unwrap_or_default();

        let docno = self.docstore.append(id, path, freq.token_count)?;
        for (term, tf) in freq.counts {
            self.runs.push(Triple::new(term, docno, tf))?;
        }

        let indexed = self.docstore.document_count();
        if indexed % PROGRESS_INTERVAL == 0 {
            info!(docs = indexed, runs = self.runs.run_count(), "Indexed documents");
        }
        Ok(docno)
    }

    /// Index a record from a corpus source
    pub fn add_record(&mut self, record: &CorpusRecord) -> Result<DocNo> {
        self.add_document(&record.id, record.content.as_deref(), &record.path)
    }

    /// Documents indexed so far
    pub fn document_count(&self) -> u64 {
        self.docstore.document_count()
    }

    /// Spill the last run, merge, and write the remaining artifacts
    pub fn finish(self) -> Result<BuildSummary> {
        let IndexBuilder {
            config,
            docstore,
            runs,
            started,
            ..
        } = self;

        let run_paths = runs.finish()?;
        let store = docstore.finish()?;
        debug!(
            docs = store.document_count,
            runs = run_paths.len(),
            "Phase A complete"
        );

        let readers = run_paths
            .iter()
            .map(|p| RunReader::open(p))
            .collect::<Result<Vec<_>>>()?;

        let out = &config.out_dir;
        let mut postings =
            PostingsWriter::new(BufWriter::new(File::create(out.join(files::POSTINGS))?));
        let mut lexicon =
            LexiconWriter::new(BufWriter::new(File::create(out.join(files::LEXICON))?));

        let merged = merge_runs(readers, &mut postings, &mut lexicon)?;
        postings.finish()?;
        lexicon.finish()?;

        let meta = IndexMeta::from_totals(
            store.document_count,
            store.total_tokens,
            config.source_db.clone(),
        );
        meta.write(&out.join(files::INDEX_META))?;

        if !config.keep_runs {
            fs::remove_dir_all(config.run_dir())?;
        }

        let summary = BuildSummary {
            document_count: store.document_count,
            term_count: merged.term_count,
            posting_count: merged.posting_count,
            run_count: run_paths.len(),
            total_tokens: store.total_tokens,
            avg_doc_len: meta.avg_doc_len,
        };

        info!(
            docs = summary.document_count,
            terms = summary.term_count,
            postings = summary.posting_count,
            runs = summary.run_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Index build complete"
        );
        Ok(summary)
    }
}

fn remove_previous_build(config: &IndexerConfig) -> Result<()> {
    // Metadata first: without it the directory no longer reads as complete
    let mut names = files::ALL;
    names.sort_by_key(|&name| name != files::INDEX_META);
    for name in names {
        match fs::remove_file(config.out_dir.join(name)) {
            Ok(()) => debug!(file = name, "Removed artifact of previous build"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    match fs::remove_dir_all(config.run_dir()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Build a complete index from an iterator of corpus records
///
/// The first failing record aborts the build.
pub fn build_index<I>(records: I, config: IndexerConfig) -> Result<BuildSummary>
where
    I: IntoIterator<Item = Result<CorpusRecord>>,
{
    let mut builder = IndexBuilder::create(config)?;
    for record in records {
        builder.add_record(&record?)?;
    }
    builder.finish()
}
