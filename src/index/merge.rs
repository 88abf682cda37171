//! K-way merge of sorted runs into the postings file and lexicon
//!
//! A min-heap holds the head triple of every run. Popping the minimum yields
//! one globally `(term, docno)`-ordered stream; a change of term closes the
//! current lexicon entry. Each run contributes one buffered triple, so working
//! memory is O(runs) regardless of how many postings flow through.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::io::Write;

use tracing::debug;

use super::lexicon::LexiconWriter;
use super::postings::PostingsWriter;
use super::run::SortedRun;
use super::types::{LexiconEntry, Posting, Triple};
use crate::error::{IndexError, Result};

/// Counts produced by a merge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Distinct terms written to the lexicon
    pub term_count: u64,
    /// Postings written to the postings file
    pub posting_count: u64,
}

/// Head of one run inside the heap
struct HeapEntry {
    triple: Triple,
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple
            .key_cmp(&other.triple)
            .then_with(|| self.source.cmp(&other.source))
    }
}

/// Term whose posting list is currently being written
struct OpenTerm {
    term: String,
    offset: u64,
}

/// Merge every run into `postings` and `lexicon`
///
/// Runs must each be sorted by `(term, docno)` and no `(term, docno)` pair
/// may appear twice across runs; violations surface as `Corrupt` errors.
pub fn merge_runs<S, P, L>(
    mut runs: Vec<S>,
    postings: &mut PostingsWriter<P>,
    lexicon: &mut LexiconWriter<L>,
) -> Result<MergeSummary>
where
    S: SortedRun,
    P: Write,
    L: Write,
{
    let mut heap = BinaryHeap::with_capacity(runs.len());
    for (source, run) in runs.iter_mut().enumerate() {
        if let Some(triple) = run.next_triple()? {
            heap.push(Reverse(HeapEntry { triple, source }));
        }
    }
    debug!(runs = runs.len(), live = heap.len(), "Starting k-way merge");

    let mut summary = MergeSummary::default();
    let mut open: Option<OpenTerm> = None;

    while let Some(Reverse(HeapEntry { triple, source })) = heap.pop() {
        let Triple {
            term,
            docno,
            term_frequency,
        } = triple;

        let same_term = open.as_ref().map_or(false, |o| o.term == term);
        if !same_term {
            if let Some(prev) = open.take() {
                if prev.term.as_bytes() > term.as_bytes() {
                    return Err(IndexError::corrupt(format!(
                        "run {} is not sorted: '{}' after '{}'",
                        source, term, prev.term
                    )));
                }
                close_term(prev, postings, lexicon)?;
                summary.term_count += 1;
            }
            let offset = postings.start_posting_list();
            open = Some(OpenTerm { term, offset });
        }

        postings.add_posting(Posting::new(docno, term_frequency))?;
        summary.posting_count += 1;

        if let Some(next) = runs[source].next_triple()? {
            heap.push(Reverse(HeapEntry {
                triple: next,
                source,
            }));
        }
    }

    if let Some(prev) = open.take() {
        close_term(prev, postings, lexicon)?;
        summary.term_count += 1;
    }

    Ok(summary)
}

fn close_term<P: Write, L: Write>(
    term: OpenTerm,
    postings: &mut PostingsWriter<P>,
    lexicon: &mut LexiconWriter<L>,
) -> Result<()> {
    let count = postings.finish_posting_list();
    lexicon.add(&LexiconEntry {
        term: term.term,
        offset: term.offset,
        count,
    })
}
