//! Postings format
//!
//! Each term owns one contiguous run of `(doc delta, term frequency)` pairs,
//! both varint-encoded. The first delta of a run is the raw document number;
//! later deltas are gaps from the previous document of the same term, so they
//! are always positive.

use std::io::{Read, Seek, SeekFrom, Write};

use super::codec::{read_varint, write_varint, CountingWriter};
use super::types::{DocNo, LexiconEntry, Posting};
use crate::error::{IndexError, Result};

/// Writer for posting lists
pub struct PostingsWriter<W: Write> {
    out: CountingWriter<W>,
    /// Last docno written for the open list
    prev_docno: Option<DocNo>,
    /// Postings in the open list
    count: u32,
}

impl<W: Write> PostingsWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: CountingWriter::new(out),
            prev_docno: None,
            count: 0,
        }
    }

    /// Start writing a new posting list and return its byte offset
    pub fn start_posting_list(&mut self) -> u64 {
        self.prev_docno = None;
        self.count = 0;
        self.out.position()
    }

    /// Add a posting to the current list
    ///
    /// Document numbers must be strictly increasing within a list.
    pub fn add_posting(&mut self, posting: Posting) -> Result<()> {
        let delta = match self.prev_docno {
            None => posting.docno.as_u32(),
            Some(prev) if posting.docno > prev => posting.docno.as_u32() - prev.as_u32(),
            Some(prev) => {
                return Err(IndexError::corrupt(format!(
                    "posting {} written after {} in the same list",
                    posting.docno, prev
                )))
            }
        };
        write_varint(&mut self.out, delta as u64)?;
        write_varint(&mut self.out, posting.term_frequency as u64)?;
        self.prev_docno = Some(posting.docno);
        self.count = self
            .count
            .checked_add(1)
            .ok_or_else(|| IndexError::corrupt("posting list longer than u32::MAX"))?;
        Ok(())
    }

    /// Finish the current list and return its posting count
    pub fn finish_posting_list(&mut self) -> u32 {
        let count = self.count;
        self.prev_docno = None;
        self.count = 0;
        count
    }

    /// Bytes written so far
    pub fn position(&self) -> u64 {
        self.out.position()
    }

    /// Flush and return the underlying writer
    pub fn finish(self) -> Result<W> {
        let mut inner = self.out.into_inner();
        inner.flush()?;
        Ok(inner)
    }
}

/// Reader for posting lists
pub struct PostingsReader<R> {
    /// The postings data (typically a buffered file)
    input: R,
    /// Exclusive upper bound for decoded document numbers
    doc_count: u32,
}

impl<R: Read + Seek> PostingsReader<R> {
    pub fn new(input: R, doc_count: u32) -> Self {
        Self { input, doc_count }
    }

    /// Decode the full posting list of a lexicon entry
    pub fn read_postings(&mut self, entry: &LexiconEntry) -> Result<Vec<Posting>> {
        self.input.seek(SeekFrom::Start(entry.offset))?;

        // The count is untrusted until the list has decoded
        let mut postings = Vec::with_capacity((entry.count as usize).min(1 << 16));
        let mut docno: u64 = 0;
        for i in 0..entry.count {
            let delta = read_varint(&mut self.input)?;
            let tf = read_varint(&mut self.input)?;

            if i > 0 && delta == 0 {
                return Err(IndexError::corrupt(format!(
                    "duplicate document in postings of '{}'",
                    entry.term
                )));
            }
            docno = docno.saturating_add(delta);
            if docno >= self.doc_count as u64 {
                return Err(IndexError::corrupt(format!(
                    "posting for '{}' references document {} of {}",
                    entry.term, docno, self.doc_count
                )));
            }
            let tf = u32::try_from(tf).map_err(|_| {
                IndexError::corrupt(format!("term frequency overflow for '{}'", entry.term))
            })?;

            postings.push(Posting::new(DocNo(docno as u32), tf));
        }

        Ok(postings)
    }
}
