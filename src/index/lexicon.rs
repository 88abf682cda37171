//! Sorted term directory
//!
//! `lexicon.bin` is a flat sequence of records
//! `(u32 term length, term bytes, u64 postings offset, u32 posting count)`
//! in strictly ascending bytewise term order, so the loaded table can be
//! binary searched directly.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::Path;

use super::codec::{read_u32_le, read_u32_le_or_eof, read_u64_le, write_u32_le, write_u64_le};
use super::types::LexiconEntry;
use crate::error::{IndexError, Result};

/// Fully resident lexicon
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
}

impl Lexicon {
    /// Load and validate a lexicon file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Decode lexicon records until end of stream
    pub fn read_from<R: Read>(mut input: R) -> Result<Self> {
        let mut entries: Vec<LexiconEntry> = Vec::new();

        while let Some(term_len) = read_u32_le_or_eof(&mut input).map_err(truncated)? {
            let mut term_bytes = Vec::new();
            (&mut input)
                .take(term_len as u64)
                .read_to_end(&mut term_bytes)?;
            if term_bytes.len() != term_len as usize {
                return Err(IndexError::corrupt("truncated lexicon term"));
            }
            let offset = read_u64_le(&mut input).map_err(truncated)?;
            let count = read_u32_le(&mut input).map_err(truncated)?;

            let term = String::from_utf8(term_bytes)
                .map_err(|_| IndexError::corrupt("lexicon term is not valid UTF-8"))?;

            if let Some(prev) = entries.last() {
                if prev.term.as_bytes() >= term.as_bytes() {
                    return Err(IndexError::corrupt(format!(
                        "lexicon terms out of order: '{}' after '{}'",
                        term, prev.term
                    )));
                }
            }

            entries.push(LexiconEntry {
                term,
                offset,
                count,
            });
        }

        Ok(Self { entries })
    }

    /// Look up a term and return its postings location
    pub fn get(&self, term: &str) -> Option<&LexiconEntry> {
        self.entries
            .binary_search_by(|e| e.term.as_bytes().cmp(term.as_bytes()))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Check if a term exists
    pub fn contains(&self, term: &str) -> bool {
        self.get(term).is_some()
    }

    /// Get the number of terms
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in term order
    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.iter()
    }
}

fn truncated(e: std::io::Error) -> IndexError {
    if e.kind() == ErrorKind::UnexpectedEof {
        IndexError::corrupt("truncated lexicon record")
    } else {
        IndexError::Io(e)
    }
}

/// Streaming lexicon writer
///
/// Entries are written as they are closed by the merge, so only the previous
/// term is held in memory.
pub struct LexiconWriter<W: Write> {
    out: W,
    last_term: Option<String>,
    len: u64,
}

impl<W: Write> LexiconWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_term: None,
            len: 0,
        }
    }

    /// Append an entry; terms MUST arrive in strictly ascending order
    pub fn add(&mut self, entry: &LexiconEntry) -> Result<()> {
        if let Some(last) = &self.last_term {
            if last.as_bytes() >= entry.term.as_bytes() {
                return Err(IndexError::corrupt(format!(
                    "lexicon term '{}' added after '{}'",
                    entry.term, last
                )));
            }
        }
        let term_len = u32::try_from(entry.term.len())
            .map_err(|_| IndexError::InvalidArgument("term longer than u32::MAX bytes".into()))?;

        write_u32_le(&mut self.out, term_len)?;
        self.out.write_all(entry.term.as_bytes())?;
        write_u64_le(&mut self.out, entry.offset)?;
        write_u32_le(&mut self.out, entry.count)?;

        match &mut self.last_term {
            Some(last) => {
                last.clear();
                last.push_str(&entry.term);
            }
            None => self.last_term = Some(entry.term.clone()),
        }
        self.len += 1;
        Ok(())
    }

    /// Number of entries written
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
