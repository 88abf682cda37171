//! Core types for the on-disk index

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Dense document number assigned in corpus-iteration order (0..document_count)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocNo(pub u32);

impl DocNo {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// A single posting entry within a posting list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Posting {
    pub docno: DocNo,
    /// Occurrences of the term in this document
    pub term_frequency: u32,
}

impl Posting {
    pub fn new(docno: DocNo, term_frequency: u32) -> Self {
        Self {
            docno,
            term_frequency,
        }
    }
}

/// One (term, document, count) entry of a sorted run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Triple {
    pub term: String,
    pub docno: DocNo,
    pub term_frequency: u32,
}

impl Triple {
    pub fn new(term: impl Into<String>, docno: DocNo, term_frequency: u32) -> Self {
        Self {
            term: term.into(),
            docno,
            term_frequency,
        }
    }

    /// Merge order: term ascending, then document ascending
    pub fn key_cmp(&self, other: &Self) -> Ordering {
        self.term
            .as_bytes()
            .cmp(other.term.as_bytes())
            .then_with(|| self.docno.cmp(&other.docno))
    }
}

/// Lexicon record: where a term's postings live in the postings file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexiconEntry {
    pub term: String,
    /// Byte offset of the first posting
    pub offset: u64,
    /// Number of postings (the term's document frequency)
    pub count: u32,
}

/// Stored document: external identifier and source path
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    pub external_id: String,
    pub path: String,
}
